//! Contraction-hierarchy searches against an independent Dijkstra baseline.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::{Graph, NodeIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use gridroute::cpg::CornerPointGraph;
use gridroute::expand::{BchPolicy, FchCpgPolicy, FchPolicy, GridPolicy};
use gridroute::heuristic::{OctileHeuristic, ZeroHeuristic};
use gridroute::search::{BchSearch, ChaseSearch, FlexibleAstar, ProblemInstance, Solution};
use gridroute::XyGraph;

use common::grid;

/// Contract a directed edge list in rank order, inserting every candidate
/// shortcut (no witness search; extra shortcuts never change distances).
fn contract(edges: &[(u32, u32, f64)], rank: &HashMap<u32, u32>) -> Vec<(u32, u32, f64)> {
    let mut out: HashMap<u32, HashMap<u32, f64>> = HashMap::new();
    let mut inc: HashMap<u32, HashMap<u32, f64>> = HashMap::new();
    let add = |out: &mut HashMap<u32, HashMap<u32, f64>>,
                   inc: &mut HashMap<u32, HashMap<u32, f64>>,
                   t: u32,
                   h: u32,
                   c: f64| {
        let slot = out.entry(t).or_default().entry(h).or_insert(f64::INFINITY);
        if c < *slot {
            *slot = c;
            inc.entry(h).or_default().insert(t, c);
        }
    };
    for &(t, h, c) in edges {
        add(&mut out, &mut inc, t, h, c);
    }

    let mut order: Vec<u32> = rank.keys().copied().collect();
    order.sort_by_key(|id| rank[id]);
    for &v in &order {
        let rv = rank[&v];
        let ins: Vec<(u32, f64)> = inc
            .get(&v)
            .map(|m| {
                m.iter()
                    .filter(|(u, _)| rank[u] > rv)
                    .map(|(&u, &c)| (u, c))
                    .collect()
            })
            .unwrap_or_default();
        let outs: Vec<(u32, f64)> = out
            .get(&v)
            .map(|m| {
                m.iter()
                    .filter(|(w, _)| rank[w] > rv)
                    .map(|(&w, &c)| (w, c))
                    .collect()
            })
            .unwrap_or_default();
        for &(u, c1) in &ins {
            for &(w, c2) in &outs {
                if u != w {
                    add(&mut out, &mut inc, u, w, c1 + c2);
                }
            }
        }
    }

    let mut result = Vec::new();
    for (t, heads) in &out {
        for (h, c) in heads {
            result.push((*t, *h, *c));
        }
    }
    result
}

struct TestGraph {
    original: Vec<(u32, u32, f64)>,
    contracted: Arc<XyGraph>,
    contracted_edges: HashMap<(u32, u32), f64>,
    rank: Arc<Vec<u32>>,
    n: u32,
}

fn build_test_graph(rng: &mut StdRng, n: u32) -> TestGraph {
    let mut original = Vec::new();
    for v in 0..n {
        for _ in 0..4 {
            let w = rng.gen_range(0..n);
            if w != v {
                original.push((v, w, rng.gen_range(1..=10) as f64));
            }
        }
    }

    let mut perm: Vec<u32> = (0..n).collect();
    perm.shuffle(rng);
    let rank_map: HashMap<u32, u32> = (0..n).map(|v| (v, perm[v as usize])).collect();

    let contracted_list = contract(&original, &rank_map);
    let mut contracted = XyGraph::new();
    for _ in 0..n {
        contracted.add_node(rng.gen_range(0..100), rng.gen_range(0..100));
    }
    let mut contracted_edges = HashMap::new();
    for &(t, h, c) in &contracted_list {
        contracted.add_edge(t, h, c);
        contracted_edges.insert((t, h), c);
    }

    let rank: Vec<u32> = (0..n).map(|v| rank_map[&v]).collect();
    TestGraph {
        original,
        contracted: Arc::new(contracted),
        contracted_edges,
        rank: Arc::new(rank),
        n,
    }
}

fn baseline_cost(edges: &[(u32, u32, f64)], n: u32, from: u32, to: u32) -> f64 {
    let mut g: Graph<(), f64> = Graph::new();
    for _ in 0..n {
        g.add_node(());
    }
    for &(t, h, c) in edges {
        g.add_edge(NodeIndex::new(t as usize), NodeIndex::new(h as usize), c);
    }
    let dist = petgraph::algo::dijkstra(&g, NodeIndex::new(from as usize), None, |e| *e.weight());
    dist.get(&NodeIndex::new(to as usize))
        .copied()
        .unwrap_or(f64::INFINITY)
}

fn check_graph_path(sol: &Solution, edges: &HashMap<(u32, u32), f64>, from: u32, to: u32) {
    if !sol.found() {
        assert!(sol.path.is_empty());
        return;
    }
    assert_eq!(sol.path.first(), Some(&from));
    assert_eq!(sol.path.last(), Some(&to));
    let mut sum = 0.0;
    for pair in sol.path.windows(2) {
        let cost = edges
            .get(&(pair[0], pair[1]))
            .unwrap_or_else(|| panic!("{} -> {} is not a graph edge", pair[0], pair[1]));
        sum += cost;
    }
    assert!(
        (sum - sol.sum_of_edge_costs).abs() < 1e-6,
        "path sums to {} but solution reports {}",
        sum,
        sol.sum_of_edge_costs
    );
}

#[test]
fn two_node_hierarchy_routes_both_ways() {
    let mut g = XyGraph::new();
    g.add_node(0, 0);
    g.add_node(1, 0);
    g.add_edge(0, 1, 5.0);
    g.add_edge(1, 0, 3.0);
    let g = Arc::new(g);
    let rank = Arc::new(vec![0u32, 1u32]);

    let mut bch = BchSearch::new(
        BchPolicy::forward(g.clone(), rank.clone()),
        BchPolicy::backward(g.clone(), rank.clone()),
    );

    let mut pi = ProblemInstance::new(0, 1, false);
    let mut sol = Solution::new();
    bch.get_path(&mut pi, &mut sol);
    assert!((sol.sum_of_edge_costs - 5.0).abs() < 1e-9);
    assert_eq!(sol.path, vec![0, 1]);

    let mut pi = ProblemInstance::new(1, 0, false);
    let mut sol = Solution::new();
    bch.get_path(&mut pi, &mut sol);
    assert!((sol.sum_of_edge_costs - 3.0).abs() < 1e-9);
    assert_eq!(sol.path, vec![1, 0]);
}

#[test]
fn bch_matches_dijkstra_on_random_contracted_graphs() {
    let mut rng = StdRng::seed_from_u64(0xbc4);
    for _ in 0..8 {
        let tg = build_test_graph(&mut rng, 30);
        let mut bch = BchSearch::new(
            BchPolicy::forward(tg.contracted.clone(), tg.rank.clone()),
            BchPolicy::backward(tg.contracted.clone(), tg.rank.clone()),
        );
        for _ in 0..25 {
            let from = rng.gen_range(0..tg.n);
            let to = rng.gen_range(0..tg.n);
            let expected = baseline_cost(&tg.original, tg.n, from, to);
            let mut pi = ProblemInstance::new(from, to, false);
            let mut sol = Solution::new();
            bch.get_path(&mut pi, &mut sol);
            if expected.is_infinite() {
                assert!(!sol.found(), "bch found a path {} -> {}", from, to);
            } else {
                assert!(
                    (sol.sum_of_edge_costs - expected).abs() < 1e-6,
                    "bch {} -> {}: {} != {}",
                    from,
                    to,
                    sol.sum_of_edge_costs,
                    expected
                );
                check_graph_path(&sol, &tg.contracted_edges, from, to);
            }
        }
    }
}

#[test]
fn fch_matches_dijkstra_on_random_contracted_graphs() {
    let mut rng = StdRng::seed_from_u64(0xfc8);
    for _ in 0..8 {
        let tg = build_test_graph(&mut rng, 30);
        let mut fch = FlexibleAstar::new(
            ZeroHeuristic,
            FchPolicy::new(tg.contracted.clone(), tg.rank.clone()),
        );
        for _ in 0..25 {
            let from = rng.gen_range(0..tg.n);
            let to = rng.gen_range(0..tg.n);
            let expected = baseline_cost(&tg.original, tg.n, from, to);
            let mut pi = ProblemInstance::new(from, to, false);
            let mut sol = Solution::new();
            fch.get_path(&mut pi, &mut sol);
            if expected.is_infinite() {
                assert!(!sol.found(), "fch found a path {} -> {}", from, to);
            } else {
                assert!(
                    (sol.sum_of_edge_costs - expected).abs() < 1e-6,
                    "fch {} -> {}: {} != {}",
                    from,
                    to,
                    sol.sum_of_edge_costs,
                    expected
                );
                check_graph_path(&sol, &tg.contracted_edges, from, to);
            }
        }
    }
}

#[test]
fn chase_matches_bch_and_dijkstra() {
    let mut rng = StdRng::seed_from_u64(0xc4a5e);
    for _ in 0..8 {
        let tg = build_test_graph(&mut rng, 40);
        let mut bch = BchSearch::new(
            BchPolicy::forward(tg.contracted.clone(), tg.rank.clone()),
            BchPolicy::backward(tg.contracted.clone(), tg.rank.clone()),
        );
        let mut chase = ChaseSearch::new(
            BchPolicy::forward(tg.contracted.clone(), tg.rank.clone()),
            BchPolicy::backward(tg.contracted.clone(), tg.rank.clone()),
            tg.n,
        );
        for _ in 0..25 {
            let from = rng.gen_range(0..tg.n);
            let to = rng.gen_range(0..tg.n);
            let expected = baseline_cost(&tg.original, tg.n, from, to);

            let mut pi = ProblemInstance::new(from, to, false);
            let mut bch_sol = Solution::new();
            bch.get_path(&mut pi, &mut bch_sol);

            let mut pi = ProblemInstance::new(from, to, false);
            let mut chase_sol = Solution::new();
            chase.get_path(&mut pi, &mut chase_sol);

            if expected.is_infinite() {
                assert!(!bch_sol.found());
                assert!(!chase_sol.found(), "chase found a path {} -> {}", from, to);
            } else {
                assert!(
                    (chase_sol.sum_of_edge_costs - expected).abs() < 1e-6,
                    "chase {} -> {}: {} != {}",
                    from,
                    to,
                    chase_sol.sum_of_edge_costs,
                    expected
                );
                assert!(
                    (chase_sol.sum_of_edge_costs - bch_sol.sum_of_edge_costs).abs() < 1e-6,
                    "chase and bch disagree on {} -> {}",
                    from,
                    to
                );
                check_graph_path(&chase_sol, &tg.contracted_edges, from, to);
            }
        }
    }
}

#[test]
fn fch_over_a_contracted_corner_graph_matches_grid_astar() {
    let maps: Vec<Vec<&str>> = vec![
        vec!["...", ".@.", "..."],
        vec!["......", "..@@..", "..@@..", "......"],
    ];
    for rows in &maps {
        let map = grid(rows);
        let static_cpg = CornerPointGraph::new(map.clone());

        // rank the corners (query endpoints implicitly rank below all) and
        // lay the shortcuts over the corner graph
        let mut rank_map: HashMap<u32, u32> = HashMap::new();
        let mut policy_rank: FxHashMap<u32, u32> = FxHashMap::default();
        for (i, &c) in static_cpg.corner_ids().iter().enumerate() {
            rank_map.insert(c, i as u32 + 1);
            policy_rank.insert(c, i as u32 + 1);
        }
        let static_edges: Vec<(u32, u32, f64)> = static_cpg.edges().collect();
        let shortcuts = contract(&static_edges, &rank_map);

        let mut cpg = CornerPointGraph::new(map.clone());
        let existing: HashMap<(u32, u32), f64> = static_edges
            .iter()
            .map(|&(t, h, c)| ((t, h), c))
            .collect();
        for (t, h, c) in shortcuts {
            if existing.get(&(t, h)).map_or(true, |&old| c < old) {
                cpg.add_edge(t, h, c);
            }
        }

        let mut reference = FlexibleAstar::new(
            OctileHeuristic::new(map.padded_width()),
            GridPolicy::new(map.clone()),
        );
        let mut fch_cpg = FlexibleAstar::new(
            OctileHeuristic::new(map.padded_width()),
            FchCpgPolicy::new(cpg, policy_rank),
        );

        for sy in 0..map.height() {
            for sx in 0..map.width() {
                for gy in 0..map.height() {
                    for gx in 0..map.width() {
                        if !map.get(map.to_padded_id_xy(sx, sy))
                            || !map.get(map.to_padded_id_xy(gx, gy))
                        {
                            continue;
                        }
                        let mut pi = ProblemInstance::new(
                            sy * map.width() + sx,
                            gy * map.width() + gx,
                            false,
                        );
                        let mut expected = Solution::new();
                        reference.get_path(&mut pi, &mut expected);

                        let mut pi = ProblemInstance::new(
                            sy * map.width() + sx,
                            gy * map.width() + gx,
                            false,
                        );
                        let mut got = Solution::new();
                        fch_cpg.get_path(&mut pi, &mut got);

                        assert!(
                            (got.sum_of_edge_costs - expected.sum_of_edge_costs).abs() < 1e-6
                                || (got.sum_of_edge_costs.is_infinite()
                                    && expected.sum_of_edge_costs.is_infinite()),
                            "fch-cpg ({},{}) -> ({},{}): {} != {}",
                            sx,
                            sy,
                            gx,
                            gy,
                            got.sum_of_edge_costs,
                            expected.sum_of_edge_costs
                        );
                    }
                }
            }
        }
    }
}
