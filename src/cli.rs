//! Command-line surface: scenario-driven benchmark runs and scenario
//! generation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::cpg::CornerPointGraph;
use crate::expand::{
    CpgPolicy, ExpansionPolicy, GridPolicy, Jps2Policy, Jps2PlusPolicy, JpgPolicy, JpsPlusPolicy,
    JpsPolicy, JpsWgmPolicy, TimexOctileHeuristic, TimexPolicy, WeightedGridPolicy,
};
use crate::gridmap::GridMap;
use crate::heuristic::{Heuristic, OctileHeuristic, ZeroHeuristic};
use crate::scenario::{Experiment, ScenarioManager};
use crate::search::{FlexibleAstar, ProblemInstance, Solution};
use crate::weighted_gridmap::WeightedGridMap;

/// The cheapest terrain in the weighted benchmarks is '.'; the octile
/// heuristic is scaled by it so f-values stay informative.
const CHEAP_TERRAIN: f64 = b'.' as f64;

#[derive(Parser)]
#[command(name = "gridroute")]
#[command(about = "Best-first pathfinding on grid maps and contracted graphs", long_about = None)]
pub struct Cli {
    /// Input scenario file
    #[arg(long)]
    pub scen: Option<PathBuf>,

    /// Search algorithm: dijkstra, astar, astar_timex, astar_wgm, sssp,
    /// sssp_wgm, jps, jps2, jps+, jps2+, jps_wgm, cpg, jpg
    #[arg(long)]
    pub alg: Option<String>,

    /// Generate a scenario file from a map and print it to stdout
    #[arg(long)]
    pub gen: Option<PathBuf>,

    /// Verify each computed cost against the scenario's optimum
    #[arg(long)]
    pub checkopt: bool,

    /// Emit a per-expansion trace to stderr
    #[arg(long)]
    pub verbose: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    if let Some(map_file) = &cli.gen {
        let map = Arc::new(GridMap::from_file(map_file)?);
        let sm = ScenarioManager::generate_experiments(
            &map_file.to_string_lossy(),
            map,
            1000,
            1,
        );
        print!("{}", sm.write_scenario());
        return Ok(());
    }

    let (Some(scen), Some(alg)) = (&cli.scen, &cli.alg) else {
        eprintln!("Err. Must specify a scenario file and search algorithm. Try --help for options.");
        return Ok(());
    };

    let scenmgr = ScenarioManager::load_scenario(scen)?;
    if scenmgr.num_experiments() == 0 {
        eprintln!("Err. Scenario file {} has no experiments.", scen.display());
        return Ok(());
    }
    let map_file = resolve_map_path(scen, &scenmgr.get_experiment(0).map);

    match alg.as_str() {
        "dijkstra" => {
            let map = load_grid(&map_file)?;
            let mut astar = FlexibleAstar::new(ZeroHeuristic, GridPolicy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "astar" => {
            let map = load_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width());
            let mut astar = FlexibleAstar::new(h, GridPolicy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "astar_timex" => {
            let map = load_grid(&map_file)?;
            let h = TimexOctileHeuristic::new(&map);
            let mut astar = FlexibleAstar::new(h, TimexPolicy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "astar_wgm" => {
            let map = load_weighted_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width()).with_hscale(CHEAP_TERRAIN);
            let mut astar = FlexibleAstar::new(h, WeightedGridPolicy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "sssp" => {
            let map = load_grid(&map_file)?;
            let mut astar = FlexibleAstar::new(ZeroHeuristic, GridPolicy::new(map));
            astar.set_exhaustive(true);
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "sssp_wgm" => {
            let map = load_weighted_grid(&map_file)?;
            let mut astar = FlexibleAstar::new(ZeroHeuristic, WeightedGridPolicy::new(map));
            astar.set_exhaustive(true);
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "jps" => {
            let map = load_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width());
            let mut astar = FlexibleAstar::new(h, JpsPolicy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "jps2" => {
            let map = load_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width());
            let mut astar = FlexibleAstar::new(h, Jps2Policy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "jps+" => {
            let map = load_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width());
            let mut astar = FlexibleAstar::new(h, JpsPlusPolicy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "jps2+" => {
            let map = load_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width());
            let mut astar = FlexibleAstar::new(h, Jps2PlusPolicy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "jps_wgm" => {
            let map = load_weighted_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width()).with_hscale(CHEAP_TERRAIN);
            let mut astar = FlexibleAstar::new(h, JpsWgmPolicy::new(map));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "cpg" => {
            let map = load_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width());
            let cpg = CornerPointGraph::new(map);
            let mut astar = FlexibleAstar::new(h, CpgPolicy::new(cpg));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        "jpg" => {
            let map = load_grid(&map_file)?;
            let h = OctileHeuristic::new(map.padded_width());
            let cpg = CornerPointGraph::new(map);
            let mut astar = FlexibleAstar::new(h, JpgPolicy::new(cpg));
            run_experiments(&mut astar, alg, &scenmgr, &cli);
            report_memory(astar.mem() + scenmgr.mem());
        }
        other => {
            eprintln!("err; invalid search algorithm: {}", other);
        }
    }
    Ok(())
}

fn load_grid(path: &Path) -> Result<Arc<GridMap>> {
    GridMap::from_file(path)
        .map(Arc::new)
        .with_context(|| format!("failed to load map {}", path.display()))
}

fn load_weighted_grid(path: &Path) -> Result<Arc<WeightedGridMap>> {
    WeightedGridMap::from_file(path)
        .map(Arc::new)
        .with_context(|| format!("failed to load map {}", path.display()))
}

/// Map paths in scenario files are usually relative to the scenario file.
fn resolve_map_path(scen: &Path, map: &str) -> PathBuf {
    let direct = PathBuf::from(map);
    if direct.exists() {
        return direct;
    }
    match scen.parent() {
        Some(parent) => parent.join(map),
        None => direct,
    }
}

fn run_experiments<H: Heuristic, E: ExpansionPolicy>(
    astar: &mut FlexibleAstar<H, E>,
    alg: &str,
    scenmgr: &ScenarioManager,
    cli: &Cli,
) {
    println!("id\talg\texpanded\tinserted\tupdated\ttouched\tmicros\tpcost\tplen\tmap");
    for i in 0..scenmgr.num_experiments() {
        let exp = scenmgr.get_experiment(i);
        let mut pi = ProblemInstance::new(exp.start_id(), exp.goal_id(), cli.verbose);
        let mut sol = Solution::new();
        astar.get_path(&mut pi, &mut sol);

        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            i,
            alg,
            sol.nodes_expanded,
            sol.nodes_inserted,
            sol.nodes_updated,
            sol.nodes_touched,
            sol.time_elapsed_micro,
            sol.sum_of_edge_costs,
            sol.path.len(),
            scenmgr.last_file_loaded(),
        );

        if cli.checkopt {
            check_optimality(&sol, exp);
        }
    }
}

/// Compare the computed cost against the scenario optimum at the file's
/// stated precision; a mismatch is fatal.
fn check_optimality(sol: &Solution, exp: &Experiment) {
    let precision = 1i32;
    let epsilon = 10f64.powi(-precision) / 2.0;
    let delta = (sol.sum_of_edge_costs - exp.distance).abs();
    if delta - epsilon > epsilon {
        eprintln!("optimality check failed!");
        eprintln!(
            "optimal path length: {:.prec$} computed length: {:.prec$}",
            exp.distance,
            sol.sum_of_edge_costs,
            prec = exp.precision.max(1),
        );
        eprintln!("precision: {} epsilon: {}", precision, epsilon);
        eprintln!("delta: {}", delta);
        std::process::exit(1);
    }
}

fn report_memory(bytes: usize) {
    info!("done. total memory: {}", bytes);
}
