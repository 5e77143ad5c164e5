#![allow(dead_code)]

//! Shared helpers for the integration tests.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use gridroute::gridmap::GridMap;
use gridroute::SQRT2;

pub fn grid(rows: &[&str]) -> Arc<GridMap> {
    let text = format!(
        "type octile\nheight {}\nwidth {}\nmap\n{}\n",
        rows.len(),
        rows[0].len(),
        rows.join("\n")
    );
    Arc::new(GridMap::parse(&text).expect("test map must parse"))
}

pub fn random_map(rng: &mut StdRng, width: u32, height: u32, density: f64) -> Arc<GridMap> {
    let mut map = GridMap::new(width, height);
    for y in 0..height {
        for x in 0..width {
            if rng.gen_bool(1.0 - density) {
                map.set_label(map.to_padded_id_xy(x, y), true);
            }
        }
    }
    Arc::new(map)
}

pub fn random_open_cell(rng: &mut StdRng, map: &GridMap) -> Option<(u32, u32)> {
    for _ in 0..200 {
        let x = rng.gen_range(0..map.width());
        let y = rng.gen_range(0..map.height());
        if map.get(map.to_padded_id_xy(x, y)) {
            return Some((x, y));
        }
    }
    None
}

fn segment_cost(map: &GridMap, from: u32, to: u32, diag_first: bool) -> Option<f64> {
    let (fx, fy) = map.to_unpadded_xy(from);
    let (tx, ty) = map.to_unpadded_xy(to);
    let dx = tx as i64 - fx as i64;
    let dy = ty as i64 - fy as i64;
    let sx = dx.signum();
    let sy = dy.signum();
    let diag = dx.abs().min(dy.abs());
    let straight = (dx.abs() - dy.abs()).abs();
    let pw = map.padded_width() as i64;
    let mut cur = from as i64;

    let walk_diag = |cur: &mut i64, steps: i64| -> bool {
        for _ in 0..steps {
            let next = *cur + sy * pw + sx;
            if !map.get(next as u32)
                || !map.get((*cur + sx) as u32)
                || !map.get((*cur + sy * pw) as u32)
            {
                return false;
            }
            *cur = next;
        }
        true
    };
    let walk_straight = |cur: &mut i64, steps: i64| -> bool {
        let step = if dx.abs() > dy.abs() { sx } else { sy * pw };
        for _ in 0..steps {
            let next = *cur + step;
            if !map.get(next as u32) {
                return false;
            }
            *cur = next;
        }
        true
    };

    let ok = if diag_first {
        walk_diag(&mut cur, diag) && walk_straight(&mut cur, straight)
    } else {
        walk_straight(&mut cur, straight) && walk_diag(&mut cur, diag)
    };
    (ok && cur == to as i64).then(|| diag as f64 * SQRT2 + straight as f64)
}

/// Validate a returned path: it must start and end at the given cells,
/// every consecutive pair must be a legal taut segment with no corner
/// cutting, and the segment costs must sum to the reported total.
pub fn check_grid_path(map: &GridMap, path: &[u32], start: u32, target: u32, total: f64) {
    assert!(!path.is_empty(), "path must not be empty");
    assert_eq!(path[0], start, "path must start at the start cell");
    assert_eq!(*path.last().unwrap(), target, "path must end at the target");
    let mut sum = 0.0;
    for pair in path.windows(2) {
        let cost = segment_cost(map, pair[0], pair[1], true)
            .or_else(|| segment_cost(map, pair[0], pair[1], false))
            .unwrap_or_else(|| {
                panic!(
                    "illegal segment {:?} -> {:?}",
                    map.to_unpadded_xy(pair[0]),
                    map.to_unpadded_xy(pair[1])
                )
            });
        sum += cost;
    }
    assert!(
        (sum - total).abs() < 1e-6,
        "path cost {} does not match reported {}",
        sum,
        total
    );
}
