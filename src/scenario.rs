//! Moving-AI scenario files: loading, writing and generation.
//!
//! Format (version 1.0): a header line, then one experiment per line:
//! `bucket map width height sx sy gx gy optimal_cost`.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::expand::GridPolicy;
use crate::gridmap::GridMap;
use crate::heuristic::OctileHeuristic;
use crate::search::{FlexibleAstar, ProblemInstance, Solution};

#[derive(Debug, Clone)]
pub struct Experiment {
    pub bucket: u32,
    pub map: String,
    pub width: u32,
    pub height: u32,
    pub start_x: u32,
    pub start_y: u32,
    pub goal_x: u32,
    pub goal_y: u32,
    pub distance: f64,
    pub precision: usize,
}

impl Experiment {
    pub fn start_id(&self) -> u32 {
        self.start_y * self.width + self.start_x
    }

    pub fn goal_id(&self) -> u32 {
        self.goal_y * self.width + self.goal_x
    }
}

#[derive(Debug, Default)]
pub struct ScenarioManager {
    experiments: Vec<Experiment>,
    last_file: String,
}

impl ScenarioManager {
    pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario file {}", path.display()))?;
        let mut lines = text.lines();
        let header = lines.next().context("scenario file is empty")?;
        if !header.trim_start().starts_with("version") {
            bail!("scenario header must declare a version, got {:?}", header);
        }
        let mut experiments = Vec::new();
        for (lineno, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 9 {
                bail!(
                    "scenario line {}: expected 9 fields, got {}",
                    lineno + 2,
                    fields.len()
                );
            }
            let parse_u32 = |i: usize, what: &str| -> Result<u32> {
                fields[i]
                    .parse()
                    .with_context(|| format!("scenario line {}: bad {}", lineno + 2, what))
            };
            let distance: f64 = fields[8]
                .parse()
                .with_context(|| format!("scenario line {}: bad optimal cost", lineno + 2))?;
            let precision = fields[8]
                .split('.')
                .nth(1)
                .map(|frac| frac.len())
                .unwrap_or(0);
            experiments.push(Experiment {
                bucket: parse_u32(0, "bucket")?,
                map: fields[1].to_string(),
                width: parse_u32(2, "width")?,
                height: parse_u32(3, "height")?,
                start_x: parse_u32(4, "start x")?,
                start_y: parse_u32(5, "start y")?,
                goal_x: parse_u32(6, "goal x")?,
                goal_y: parse_u32(7, "goal y")?,
                distance,
                precision,
            });
        }
        Ok(ScenarioManager {
            experiments,
            last_file: path.to_string_lossy().into_owned(),
        })
    }

    /// Generate `count` random solvable experiments on `map`; the optimal
    /// cost of each is computed with the engine's own octile search.
    pub fn generate_experiments(map_file: &str, map: Arc<GridMap>, count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut astar = FlexibleAstar::new(
            OctileHeuristic::new(map.padded_width()),
            GridPolicy::new(map.clone()),
        );
        let mut experiments = Vec::with_capacity(count);
        let mut attempts = 0usize;
        while experiments.len() < count && attempts < count * 100 {
            attempts += 1;
            let sx = rng.gen_range(0..map.width());
            let sy = rng.gen_range(0..map.height());
            let gx = rng.gen_range(0..map.width());
            let gy = rng.gen_range(0..map.height());
            if !map.get(map.to_padded_id_xy(sx, sy)) || !map.get(map.to_padded_id_xy(gx, gy)) {
                continue;
            }
            let mut pi = ProblemInstance::new(sy * map.width() + sx, gy * map.width() + gx, false);
            let mut sol = Solution::new();
            astar.get_path(&mut pi, &mut sol);
            if !sol.found() {
                continue;
            }
            experiments.push(Experiment {
                bucket: (sol.sum_of_edge_costs / 4.0) as u32,
                map: map_file.to_string(),
                width: map.width(),
                height: map.height(),
                start_x: sx,
                start_y: sy,
                goal_x: gx,
                goal_y: gy,
                distance: sol.sum_of_edge_costs,
                precision: 8,
            });
        }
        experiments.sort_by(|a, b| a.bucket.cmp(&b.bucket));
        ScenarioManager {
            experiments,
            last_file: map_file.to_string(),
        }
    }

    pub fn write_scenario(&self) -> String {
        let mut out = String::from("version 1.0\n");
        for e in &self.experiments {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.prec$}",
                e.bucket,
                e.map,
                e.width,
                e.height,
                e.start_x,
                e.start_y,
                e.goal_x,
                e.goal_y,
                e.distance,
                prec = e.precision.max(1),
            );
        }
        out
    }

    pub fn num_experiments(&self) -> usize {
        self.experiments.len()
    }

    pub fn get_experiment(&self, i: usize) -> &Experiment {
        &self.experiments[i]
    }

    pub fn last_file_loaded(&self) -> &str {
        &self.last_file
    }

    pub fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.experiments.capacity() * std::mem::size_of::<Experiment>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_the_text_format() {
        let map = Arc::new(
            GridMap::parse("type octile\nheight 4\nwidth 4\nmap\n....\n....\n....\n....\n")
                .unwrap(),
        );
        let sm = ScenarioManager::generate_experiments("maps/tiny.map", map, 5, 7);
        assert_eq!(sm.num_experiments(), 5);
        let text = sm.write_scenario();
        let dir = std::env::temp_dir().join("gridroute_scen_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tiny.scen");
        std::fs::write(&path, &text).unwrap();
        let loaded = ScenarioManager::load_scenario(&path).unwrap();
        assert_eq!(loaded.num_experiments(), 5);
        for (a, b) in (0..5).map(|i| (sm.get_experiment(i), loaded.get_experiment(i))) {
            assert_eq!(a.start_id(), b.start_id());
            assert_eq!(a.goal_id(), b.goal_id());
            assert!((a.distance - b.distance).abs() < 1e-6);
        }
    }
}
