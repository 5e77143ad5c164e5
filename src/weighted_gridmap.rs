//! Terrain-weighted grid. Each cell carries a weight byte (the raw map
//! character in the Moving-AI benchmarks); zero means blocked. Edge costs
//! are the average of the endpoint weights, times sqrt(2) for diagonals.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::gridmap::Nbhd;

pub struct WeightedGridMap {
    header_w: u32,
    header_h: u32,
    padded_w: u32,
    padded_h: u32,
    weights: Vec<u8>,
}

impl WeightedGridMap {
    /// All-blocked map of the given unpadded dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let padded_w = width + 2;
        let padded_h = height + 2;
        WeightedGridMap {
            header_w: width,
            header_h: height,
            padded_w,
            padded_h,
            weights: vec![0u8; (padded_w * padded_h) as usize],
        }
    }

    /// Build from row-major unpadded weights; zero stays blocked.
    pub fn from_weights(width: u32, height: u32, cells: &[u8]) -> Self {
        debug_assert_eq!(cells.len(), (width * height) as usize);
        let mut map = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let w = cells[(y * width + x) as usize];
                let id = map.to_padded_id_xy(x, y);
                map.weights[id as usize] = w;
            }
        }
        map
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read map file {}", path.as_ref().display()))?;
        Self::parse(&text)
    }

    /// Moving-AI format; the cell character itself is the terrain weight,
    /// with `@` and `O` blocked.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let mut width = 0u32;
        let mut height = 0u32;
        for line in lines.by_ref() {
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("type") => {}
                Some("height") => {
                    height = fields
                        .next()
                        .context("map header: height value missing")?
                        .parse()
                        .context("map header: bad height")?;
                }
                Some("width") => {
                    width = fields
                        .next()
                        .context("map header: width value missing")?
                        .parse()
                        .context("map header: bad width")?;
                }
                Some("map") => break,
                Some(other) => bail!("map header: unexpected token {:?}", other),
                None => {}
            }
        }
        if width == 0 || height == 0 {
            bail!("map header: missing width or height");
        }
        let mut map = Self::new(width, height);
        for y in 0..height {
            let row = lines
                .next()
                .with_context(|| format!("map body: row {} missing", y))?;
            if row.len() < width as usize {
                bail!("map body: row {} has {} cells, expected {}", y, row.len(), width);
            }
            for (x, c) in row.bytes().take(width as usize).enumerate() {
                if c != b'@' && c != b'O' {
                    let id = map.to_padded_id_xy(x as u32, y);
                    map.weights[id as usize] = c;
                }
            }
        }
        Ok(map)
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.header_w
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.header_h
    }

    #[inline(always)]
    pub fn padded_width(&self) -> u32 {
        self.padded_w
    }

    #[inline(always)]
    pub fn padded_area(&self) -> u32 {
        self.padded_w * self.padded_h
    }

    #[inline(always)]
    pub fn to_padded_id_xy(&self, x: u32, y: u32) -> u32 {
        debug_assert!(x < self.header_w && y < self.header_h);
        (y + 1) * self.padded_w + (x + 1)
    }

    #[inline(always)]
    pub fn to_padded_id(&self, unpadded_id: u32) -> u32 {
        self.to_padded_id_xy(unpadded_id % self.header_w, unpadded_id / self.header_w)
    }

    #[inline(always)]
    pub fn to_unpadded_xy(&self, padded_id: u32) -> (u32, u32) {
        (padded_id % self.padded_w - 1, padded_id / self.padded_w - 1)
    }

    #[inline(always)]
    pub fn get(&self, padded_id: u32) -> bool {
        self.weights[padded_id as usize] > 0
    }

    #[inline(always)]
    pub fn weight(&self, padded_id: u32) -> f64 {
        self.weights[padded_id as usize] as f64
    }

    /// Average-of-endpoints cost for one step between adjacent cells.
    #[inline(always)]
    pub fn step_cost(&self, from: u32, to: u32, diagonal: bool) -> f64 {
        let avg = (self.weight(from) + self.weight(to)) / 2.0;
        if diagonal {
            avg * crate::SQRT2
        } else {
            avg
        }
    }

    /// Traversability bits of the 3x3 neighbourhood.
    pub fn neighbours(&self, padded_id: u32) -> Nbhd {
        let mut rows = [0u8; 3];
        for (i, dy) in (-1i32..=1).enumerate() {
            for dx in -1i32..=1 {
                let id = (padded_id as i64 + dy as i64 * self.padded_w as i64 + dx as i64) as u32;
                if self.get(id) {
                    rows[i] |= 1 << (dx + 1);
                }
            }
        }
        Nbhd::new(rows[0], rows[1], rows[2])
    }

    /// True when the cell and all eight neighbours are traversable with one
    /// uniform weight. Weighted jump scans stop wherever this fails.
    pub fn uniform_3x3(&self, padded_id: u32) -> bool {
        let w = self.weights[padded_id as usize];
        if w == 0 {
            return false;
        }
        let pw = self.padded_w as i64;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let id = (padded_id as i64 + dy * pw + dx) as usize;
                if self.weights[id] != w {
                    return false;
                }
            }
        }
        true
    }

    pub fn mem(&self) -> usize {
        std::mem::size_of::<Self>() + self.weights.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_costs_average_endpoints() {
        let m = WeightedGridMap::from_weights(3, 1, &[1, 5, 1]);
        let a = m.to_padded_id_xy(0, 0);
        let b = m.to_padded_id_xy(1, 0);
        let c = m.to_padded_id_xy(2, 0);
        assert_eq!(m.step_cost(a, b, false), 3.0);
        assert_eq!(m.step_cost(b, c, false), 3.0);
    }

    #[test]
    fn uniformity_detects_terrain_changes() {
        let m = WeightedGridMap::from_weights(5, 5, &{
            let mut cells = [1u8; 25];
            cells[12] = 9; // centre cell differs
            cells
        });
        assert!(!m.uniform_3x3(m.to_padded_id_xy(2, 2)));
        assert!(!m.uniform_3x3(m.to_padded_id_xy(1, 1)));
        // corner cells touch the blocked border
        assert!(!m.uniform_3x3(m.to_padded_id_xy(0, 0)));
    }
}
