//! Count-Min Sketch: a probabilistic frequency counter over byte-string
//! keys with conservative update and symmetric add/remove.

use crate::endian::{read_u32, read_u64, write_u32, write_u64};
use crate::hash::h32;
use crate::{Error, Result};

/// A Count-Min Sketch parameterised by an error bound `epsilon` and a
/// failure probability `delta` at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMinSketch {
    width: u32,
    depth: u32,
    item_count: u64,
    unique_count: u64,
    counts: Vec<u32>,
}

impl CountMinSketch {
    pub fn new(epsilon: f64, delta: f64) -> Result<Self> {
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return Err(Error::InvalidParameter(
                "epsilon must be strictly between 0 and 1".into(),
            ));
        }
        if !(delta > 0.0 && delta < 1.0) {
            return Err(Error::InvalidParameter(
                "delta must be strictly between 0 and 1".into(),
            ));
        }
        let width = (std::f64::consts::E / epsilon).ceil() as u64;
        let depth = (1.0 / delta).ln().ceil() as u64;
        let cells = width
            .checked_mul(depth)
            .ok_or_else(|| Error::InvalidParameter("width * depth overflows".into()))?;
        if cells > usize::MAX as u64 {
            return Err(Error::InvalidParameter(
                "width * depth exceeds addressable size".into(),
            ));
        }
        Ok(CountMinSketch {
            width: width as u32,
            depth: depth as u32,
            item_count: 0,
            unique_count: 0,
            counts: vec![0; cells as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    pub fn unique_count(&self) -> u64 {
        self.unique_count
    }

    pub fn clear(&mut self) {
        self.item_count = 0;
        self.unique_count = 0;
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    fn cell_indices(&self, key: &[u8]) -> Vec<usize> {
        let h1 = h32(key, 1) as u64;
        let h2 = h32(key, 2) as u64;
        let width = self.width as u64;
        (0..self.depth as u64)
            .map(|i| {
                let col = (h1 + i * h2 + i * i) % width;
                (i * width + col) as usize
            })
            .collect()
    }

    /// Current estimated count for `key`, equivalent to `update(key, 0)`.
    pub fn point_query(&self, key: &[u8]) -> u32 {
        self.cell_indices(key)
            .into_iter()
            .map(|idx| self.counts[idx])
            .min()
            .unwrap_or(0)
    }

    /// Applies a signed delta `n` to `key` with conservative update, and
    /// returns the resulting estimate. Positive `n` adds mass; negative `n`
    /// removes up to `est` units of mass (never going below the estimate).
    pub fn update(&mut self, key: &[u8], n: i64) -> u32 {
        let idxs = self.cell_indices(key);
        let est = idxs.iter().map(|&i| self.counts[i]).min().unwrap_or(0);

        if n > 0 {
            if est == 0 {
                self.unique_count += 1;
            }
            let target = (est as u64).saturating_add(n as u64).min(u32::MAX as u64) as u32;
            let mut added = 0u32;
            for idx in &idxs {
                let cur = self.counts[*idx];
                let new_val = cur.max(target);
                added = added.max(new_val - cur);
                self.counts[*idx] = new_val;
            }
            self.item_count = self.item_count.saturating_add(added as u64);
            est.saturating_add(added)
        } else if n < 0 && est > 0 {
            let want = n.unsigned_abs();
            let r = want.min(est as u64) as u32;
            if r == est {
                self.unique_count = self.unique_count.saturating_sub(1);
            }
            for idx in &idxs {
                self.counts[*idx] -= r;
            }
            self.item_count = self.item_count.saturating_sub(r as u64);
            est - r
        } else {
            est
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + 4 * self.counts.len());
        write_u64(&mut buf, self.item_count);
        write_u64(&mut buf, self.unique_count);
        for c in &self.counts {
            write_u32(&mut buf, *c);
        }
        buf
    }

    pub fn deserialize(&mut self, buf: &[u8]) -> Result<()> {
        let expected_len = 16 + 4 * self.counts.len();
        if buf.len() != expected_len {
            self.clear();
            return Err(Error::InvalidLength);
        }
        let item_count = read_u64(buf, 0);
        let unique_count = read_u64(buf, 8);
        let mut counts = vec![0u32; self.counts.len()];
        let mut pos = 16;
        for c in counts.iter_mut() {
            *c = read_u32(buf, pos);
            pos += 4;
        }
        self.item_count = item_count;
        self.unique_count = unique_count;
        self.counts = counts;
        Ok(())
    }
}
