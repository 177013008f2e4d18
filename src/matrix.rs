//! Dense row-major matrices with saturating integer arithmetic, NaN-as-
//! unset float semantics, and a Pearson-correlation row search.

use crate::endian::{read_f32, read_i32, write_f32, write_i32};
use crate::running_stats::RunningStats;
use crate::{Error, Result};

/// Which extreme of Pearson correlation [`MatrixInt::pcc`]/[`MatrixFlt::pcc`]
/// should search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PccMode {
    Max,
    Min,
}

fn pcc_of(target: &[f64], other: &[f64]) -> Option<f64> {
    let mut target_stats = RunningStats::new();
    let mut other_stats = RunningStats::new();
    for &v in target {
        target_stats.add(v);
    }
    for &v in other {
        other_stats.add(v);
    }
    let sd1 = target_stats.uncorrected_sd();
    let sd2 = other_stats.uncorrected_sd();
    if sd1 == 0.0 || sd2 == 0.0 {
        return None;
    }
    let cols = target.len() as f64;
    let dot: f64 = target.iter().zip(other).map(|(a, b)| a * b).sum();
    Some((dot - cols * target_stats.mean() * other_stats.mean()) / (cols * sd1 * sd2))
}

fn best_row(rows: &[Vec<f64>], target: usize, mode: PccMode) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, row) in rows.iter().enumerate() {
        if i == target {
            continue;
        }
        let Some(score) = pcc_of(&rows[target], row) else {
            continue;
        };
        let better = match best {
            None => true,
            Some((_, b)) => match mode {
                PccMode::Max => score > b,
                PccMode::Min => score < b,
            },
        };
        if better {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

macro_rules! define_matrix {
    ($name:ident, $elem:ty, $read:ident, $write:ident, $default_elem:expr) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            rows: i32,
            cols: i32,
            data: Vec<$elem>,
        }

        impl $name {
            pub fn new(rows: i32, cols: i32) -> Result<Self> {
                if rows <= 0 || cols <= 0 {
                    return Err(Error::InvalidParameter(
                        "rows and cols must be positive".into(),
                    ));
                }
                let cells = rows as usize * cols as usize;
                Ok($name {
                    rows,
                    cols,
                    data: vec![$default_elem; cells],
                })
            }

            pub fn rows(&self) -> i32 {
                self.rows
            }

            pub fn cols(&self) -> i32 {
                self.cols
            }

            fn index(&self, row: i32, col: i32) -> Option<usize> {
                if row < 0 || col < 0 || row >= self.rows || col >= self.cols {
                    None
                } else {
                    Some(row as usize * self.cols as usize + col as usize)
                }
            }

            pub fn get(&self, row: i32, col: i32) -> Option<$elem> {
                self.index(row, col).map(|i| self.data[i])
            }

            pub fn clear(&mut self) {
                self.data.iter_mut().for_each(|v| *v = $default_elem);
            }

            fn row_as_f64(&self, row: i32) -> Vec<f64> {
                (0..self.cols)
                    .map(|c| self.get(row, c).unwrap_or_default() as f64)
                    .collect()
            }

            /// Searches for the row whose Pearson correlation with `row` is
            /// the `mode` extreme among all other rows. Rows with zero
            /// standard deviation are skipped. Ties favour the earliest
            /// index.
            pub fn pcc(&self, row: i32, mode: PccMode) -> Option<i32> {
                if row < 0 || row >= self.rows {
                    return None;
                }
                let rows: Vec<Vec<f64>> = (0..self.rows).map(|r| self.row_as_f64(r)).collect();
                best_row(&rows, row as usize, mode).map(|i| i as i32)
            }

            pub fn serialize(&self) -> Vec<u8> {
                let mut buf = Vec::with_capacity(8 + self.data.len() * std::mem::size_of::<$elem>());
                write_i32(&mut buf, self.rows);
                write_i32(&mut buf, self.cols);
                for v in &self.data {
                    $write(&mut buf, *v);
                }
                buf
            }

            pub fn deserialize(&mut self, buf: &[u8]) -> Result<()> {
                let expected_len = 8 + self.data.len() * std::mem::size_of::<$elem>();
                if buf.len() != expected_len {
                    self.clear();
                    return Err(Error::InvalidLength);
                }
                let rows = read_i32(buf, 0);
                if rows != self.rows {
                    self.clear();
                    return Err(Error::MismatchedRows);
                }
                let cols = read_i32(buf, 4);
                if cols != self.cols {
                    self.clear();
                    return Err(Error::MismatchedCols);
                }
                let mut data = vec![$default_elem; self.data.len()];
                let mut pos = 8;
                for v in data.iter_mut() {
                    *v = $read(buf, pos);
                    pos += std::mem::size_of::<$elem>();
                }
                self.data = data;
                Ok(())
            }
        }
    };
}

define_matrix!(MatrixInt, i32, read_i32, write_i32, 0i32);
define_matrix!(MatrixFlt, f32, read_f32, write_f32, f32::NAN);

impl MatrixInt {
    /// Saturating add; clamps to `i32::MIN + 1` so no stored value collides
    /// with any sentinel a caller might independently be using.
    pub fn add(&mut self, row: i32, col: i32, delta: i32) -> Option<i32> {
        let idx = self.index(row, col)?;
        let sum = self.data[idx] as i64 + delta as i64;
        let clamped = sum.clamp((i32::MIN as i64) + 1, i32::MAX as i64) as i32;
        self.data[idx] = clamped;
        Some(clamped)
    }
}

impl MatrixFlt {
    /// Replaces a NaN ("unset") cell with `delta`; otherwise accumulates.
    pub fn add(&mut self, row: i32, col: i32, delta: f32) -> Option<f32> {
        let idx = self.index(row, col)?;
        let cur = self.data[idx];
        let next = if cur.is_nan() { delta } else { cur + delta };
        self.data[idx] = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_saturating_add_clamps() {
        let mut m = MatrixInt::new(1, 1).unwrap();
        m.add(0, 0, i32::MAX);
        let v = m.add(0, 0, i32::MAX).unwrap();
        assert_eq!(v, i32::MAX);
        m.add(0, 0, i32::MIN);
        m.add(0, 0, i32::MIN);
        let v = m.get(0, 0).unwrap();
        assert!(v > i32::MIN);
    }

    #[test]
    fn out_of_bounds_is_none() {
        let m = MatrixInt::new(2, 2).unwrap();
        assert_eq!(m.get(5, 0), None);
        assert_eq!(m.get(-1, 0), None);
    }

    #[test]
    fn float_nan_is_unset() {
        let mut m = MatrixFlt::new(1, 1).unwrap();
        assert!(m.get(0, 0).unwrap().is_nan());
        m.add(0, 0, 2.0);
        assert_eq!(m.get(0, 0), Some(2.0));
        m.add(0, 0, 3.0);
        assert_eq!(m.get(0, 0), Some(5.0));
    }

    #[test]
    fn pcc_finds_perfectly_correlated_row() {
        let mut m = MatrixInt::new(3, 4).unwrap();
        let rows: [[i32; 4]; 3] = [[1, 2, 3, 4], [2, 4, 6, 8], [4, 3, 2, 1]];
        for (r, vals) in rows.iter().enumerate() {
            for (c, v) in vals.iter().enumerate() {
                m.add(r as i32, c as i32, *v);
            }
        }
        assert_eq!(m.pcc(0, PccMode::Max), Some(1));
        assert_eq!(m.pcc(0, PccMode::Min), Some(2));
    }

    #[test]
    fn round_trip() {
        let mut m = MatrixInt::new(2, 2).unwrap();
        m.add(0, 0, 7);
        m.add(1, 1, -3);
        let buf = m.serialize();
        let mut loaded = MatrixInt::new(2, 2).unwrap();
        loaded.deserialize(&buf).unwrap();
        assert_eq!(m, loaded);
    }

    #[test]
    fn deserialize_rejects_mismatched_dims() {
        let mut m = MatrixInt::new(2, 2).unwrap();
        let buf = m.serialize();
        let mut other = MatrixInt::new(3, 2).unwrap();
        let err = other.deserialize(&buf).unwrap_err();
        assert_eq!(err, Error::MismatchedRows);
    }
}
