//! A ring-buffered integer time series keyed by nanosecond timestamp.

use crate::endian::{read_i32, read_u64, write_i32, write_u64};
use crate::{Error, Result};

/// Aggregate kinds accepted by [`TimeSeries::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Sum,
    Min,
    Max,
    Avg,
    Sd,
    Usd,
}

/// How [`TimeSeries::merge`] folds a source series' rows into a
/// destination series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOp {
    Add,
    Set,
}

/// A fixed-span circular buffer of `i32` values, one per `ns_per_row`-sized
/// time bucket, addressed by absolute nanosecond timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    current_time: u64,
    ns_per_row: u64,
    rows: i32,
    v: Vec<i32>,
}

impl TimeSeries {
    pub fn new(ns_per_row: u64, rows: i32) -> Result<Self> {
        if rows < 2 {
            return Err(Error::InvalidParameter("rows must be at least 2".into()));
        }
        if ns_per_row < 1 {
            return Err(Error::InvalidParameter("ns_per_row must be at least 1".into()));
        }
        let mut ts = TimeSeries {
            current_time: 0,
            ns_per_row,
            rows,
            v: vec![0; rows as usize],
        };
        ts.clear();
        Ok(ts)
    }

    pub fn clear(&mut self) {
        self.current_time = self.ns_per_row * (self.rows as u64 - 1);
        self.v.iter_mut().for_each(|x| *x = 0);
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn ns_per_row(&self) -> u64 {
        self.ns_per_row
    }

    pub fn timestamp(&self) -> u64 {
        self.current_time
    }

    /// Resolves `ns` to a slot index. When `advance` is set and `ns` is in
    /// the future, the buffer is rotated forward and the slots that pass
    /// out of the window are zeroed; otherwise a future or too-distant-past
    /// timestamp yields `None` without mutating anything.
    fn find_index(&mut self, ns: u64, advance: bool) -> Option<usize> {
        let rows = self.rows as i64;
        let current_row = (self.current_time / self.ns_per_row) as i64;
        let requested_row = (ns / self.ns_per_row) as i64;
        let delta = requested_row - current_row;

        if delta > 0 && advance {
            let to_zero = delta.min(rows) as usize;
            for step in 1..=to_zero {
                let idx = ((current_row + step as i64).rem_euclid(rows)) as usize;
                self.v[idx] = 0;
            }
            self.current_time = ns - (ns % self.ns_per_row);
            Some((requested_row.rem_euclid(rows)) as usize)
        } else if (delta > 0 && !advance) || delta.unsigned_abs() as i64 >= rows {
            None
        } else {
            Some((requested_row.rem_euclid(rows)) as usize)
        }
    }

    /// Saturating-adds `v` into the slot for `ns`, advancing the buffer if
    /// `ns` is newer than the current time.
    pub fn add(&mut self, ns: u64, delta: i32) -> Option<i32> {
        let idx = self.find_index(ns, true)?;
        let sum = self.v[idx] as i64 + delta as i64;
        let clamped = sum.clamp((i32::MIN as i64) + 1, i32::MAX as i64) as i32;
        self.v[idx] = clamped;
        Some(clamped)
    }

    /// Overwrites the slot for `ns`, advancing the buffer if needed.
    pub fn set(&mut self, ns: u64, value: i32) -> Option<i32> {
        let idx = self.find_index(ns, true)?;
        self.v[idx] = value;
        Some(value)
    }

    /// Reads the slot for `ns` without advancing the buffer. `None` for any
    /// timestamp outside the current window.
    pub fn get(&mut self, ns: u64) -> Option<i32> {
        let idx = self.find_index(ns, false)?;
        Some(self.v[idx])
    }

    fn row_ns(&self, row: i64) -> u64 {
        row as u64 * self.ns_per_row
    }

    /// Returns up to `n` consecutive values starting at `ns`, oldest first.
    pub fn get_range(&mut self, ns: u64, n: usize) -> Option<Vec<i32>> {
        let start_row = (ns / self.ns_per_row) as i64;
        let mut out = Vec::with_capacity(n);
        for i in 0..n as i64 {
            let row_ns = self.row_ns(start_row + i);
            out.push(self.get(row_ns)?);
        }
        Some(out)
    }

    /// Aggregates `n` consecutive values starting at `ns`. When
    /// `include_zero` is false, zero-valued slots are excluded from both
    /// the aggregate and the effective sample count.
    pub fn stats(&mut self, ns: u64, n: usize, kind: StatKind, include_zero: bool) -> Option<f64> {
        let values = self.get_range(ns, n)?;
        let mut rs = crate::running_stats::RunningStats::new();
        let mut sum = 0.0;
        let mut min = i32::MAX;
        let mut max = i32::MIN;
        let mut count = 0u64;
        for v in values {
            if v == 0 && !include_zero {
                continue;
            }
            sum += v as f64;
            min = min.min(v);
            max = max.max(v);
            count += 1;
            rs.add(v as f64);
        }
        if count == 0 {
            return Some(0.0);
        }
        Some(match kind {
            StatKind::Sum => sum,
            StatKind::Min => min as f64,
            StatKind::Max => max as f64,
            StatKind::Avg => sum / count as f64,
            StatKind::Sd => rs.sd(),
            StatKind::Usd => rs.uncorrected_sd(),
        })
    }

    /// Replays `src`'s rows, oldest first, into `self` using `op`.
    /// Requires `self.ns_per_row() <= src.ns_per_row()`.
    pub fn merge(&mut self, src: &mut TimeSeries, op: MergeOp) -> Result<()> {
        if self.ns_per_row > src.ns_per_row {
            return Err(Error::InvalidParameter(
                "destination ns_per_row must be <= source ns_per_row".into(),
            ));
        }
        let src_rows = src.rows as i64;
        let src_current_row = (src.current_time / src.ns_per_row) as i64;
        for step in 1..=src_rows {
            let row = (src_current_row + step).rem_euclid(src_rows);
            let ns = row as u64 * src.ns_per_row;
            if let Some(v) = src.get(ns) {
                match op {
                    MergeOp::Add => {
                        self.add(ns, v);
                    }
                    MergeOp::Set => {
                        self.set(ns, v);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + 8 + 4 + self.v.len() * 4);
        write_u64(&mut buf, self.current_time);
        write_u64(&mut buf, self.ns_per_row);
        write_i32(&mut buf, self.rows);
        for v in &self.v {
            write_i32(&mut buf, *v);
        }
        buf
    }

    pub fn deserialize(&mut self, buf: &[u8]) -> Result<()> {
        let expected_len = 20 + self.v.len() * 4;
        if buf.len() != expected_len {
            self.clear();
            return Err(Error::InvalidLength);
        }
        let current_time = read_u64(buf, 0);
        let ns_per_row = read_u64(buf, 8);
        if ns_per_row != self.ns_per_row {
            self.clear();
            return Err(Error::MismatchedNsPerRow);
        }
        let rows = read_i32(buf, 16);
        if rows != self.rows {
            self.clear();
            return Err(Error::MismatchedRows);
        }
        let mut v = vec![0i32; self.v.len()];
        let mut pos = 20;
        for x in v.iter_mut() {
            *x = read_i32(buf, pos);
            pos += 4;
        }
        self.current_time = current_time;
        self.v = v;
        Ok(())
    }
}
