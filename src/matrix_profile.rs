//! SCRIMP-style matrix profile computation over a window of a
//! [`crate::time_series::TimeSeries`], used for discord (anomaly)
//! detection in a bounded ring buffer.

use rand::seq::SliceRandom;

use crate::running_stats::RunningStats;
use crate::time_series::TimeSeries;
use crate::{Error, Result};

/// The result of a matrix-profile computation: the nearest-neighbour
/// distance (`mp`) and its index (`mpi`) for every subsequence in the
/// analysed window.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixProfile {
    mp: Vec<f64>,
    mpi: Vec<usize>,
}

impl MatrixProfile {
    /// Computes a matrix profile over `n` consecutive samples of `ts`
    /// starting at timestamp `ns_start`, using subsequence length `m`.
    /// `percent` (0, 100] controls how many diagonals of the distance
    /// matrix are sampled; 100 computes every diagonal exactly.
    pub fn compute(
        ts: &mut TimeSeries,
        ns_start: u64,
        n: usize,
        m: usize,
        percent: f64,
    ) -> Result<Self> {
        if m < 4 {
            return Err(Error::InvalidParameter(
                "subsequence length must be at least 4".into(),
            ));
        }
        if n < 4 * m {
            return Err(Error::InvalidParameter(
                "window length must be at least 4x the subsequence length".into(),
            ));
        }
        if n % m != 0 {
            return Err(Error::InvalidParameter(
                "window length must be a multiple of the subsequence length".into(),
            ));
        }
        if n as i32 > ts.rows() {
            return Err(Error::InvalidParameter(
                "window length must not exceed the series' row count".into(),
            ));
        }
        if !(percent > 0.0 && percent <= 100.0) {
            return Err(Error::InvalidParameter(
                "percent must be in (0, 100]".into(),
            ));
        }

        let values: Vec<f64> = ts
            .get_range(ns_start, n)
            .ok_or_else(|| Error::InvalidParameter("window is out of the series' range".into()))?
            .into_iter()
            .map(|v| v as f64)
            .collect();

        // Rolling mean/stdev over each m-wide window, slid forward one sample
        // at a time: drop values[i-1], add values[i+m-1], carrying `mean` and
        // the sum of squared deviations forward in O(1) per step instead of
        // re-summing the whole window.
        let mp_len = n - m + 1;
        let mut mean = vec![0.0; mp_len];
        let mut sum = vec![0.0; mp_len];
        let mut sd = vec![0.0; mp_len];

        let mut rs = RunningStats::new();
        for k in 0..m {
            rs.add(values[k]);
        }
        mean[0] = rs.mean();
        sd[0] = rs.uncorrected_sd();
        sum[0] = sd[0] * sd[0] * m as f64;

        for i in 1..mp_len {
            let x_old = values[i - 1];
            let x_new = values[i + m - 1];
            let delta = x_new - x_old;
            let new_mean = mean[i - 1] + delta / m as f64;
            sum[i] = sum[i - 1] + delta * (x_new - new_mean + x_old - mean[i - 1]);
            mean[i] = new_mean;
            sd[i] = (sum[i].max(0.0) / m as f64).sqrt();
        }

        let mut mp = vec![f64::INFINITY; mp_len];
        let mut mpi = vec![0usize; mp_len];

        let mut diagonals: Vec<usize> = ((m / 4 + 1)..mp_len).collect();
        diagonals.shuffle(&mut rand::thread_rng());
        let take = (((percent / 100.0) * mp_len as f64) as usize + 1).min(diagonals.len());

        for &d in &diagonals[..take] {
            let max_i = mp_len - d;
            if max_i == 0 {
                continue;
            }
            let mut dot: f64 = (0..m).map(|k| values[d + k] * values[k]).sum();
            for i in 0..max_i {
                let j = i + d;
                let denom = sd[i] * sd[j];
                if denom > 0.0 {
                    let dist2 = (2.0 * (m as f64 - (dot - m as f64 * mean[i] * mean[j]) / denom))
                        .max(0.0);
                    if dist2 < mp[j] {
                        mp[j] = dist2;
                        mpi[j] = i;
                    }
                    if dist2 < mp[i] {
                        mp[i] = dist2;
                        mpi[i] = j;
                    }
                }
                if i + 1 < max_i {
                    dot = dot - values[i] * values[j] + values[i + m] * values[j + m];
                }
            }
        }

        for v in mp.iter_mut() {
            *v = v.abs().sqrt();
        }

        Ok(MatrixProfile { mp, mpi })
    }

    pub fn len(&self) -> usize {
        self.mp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mp.is_empty()
    }

    pub fn distance(&self, i: usize) -> Option<f64> {
        self.mp.get(i).copied()
    }

    pub fn nearest_neighbor(&self, i: usize) -> Option<usize> {
        self.mpi.get(i).copied()
    }

    /// The index of the most anomalous subsequence: the one with the
    /// largest nearest-neighbour distance.
    pub fn discord(&self) -> Option<usize> {
        self.mp
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
            .max_by(|a, b| a.1.partial_cmp(b.1).expect("finite distance"))
            .map(|(i, _)| i)
    }

    pub fn mean(&self) -> f64 {
        let mut rs = RunningStats::new();
        for &d in &self.mp {
            if d.is_finite() {
                rs.add(d);
            }
        }
        rs.mean()
    }

    pub fn sd(&self) -> f64 {
        let mut rs = RunningStats::new();
        for &d in &self.mp {
            if d.is_finite() {
                rs.add(d);
            }
        }
        rs.sd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_with(values: &[i32]) -> TimeSeries {
        let mut ts = TimeSeries::new(1, values.len() as i32).unwrap();
        for (i, v) in values.iter().enumerate() {
            ts.add(i as u64, *v);
        }
        ts
    }

    #[test]
    fn distances_are_nonnegative_and_indices_in_bounds() {
        let values = [
            1, 2, 3, 4, 5, 1, 2, 3, 4, 5, 10, 20, 30, 40, 50, 1, 2, 3, 4, 5,
        ];
        let mut ts = series_with(&values);
        let mp = MatrixProfile::compute(&mut ts, 0, 16, 4, 100.0).unwrap();
        assert_eq!(mp.len(), 13);
        for i in 0..mp.len() {
            assert!(mp.distance(i).unwrap() >= 0.0);
            assert!(mp.nearest_neighbor(i).unwrap() < mp.len());
        }
    }

    #[test]
    fn discord_detects_the_outlier_region() {
        // A steadily repeating ramp makes every subsequence nearly
        // self-similar after z-normalization; a block with the opposite
        // up/down shape in the middle stands out regardless of amplitude.
        let mut values = vec![1, 2, 3, 4].repeat(5);
        values.extend(vec![4, 1, 3, 2].repeat(4));
        values.extend(vec![1, 2, 3, 4].repeat(5));
        let mut ts = series_with(&values);
        let n = values.len() - (values.len() % 4);
        let mp = MatrixProfile::compute(&mut ts, 0, n, 4, 100.0).unwrap();
        let discord = mp.discord().unwrap();
        assert!(mp.distance(discord).unwrap() > 1.0);
        assert!((15..=40).contains(&discord));
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut ts = series_with(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(MatrixProfile::compute(&mut ts, 0, 8, 3, 100.0).is_err());
        assert!(MatrixProfile::compute(&mut ts, 0, 7, 4, 100.0).is_err());
        assert!(MatrixProfile::compute(&mut ts, 0, 8, 4, 0.0).is_err());
        assert!(MatrixProfile::compute(&mut ts, 0, 8, 4, 101.0).is_err());
    }
}
