//! Single-quantile online estimator: the Piecewise-Parabolic-Prediction
//! (P²) algorithm of Jain & Chlamtac, tracked with 5 markers.

use crate::endian::{read_f32, read_f64, read_u16, write_f32, write_f64, write_u16};
use crate::{Error, Result};

const MARKERS: usize = 5;
const SERIALIZED_LEN: usize = 2 + 4 + 3 * MARKERS * 8;

/// Tracks a single target quantile `p` over a stream of `f64` samples in
/// constant memory, via the P² algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct P2Quantile {
    p: f64,
    cnt: u16,
    q: [f64; MARKERS],
    n: [f64; MARKERS],
    np: [f64; MARKERS],
}

impl P2Quantile {
    pub fn new(p: f64) -> Result<Self> {
        if !(p > 0.0 && p < 1.0) {
            return Err(Error::InvalidParameter(
                "p must be strictly between 0 and 1".into(),
            ));
        }
        let mut s = P2Quantile {
            p,
            cnt: MARKERS as u16,
            q: [0.0; MARKERS],
            n: [0.0; MARKERS],
            np: [0.0; MARKERS],
        };
        s.reset_positions();
        Ok(s)
    }

    fn reset_positions(&mut self) {
        self.n = [1.0, 2.0, 3.0, 4.0, 5.0];
        self.np = [
            1.0,
            1.0 + 2.0 * self.p,
            1.0 + 4.0 * self.p,
            3.0 + 2.0 * self.p,
            5.0,
        ];
    }

    pub fn clear(&mut self) {
        self.cnt = MARKERS as u16;
        self.q = [0.0; MARKERS];
        self.reset_positions();
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    /// Folds `x` into the estimator. Returns `None` while still warming up
    /// (fewer than 5 samples seen), and `Some(median marker height)` on the
    /// exact sample that completes warm-up, matching every other query in
    /// this type by returning a height rather than a position.
    pub fn add(&mut self, x: f64) -> Option<f64> {
        if self.cnt > 0 {
            self.cnt -= 1;
            self.q[self.cnt as usize] = x;
            if self.cnt == 0 {
                self.q
                    .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                return Some(self.q[2]);
            }
            return None;
        }

        let k = if x < self.q[0] {
            self.q[0] = x;
            0
        } else if x >= self.q[MARKERS - 1] {
            if x > self.q[MARKERS - 1] {
                self.q[MARKERS - 1] = x;
            }
            MARKERS - 2
        } else {
            let mut found = MARKERS - 2;
            for i in 0..MARKERS - 1 {
                if self.q[i] <= x && x < self.q[i + 1] {
                    found = i;
                    break;
                }
            }
            found
        };
        for i in (k + 1)..MARKERS {
            self.n[i] += 1.0;
        }

        let dn = [0.0, self.p / 2.0, self.p, (1.0 + self.p) / 2.0, 1.0];
        for i in 0..MARKERS {
            self.np[i] += dn[i];
        }

        for i in 1..MARKERS - 1 {
            let d = self.np[i] - self.n[i];
            if (d >= 1.0 && self.n[i + 1] - self.n[i] > 1.0)
                || (d <= -1.0 && self.n[i - 1] - self.n[i] < -1.0)
            {
                let d = if d >= 0.0 { 1.0 } else { -1.0 };
                let qp = parabolic(i, d, &self.q, &self.n);
                self.q[i] = if self.q[i - 1] < qp && qp < self.q[i + 1] {
                    qp
                } else {
                    linear(i, d, &self.q, &self.n)
                };
                self.n[i] += d;
            }
        }

        None
    }

    /// Marker height at index `m`, or `None` before warm-up or out of range.
    pub fn estimate(&self, m: usize) -> Option<f64> {
        if m < MARKERS && self.cnt == 0 {
            Some(self.q[m])
        } else {
            None
        }
    }

    /// Marker position (observation count) at index `m`.
    pub fn count(&self, m: usize) -> Option<u64> {
        if m < MARKERS && self.cnt == 0 {
            Some(self.n[m] as u64)
        } else {
            None
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SERIALIZED_LEN);
        write_u16(&mut buf, self.cnt);
        write_f32(&mut buf, self.p as f32);
        for v in self.q {
            write_f64(&mut buf, v);
        }
        for v in self.n {
            write_f64(&mut buf, v);
        }
        for v in self.np {
            write_f64(&mut buf, v);
        }
        buf
    }

    pub fn deserialize(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() != SERIALIZED_LEN {
            self.clear();
            return Err(Error::InvalidLength);
        }
        let cnt = read_u16(buf, 0);
        if cnt as usize > MARKERS {
            self.clear();
            return Err(Error::InvalidCount);
        }
        let p = read_f32(buf, 2);
        if (p - self.p as f32).abs() > f32::EPSILON {
            self.clear();
            return Err(Error::MismatchedParameter);
        }
        let mut pos = 6;
        let mut q = [0.0; MARKERS];
        for v in q.iter_mut() {
            *v = read_f64(buf, pos);
            pos += 8;
        }
        let mut n = [0.0; MARKERS];
        for v in n.iter_mut() {
            *v = read_f64(buf, pos);
            pos += 8;
        }
        let mut np = [0.0; MARKERS];
        for v in np.iter_mut() {
            *v = read_f64(buf, pos);
            pos += 8;
        }
        self.cnt = cnt;
        self.q = q;
        self.n = n;
        self.np = np;
        Ok(())
    }
}

fn parabolic(i: usize, d: f64, q: &[f64; MARKERS], n: &[f64; MARKERS]) -> f64 {
    q[i] + d / (n[i + 1] - n[i - 1])
        * ((n[i] - n[i - 1] + d) * (q[i + 1] - q[i]) / (n[i + 1] - n[i])
            + (n[i + 1] - n[i] - d) * (q[i] - q[i - 1]) / (n[i] - n[i - 1]))
}

fn linear(i: usize, d: f64, q: &[f64; MARKERS], n: &[f64; MARKERS]) -> f64 {
    let j = (i as f64 + d) as usize;
    q[i] + d * (q[j] - q[i]) / (n[j] - n[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: [f64; 20] = [
        0.02, 0.15, 0.74, 3.39, 0.83, 22.37, 10.15, 15.43, 38.62, 15.92, 34.60, 10.28, 1.47, 0.40,
        0.05, 11.39, 0.27, 0.42, 0.09, 11.37,
    ];

    #[test]
    fn median_worked_example() {
        let mut p2 = P2Quantile::new(0.5).unwrap();
        for x in DATA {
            p2.add(x);
        }
        let expected_q = [0.02, 0.493895, 4.44063, 17.2039, 38.62];
        let expected_n = [1u64, 6, 10, 16, 20];
        for i in 0..5 {
            assert!((p2.estimate(i).unwrap() - expected_q[i]).abs() < 1e-3);
            assert_eq!(p2.count(i).unwrap(), expected_n[i]);
        }
    }

    #[test]
    fn rejects_out_of_range_p() {
        assert!(P2Quantile::new(0.0).is_err());
        assert!(P2Quantile::new(1.0).is_err());
        assert!(P2Quantile::new(-0.1).is_err());
    }

    #[test]
    fn queries_are_none_before_warmup() {
        let mut p2 = P2Quantile::new(0.5).unwrap();
        assert_eq!(p2.estimate(0), None);
        p2.add(1.0);
        p2.add(2.0);
        assert_eq!(p2.count(0), None);
    }

    #[test]
    fn warmup_completion_returns_median_height_not_position() {
        let mut p2 = P2Quantile::new(0.5).unwrap();
        let mut last = None;
        for x in [5.0, 1.0, 4.0, 2.0, 3.0] {
            last = p2.add(x);
        }
        assert_eq!(last, Some(3.0));
    }

    #[test]
    fn markers_stay_sorted() {
        let mut p2 = P2Quantile::new(0.9).unwrap();
        for x in DATA {
            p2.add(x);
        }
        for i in 0..4 {
            assert!(p2.estimate(i).unwrap() <= p2.estimate(i + 1).unwrap());
            assert!(p2.count(i).unwrap() <= p2.count(i + 1).unwrap());
        }
    }

    #[test]
    fn round_trip() {
        let mut p2 = P2Quantile::new(0.5).unwrap();
        for x in DATA {
            p2.add(x);
        }
        let buf = p2.serialize();
        let mut loaded = P2Quantile::new(0.5).unwrap();
        loaded.deserialize(&buf).unwrap();
        assert_eq!(p2, loaded);
    }

    #[test]
    fn deserialize_rejects_mismatched_p() {
        let mut p2 = P2Quantile::new(0.5).unwrap();
        for x in DATA {
            p2.add(x);
        }
        let buf = p2.serialize();
        let mut other = P2Quantile::new(0.9).unwrap();
        let err = other.deserialize(&buf).unwrap_err();
        assert_eq!(err, Error::MismatchedParameter);
        assert_eq!(other, P2Quantile::new(0.9).unwrap());
    }

    #[test]
    fn deserialize_rejects_wrong_length() {
        let mut p2 = P2Quantile::new(0.5).unwrap();
        let err = p2.deserialize(&[0u8; 3]).unwrap_err();
        assert_eq!(err, Error::InvalidLength);
    }
}
