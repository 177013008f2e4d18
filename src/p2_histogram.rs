//! Adaptive equi-probable histogram: the P² algorithm generalised from a
//! single quantile marker to `b` buckets (`b + 1` markers).

use crate::endian::{read_f64, read_u16, write_f64, write_u16};
use crate::{Error, Result};

const MIN_BUCKETS: u16 = 4;
const MAX_BUCKETS: u16 = 65534;

/// Tracks `b` equi-probable buckets over a stream of `f64` samples via the
/// P² algorithm generalised to `b + 1` markers.
#[derive(Debug, Clone, PartialEq)]
pub struct P2Histogram {
    b: u16,
    cnt: u16,
    /// `q[0..=b]` marker heights followed by `n[0..=b]` marker positions.
    data: Vec<f64>,
}

impl P2Histogram {
    pub fn new(b: u16) -> Result<Self> {
        if !(MIN_BUCKETS..=MAX_BUCKETS).contains(&b) {
            return Err(Error::InvalidParameter(format!(
                "bucket count must be between {} and {}",
                MIN_BUCKETS, MAX_BUCKETS
            )));
        }
        let markers = b as usize + 1;
        let mut s = P2Histogram {
            b,
            cnt: markers as u16,
            data: vec![0.0; 2 * markers],
        };
        s.reset_positions();
        Ok(s)
    }

    fn markers(&self) -> usize {
        self.b as usize + 1
    }

    fn q(&self, i: usize) -> f64 {
        self.data[i]
    }

    fn set_q(&mut self, i: usize, v: f64) {
        self.data[i] = v;
    }

    fn n(&self, i: usize) -> f64 {
        self.data[self.markers() + i]
    }

    fn set_n(&mut self, i: usize, v: f64) {
        let off = self.markers();
        self.data[off + i] = v;
    }

    fn reset_positions(&mut self) {
        let m = self.markers();
        for i in 0..m {
            self.set_n(i, (i + 1) as f64);
        }
    }

    pub fn clear(&mut self) {
        let m = self.markers();
        self.cnt = m as u16;
        for i in 0..m {
            self.set_q(i, 0.0);
        }
        self.reset_positions();
    }

    pub fn buckets(&self) -> u16 {
        self.b
    }

    /// Folds `x` into the histogram. Returns `true` on the exact sample
    /// that completes warm-up.
    pub fn add(&mut self, x: f64) -> bool {
        let m = self.markers();
        if self.cnt > 0 {
            self.cnt -= 1;
            self.set_q(self.cnt as usize, x);
            if self.cnt == 0 {
                let mut q: Vec<f64> = (0..m).map(|i| self.q(i)).collect();
                q.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                for (i, v) in q.into_iter().enumerate() {
                    self.set_q(i, v);
                }
                return true;
            }
            return false;
        }

        let last = m - 1;
        let k = if x < self.q(0) {
            self.set_q(0, x);
            0
        } else if x >= self.q(last) {
            if x > self.q(last) {
                self.set_q(last, x);
            }
            last - 1
        } else {
            let mut found = last - 1;
            for i in 0..last {
                if self.q(i) <= x && x < self.q(i + 1) {
                    found = i;
                    break;
                }
            }
            found
        };
        for i in (k + 1)..m {
            self.set_n(i, self.n(i) + 1.0);
        }

        let total = self.n(last);
        let b = self.b as f64;
        for i in 1..last {
            let desired = 1.0 + i as f64 * (total - 1.0) / b;
            let d = desired - self.n(i);
            if (d >= 1.0 && self.n(i + 1) - self.n(i) > 1.0)
                || (d <= -1.0 && self.n(i - 1) - self.n(i) < -1.0)
            {
                let d = if d >= 0.0 { 1.0 } else { -1.0 };
                let qp = self.parabolic(i, d);
                let new_q = if self.q(i - 1) < qp && qp < self.q(i + 1) {
                    qp
                } else {
                    self.linear(i, d)
                };
                self.set_q(i, new_q);
                self.set_n(i, self.n(i) + d);
            }
        }

        false
    }

    fn parabolic(&self, i: usize, d: f64) -> f64 {
        self.q(i)
            + d / (self.n(i + 1) - self.n(i - 1))
                * ((self.n(i) - self.n(i - 1) + d) * (self.q(i + 1) - self.q(i))
                    / (self.n(i + 1) - self.n(i))
                    + (self.n(i + 1) - self.n(i) - d) * (self.q(i) - self.q(i - 1))
                        / (self.n(i) - self.n(i - 1)))
    }

    fn linear(&self, i: usize, d: f64) -> f64 {
        let j = (i as f64 + d) as usize;
        self.q(i) + d * (self.q(j) - self.q(i)) / (self.n(j) - self.n(i))
    }

    /// Marker height at bucket index `m`, or `None` before warm-up or out
    /// of range.
    pub fn estimate(&self, m: usize) -> Option<f64> {
        if m < self.markers() && self.cnt == 0 {
            Some(self.q(m))
        } else {
            None
        }
    }

    pub fn count(&self, m: usize) -> Option<u64> {
        if m < self.markers() && self.cnt == 0 {
            Some(self.n(m) as u64)
        } else {
            None
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + self.data.len() * 8);
        write_u16(&mut buf, self.cnt);
        for v in &self.data {
            write_f64(&mut buf, *v);
        }
        buf
    }

    pub fn deserialize(&mut self, buf: &[u8]) -> Result<()> {
        let m = self.markers();
        let expected_len = 2 + 2 * m * 8;
        if buf.len() != expected_len {
            self.clear();
            return Err(Error::InvalidLength);
        }
        let cnt = read_u16(buf, 0);
        if cnt as usize > m {
            self.clear();
            return Err(Error::InvalidCount);
        }
        let mut data = vec![0.0; 2 * m];
        let mut pos = 2;
        for v in data.iter_mut() {
            *v = read_f64(buf, pos);
            pos += 8;
        }
        self.cnt = cnt;
        self.data = data;
        Ok(())
    }
}
