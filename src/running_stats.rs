//! Online mean/variance/standard-deviation tracking via Welford's method.

use crate::endian::{read_f64, write_f64};
use crate::{Error, Result};

const SERIALIZED_LEN: usize = 24;

/// Incrementally tracks the count, mean, and sum of squared deviations of a
/// stream of `f64` samples. NaN and infinite samples are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    count: f64,
    mean: f64,
    sum: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    pub fn new() -> Self {
        RunningStats {
            count: 0.0,
            mean: 0.0,
            sum: 0.0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Folds `x` into the running moments. NaN and +/-infinity are ignored.
    pub fn add(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }
        self.count += 1.0;
        if self.count == 1.0 {
            self.mean = x;
            self.sum = 0.0;
            return;
        }
        let delta = x - self.mean;
        let new_mean = self.mean + delta / self.count;
        self.sum += delta * (x - new_mean);
        self.mean = new_mean;
    }

    pub fn count(&self) -> f64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample (n-1 denominator) variance. 0 while `count < 2`.
    pub fn variance(&self) -> f64 {
        if self.count < 2.0 {
            0.0
        } else {
            self.sum / (self.count - 1.0)
        }
    }

    /// Sample (corrected) standard deviation.
    pub fn sd(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Population (uncorrected, n denominator) standard deviation.
    pub fn uncorrected_sd(&self) -> f64 {
        if self.count < 2.0 {
            0.0
        } else {
            (self.sum / self.count).sqrt()
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SERIALIZED_LEN);
        write_f64(&mut buf, self.count);
        write_f64(&mut buf, self.mean);
        write_f64(&mut buf, self.sum);
        buf
    }

    /// Loads state from `buf`. On any error the receiver is reset to
    /// [`RunningStats::new`] before the error is returned.
    pub fn deserialize(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() != SERIALIZED_LEN {
            self.clear();
            return Err(Error::InvalidLength);
        }
        let count = read_f64(buf, 0);
        if count < 0.0 {
            self.clear();
            return Err(Error::InvalidCount);
        }
        self.count = count;
        self.mean = read_f64(buf, 8);
        self.sum = read_f64(buf, 16);
        Ok(())
    }
}
