// src/stats/welford.rs
//! Welford Online Mean / Variance
//!
//! # Algorithm
//!
//! For each observation x:
//! ```text
//! n     = n + 1
//! δ     = x - mean
//! mean  = mean + δ/n
//! δ₂    = x - mean
//! M2    = M2 + δ·δ₂
//! ```
//! with sample variance `M2 / (n - 1)`.
//!
//! Memory is O(1) in the number of observations and the update avoids the
//! catastrophic cancellation of the naive `Σx² - n·mean²` formula.
//!
//! # Parallel Combination
//!
//! Two accumulators A and B merge with the Chan et al. formula:
//! ```text
//! n    = n_A + n_B
//! δ    = mean_B - mean_A
//! mean = mean_A + δ·n_B/n
//! M2   = M2_A + M2_B + δ²·n_A·n_B/n
//! ```

use crate::error::{SdeError, SdeResult};
use serde::Serialize;

/// Running (count, mean, M2) triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OnlineAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
}

impl OnlineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one observation
    #[inline]
    pub fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the running mean
    pub fn m2(&self) -> f64 {
        self.m2
    }

    /// Unbiased sample variance `M2 / (n - 1)`
    ///
    /// # Errors
    ///
    /// [`SdeError::InsufficientObservations`] when fewer than two values
    /// have been seen.
    pub fn variance(&self) -> SdeResult<f64> {
        if self.count <= 1 {
            return Err(SdeError::InsufficientObservations { count: self.count });
        }
        Ok(self.m2 / (self.count - 1) as f64)
    }

    /// Population variance `M2 / n` (0 for an empty accumulator)
    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.m2 / self.count as f64
    }

    /// Standard error of the mean, `sqrt(variance / n)`
    pub fn std_error(&self) -> SdeResult<f64> {
        Ok((self.variance()? / self.count as f64).sqrt())
    }

    /// Fold another accumulator into this one
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;

        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count += other.count;
    }

    /// By-value merge for use in `reduce`
    pub fn merged(mut self, other: Self) -> Self {
        self.merge(&other);
        self
    }
}

impl Extend<f64> for OnlineAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.update(x);
        }
    }
}

impl FromIterator<f64> for OnlineAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_pass(data: &[f64]) -> (f64, f64) {
        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var)
    }

    #[test]
    fn test_matches_two_pass() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let acc: OnlineAccumulator = data.iter().copied().collect();
        let (mean, var) = two_pass(&data);

        assert_eq!(acc.count(), 8);
        assert_relative_eq!(acc.mean(), mean, max_relative = 1e-12);
        assert_relative_eq!(acc.variance().unwrap(), var, max_relative = 1e-12);
    }

    #[test]
    fn test_large_offset_stability() {
        // naive sum-of-squares loses every digit here
        let data: Vec<f64> = (0..1000).map(|i| 1e9 + (i % 7) as f64).collect();
        let acc: OnlineAccumulator = data.iter().copied().collect();
        let (_, var) = two_pass(&data);

        assert_relative_eq!(acc.variance().unwrap(), var, max_relative = 1e-9);
    }

    #[test]
    fn test_variance_needs_two_observations() {
        let mut acc = OnlineAccumulator::new();
        assert!(matches!(
            acc.variance(),
            Err(SdeError::InsufficientObservations { count: 0 })
        ));

        acc.update(3.0);
        assert!(matches!(
            acc.variance(),
            Err(SdeError::InsufficientObservations { count: 1 })
        ));

        acc.update(5.0);
        assert_relative_eq!(acc.variance().unwrap(), 2.0);
    }

    #[test]
    fn test_merge_matches_sequential() {
        let data: Vec<f64> = (0..101).map(|i| ((i * 37) % 11) as f64 * 0.5 - 2.0).collect();
        let whole: OnlineAccumulator = data.iter().copied().collect();

        let left: OnlineAccumulator = data[..40].iter().copied().collect();
        let right: OnlineAccumulator = data[40..].iter().copied().collect();
        let merged = left.merged(right);

        assert_eq!(merged.count(), whole.count());
        assert_relative_eq!(merged.mean(), whole.mean(), max_relative = 1e-12);
        assert_relative_eq!(
            merged.variance().unwrap(),
            whole.variance().unwrap(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_population_variance() {
        let acc: OnlineAccumulator = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        assert!((acc.population_variance() - 4.0).abs() < 1e-12);
        assert!((acc.variance().unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(OnlineAccumulator::new().population_variance(), 0.0);

        let single: OnlineAccumulator = [3.5].into_iter().collect();
        assert_eq!(single.population_variance(), 0.0);
    }

    #[test]
    fn test_merge_with_empty() {
        let acc: OnlineAccumulator = [1.0, 2.0, 3.0].into_iter().collect();

        let mut a = OnlineAccumulator::new();
        a.merge(&acc);
        assert_eq!(a, acc);

        let b = acc.merged(OnlineAccumulator::new());
        assert_eq!(b, acc);
    }
}
