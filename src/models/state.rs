use crate::solvers::floor_at_zero;

/// Mutable (S, v, r) triple owned by a single path
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathState {
    /// Asset price
    pub s: f64,
    /// Instantaneous variance
    pub v: f64,
    /// Short rate
    pub r: f64,
}

impl PathState {
    pub fn new(s: f64, v: f64, r: f64) -> Self {
        Self { s, v, r }
    }

    /// Apply the zero floor to every component
    #[inline]
    pub fn clamp(&mut self) {
        self.s = floor_at_zero(self.s);
        self.v = floor_at_zero(self.v);
        self.r = floor_at_zero(self.r);
    }

    pub fn is_finite(&self) -> bool {
        self.s.is_finite() && self.v.is_finite() && self.r.is_finite()
    }
}
