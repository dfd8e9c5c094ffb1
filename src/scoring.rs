/// Weights combining the three accumulated log-costs of a hypothesis
/// into its ranking key. All constituent costs are log-probabilities or
/// log-penalties (≤ 0), so a higher total is better.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weights {
    pub translation: f64,
    pub language: f64,
    pub distortion: f64,
}

impl Default for Weights {
    #[inline]
    fn default() -> Self {
        Self {
            translation: 1.0,
            language: 0.1,
            distortion: 1.0,
        }
    }
}

impl Weights {
    #[inline]
    pub fn total_cost(&self, translation: f64, language: f64, distortion: f64) -> f64 {
        self.translation * translation + self.language * language + self.distortion * distortion
    }
}

/// Reordering penalty `ln(alpha^|previous - new + 1|)`: zero exactly at
/// the monotonic step `new == previous + 1` (including the first word,
/// where `previous` is -1), decaying geometrically with displacement.
#[inline]
pub fn distortion_cost(previous_position: isize, new_position: usize, alpha: f64) -> f64 {
    debug_assert!(
        alpha > 0.0 && alpha < 1.0,
        "distortion decay alpha {alpha} is not in (0, 1)"
    );

    let displacement = (previous_position - new_position as isize + 1).unsigned_abs();
    alpha.ln() * displacement as f64
}
