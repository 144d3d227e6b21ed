//! Score normalisation for model-reported ATS scores.
//!
//! Models report scores as integers, floats, or numeric strings, and
//! occasionally outside the documented range. Everything is folded into an
//! integer in `0..=100`.

/// Upper bound of every score.
pub const MAX_SCORE: u8 = 100;

/// Clamp a raw numeric score into `0..=100`.
///
/// # Algorithm
///
/// 1. Non-finite input (NaN, ±∞) → 0
/// 2. Round half away from zero to the nearest integer
/// 3. Clamp into `[0, 100]`
///
/// The mapping is idempotent: `clamp_score(clamp_score(x) as f64) == clamp_score(x)`.
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, MAX_SCORE as f64) as u8
}

/// Parse a score from text such as `"85"`, `" 72.5 "`, or `"90%"`.
///
/// Returns `None` when no leading number can be read.
pub fn parse_score_text(s: &str) -> Option<f64> {
    let s = s.trim().trim_end_matches('%').trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}
