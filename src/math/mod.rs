/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns `true` for finite values strictly greater than zero.
#[must_use]
pub fn is_positive_finite(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

/// Rounds `x` to `digits` significant decimal digits.
///
/// The exact binary value is rounded, halfway cases to even, so `1.25` gives
/// `1.2` and `2.675` (stored just below) gives `2.67` at three digits. Zero and
/// non-finite values are returned unchanged; `digits` below one is treated as
/// one.
#[must_use]
pub fn round_sig(x: f64, digits: u32) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let precision = digits.max(1) as usize - 1;
    format!("{x:.precision$e}").parse().unwrap_or(x)
}
