pub const EPSILON: f64 = 1e-5;

/// Whether `a` and `b` are equal within an absolute tolerance
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
