//! Shared test utilities for the gridding workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Approximate equality macros for real and complex values
//! - Sampling trajectory and density weight generators
//! - Deterministic complex test signals
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, radial_trajectory};
//! ```

pub mod generators;

// Re-export commonly used items at the crate root
pub use generators::*;

pub use num_complex::Complex32;

/// Asserts that two real values differ by at most `epsilon`.
///
/// Both sides are widened to `f64`, so `f32` kernel values can be compared
/// against closed-form `f64` references directly.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// let k1 = kernel.evaluate(1.0);          // f32 table lookup
/// assert_approx_eq!(k1, kernel.exact(1.0), 1e-4);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  |diff|: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of complex values.
///
/// Compares the modulus of the difference against `epsilon`.
///
/// ```ignore
/// use test_utils::{assert_complex_approx_eq, Complex32};
///
/// assert_complex_approx_eq!(Complex32::new(1.0, 0.0), Complex32::new(1.0, 1e-6), 1e-4);
/// ```
#[macro_export]
macro_rules! assert_complex_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = $left;
        let right = $right;
        let epsilon: f64 = $epsilon as f64;
        let dre = left.re as f64 - right.re as f64;
        let dim = left.im as f64 - right.im as f64;
        let diff = (dre * dre + dim * dim).sqrt();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  |diff|: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of two complex slices, element by element.
#[macro_export]
macro_rules! assert_complex_slice_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = $left;
        let right = $right;
        assert_eq!(left.len(), right.len(), "slice lengths differ");
        for (l, r) in left.iter().zip(right.iter()) {
            $crate::assert_complex_approx_eq!(*l, *r, $epsilon);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_comparison_widens_f32() {
        // 1/3 in f32 is only accurate to about 1e-8
        assert_approx_eq!(1.0f32 / 3.0, 1.0f64 / 3.0, 1e-7);
        assert_approx_eq!(-0.0f32, 0.0f64, 0.0);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_real_comparison_outside_tolerance() {
        assert_approx_eq!(0.32f32, 0.33f64, 1e-3);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_real_comparison_rejects_nan() {
        assert_approx_eq!(f32::NAN, 0.0f64, 1.0);
    }

    #[test]
    fn test_assert_complex_approx_eq_passes() {
        assert_complex_approx_eq!(Complex32::new(1.0, -2.0), Complex32::new(1.0001, -2.0), 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_complex_approx_eq_fails_on_nan() {
        assert_complex_approx_eq!(Complex32::new(f32::NAN, 0.0), Complex32::new(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_assert_complex_slice_approx_eq_passes() {
        let a = [Complex32::new(1.0, 0.0), Complex32::new(0.0, 1.0)];
        let b = [Complex32::new(1.0, 1e-6), Complex32::new(1e-6, 1.0)];
        assert_complex_slice_approx_eq!(&a[..], &b[..], 1e-4);
    }
}
