//! Affine 2x3 matrix helpers.
//!
//! Matrices use the `[a, b, c, d, e, f]` coefficient order of [`kurbo::Affine`]:
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```

use crate::foundation::core::Affine;

/// Coefficients of the identity matrix.
pub const IDENTITY_COEFFS: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Compose two matrices so that `b` is applied to points first, then `a`.
#[inline]
pub fn compose(a: Affine, b: Affine) -> Affine {
    a * b
}

/// The identity matrix.
#[inline]
pub fn identity() -> Affine {
    Affine::IDENTITY
}

/// Exact identity check. Near-identity matrices (`[1.0001, 0, 0, 1, 0, 0]`) are not identity.
#[inline]
pub fn is_identity(m: Affine) -> bool {
    m.as_coeffs() == IDENTITY_COEFFS
}

/// Build a matrix from `[a, b, c, d, e, f]`.
#[inline]
pub fn from_coeffs(c: [f64; 6]) -> Affine {
    Affine::new(c)
}

/// Return `[a, b, c, d, e, f]`.
#[inline]
pub fn to_coeffs(m: Affine) -> [f64; 6] {
    m.as_coeffs()
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
