//! Math utils.

use num_integer::Integer;

/// Euclidean modulo.
///
/// The result is always in `[0, modulus)`, which is what coordinate and
/// address wrapping need.
pub fn modulo<T: Integer + Copy>(value: T, modulus: T) -> T {
    value.mod_floor(&modulus)
}
