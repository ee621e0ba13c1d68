//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the inclusive range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Arithmetic mean of a set of samples, or `None` if there are no samples.
pub fn mean<T>(samples: &[T]) -> Option<T>
where
    T: Float
{
    if samples.is_empty() {
        return None;
    }

    let sum = samples.iter().fold(T::zero(), |acc, s| acc + *s);

    T::from(samples.len()).map(|n| sum / n)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// Floating point round-off can produce `r == rhs.abs()` when `lhs` is a very small negative
/// number.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.9, 0.03, 0.75), 0.75);
        assert_eq!(clamp(0.02, 0.03, 0.75), 0.03);
        assert_eq!(clamp(0.4, 0.03, 0.75), 0.4);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean::<f64>(&[]), None);
        assert_eq!(mean(&[10.0, 12.0, 14.0, 8.0, 6.0]), Some(10.0));
    }

    #[test]
    fn test_rem_euclid() {
        assert_eq!(rem_euclid(370.0, 360.0), 10.0);
        assert_eq!(rem_euclid(-10.0, 360.0), 350.0);
        assert_eq!(rem_euclid(0.0, 360.0), 0.0);
    }
}
