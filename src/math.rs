use crate::error::{PendulumError, Result};

/// Adds two vectors component by component
///
/// Both operands must have the same length; a mismatch is reported rather
/// than truncated to the shorter one.
pub fn add(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    if a.len() != b.len() {
        return Err(PendulumError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
}

/// Multiplies a vector by a scalar
pub fn multiply(k: f64, a: &[f64]) -> Vec<f64> {
    a.iter().map(|x| k * x).collect()
}

/// Adds two fixed-size vectors component by component
///
/// The dimension is checked by the type system, so this cannot fail.
pub fn add_n<const N: usize>(a: &[f64; N], b: &[f64; N]) -> [f64; N] {
    let mut result = [0.0; N];
    for i in 0..N {
        result[i] = a[i] + b[i];
    }
    result
}

/// Multiplies a fixed-size vector by a scalar
pub fn multiply_n<const N: usize>(k: f64, a: &[f64; N]) -> [f64; N] {
    let mut result = [0.0; N];
    for i in 0..N {
        result[i] = k * a[i];
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add() {
        let sum = add(&[1.0, 2.0, 3.0, 4.0], &[0.5, -2.0, 1.0, 0.0]).unwrap();
        assert_eq!(sum, vec![1.5, 0.0, 4.0, 4.0]);
    }

    #[test]
    fn test_add_dimension_mismatch() {
        let err = add(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            PendulumError::DimensionMismatch { left: 4, right: 3 }
        ));
    }

    #[test]
    fn test_add_does_not_mutate_inputs() {
        let a = vec![1.0, 2.0];
        let b = vec![3.0, 4.0];
        let _ = add(&a, &b).unwrap();
        assert_eq!(a, vec![1.0, 2.0]);
        assert_eq!(b, vec![3.0, 4.0]);
    }

    #[test]
    fn test_empty_vectors() {
        assert!(add(&[], &[]).unwrap().is_empty());
        assert!(multiply(3.0, &[]).is_empty());
    }

    #[test]
    fn test_fixed_size_matches_slices() {
        let a = [1.0, -2.0, 0.25, 8.0];
        let b = [0.5, 0.5, 0.5, 0.5];
        assert_eq!(add_n(&a, &b).to_vec(), add(&a, &b).unwrap());
        assert_eq!(multiply_n(-2.0, &a).to_vec(), multiply(-2.0, &a));
    }

    fn vec4() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-1.0e6..1.0e6f64, 4)
    }

    proptest! {
        #[test]
        fn add_is_commutative(a in vec4(), b in vec4()) {
            prop_assert_eq!(add(&a, &b).unwrap(), add(&b, &a).unwrap());
        }

        /// Floating-point addition only associates up to rounding.
        #[test]
        fn add_is_associative(a in vec4(), b in vec4(), c in vec4()) {
            let left = add(&add(&a, &b).unwrap(), &c).unwrap();
            let right = add(&a, &add(&b, &c).unwrap()).unwrap();
            for (l, r) in left.iter().zip(&right) {
                prop_assert!((l - r).abs() <= 1e-9 * (1.0 + l.abs()));
            }
        }

        #[test]
        fn multiply_by_one_is_identity(a in vec4()) {
            prop_assert_eq!(multiply(1.0, &a), a);
        }

        #[test]
        fn multiply_by_zero_is_zero(a in vec4()) {
            prop_assert!(multiply(0.0, &a).iter().all(|&x| x == 0.0));
        }
    }
}
