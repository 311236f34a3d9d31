//! Signal preprocessing
//!
//! Vector magnitude of tri-axial acceleration and its ENMO variant
//! (Euclidean Norm Minus One, floor-clamped at zero).

use crate::types::Acceleration;

/// Euclidean norm of every triple, optionally minus one g and optionally
/// clamped at zero
pub fn calculate_vector_magnitude(
    acceleration: &[Acceleration],
    minus_one: bool,
    round_negative_to_zero: bool,
) -> Vec<f64> {
    acceleration
        .iter()
        .map(|sample| {
            let mut magnitude = norm(sample);
            if minus_one {
                magnitude -= 1.0;
            }
            if round_negative_to_zero && magnitude < 0.0 {
                magnitude = 0.0;
            }
            magnitude
        })
        .collect()
}

/// ENMO per sample
pub fn enmo(acceleration: &[Acceleration]) -> Vec<f64> {
    calculate_vector_magnitude(acceleration, true, true)
}

fn norm(sample: &Acceleration) -> f64 {
    sample.iter().map(|v| v * v).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_plain_magnitude() {
        let magnitudes = calculate_vector_magnitude(&[[3.0, 4.0, 0.0], [0.0, 0.0, -2.0]], false, false);
        assert_eq!(magnitudes, vec![5.0, 2.0]);
    }

    #[test]
    fn test_minus_one_without_clamp_goes_negative() {
        let magnitudes = calculate_vector_magnitude(&[[0.0, 0.5, 0.0]], true, false);
        assert_abs_diff_eq!(magnitudes[0], -0.5);
    }

    #[test]
    fn test_enmo_clamps_at_zero() {
        let values = enmo(&[[0.0, 0.5, 0.0], [0.0, 0.0, 1.0], [0.6, 0.0, 0.8], [0.0, 1.1, 0.0]]);
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], 0.0);
        assert_abs_diff_eq!(values[1], 0.0);
        assert_abs_diff_eq!(values[2], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[3], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert!(enmo(&[]).is_empty());
    }

    #[test]
    fn test_nan_propagates() {
        let values = enmo(&[[f64::NAN, 0.0, 1.0]]);
        assert!(values[0].is_nan());
    }
}
