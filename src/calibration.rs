use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::estimated_model_height;

/// スケール係数の分母に足す値
pub const SCALE_EPSILON: f64 = 1e-8;

/// メートル → インチ
pub const INCHES_PER_METER: f64 = 39.3701;

/// 実寸に換算した長さ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledLength {
    pub meters: f64,
    pub inches: f64,
}

/// モデル距離を実寸 (m, in) に換算
///
/// factor = actual_height / (model_height + epsilon)。model_distance に対して線形。
pub fn scale_distance(model_distance: f64, model_height: f64, actual_height: f64) -> ScaledLength {
    let scale_factor = actual_height / (model_height + SCALE_EPSILON);
    let meters = model_distance * scale_factor;
    ScaledLength {
        meters,
        inches: meters * INCHES_PER_METER,
    }
}

/// 1回の解析で固定されるスケール較正
///
/// model_height は代表フレーム（FFC）から一度だけ求め、以降のすべての距離換算に使う。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleCalibrator {
    pub model_height: f64,
    pub actual_height: f64,
}

impl ScaleCalibrator {
    pub fn new(model_height: f64, actual_height: f64) -> Self {
        Self {
            model_height,
            actual_height,
        }
    }

    /// 頭と足首から推定したモデル身長で較正
    pub fn from_frame(head: &Vector3<f64>, ankle: &Vector3<f64>, actual_height: f64) -> Self {
        Self::new(estimated_model_height(head, ankle), actual_height)
    }

    pub fn factor(&self) -> f64 {
        self.actual_height / (self.model_height + SCALE_EPSILON)
    }

    pub fn scale(&self, model_distance: f64) -> ScaledLength {
        scale_distance(model_distance, self.model_height, self.actual_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scale_distance_reference_case() {
        // 足首間 1.0 モデル単位、モデル身長 1.0、実身長 1.83m
        let len = scale_distance(1.0, 1.0, 1.83);
        assert!((len.meters - 1.83).abs() < 1e-6);
        assert!((len.inches - 72.05).abs() < 0.01, "inches: {}", len.inches);
    }

    #[test]
    fn test_scale_distance_identity() {
        let len = scale_distance(0.75, 1.6, 1.6);
        assert!((len.meters - 0.75).abs() < 1e-6);
        assert!((len.inches - 0.75 * INCHES_PER_METER).abs() < 1e-5);
    }

    #[test]
    fn test_scale_distance_zero_model_height_is_finite() {
        let len = scale_distance(1.0, 0.0, 1.8);
        assert!(len.meters.is_finite());
    }

    #[test]
    fn test_calibrator_from_frame() {
        let head = Vector3::new(0.0, 0.9, 0.0);
        let ankle = Vector3::new(0.0, 0.0, 0.0);
        let cal = ScaleCalibrator::from_frame(&head, &ankle, 1.83);
        assert!((cal.model_height - 1.0).abs() < 1e-12);
        assert!((cal.factor() - 1.83).abs() < 1e-6);
        assert_eq!(cal.scale(2.0), scale_distance(2.0, cal.model_height, 1.83));
    }

    proptest! {
        #[test]
        fn prop_scale_distance_linear(d in 0.0f64..5.0, h in 0.5f64..3.0, actual in 1.0f64..2.5) {
            let one = scale_distance(d, h, actual);
            let two = scale_distance(2.0 * d, h, actual);
            prop_assert!((two.meters - 2.0 * one.meters).abs() < 1e-9);
            prop_assert!((two.inches - 2.0 * one.inches).abs() < 1e-9);
        }
    }
}
