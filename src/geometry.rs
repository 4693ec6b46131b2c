//! 3D関節座標に対する幾何プリミティブ
//!
//! すべて純粋関数。ゼロ長ベクトルは分母に epsilon を足して吸収するため
//! 失敗はしないが、結果は 90° 付近に寄った近似値になる（warn ログを出す）。

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 内積正規化時の分母に足す値
pub const ANGLE_EPSILON: f64 = 1e-8;

/// 頭頂・足裏がキーポイントからずれている分の補正（モデル単位）
pub const MODEL_HEIGHT_OFFSET: f64 = 0.1;

/// これより短いベクトルは退化とみなしてログに残す
pub const DEGENERATE_LENGTH: f64 = 1e-6;

/// 座標軸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        v[self.index()] = 1.0;
        v
    }

    pub fn component(self, v: &Vector3<f64>) -> f64 {
        v[self.index()]
    }
}

fn warn_if_degenerate(what: &'static str, v: &Vector3<f64>) {
    let norm = v.norm();
    if norm < DEGENERATE_LENGTH {
        tracing::warn!(vector = what, norm, "degenerate vector in angle computation");
    }
}

/// 頂点 b における a-b-c の角度（度, 0〜180）
pub fn included_angle(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    let ba = a - b;
    let bc = c - b;
    warn_if_degenerate("b->a", &ba);
    warn_if_degenerate("b->c", &bc);
    let cos_theta = ba.dot(&bc) / (ba.norm() * bc.norm() + ANGLE_EPSILON);
    cos_theta.clamp(-1.0, 1.0).acos().to_degrees()
}

/// 2本の差分ベクトルのなす角（度, 0〜180）
///
/// 各ベクトルを (norm + epsilon) で正規化してから内積を取る。
pub fn separation_angle(v1: &Vector3<f64>, v2: &Vector3<f64>) -> f64 {
    warn_if_degenerate("vec1", v1);
    warn_if_degenerate("vec2", v2);
    let u1 = v1 / (v1.norm() + ANGLE_EPSILON);
    let u2 = v2 / (v2.norm() + ANGLE_EPSILON);
    u1.dot(&u2).clamp(-1.0, 1.0).acos().to_degrees()
}

/// ユークリッド距離（モデル単位）
pub fn planar_distance(p: &Vector3<f64>, q: &Vector3<f64>) -> f64 {
    (p - q).norm()
}

/// 1軸方向の距離（リーチ計測用）
pub fn axis_distance(p: &Vector3<f64>, q: &Vector3<f64>, axis: Axis) -> f64 {
    (axis.component(p) - axis.component(q)).abs()
}

/// 頭〜足首距離 + 固定オフセット。スケール較正の分母専用
pub fn estimated_model_height(head: &Vector3<f64>, ankle: &Vector3<f64>) -> f64 {
    planar_distance(head, ankle) + MODEL_HEIGHT_OFFSET
}

/// 骨盤→脊椎ベクトルの側屈角（度, 符号付き）
///
/// `plane = (a, b)` のとき atan2(v[a], v[b])。既定は (x, y)。
pub fn lateral_tilt(spine: &Vector3<f64>, pelvis: &Vector3<f64>, plane: [Axis; 2]) -> f64 {
    let v = spine - pelvis;
    plane[0].component(&v).atan2(plane[1].component(&v)).to_degrees()
}

/// 投球方向に対する向きの区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentBucket {
    SideOn,
    FrontOn,
    SemiSideOn,
}

impl AlignmentBucket {
    /// side-on は [70, 110] 両端含む。front-on は 30 以下か 150 以上
    pub fn from_angle(angle: f64) -> Self {
        if (70.0..=110.0).contains(&angle) {
            AlignmentBucket::SideOn
        } else if angle <= 30.0 || angle >= 150.0 {
            AlignmentBucket::FrontOn
        } else {
            AlignmentBucket::SemiSideOn
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlignmentBucket::SideOn => "side-on",
            AlignmentBucket::FrontOn => "front-on",
            AlignmentBucket::SemiSideOn => "semi side-on",
        }
    }
}

/// 腰・肩それぞれの区分から決まる姿勢ラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Uniform(AlignmentBucket),
    Mixed {
        hip: AlignmentBucket,
        shoulder: AlignmentBucket,
    },
}

impl Alignment {
    pub fn from_buckets(hip: AlignmentBucket, shoulder: AlignmentBucket) -> Self {
        if hip == shoulder {
            Alignment::Uniform(hip)
        } else {
            Alignment::Mixed { hip, shoulder }
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::Uniform(bucket) => f.write_str(bucket.as_str()),
            Alignment::Mixed { hip, shoulder } => {
                write!(f, "mixed ({}/{})", hip.as_str(), shoulder.as_str())
            }
        }
    }
}

/// 腰ライン・肩ラインを投球方向軸と比べて姿勢を分類
///
/// ラインは右→左（left - right）の向き。
pub fn classify_alignment(
    left_hip: &Vector3<f64>,
    right_hip: &Vector3<f64>,
    left_shoulder: &Vector3<f64>,
    right_shoulder: &Vector3<f64>,
    delivery_axis: &Vector3<f64>,
) -> Alignment {
    let hip_angle = separation_angle(&(left_hip - right_hip), delivery_axis);
    let shoulder_angle = separation_angle(&(left_shoulder - right_shoulder), delivery_axis);
    Alignment::from_buckets(
        AlignmentBucket::from_angle(hip_angle),
        AlignmentBucket::from_angle(shoulder_angle),
    )
}
