use nalgebra::Vector3;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// SMPL の 24 関節インデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum JointIndex {
    Pelvis = 0,
    LeftHip = 1,
    RightHip = 2,
    Spine1 = 3,
    LeftKnee = 4,
    RightKnee = 5,
    Spine2 = 6,
    LeftAnkle = 7,
    RightAnkle = 8,
    Spine3 = 9,
    LeftFoot = 10,
    RightFoot = 11,
    Neck = 12,
    LeftCollar = 13,
    RightCollar = 14,
    Head = 15,
    LeftShoulder = 16,
    RightShoulder = 17,
    LeftElbow = 18,
    RightElbow = 19,
    LeftWrist = 20,
    RightWrist = 21,
    LeftHand = 22,
    RightHand = 23,
}

impl JointIndex {
    pub const COUNT: usize = 24;

    pub fn from_index(index: usize) -> Option<Self> {
        use JointIndex::*;
        const ALL: [JointIndex; JointIndex::COUNT] = [
            Pelvis, LeftHip, RightHip, Spine1, LeftKnee, RightKnee, Spine2, LeftAnkle,
            RightAnkle, Spine3, LeftFoot, RightFoot, Neck, LeftCollar, RightCollar, Head,
            LeftShoulder, RightShoulder, LeftElbow, RightElbow, LeftWrist, RightWrist,
            LeftHand, RightHand,
        ];
        ALL.get(index).copied()
    }
}

/// 左右
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn pick(self, left: JointIndex, right: JointIndex) -> JointIndex {
        match self {
            Side::Left => left,
            Side::Right => right,
        }
    }
}

/// 投影面(x, y)上のBBox（モデル座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// 1フレーム分の24関節（モデル座標）
///
/// 関節の並びは全フレーム共通。意味のある関節は名前付きアクセサで取得する。
#[derive(Debug, Clone, PartialEq)]
pub struct JointFrame {
    joints: [Vector3<f64>; JointIndex::COUNT],
}

impl JointFrame {
    pub fn new(joints: [Vector3<f64>; JointIndex::COUNT]) -> Self {
        Self { joints }
    }

    pub fn from_array(raw: [[f64; 3]; JointIndex::COUNT]) -> Self {
        Self {
            joints: raw.map(|[x, y, z]| Vector3::new(x, y, z)),
        }
    }

    /// `24×3` のビューから構築。形状が違えば None
    pub fn from_view(view: ArrayView2<f64>) -> Option<Self> {
        if view.shape() != [JointIndex::COUNT, 3] {
            return None;
        }
        let joints = std::array::from_fn(|j| {
            Vector3::new(view[[j, 0]], view[[j, 1]], view[[j, 2]])
        });
        Some(Self { joints })
    }

    pub fn get(&self, index: JointIndex) -> &Vector3<f64> {
        &self.joints[index as usize]
    }

    pub fn joints(&self) -> &[Vector3<f64>; JointIndex::COUNT] {
        &self.joints
    }

    pub fn pelvis(&self) -> Vector3<f64> {
        *self.get(JointIndex::Pelvis)
    }

    /// 胸椎上部 (Spine3)
    pub fn spine(&self) -> Vector3<f64> {
        *self.get(JointIndex::Spine3)
    }

    pub fn head(&self) -> Vector3<f64> {
        *self.get(JointIndex::Head)
    }

    pub fn hip(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftHip, JointIndex::RightHip))
    }

    pub fn knee(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftKnee, JointIndex::RightKnee))
    }

    pub fn ankle(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftAnkle, JointIndex::RightAnkle))
    }

    /// つま先 (SMPL の foot 関節)
    pub fn toe(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftFoot, JointIndex::RightFoot))
    }

    /// 鎖骨。肩ラインの向き（腰肩の捻転差）に使う
    pub fn collar(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftCollar, JointIndex::RightCollar))
    }

    pub fn shoulder(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftShoulder, JointIndex::RightShoulder))
    }

    pub fn elbow(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftElbow, JointIndex::RightElbow))
    }

    pub fn wrist(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftWrist, JointIndex::RightWrist))
    }

    /// 手のひら (SMPL の hand 関節)
    pub fn palm(&self, side: Side) -> Vector3<f64> {
        *self.get(side.pick(JointIndex::LeftHand, JointIndex::RightHand))
    }

    /// 全関節の x, y 範囲
    pub fn projected_bbox(&self) -> BBox {
        let mut bbox = BBox {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        };
        for p in &self.joints {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        bbox
    }
}

impl Default for JointFrame {
    fn default() -> Self {
        Self {
            joints: [Vector3::zeros(); JointIndex::COUNT],
        }
    }
}
