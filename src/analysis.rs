//! フェーズ別の指標を集約して1件の BiomechResult を作る
//!
//! - BFC: 後ろ脚の膝角度（全フレーム平均）
//! - FFC: ストライド長・姿勢分類（先頭フレーム）。ここで求めたモデル身長を以降の換算に使う
//! - FFC + Release: 肘の 180° からのずれ（最大）・腰肩捻転差（平均）
//! - Release: 前脚の膝角度・リーチ・側屈（先頭フレーム）

use crate::calibration::ScaleCalibrator;
use crate::config::{Config, ConventionConfig};
use crate::error::AnalysisError;
use crate::geometry::{
    axis_distance, classify_alignment, included_angle, lateral_tilt, planar_distance,
    separation_angle, Alignment,
};
use crate::pose::{JointFrame, PhaseLabel, Side};
use crate::result::BiomechResult;
use crate::selection::{PhaseTrack, PhaseTracks, TrackedFrame};

/// 解析器に渡す設定（実行中は不変）
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// 実身長（メートル）
    pub actual_height: f64,
    pub convention: ConventionConfig,
}

impl AnalysisConfig {
    pub fn new(actual_height: f64) -> Self {
        Self {
            actual_height,
            convention: ConventionConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            actual_height: config.subject.height_m,
            convention: config.convention.clone(),
        }
    }
}

/// FFC で求める値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontFootMetrics {
    pub frame: u32,
    pub stride_model: f64,
    pub alignment: Alignment,
    pub calibrator: ScaleCalibrator,
}

/// FFC〜Release 区間の集計
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmActionMetrics {
    pub max_elbow_deviation: f64,
    pub mean_separation: f64,
}

/// Release で求める値（リーチは換算前のモデル距離）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseMetrics {
    pub frame: u32,
    pub front_knee_angle: f64,
    pub reach_model: f64,
    pub lateral_tilt: f64,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn anchor(track: &PhaseTrack) -> Result<(&TrackedFrame, u32), AnalysisError> {
    let row = track.first().ok_or(AnalysisError::MissingPhaseData { phase: track.label })?;
    let frame = row
        .frame
        .ok_or(AnalysisError::MissingFrameIndex { phase: track.label })?;
    Ok((row, frame))
}

/// トラックの取り違え（例: BFC の位置に Release）を弾く
fn require_label(track: &PhaseTrack, expected: PhaseLabel) -> Result<(), AnalysisError> {
    if track.label == expected {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "expected a '{}' track, got '{}'",
            expected, track.label
        )))
    }
}

pub struct DeliveryAnalyzer {
    config: AnalysisConfig,
}

impl DeliveryAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let h = config.actual_height;
        if !h.is_finite() || h <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "actual height must be a positive number, got {}",
                h
            )));
        }
        if config.convention.tilt_axes[0] == config.convention.tilt_axes[1] {
            return Err(AnalysisError::InvalidConfig("tilt axes must differ".to_string()));
        }
        Ok(Self { config })
    }

    /// 後ろ脚の股関節-膝-足首の角度
    pub fn back_knee_angle(&self, joints: &JointFrame) -> f64 {
        let side = self.config.convention.back_leg;
        included_angle(&joints.hip(side), &joints.knee(side), &joints.ankle(side))
    }

    /// 前脚の股関節-膝-足首の角度
    pub fn front_knee_angle(&self, joints: &JointFrame) -> f64 {
        let side = self.config.convention.front_leg;
        included_angle(&joints.hip(side), &joints.knee(side), &joints.ankle(side))
    }

    /// 肩-肘-手首の角度が 180° からどれだけ曲がっているか
    pub fn elbow_deviation(&self, joints: &JointFrame) -> f64 {
        let arm = self.config.convention.bowling_arm;
        let angle = included_angle(&joints.shoulder(arm), &joints.elbow(arm), &joints.wrist(arm));
        (angle - 180.0).abs()
    }

    /// 腰ライン (左→右) と鎖骨ライン (左→右) のなす角
    pub fn hip_shoulder_separation(&self, joints: &JointFrame) -> f64 {
        let shoulder_line = joints.collar(Side::Right) - joints.collar(Side::Left);
        let hip_line = joints.hip(Side::Right) - joints.hip(Side::Left);
        separation_angle(&shoulder_line, &hip_line)
    }

    pub fn alignment(&self, joints: &JointFrame) -> Alignment {
        classify_alignment(
            &joints.hip(Side::Left),
            &joints.hip(Side::Right),
            &joints.shoulder(Side::Left),
            &joints.shoulder(Side::Right),
            &self.config.convention.delivery_axis.unit(),
        )
    }

    /// BFC 全フレームの後ろ膝角度の平均
    pub fn back_foot_contact(&self, bfc: &PhaseTrack) -> Result<(u32, f64), AnalysisError> {
        let (_, frame) = anchor(bfc)?;
        let angles: Vec<f64> = bfc.iter().map(|r| self.back_knee_angle(&r.joints)).collect();
        let avg = mean(&angles).ok_or(AnalysisError::MissingPhaseData { phase: bfc.label })?;
        tracing::debug!(frame, rows = angles.len(), back_knee = avg, "back-foot-contact");
        Ok((frame, avg))
    }

    pub fn front_foot_contact(&self, ffc: &PhaseTrack) -> Result<FrontFootMetrics, AnalysisError> {
        let (row, frame) = anchor(ffc)?;
        let joints = &row.joints;
        let stride_model = planar_distance(&joints.ankle(Side::Right), &joints.ankle(Side::Left));
        let calibrator = ScaleCalibrator::from_frame(
            &joints.head(),
            &joints.ankle(self.config.convention.front_leg),
            self.config.actual_height,
        );
        let alignment = self.alignment(joints);
        tracing::debug!(
            frame,
            stride_model,
            model_height = calibrator.model_height,
            scale_factor = calibrator.factor(),
            %alignment,
            "front-foot-contact"
        );
        Ok(FrontFootMetrics {
            frame,
            stride_model,
            alignment,
            calibrator,
        })
    }

    /// FFC と Release を連結した区間での腕・体幹の集計（順序は結果に影響しない）
    pub fn arm_action(
        &self,
        ffc: &PhaseTrack,
        release: &PhaseTrack,
    ) -> Result<ArmActionMetrics, AnalysisError> {
        let (deviations, separations): (Vec<f64>, Vec<f64>) = ffc
            .chain(release)
            .map(|r| (self.elbow_deviation(&r.joints), self.hip_shoulder_separation(&r.joints)))
            .unzip();
        let missing = AnalysisError::MissingPhaseData { phase: ffc.label };
        let max_elbow_deviation = max(&deviations).ok_or_else(|| missing.clone())?;
        let mean_separation = mean(&separations).ok_or(missing)?;
        tracing::debug!(
            rows = deviations.len(),
            max_elbow_deviation,
            mean_separation,
            "front-foot-contact..release"
        );
        Ok(ArmActionMetrics {
            max_elbow_deviation,
            mean_separation,
        })
    }

    pub fn release(&self, release: &PhaseTrack) -> Result<ReleaseMetrics, AnalysisError> {
        let (row, frame) = anchor(release)?;
        let joints = &row.joints;
        let convention = &self.config.convention;
        let front_knee_angle = self.front_knee_angle(joints);
        let reach_model = axis_distance(
            &joints.palm(convention.bowling_arm),
            &joints.toe(convention.front_leg),
            convention.delivery_axis,
        );
        let tilt = lateral_tilt(&joints.spine(), &joints.pelvis(), convention.tilt_axes);
        tracing::debug!(frame, front_knee_angle, reach_model, lateral_tilt = tilt, "release");
        Ok(ReleaseMetrics {
            frame,
            front_knee_angle,
            reach_model,
            lateral_tilt: tilt,
        })
    }

    /// 3フェーズのトラックから結果を組み立てる
    ///
    /// どれかのトラックが空なら、そのフェーズ名を持つ MissingPhaseData で失敗する。
    pub fn analyze_phases(
        &self,
        bfc: &PhaseTrack,
        ffc: &PhaseTrack,
        release: &PhaseTrack,
    ) -> Result<BiomechResult, AnalysisError> {
        require_label(bfc, PhaseLabel::BackFootContact)?;
        require_label(ffc, PhaseLabel::FrontFootContact)?;
        require_label(release, PhaseLabel::Release)?;

        let (bfc_frame, back_knee_angle) = self.back_foot_contact(bfc)?;
        let front = self.front_foot_contact(ffc)?;
        // Release が空なら区間集計より先にここで落とす
        let release_metrics = self.release(release)?;
        let arm = self.arm_action(ffc, release)?;

        let stride = front.calibrator.scale(front.stride_model);
        let reach = front.calibrator.scale(release_metrics.reach_model);

        let result = BiomechResult {
            bfc_frame,
            back_knee_angle,
            ffc_frame: front.frame,
            stride_length_m: stride.meters,
            stride_length_in: stride.inches,
            alignment: front.alignment.to_string(),
            max_elbow_deviation: arm.max_elbow_deviation,
            hip_shoulder_separation: arm.mean_separation,
            release_frame: release_metrics.frame,
            front_knee_angle: release_metrics.front_knee_angle,
            delivery_reach_m: reach.meters,
            delivery_reach_in: reach.inches,
            lateral_tilt: release_metrics.lateral_tilt,
        };
        tracing::info!(
            bfc = result.bfc_frame,
            ffc = result.ffc_frame,
            release = result.release_frame,
            "delivery analyzed"
        );
        Ok(result)
    }

    pub fn analyze(&self, tracks: &PhaseTracks) -> Result<BiomechResult, AnalysisError> {
        self.analyze_phases(
            tracks.get(PhaseLabel::BackFootContact),
            tracks.get(PhaseLabel::FrontFootContact),
            tracks.get(PhaseLabel::Release),
        )
    }
}
