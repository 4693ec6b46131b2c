use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::SelectionError;
use crate::pose::{JointFrame, JointIndex};

/// 1フレーム内の検出1件（関節はメッシュ回帰器でデコード済み）
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub frame: u32,
    /// トラッカーが振る人物ID。同フレーム内の並び順の基準
    pub track_id: u32,
    pub joints: JointFrame,
}

/// トラッカー出力（検出ごとに1行）
///
/// `joints` は [N, 24, 3]、`frame_idx` と `id` は長さ N。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrackedOutput {
    pub frame_idx: Vec<u32>,
    pub id: Vec<u32>,
    pub joints: Array3<f64>,
}

impl RawTrackedOutput {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read tracked output {}", path.display()))?;
        let raw: RawTrackedOutput =
            serde_json::from_str(&content).context("Failed to parse tracked output")?;
        Ok(raw)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json).context("Failed to write tracked output")?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frame_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_idx.is_empty()
    }

    /// 形状を検証して Detection 列に展開
    pub fn detections(&self) -> Result<Vec<Detection>, SelectionError> {
        let shape = self.joints.shape();
        if shape.len() != 3 || shape[1] != JointIndex::COUNT || shape[2] != 3 {
            return Err(SelectionError::JointShape {
                shape: shape.to_vec(),
            });
        }
        let n = shape[0];
        if self.frame_idx.len() != n || self.id.len() != n {
            return Err(SelectionError::LengthMismatch {
                joints: n,
                frames: self.frame_idx.len(),
                ids: self.id.len(),
            });
        }

        let detections = self
            .joints
            .axis_iter(Axis(0))
            .zip(self.frame_idx.iter().zip(&self.id))
            .map(|(view, (&frame, &track_id))| {
                // 形状は上で検証済み
                let joints = JointFrame::from_view(view).unwrap_or_default();
                Detection {
                    frame,
                    track_id,
                    joints,
                }
            })
            .collect();
        Ok(detections)
    }
}
