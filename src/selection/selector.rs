use std::collections::BTreeMap;

use super::raw::Detection;
use super::track::{PhaseTracks, TrackedFrame};
use crate::pose::LabelMap;

/// 1フレームの候補から選ばれた結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// 入力スライス内のインデックス
    pub index: usize,
    pub area: f64,
    /// 最大面積が複数候補で同値だった
    pub tied: bool,
}

/// BBox面積が最大の候補を選ぶ
///
/// 面積が厳密に大きいときだけ置き換えるので、同値なら先に出た候補が残る。
pub fn select_primary(candidates: &[Detection]) -> Option<Selection> {
    let mut best: Option<Selection> = None;
    for (index, det) in candidates.iter().enumerate() {
        let area = det.joints.projected_bbox().area();
        match best {
            Some(ref mut current) if area <= current.area => {
                if area == current.area {
                    current.tied = true;
                }
            }
            _ => {
                best = Some(Selection {
                    index,
                    area,
                    tied: false,
                })
            }
        }
    }
    best
}

/// 選択処理の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub frames_seen: usize,
    /// ラベルが無い（または認識できない）ため捨てたフレーム
    pub frames_unlabeled: usize,
    pub frames_selected: usize,
    /// 最大面積の同値が発生したフレーム
    pub ambiguous_frames: usize,
}

/// フレーム→フェーズのラベルに従い、各フレームの主被写体をフェーズ別に振り分ける
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateSelector;

impl CandidateSelector {
    pub fn new() -> Self {
        Self
    }

    /// 検出列からフェーズトラックを構築
    ///
    /// - フレームは番号の昇順で処理する（トラック内の順序 = 動画順）
    /// - 同一フレーム内の候補は track_id 順に並べてから選ぶ（同値時の勝者を固定）
    /// - ラベルの無いフレームは捨てる
    pub fn build_tracks(
        &self,
        detections: Vec<Detection>,
        labels: &LabelMap,
    ) -> (PhaseTracks, SelectionStats) {
        let mut by_frame: BTreeMap<u32, Vec<Detection>> = BTreeMap::new();
        for det in detections {
            by_frame.entry(det.frame).or_default().push(det);
        }

        let mut tracks = PhaseTracks::new();
        let mut stats = SelectionStats::default();

        for (frame, mut candidates) in by_frame {
            stats.frames_seen += 1;

            let Some(&label) = labels.get(&frame) else {
                stats.frames_unlabeled += 1;
                continue;
            };

            candidates.sort_by_key(|d| d.track_id);
            let Some(selection) = select_primary(&candidates) else {
                continue;
            };

            if selection.tied {
                stats.ambiguous_frames += 1;
                tracing::warn!(
                    frame,
                    candidates = candidates.len(),
                    area = selection.area,
                    "equal-area candidates, keeping lowest track id"
                );
            }

            let chosen = candidates.swap_remove(selection.index);
            tracing::debug!(
                frame,
                %label,
                track_id = chosen.track_id,
                area = selection.area,
                "candidate selected"
            );
            tracks
                .get_mut(label)
                .push(TrackedFrame::new(frame, chosen.joints));
            stats.frames_selected += 1;
        }

        tracing::info!(
            seen = stats.frames_seen,
            selected = stats.frames_selected,
            unlabeled = stats.frames_unlabeled,
            ambiguous = stats.ambiguous_frames,
            "phase tracks built"
        );
        (tracks, stats)
    }
}
