use std::collections::BTreeMap;

use crate::pose::{JointFrame, PhaseLabel};

/// フェーズに属する1フレーム
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFrame {
    /// 動画フレーム番号。テーブルに frame 列が無ければ None
    pub frame: Option<u32>,
    pub joints: JointFrame,
}

impl TrackedFrame {
    pub fn new(frame: u32, joints: JointFrame) -> Self {
        Self {
            frame: Some(frame),
            joints,
        }
    }
}

/// 同じフェーズラベルを持つフレーム列（動画順）
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTrack {
    pub label: PhaseLabel,
    pub rows: Vec<TrackedFrame>,
}

impl PhaseTrack {
    pub fn new(label: PhaseLabel) -> Self {
        Self {
            label,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(label: PhaseLabel, rows: Vec<TrackedFrame>) -> Self {
        Self { label, rows }
    }

    pub fn push(&mut self, row: TrackedFrame) {
        self.rows.push(row);
    }

    pub fn first(&self) -> Option<&TrackedFrame> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackedFrame> {
        self.rows.iter()
    }

    /// self の後ろに other を連結して走査
    pub fn chain<'a>(
        &'a self,
        other: &'a PhaseTrack,
    ) -> impl Iterator<Item = &'a TrackedFrame> {
        self.rows.iter().chain(other.rows.iter())
    }
}

/// 5フェーズ分のトラック。全ラベルが常に存在する
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTracks {
    tracks: BTreeMap<PhaseLabel, PhaseTrack>,
}

impl PhaseTracks {
    pub fn new() -> Self {
        let tracks = PhaseLabel::ALL
            .into_iter()
            .map(|label| (label, PhaseTrack::new(label)))
            .collect();
        Self { tracks }
    }

    pub fn get(&self, label: PhaseLabel) -> &PhaseTrack {
        &self.tracks[&label]
    }

    pub fn get_mut(&mut self, label: PhaseLabel) -> &mut PhaseTrack {
        self.tracks
            .entry(label)
            .or_insert_with(|| PhaseTrack::new(label))
    }

    /// トラックを差し替える（ラベルは track.label を使う）
    pub fn insert(&mut self, track: PhaseTrack) {
        self.tracks.insert(track.label, track);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhaseTrack> {
        self.tracks.values()
    }
}

impl Default for PhaseTracks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_tracks_have_all_labels() {
        let tracks = PhaseTracks::new();
        for label in PhaseLabel::ALL {
            assert_eq!(tracks.get(label).label, label);
            assert!(tracks.get(label).is_empty());
        }
        assert_eq!(tracks.iter().count(), 5);
    }

    #[test]
    fn test_chain_keeps_order() {
        let mut ffc = PhaseTrack::new(PhaseLabel::FrontFootContact);
        ffc.push(TrackedFrame::new(10, JointFrame::default()));
        let mut release = PhaseTrack::new(PhaseLabel::Release);
        release.push(TrackedFrame::new(14, JointFrame::default()));
        release.push(TrackedFrame::new(15, JointFrame::default()));

        let frames: Vec<_> = ffc.chain(&release).map(|r| r.frame).collect();
        assert_eq!(frames, vec![Some(10), Some(14), Some(15)]);
    }

    #[test]
    fn test_insert_replaces_track() {
        let mut tracks = PhaseTracks::new();
        let track = PhaseTrack::with_rows(
            PhaseLabel::Release,
            vec![TrackedFrame::new(3, JointFrame::default())],
        );
        tracks.insert(track);
        assert_eq!(tracks.get(PhaseLabel::Release).len(), 1);
        assert_eq!(tracks.get(PhaseLabel::Release).first().unwrap().frame, Some(3));
    }
}
