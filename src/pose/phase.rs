use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// フレーム番号 → フェーズ
pub type LabelMap = BTreeMap<u32, PhaseLabel>;

/// ラベリングツールが付与する投球フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhaseLabel {
    Jump,
    BackFootContact,
    FrontFootContact,
    Release,
    FollowThrough,
}

impl PhaseLabel {
    pub const ALL: [PhaseLabel; 5] = [
        PhaseLabel::Jump,
        PhaseLabel::BackFootContact,
        PhaseLabel::FrontFootContact,
        PhaseLabel::Release,
        PhaseLabel::FollowThrough,
    ];

    /// 解析で使う瞬間フェーズ (BFC / FFC / Release)
    pub fn is_instant(self) -> bool {
        matches!(
            self,
            PhaseLabel::BackFootContact | PhaseLabel::FrontFootContact | PhaseLabel::Release
        )
    }

    /// ラベルCSV・フェーズテーブルのファイル名で使うトークン
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseLabel::Jump => "jump",
            PhaseLabel::BackFootContact => "bfc",
            PhaseLabel::FrontFootContact => "ffc",
            PhaseLabel::Release => "release",
            PhaseLabel::FollowThrough => "followthrough",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            PhaseLabel::Jump => "jump",
            PhaseLabel::BackFootContact => "back-foot-contact",
            PhaseLabel::FrontFootContact => "front-foot-contact",
            PhaseLabel::Release => "release",
            PhaseLabel::FollowThrough => "follow-through",
        }
    }
}

impl fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized phase label: {0:?}")]
pub struct UnknownPhaseLabel(pub String);

impl FromStr for PhaseLabel {
    type Err = UnknownPhaseLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        PhaseLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == token || label.long_name() == token)
            .ok_or_else(|| UnknownPhaseLabel(s.to_string()))
    }
}
