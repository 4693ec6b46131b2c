use std::path::PathBuf;

use thiserror::Error;

use crate::pose::PhaseLabel;

/// 解析の失敗。どのフェーズが欠けているかを必ず含める
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("no frames retained for phase '{phase}'")]
    MissingPhaseData { phase: PhaseLabel },

    #[error("anchor frame of phase '{phase}' has no frame index")]
    MissingFrameIndex { phase: PhaseLabel },

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

/// フェーズテーブル・ラベルCSVの読み書きエラー
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("row {row}: invalid value {value:?} in column '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// フェーズテーブル1枚の読み込み失敗（どのフェーズ・どのファイルかを付ける）
    #[error("phase '{phase}' table {}: {source}", path.display())]
    Phase {
        phase: PhaseLabel,
        path: PathBuf,
        #[source]
        source: Box<TableError>,
    },
}

/// トラッカー出力の形状エラー
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("joint tensor must be [N, 24, 3], got {shape:?}")]
    JointShape { shape: Vec<usize> },

    #[error("length mismatch: {joints} joint rows, {frames} frame indices, {ids} ids")]
    LengthMismatch {
        joints: usize,
        frames: usize,
        ids: usize,
    },
}
