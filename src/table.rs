//! フェーズ別関節テーブルとラベルCSVの読み書き
//!
//! フェーズテーブルの列: `frame, joint0_x, joint0_y, joint0_z, ..., joint23_z`

use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use nalgebra::Vector3;
use serde::Deserialize;

use crate::error::TableError;
use crate::pose::{JointFrame, JointIndex, LabelMap, PhaseLabel};
use crate::selection::{PhaseTrack, PhaseTracks, TrackedFrame};

const AXES: [char; 3] = ['x', 'y', 'z'];

fn joint_column(joint: usize, axis: usize) -> String {
    format!("joint{}_{}", joint, AXES[axis])
}

/// フェーズテーブルのヘッダ
pub fn phase_table_header() -> Vec<String> {
    let mut header = Vec::with_capacity(1 + JointIndex::COUNT * 3);
    header.push("frame".to_string());
    for j in 0..JointIndex::COUNT {
        for a in 0..3 {
            header.push(joint_column(j, a));
        }
    }
    header
}

/// `<dir>/<token>.csv`
pub fn phase_table_path(dir: &Path, label: PhaseLabel) -> PathBuf {
    dir.join(format!("{}.csv", label.as_str()))
}

pub fn write_phase_table<P: AsRef<Path>>(path: P, track: &PhaseTrack) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(phase_table_header())?;
    for row in track.iter() {
        let mut record = Vec::with_capacity(1 + JointIndex::COUNT * 3);
        record.push(row.frame.map(|f| f.to_string()).unwrap_or_default());
        for p in row.joints.joints() {
            record.extend(p.iter().map(|c| c.to_string()));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// ヘッダ名から列位置を引いて読む
///
/// `frame` 列は任意。無ければ各行の frame は None になる。空欄も None。
/// 関節列もデータ行も無いファイル（0バイト、`""` だけの行）は空のトラックとして読む。
pub fn read_phase_table<P: AsRef<Path>>(
    path: P,
    label: PhaseLabel,
) -> Result<PhaseTrack, TableError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let mut records = reader.records().peekable();

    let has_joint_columns = headers.iter().any(|h| h.trim().starts_with("joint"));
    if !has_joint_columns && records.peek().is_none() {
        tracing::debug!(phase = %label, "phase table has no columns, reading as empty");
        return Ok(PhaseTrack::new(label));
    }

    let frame_col = position("frame");
    let mut joint_cols = [[0usize; 3]; JointIndex::COUNT];
    for (j, cols) in joint_cols.iter_mut().enumerate() {
        for (a, col) in cols.iter_mut().enumerate() {
            let name = joint_column(j, a);
            *col = position(&name).ok_or(TableError::MissingColumn { column: name })?;
        }
    }

    let mut track = PhaseTrack::new(label);
    for (i, record) in records.enumerate() {
        let record = record?;
        let row = i + 1;
        let frame = match frame_col {
            Some(col) => parse_frame(&record, col, row)?,
            None => None,
        };
        let mut joints = [Vector3::zeros(); JointIndex::COUNT];
        for (j, cols) in joint_cols.iter().enumerate() {
            for (a, &col) in cols.iter().enumerate() {
                joints[j][a] = parse_coord(&record, col, row, &headers)?;
            }
        }
        track.push(TrackedFrame {
            frame,
            joints: JointFrame::new(joints),
        });
    }
    tracing::debug!(phase = %label, rows = track.len(), "phase table loaded");
    Ok(track)
}

fn parse_frame(record: &StringRecord, col: usize, row: usize) -> Result<Option<u32>, TableError> {
    let raw = record.get(col).unwrap_or("").trim();
    if raw.is_empty() {
        return Ok(None);
    }
    // pandas 経由だと "12.0" のような表記になることがある
    raw.parse::<u32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64)
                .map(|v| v as u32)
        })
        .map(Some)
        .ok_or_else(|| TableError::InvalidValue {
            row,
            column: "frame".to_string(),
            value: raw.to_string(),
        })
}

fn parse_coord(
    record: &StringRecord,
    col: usize,
    row: usize,
    headers: &StringRecord,
) -> Result<f64, TableError> {
    let raw = record.get(col).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| TableError::InvalidValue {
        row,
        column: headers.get(col).unwrap_or("").to_string(),
        value: raw.to_string(),
    })
}

/// 全5フェーズのテーブルを書き出す
pub fn write_phase_tables<P: AsRef<Path>>(dir: P, tracks: &PhaseTracks) -> Result<(), TableError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    for track in tracks.iter() {
        write_phase_table(phase_table_path(dir, track.label), track)?;
    }
    Ok(())
}

/// 解析に使う瞬間フェーズ (BFC / FFC / Release) のテーブルを読む
pub fn read_phase_tables<P: AsRef<Path>>(dir: P) -> Result<PhaseTracks, TableError> {
    let dir = dir.as_ref();
    let mut tracks = PhaseTracks::new();
    for label in PhaseLabel::ALL.into_iter().filter(|l| l.is_instant()) {
        let path = phase_table_path(dir, label);
        let track = read_phase_table(&path, label).map_err(|source| TableError::Phase {
            phase: label,
            path: path.clone(),
            source: Box::new(source),
        })?;
        tracks.insert(track);
    }
    Ok(tracks)
}

#[derive(Debug, Deserialize)]
struct LabelRow {
    frame: u32,
    label: String,
}

/// ラベルCSVの読み込み結果
#[derive(Debug, Clone, Default)]
pub struct LabelFile {
    pub labels: LabelMap,
    /// 認識できないラベルで捨てた行数
    pub unrecognized: usize,
}

/// `frame,label` のCSVを読む
///
/// 未知のラベルは warn を出して捨てる。同じフレームが複数回出たら後勝ち。
pub fn read_label_map<P: AsRef<Path>>(path: P) -> Result<LabelFile, TableError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = LabelFile::default();
    for row in reader.deserialize::<LabelRow>() {
        let row = row?;
        match row.label.parse::<PhaseLabel>() {
            Ok(label) => {
                if let Some(prev) = out.labels.insert(row.frame, label) {
                    tracing::warn!(
                        frame = row.frame,
                        %prev,
                        %label,
                        "frame labeled twice, keeping the later label"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(frame = row.frame, "{}", e);
                out.unrecognized += 1;
            }
        }
    }
    Ok(out)
}

pub fn write_label_map<P: AsRef<Path>>(path: P, labels: &LabelMap) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["frame", "label"])?;
    for (frame, label) in labels {
        writer.write_record([frame.to_string(), label.as_str().to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
