use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pace_biomech::config::Config;
use pace_biomech::selection::{CandidateSelector, RawTrackedOutput};
use pace_biomech::table::{read_label_map, write_phase_tables};

const CONFIG_PATH: &str = "config.toml";

/// トラッカー出力とフレームラベルからフェーズ別テーブルを作る
#[derive(Parser, Debug)]
#[command(name = "extract_phases", version)]
struct Cli {
    /// 設定ファイル
    #[arg(short, long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// デコード済みトラッカー出力 (JSON)
    #[arg(long)]
    raw: Option<PathBuf>,

    /// フレーム→フェーズのラベルCSV
    #[arg(long)]
    labels: Option<PathBuf>,

    /// 出力ディレクトリ
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    pace_biomech::init_logging();
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let raw_path = cli.raw.unwrap_or(config.paths.raw_output);
    let labels_path = cli.labels.unwrap_or(config.paths.labels);
    let out_dir = cli.out_dir.unwrap_or(config.paths.phases_dir);

    println!("=== フェーズ抽出 ===");
    println!("  入力: {}", raw_path.display());
    println!("  ラベル: {}", labels_path.display());
    println!("  出力先: {}", out_dir.display());
    println!();

    println!("[1/3] 読み込み");
    let raw = RawTrackedOutput::load(&raw_path)?;
    if raw.is_empty() {
        tracing::warn!(path = %raw_path.display(), "tracked output has no detections");
    }
    println!("  検出行: {}", raw.len());
    let detections = raw.detections()?;
    let label_file = read_label_map(&labels_path)
        .with_context(|| format!("Failed to read {}", labels_path.display()))?;
    println!(
        "  ラベル: {} フレーム (不明ラベル {} 行)",
        label_file.labels.len(),
        label_file.unrecognized
    );

    println!("[2/3] 主被写体の選択");
    let (tracks, stats) = CandidateSelector::new().build_tracks(detections, &label_file.labels);
    println!(
        "  フレーム: {} / 採用: {} / ラベル無し: {} / 同値: {}",
        stats.frames_seen, stats.frames_selected, stats.frames_unlabeled, stats.ambiguous_frames
    );

    println!("[3/3] 書き出し");
    write_phase_tables(&out_dir, &tracks)?;
    for track in tracks.iter() {
        println!("  {}: {} フレーム", track.label, track.len());
    }
    println!();
    println!("保存しました: {}", out_dir.display());
    Ok(())
}
