use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pace_biomech::analysis::{AnalysisConfig, DeliveryAnalyzer};
use pace_biomech::config::Config;
use pace_biomech::pose::PhaseLabel;
use pace_biomech::table::read_phase_tables;

const CONFIG_PATH: &str = "config.toml";

/// BFC / FFC / Release のフェーズテーブルから投球の指標を算出する
#[derive(Parser, Debug)]
#[command(name = "pace-biomech", version)]
struct Cli {
    /// 設定ファイル
    #[arg(short, long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// フェーズテーブルのディレクトリ（設定の paths.phases_dir を上書き）
    #[arg(long)]
    phases_dir: Option<PathBuf>,

    /// 結果CSVの出力先（設定の paths.result を上書き）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 投手の実身長 [m]（設定の subject.height_m を上書き）
    #[arg(long)]
    height: Option<f64>,
}

fn main() -> Result<()> {
    pace_biomech::init_logging();
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(dir) = cli.phases_dir {
        config.paths.phases_dir = dir;
    }
    if let Some(output) = cli.output {
        config.paths.result = output;
    }
    if let Some(height) = cli.height {
        config.subject.height_m = height;
    }
    config.validate()?;

    println!("=== Pace Biomech ===");
    println!("  フェーズ: {}", config.paths.phases_dir.display());
    println!("  出力先: {}", config.paths.result.display());
    println!("  実身長: {} m", config.subject.height_m);
    println!();

    println!("[1/3] フェーズテーブル読み込み");
    let tracks = read_phase_tables(&config.paths.phases_dir).with_context(|| {
        format!("Failed to read phase tables from {}", config.paths.phases_dir.display())
    })?;
    for label in PhaseLabel::ALL.into_iter().filter(|l| l.is_instant()) {
        println!("  {}: {} フレーム", label, tracks.get(label).len());
    }

    println!("[2/3] 解析");
    let analyzer = DeliveryAnalyzer::new(AnalysisConfig::from_config(&config))?;
    let result = analyzer.analyze(&tracks)?;

    println!("[3/3] 書き出し");
    result.write_csv(&config.paths.result)?;
    println!();
    println!("{}", result);
    println!();
    println!("フレーム注記:");
    for (frame, lines) in result.annotations() {
        println!("  frame {}", frame);
        for line in lines {
            println!("    {}", line);
        }
    }
    println!();
    println!("保存しました: {}", config.paths.result.display());
    Ok(())
}
