use anyhow::{bail, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::geometry::Axis;
use crate::pose::Side;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub subject: SubjectConfig,
    #[serde(default)]
    pub convention: ConventionConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// 被験者（投手）の実測値
#[derive(Debug, Deserialize, Clone)]
pub struct SubjectConfig {
    /// 実身長（メートル）
    #[serde(default = "default_height_m")]
    pub height_m: f64,
}

/// 座標系・左右の取り決め
#[derive(Debug, Deserialize, Clone)]
pub struct ConventionConfig {
    /// 投球方向の軸。姿勢分類の基準とリーチ計測に使う
    #[serde(default = "default_delivery_axis")]
    pub delivery_axis: Axis,
    /// 側屈角を atan2(v[0], v[1]) で測る2軸
    #[serde(default = "default_tilt_axes")]
    pub tilt_axes: [Axis; 2],
    /// BFC で膝角度を測る脚
    #[serde(default = "default_back_leg")]
    pub back_leg: Side,
    /// FFC / Release で使う前脚（前足つま先、身長推定の足首もこちら）
    #[serde(default = "default_front_leg")]
    pub front_leg: Side,
    /// 投球腕
    #[serde(default = "default_bowling_arm")]
    pub bowling_arm: Side,
}

/// 入出力パス
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// デコード済みトラッカー出力 (JSON)
    #[serde(default = "default_raw_output")]
    pub raw_output: PathBuf,
    /// フレーム→フェーズのラベルCSV
    #[serde(default = "default_labels")]
    pub labels: PathBuf,
    /// フェーズ別テーブルの出力先
    #[serde(default = "default_phases_dir")]
    pub phases_dir: PathBuf,
    /// 解析結果CSV
    #[serde(default = "default_result")]
    pub result: PathBuf,
}

fn default_height_m() -> f64 { 1.83 }
fn default_delivery_axis() -> Axis { Axis::Z }
fn default_tilt_axes() -> [Axis; 2] { [Axis::X, Axis::Y] }
fn default_back_leg() -> Side { Side::Left }
fn default_front_leg() -> Side { Side::Left }
fn default_bowling_arm() -> Side { Side::Right }
fn default_raw_output() -> PathBuf { PathBuf::from("results/tracked.json") }
fn default_labels() -> PathBuf { PathBuf::from("segments/labels.csv") }
fn default_phases_dir() -> PathBuf { PathBuf::from("phases") }
fn default_result() -> PathBuf { PathBuf::from("final_output/biomech_results.csv") }

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            height_m: default_height_m(),
        }
    }
}

impl Default for ConventionConfig {
    fn default() -> Self {
        Self {
            delivery_axis: default_delivery_axis(),
            tilt_axes: default_tilt_axes(),
            back_leg: default_back_leg(),
            front_leg: default_front_leg(),
            bowling_arm: default_bowling_arm(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_output: default_raw_output(),
            labels: default_labels(),
            phases_dir: default_phases_dir(),
            result: default_result(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルが無ければデフォルト
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "config not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let h = self.subject.height_m;
        if !h.is_finite() || h <= 0.0 {
            bail!("subject.height_m must be a positive number, got {}", h);
        }
        let [a, b] = self.convention.tilt_axes;
        if a == b {
            bail!("convention.tilt_axes must name two different axes");
        }
        Ok(())
    }
}
