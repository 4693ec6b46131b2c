use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 1回の投球解析の結果（CSV 1行）
///
/// 列名はオーバーレイ描画・フィードバック生成側が参照するキーそのもの。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomechResult {
    #[serde(rename = "Frame_BFC")]
    pub bfc_frame: u32,
    /// BFC 全フレームの後ろ脚膝角度の平均（度）
    #[serde(rename = "Back_Knee_Angle_BFC")]
    pub back_knee_angle: f64,

    #[serde(rename = "Frame_FFC")]
    pub ffc_frame: u32,
    #[serde(rename = "Stride_Length_m")]
    pub stride_length_m: f64,
    #[serde(rename = "Stride_Length_in")]
    pub stride_length_in: f64,
    #[serde(rename = "Alignment")]
    pub alignment: String,

    /// FFC〜Release での 180° からの肘角度ずれの最大値（度）
    #[serde(rename = "Max_Elbow_Angle")]
    pub max_elbow_deviation: f64,
    /// FFC〜Release での腰肩捻転差の平均（度）
    #[serde(rename = "Hip_Shoulder_Separation")]
    pub hip_shoulder_separation: f64,

    #[serde(rename = "Frame_Release")]
    pub release_frame: u32,
    #[serde(rename = "Front_Knee_Angle_Release")]
    pub front_knee_angle: f64,
    #[serde(rename = "Delivery_Reach_m")]
    pub delivery_reach_m: f64,
    #[serde(rename = "Delivery_Reach_in")]
    pub delivery_reach_in: f64,
    #[serde(rename = "Lateral_Flexion")]
    pub lateral_tilt: f64,
}

impl BiomechResult {
    /// ヘッダ + 1行で書き出す。一時ファイルに書いてから rename するので途中状態は残らない
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = Path::new(&tmp);

        {
            let mut writer = csv::Writer::from_path(tmp)
                .with_context(|| format!("Failed to open {}", tmp.display()))?;
            writer.serialize(self)?;
            writer.flush()?;
        }
        fs::rename(tmp, path)
            .with_context(|| format!("Failed to move result into {}", path.display()))?;
        Ok(())
    }

    /// 結果CSVの先頭行を読む
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let row = reader
            .deserialize::<BiomechResult>()
            .next()
            .context("Result file has no data row")??;
        Ok(row)
    }

    /// 各アンカーフレームに重ねる注記行（描画は外部）
    pub fn annotations(&self) -> BTreeMap<u32, Vec<String>> {
        let groups = [
            (
                self.bfc_frame,
                vec![format!("Back Knee Flexion: {:.1} deg", self.back_knee_angle)],
            ),
            (
                self.ffc_frame,
                vec![
                    format!(
                        "Stride Length: {:.2} m ({:.1} in)",
                        self.stride_length_m, self.stride_length_in
                    ),
                    format!("Alignment: {}", self.alignment),
                ],
            ),
            (
                self.release_frame,
                vec![
                    format!("Elbow Angle: {:.1} deg", self.max_elbow_deviation),
                    format!("Hip-Shoulder Separation: {:.1} deg", self.hip_shoulder_separation),
                    format!("Front Knee Angle: {:.1} deg", self.front_knee_angle),
                    format!("Delivery Reach: {:.2} m", self.delivery_reach_m),
                    format!("Lateral Flexion: {:.1} deg", self.lateral_tilt),
                ],
            ),
        ];

        // 同じフレームに複数フェーズが重なったら順に追記
        let mut out: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for (frame, lines) in groups {
            out.entry(frame).or_default().extend(lines);
        }
        out
    }
}

impl fmt::Display for BiomechResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BFC (frame {})", self.bfc_frame)?;
        writeln!(f, "  Back Knee Angle Avg: {:.2}°", self.back_knee_angle)?;
        writeln!(f, "FFC (frame {})", self.ffc_frame)?;
        writeln!(
            f,
            "  Stride Length: {:.2} m / {:.2} in",
            self.stride_length_m, self.stride_length_in
        )?;
        writeln!(f, "  Alignment: {}", self.alignment)?;
        writeln!(f, "FFC..Release")?;
        writeln!(f, "  Max Elbow Deviation: {:.2}°", self.max_elbow_deviation)?;
        writeln!(f, "  Hip-Shoulder Separation Avg: {:.2}°", self.hip_shoulder_separation)?;
        writeln!(f, "Release (frame {})", self.release_frame)?;
        writeln!(f, "  Front Knee Angle: {:.2}°", self.front_knee_angle)?;
        writeln!(
            f,
            "  Delivery Reach: {:.2} m / {:.2} in",
            self.delivery_reach_m, self.delivery_reach_in
        )?;
        write!(f, "  Lateral Flexion: {:.2}°", self.lateral_tilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BiomechResult {
        BiomechResult {
            bfc_frame: 41,
            back_knee_angle: 160.0,
            ffc_frame: 47,
            stride_length_m: 1.83,
            stride_length_in: 72.047283,
            alignment: "mixed (side-on/front-on)".to_string(),
            max_elbow_deviation: 12.5,
            hip_shoulder_separation: 28.25,
            release_frame: 52,
            front_knee_angle: 171.0,
            delivery_reach_m: 0.61,
            delivery_reach_in: 24.0,
            lateral_tilt: -8.5,
        }
    }

    #[test]
    fn test_csv_header_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("biomech_results.csv");
        sample().write_csv(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "Frame_BFC,Back_Knee_Angle_BFC,Frame_FFC,Stride_Length_m,Stride_Length_in,\
             Alignment,Max_Elbow_Angle,Hip_Shoulder_Separation,Frame_Release,\
             Front_Knee_Angle_Release,Delivery_Reach_m,Delivery_Reach_in,Lateral_Flexion"
        );
        assert_eq!(text.lines().count(), 2);
        assert!(!dir.path().join("out").join("biomech_results.csv.tmp").exists());
    }

    #[test]
    fn test_csv_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biomech_results.csv");
        let result = sample();
        result.write_csv(&path).unwrap();
        assert_eq!(BiomechResult::read_csv(&path).unwrap(), result);
    }

    #[test]
    fn test_annotations_per_anchor_frame() {
        let notes = sample().annotations();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[&41], vec!["Back Knee Flexion: 160.0 deg".to_string()]);
        assert_eq!(notes[&47][1], "Alignment: mixed (side-on/front-on)");
        assert_eq!(notes[&52].len(), 5);
        assert_eq!(notes[&52][3], "Delivery Reach: 0.61 m");
    }

    #[test]
    fn test_annotations_merge_shared_frame() {
        let mut result = sample();
        result.release_frame = result.ffc_frame;
        let notes = result.annotations();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[&47].len(), 7);
    }
}
