//! トラッカー出力 → フェーズテーブル → 解析結果CSV までの通し

use std::fs;
use std::path::Path;

use ndarray::Array3;

use pace_biomech::analysis::{AnalysisConfig, DeliveryAnalyzer};
use pace_biomech::error::AnalysisError;
use pace_biomech::pose::{JointIndex, LabelMap, PhaseLabel};
use pace_biomech::result::BiomechResult;
use pace_biomech::selection::{CandidateSelector, RawTrackedOutput};
use pace_biomech::table::{read_label_map, read_phase_tables, write_label_map, write_phase_tables};

/// 膝角度 `knee_deg` の投手姿勢。脚・体幹の線分は長さ 10
fn pitcher(knee_deg: f64) -> [[f64; 3]; JointIndex::COUNT] {
    let mut raw = [[0.0; 3]; JointIndex::COUNT];
    let r = knee_deg.to_radians();
    let ankle = [10.0 * r.sin(), 10.0 + 10.0 * r.cos(), 0.0];

    raw[JointIndex::LeftHip as usize] = [0.0, 20.0, 0.0];
    raw[JointIndex::LeftKnee as usize] = [0.0, 10.0, 0.0];
    raw[JointIndex::LeftAnkle as usize] = ankle;
    raw[JointIndex::RightHip as usize] = [0.0, 20.0, -10.0];
    raw[JointIndex::RightKnee as usize] = [0.0, 10.0, -10.0];
    raw[JointIndex::RightAnkle as usize] = [ankle[0] + 1.0, ankle[1], ankle[2]];
    raw[JointIndex::LeftFoot as usize] = [ankle[0], ankle[1], 0.5];
    raw[JointIndex::Head as usize] = [ankle[0], ankle[1] + 0.9, ankle[2]];

    raw[JointIndex::Pelvis as usize] = [0.0, 20.0, -5.0];
    raw[JointIndex::Spine3 as usize] = [0.0, 30.0, -5.0];
    raw[JointIndex::LeftCollar as usize] = [0.0, 32.0, 0.0];
    raw[JointIndex::RightCollar as usize] = [0.0, 32.0, -10.0];
    raw[JointIndex::LeftShoulder as usize] = [0.0, 33.0, 0.0];
    raw[JointIndex::RightShoulder as usize] = [0.0, 33.0, -10.0];
    raw[JointIndex::RightElbow as usize] = [0.0, 33.0, -20.0];
    raw[JointIndex::RightWrist as usize] = [0.0, 33.0, -30.0];
    raw[JointIndex::RightHand as usize] = [0.0, 33.0, 1.5];
    raw
}

/// 奥にいる小さな人物（BBox が必ず小さい）
fn bystander() -> [[f64; 3]; JointIndex::COUNT] {
    let mut raw = pitcher(180.0);
    for joint in raw.iter_mut() {
        for c in joint.iter_mut() {
            *c = *c * 0.01 + 100.0;
        }
    }
    raw
}

fn tracked_output(frames: &[u32]) -> RawTrackedOutput {
    let mut frame_idx = Vec::new();
    let mut id = Vec::new();
    let mut joints = Vec::new();
    for &frame in frames {
        let knee = match frame {
            40 => 150.0,
            41 => 160.0,
            42 => 170.0,
            _ => 165.0,
        };
        // 小さい人物を先に並べても大きい方が選ばれる
        for (track_id, pose) in [(7, bystander()), (2, pitcher(knee))] {
            frame_idx.push(frame);
            id.push(track_id);
            joints.extend(pose.iter().flatten().copied());
        }
    }
    let n = frame_idx.len();
    RawTrackedOutput {
        frame_idx,
        id,
        joints: Array3::from_shape_vec((n, JointIndex::COUNT, 3), joints).unwrap(),
    }
}

fn labels(with_release: bool) -> LabelMap {
    let mut labels = LabelMap::new();
    for frame in 35..40 {
        labels.insert(frame, PhaseLabel::Jump);
    }
    for frame in 40..43 {
        labels.insert(frame, PhaseLabel::BackFootContact);
    }
    labels.insert(47, PhaseLabel::FrontFootContact);
    if with_release {
        labels.insert(52, PhaseLabel::Release);
    }
    labels.insert(60, PhaseLabel::FollowThrough);
    labels
}

fn extract(dir: &Path, with_release: bool) {
    let raw_path = dir.join("tracked.json");
    let labels_path = dir.join("labels.csv");
    tracked_output(&[36, 40, 41, 42, 45, 47, 52, 60]).save(&raw_path).unwrap();
    write_label_map(&labels_path, &labels(with_release)).unwrap();

    let raw = RawTrackedOutput::load(&raw_path).unwrap();
    let label_file = read_label_map(&labels_path).unwrap();
    let (tracks, stats) =
        CandidateSelector::new().build_tracks(raw.detections().unwrap(), &label_file.labels);
    assert_eq!(stats.frames_seen, 8);
    assert_eq!(stats.frames_unlabeled, if with_release { 1 } else { 2 });
    write_phase_tables(dir.join("phases"), &tracks).unwrap();
}

#[test]
fn test_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    extract(dir.path(), true);

    for name in ["jump", "bfc", "ffc", "release", "followthrough"] {
        assert!(dir.path().join("phases").join(format!("{}.csv", name)).exists());
    }

    let tracks = read_phase_tables(dir.path().join("phases")).unwrap();
    assert_eq!(tracks.get(PhaseLabel::BackFootContact).len(), 3);

    let analyzer = DeliveryAnalyzer::new(AnalysisConfig::new(1.83)).unwrap();
    let result = analyzer.analyze(&tracks).unwrap();

    assert_eq!(result.bfc_frame, 40);
    assert_eq!(result.ffc_frame, 47);
    assert_eq!(result.release_frame, 52);
    assert!((result.back_knee_angle - 160.0).abs() < 1e-6);
    assert!((result.front_knee_angle - 165.0).abs() < 1e-6);
    assert!((result.stride_length_m - 1.83).abs() < 1e-6);
    assert!((result.stride_length_in - 72.05).abs() < 0.01);
    // 手のひら z=1.5, つま先 z=0.5
    assert!((result.delivery_reach_m - 1.83).abs() < 1e-6);
    assert!(result.max_elbow_deviation < 0.01);
    assert!(result.hip_shoulder_separation < 0.01);
    assert!(result.lateral_tilt.abs() < 1e-9);
    assert_eq!(result.alignment, "front-on");

    let out = dir.path().join("final_output").join("biomech_results.csv");
    result.write_csv(&out).unwrap();
    let first = fs::read(&out).unwrap();
    analyzer.analyze(&tracks).unwrap().write_csv(&out).unwrap();
    assert_eq!(fs::read(&out).unwrap(), first);

    assert_eq!(BiomechResult::read_csv(&out).unwrap(), result);
}

#[test]
fn test_pipeline_missing_release() {
    let dir = tempfile::tempdir().unwrap();
    extract(dir.path(), false);

    let tracks = read_phase_tables(dir.path().join("phases")).unwrap();
    let analyzer = DeliveryAnalyzer::new(AnalysisConfig::new(1.83)).unwrap();
    let err = analyzer.analyze(&tracks).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::MissingPhaseData {
            phase: PhaseLabel::Release
        }
    );

    // 失敗時は結果ファイルを作らない
    assert!(!dir.path().join("final_output").exists());
}

#[test]
fn test_pipeline_columnless_bfc_table() {
    let dir = tempfile::tempdir().unwrap();
    extract(dir.path(), true);
    let phases = dir.path().join("phases");
    let analyzer = DeliveryAnalyzer::new(AnalysisConfig::new(1.83)).unwrap();

    // 空フレームを書き出したときの形 (`""` の1行) と 0バイトのファイル
    for content in ["\"\"\n", ""] {
        fs::write(phases.join("bfc.csv"), content).unwrap();
        let tracks = read_phase_tables(&phases).unwrap();
        assert_eq!(
            analyzer.analyze(&tracks),
            Err(AnalysisError::MissingPhaseData {
                phase: PhaseLabel::BackFootContact
            })
        );
    }
}

#[test]
fn test_pipeline_missing_table_names_phase() {
    let dir = tempfile::tempdir().unwrap();
    extract(dir.path(), true);
    let phases = dir.path().join("phases");
    fs::remove_file(phases.join("ffc.csv")).unwrap();

    let err = read_phase_tables(&phases).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("front-foot-contact"), "{}", message);
    assert!(message.contains("ffc.csv"), "{}", message);
}
