// 该文件是 Qiyu （旗语） 项目的一部分。
// tests/replay_pipeline.rs - 回放检测结果的完整流水线测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{path::PathBuf, time::Duration};

use url::Url;

use qiyu::{
  FromUrl,
  frame::TimedFrame,
  model::{ModelError, ModelWrapper, ReplayError},
  output::{DecodeReport, JsonReportOutput, OutputWrapper},
  semaphore::Symbol,
  session::SharedSession,
  task::{ContinuousTask, Task},
};

// 640x480 画面，中心 (320, 240)
const SPREAD_ARMS: &str = r#"{"detections":[{"bbox":[30,230,50,250],"score":0.9},{"bbox":[590,230,610,250],"score":0.8}]}"#;
const RAISED_ARMS: &str = r#"{"detections":[{"bbox":[210,130,230,150],"score":0.9,"class_id":0},{"bbox":[410,130,430,150],"score":0.9,"class_id":0}]}"#;
const RAISED_ARMS_WITH_NOISE: &str = r#"{"detections":[{"bbox":[210,130,230,150],"score":0.9},{"bbox":[300,400,320,420],"score":0.3},{"bbox":[410,130,430,150],"score":0.9}]}"#;
const THREE_FLAGS: &str = r#"{"detections":[{"bbox":[210,130,230,150],"score":0.9},{"bbox":[300,400,320,420],"score":0.7},{"bbox":[410,130,430,150],"score":0.9}]}"#;

fn scratch(name: &str) -> PathBuf {
  let dir = std::env::temp_dir().join(format!("qiyu-pipeline-{}-{}", name, std::process::id()));
  let _ = std::fs::remove_dir_all(&dir);
  std::fs::create_dir_all(&dir).unwrap();
  dir
}

fn frames(timestamps_ms: &[u64]) -> Vec<TimedFrame<640, 480>> {
  timestamps_ms
    .iter()
    .enumerate()
    .map(|(i, &t)| TimedFrame::new(i as u64, Duration::from_millis(t), Default::default()))
    .collect()
}

fn read_reports(path: &PathBuf) -> Vec<DecodeReport> {
  std::fs::read_to_string(path)
    .unwrap()
    .lines()
    .map(|line| serde_json::from_str(line).unwrap())
    .collect()
}

#[test]
fn replayed_stream_builds_debounced_history() {
  let dir = scratch("history");
  let replay = dir.join("detections.jsonl");
  let lines = [
    SPREAD_ARMS,
    SPREAD_ARMS,
    "",
    RAISED_ARMS,
    RAISED_ARMS_WITH_NOISE,
    RAISED_ARMS,
    THREE_FLAGS,
    SPREAD_ARMS,
  ];
  std::fs::write(&replay, lines.join("\n")).unwrap();
  let report = dir.join("report.jsonl");

  let model_url = Url::parse(&format!("replay://{}", replay.display())).unwrap();
  let model = ModelWrapper::<640, 480>::from_url(&model_url).unwrap();
  let output = JsonReportOutput::create(&report).unwrap();
  let task = ContinuousTask::new(SharedSession::default());
  let session = task.session();

  task
    .run_task(
      frames(&[0, 400, 800, 1200, 1600, 2200, 2400, 3000]).into_iter(),
      model,
      output,
    )
    .unwrap();

  let reports = read_reports(&report);
  let messages: Vec<_> = reports.iter().map(|r| r.message.as_str()).collect();
  assert_eq!(
    messages,
    ["E", "E", "No message detected", "D", "D", "D", "No message detected", "E"]
  );
  let accepted: Vec<_> = reports.iter().map(|r| r.accepted).collect();
  assert_eq!(accepted, [true, false, false, true, false, false, false, true]);
  assert_eq!(reports[4].history, ["E", "D"]);
  assert_eq!(reports[7].timestamp_ms, 3000);
  assert_eq!(reports[7].history, ["E", "D", "E"]);

  assert_eq!(
    session.history(),
    vec![Symbol::Letter('E'), Symbol::Letter('D'), Symbol::Letter('E')]
  );

  std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn history_keeps_the_ten_most_recent_symbols() {
  let dir = scratch("capacity");
  let replay = dir.join("detections.jsonl");
  let lines: Vec<_> = (0..12)
    .map(|i| if i % 2 == 0 { SPREAD_ARMS } else { RAISED_ARMS })
    .collect();
  std::fs::write(&replay, lines.join("\n")).unwrap();
  let report = dir.join("report.jsonl");

  let model_url = Url::parse(&format!("replay://{}", replay.display())).unwrap();
  let output_url = Url::parse(&format!("jsonl://{}", report.display())).unwrap();
  let timestamps: Vec<u64> = (0..12).map(|i| i * 1000).collect();

  ContinuousTask::default()
    .run_task(
      frames(&timestamps).into_iter(),
      ModelWrapper::<640, 480>::from_url(&model_url).unwrap(),
      OutputWrapper::from_url(&output_url).unwrap(),
    )
    .unwrap();

  let reports = read_reports(&report);
  assert_eq!(reports.len(), 12);
  assert!(reports.iter().all(|r| r.accepted));
  let last = &reports[11].history;
  assert_eq!(last.len(), 10);
  assert_eq!(last.first().map(String::as_str), Some("E"));
  assert_eq!(last.last().map(String::as_str), Some("D"));

  std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn malformed_replay_line_stops_the_stream() {
  let dir = scratch("malformed");
  let replay = dir.join("detections.jsonl");
  std::fs::write(&replay, format!("{}\nnot json\n{}", SPREAD_ARMS, SPREAD_ARMS)).unwrap();
  let report = dir.join("report.jsonl");

  let model_url = Url::parse(&format!("replay://{}", replay.display())).unwrap();
  let result = ContinuousTask::default().run_task(
    frames(&[0, 1000, 2000]).into_iter(),
    ModelWrapper::<640, 480>::from_url(&model_url).unwrap(),
    JsonReportOutput::create(&report).unwrap(),
  );

  let err = result.unwrap_err();
  assert!(matches!(
    err.downcast_ref::<ModelError>(),
    Some(ModelError::ReplayError(ReplayError::ParseError { line: 2, .. }))
  ));
  assert_eq!(read_reports(&report).len(), 1);

  std::fs::remove_dir_all(&dir).unwrap();
}
