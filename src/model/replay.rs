// 该文件是 Qiyu （旗语） 项目的一部分。
// src/model/replay.rs - 从 JSON Lines 文件回放检测结果
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

use std::{
  fs::File,
  io::{BufRead, BufReader, Lines},
  marker::PhantomData,
  sync::{Mutex, PoisonError},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{DetectItem, DetectResult, Model},
  url_path,
};

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("第 {line} 行解析失败: {source}")]
  ParseError {
    line: usize,
    source: serde_json::Error,
  },
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

#[derive(Debug, Deserialize)]
struct ReplayFrame {
  #[serde(default)]
  detections: Vec<ReplayDetection>,
}

#[derive(Debug, Deserialize)]
struct ReplayDetection {
  bbox: [f32; 4],
  score: f32,
  #[serde(default)]
  class_id: u32,
}

impl From<ReplayDetection> for DetectItem {
  fn from(detection: ReplayDetection) -> Self {
    DetectItem {
      class_id: detection.class_id,
      score: detection.score,
      bbox: detection.bbox,
    }
  }
}

struct ReplayState {
  lines: Lines<Box<dyn BufRead + Send>>,
  line_number: usize,
  exhausted: bool,
}

/// 按行回放预先录制的检测结果，每次推理消耗一行，忽略输入帧内容
///
/// 每行是一个 JSON 对象 `{"detections": [{"bbox": [x1, y1, x2, y2], "score": 0.9}]}`，
/// 空行表示该帧没有检测结果。文件读完后始终返回空结果。
///
/// 坐标是模型输入帧（`W x H`，非方形源图已等比缩放并居中补边）的像素坐标，
/// 与实时检测器输出的坐标空间一致。
pub struct ReplayDetector<Frame> {
  state: Mutex<ReplayState>,
  _phantom: PhantomData<fn(&Frame)>,
}

impl<Frame> FromUrlWithScheme for ReplayDetector<Frame> {
  const SCHEME: &'static str = "replay";
}

impl<Frame> FromUrl for ReplayDetector<Frame> {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayError::SchemeMismatch(format!(
        "期望方案 '{}', 实际方案 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = url_path(url);
    info!("打开检测回放文件: {}", path);
    let file = File::open(&path)?;
    Ok(Self::from_reader(BufReader::new(file)))
  }
}

impl<Frame> ReplayDetector<Frame> {
  pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
    let reader: Box<dyn BufRead + Send> = Box::new(reader);
    Self {
      state: Mutex::new(ReplayState {
        lines: reader.lines(),
        line_number: 0,
        exhausted: false,
      }),
      _phantom: PhantomData,
    }
  }

  fn next_frame(&self) -> Result<DetectResult, ReplayError> {
    let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(line) = state.lines.next() else {
      if !state.exhausted {
        warn!("检测回放文件已读完, 之后的帧都没有检测结果");
        state.exhausted = true;
      }
      return Ok(DetectResult::default());
    };
    state.line_number += 1;
    let line_number = state.line_number;
    let line = line?;

    let line = line.trim();
    if line.is_empty() {
      return Ok(DetectResult::default());
    }

    let frame: ReplayFrame = serde_json::from_str(line).map_err(|source| ReplayError::ParseError {
      line: line_number,
      source,
    })?;
    debug!("第 {} 行回放 {} 个检测框", line_number, frame.detections.len());

    Ok(
      frame
        .detections
        .into_iter()
        .map(DetectItem::from)
        .collect::<Vec<_>>()
        .into(),
    )
  }
}

impl<Frame> Model for ReplayDetector<Frame> {
  type Input = Frame;
  type Output = DetectResult;
  type Error = ReplayError;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.next_frame()
  }
}
