// 该文件是 Qiyu （旗语） 项目的一部分。
// src/output/json_report.rs - JSON Lines 解码报告
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
  io::{BufWriter, Write},
  path::Path,
  sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::TimedFrame,
  output::Render,
  semaphore::Emission,
  session::FrameDecode,
  url_path,
};

#[derive(Error, Debug)]
pub enum JsonReportError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 单帧报告，字段与轮询接口返回的 `{message, history}` 一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeReport {
  pub frame: u64,
  pub timestamp_ms: u64,
  pub message: String,
  pub history: Vec<String>,
  pub accepted: bool,
}

impl DecodeReport {
  pub fn new(frame: u64, decoded: &FrameDecode) -> Self {
    Self {
      frame,
      timestamp_ms: decoded.timestamp.as_millis() as u64,
      message: decoded.message(),
      history: decoded.history_strings(),
      accepted: decoded.emission == Some(Emission::Accepted),
    }
  }
}

/// 每帧追加一行 JSON
pub struct JsonReportOutput {
  writer: Mutex<BufWriter<File>>,
}

impl FromUrlWithScheme for JsonReportOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonReportOutput {
  type Error = JsonReportError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonReportError::SchemeMismatch);
    }
    Self::create(url_path(url))
  }
}

impl JsonReportOutput {
  pub fn create(path: impl AsRef<Path>) -> Result<Self, JsonReportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    info!("解码报告写入: {}", path.display());
    Ok(Self {
      writer: Mutex::new(BufWriter::new(File::create(path)?)),
    })
  }

  pub fn write_report(&self, report: &DecodeReport) -> Result<(), JsonReportError> {
    let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
    serde_json::to_writer(&mut *writer, report)?;
    writer.write_all(b"\n")?;
    // 逐帧刷新，便于其他进程实时读取
    writer.flush()?;
    Ok(())
  }
}

impl<const W: u32, const H: u32> Render<TimedFrame<W, H>, FrameDecode> for JsonReportOutput {
  type Error = JsonReportError;

  fn render_result(&self, frame: &TimedFrame<W, H>, result: &FrameDecode) -> Result<(), Self::Error> {
    self.write_report(&DecodeReport::new(frame.index, result))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::semaphore::{DecodedSignal, Overlay, Symbol};
  use std::time::Duration;

  #[test]
  fn writes_one_line_per_frame() {
    let path = std::env::temp_dir().join(format!("qiyu-report-{}.jsonl", std::process::id()));
    let output = JsonReportOutput::create(&path).unwrap();
    let decoded = FrameDecode {
      timestamp: Duration::from_millis(1500),
      signal: DecodedSignal::Symbol(Symbol::Unknown),
      emission: Some(Emission::Accepted),
      overlay: Overlay::default(),
      history: vec![Symbol::Letter('A'), Symbol::Unknown],
    };
    let frame = TimedFrame::<2, 2>::new(7, decoded.timestamp, Default::default());
    output.render_result(&frame, &decoded).unwrap();
    output.render_result(&frame, &decoded).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let report: DecodeReport = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(
      report,
      DecodeReport {
        frame: 7,
        timestamp_ms: 1500,
        message: "?".to_string(),
        history: vec!["A".to_string(), "?".to_string()],
        accepted: true,
      }
    );
    std::fs::remove_file(&path).unwrap();
  }
}
