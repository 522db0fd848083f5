// 该文件是 Qiyu （旗语） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use chrono::{Datelike, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::TimedFrame,
  output::{JsonReportError, Render, draw::Draw, json_report::DecodeReport},
  session::FrameDecode,
  url_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录序列化错误: {0}")]
  RecordError(#[from] serde_json::Error),
}

impl From<JsonReportError> for DirectoryRecordOutputError {
  fn from(err: JsonReportError) -> Self {
    match err {
      JsonReportError::IoError(e) => DirectoryRecordOutputError::IoError(e),
      JsonReportError::SerializeError(e) => DirectoryRecordOutputError::RecordError(e),
      JsonReportError::SchemeMismatch => DirectoryRecordOutputError::SchemeMismatch,
    }
  }
}

/// 按日期分目录保存标注帧
///
/// `folder:///path?record&always`：`record` 为每帧附带一个 JSON 解码记录；
/// 默认只保存解码出旗语的帧，`always` 保存所有帧。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: Draw,
  frame_counter: Mutex<u16>,
  record: bool,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let record = uri.query_pairs().any(|(k, _)| k == "record");
    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(url_path(uri)),
      draw: Draw::from_url(uri),
      frame_counter: Mutex::new(0),
      record,
      always,
    })
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl Into<PathBuf>, draw: Draw, record: bool, always: bool) -> Self {
    Self {
      directory: directory.into(),
      draw,
      frame_counter: Mutex::new(0),
      record,
      always,
    }
  }

  fn frame_id(&self) -> u16 {
    let mut counter = self.frame_counter.lock().unwrap_or_else(PoisonError::into_inner);
    *counter = counter.wrapping_add(1);
    *counter
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn write_record(path: &Path, report: &DecodeReport) -> Result<(), DirectoryRecordOutputError> {
    std::fs::write(path.with_extension("json"), serde_json::to_vec_pretty(report)?)?;
    Ok(())
  }
}

impl<const W: u32, const H: u32> Render<TimedFrame<W, H>, FrameDecode> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &TimedFrame<W, H>, result: &FrameDecode) -> Result<(), Self::Error> {
    if !self.always && result.signal.is_no_message() {
      return Ok(());
    }

    let path = self.frame_path()?;
    debug!("保存第 {} 帧到 {}", frame.index, path.display());
    self.draw.annotate(&frame.frame, &result.overlay).save(&path)?;
    if self.record {
      Self::write_record(&path, &DecodeReport::new(frame.index, result))?;
    }
    Ok(())
  }
}
