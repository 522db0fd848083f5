// 该文件是 Qiyu （旗语） 项目的一部分。
// src/output.rs - 输出定义
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

use std::convert::Infallible;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::TimedFrame, semaphore::Emission, session::FrameDecode};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

#[cfg(any(feature = "save_image_file", feature = "directory_record"))]
pub mod draw;

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

mod json_report;
pub use self::json_report::{DecodeReport, JsonReportError, JsonReportOutput};

/// 只写日志的输出，适合无界面运行
#[derive(Debug, Default)]
pub struct LogOutput;

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(LogOutput)
  }
}

impl<const W: u32, const H: u32> Render<TimedFrame<W, H>, FrameDecode> for LogOutput {
  type Error = Infallible;

  fn render_result(&self, frame: &TimedFrame<W, H>, result: &FrameDecode) -> Result<(), Self::Error> {
    if result.emission == Some(Emission::Accepted) {
      let history: String = result.history_strings().concat();
      info!("帧 {}: 新符号 {}, 历史: {}", frame.index, result.signal, history);
    }
    Ok(())
  }
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "save_image_file")]
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("解码报告错误: {0}")]
  JsonReportError(#[from] JsonReportError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl From<Infallible> for OutputError {
  fn from(err: Infallible) -> Self {
    match err {}
  }
}

pub enum OutputWrapper {
  #[cfg(feature = "save_image_file")]
  SaveImageFileOutput(SaveImageFileOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
  JsonReportOutput(JsonReportOutput),
  LogOutput(LogOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "save_image_file")]
    if url.scheme() == SaveImageFileOutput::SCHEME {
      return Ok(OutputWrapper::SaveImageFileOutput(SaveImageFileOutput::from_url(url)?));
    }
    #[cfg(feature = "directory_record")]
    if url.scheme() == DirectoryRecordOutput::SCHEME {
      return Ok(OutputWrapper::DirectoryRecordOutput(DirectoryRecordOutput::from_url(url)?));
    }
    if url.scheme() == JsonReportOutput::SCHEME {
      return Ok(OutputWrapper::JsonReportOutput(JsonReportOutput::from_url(url)?));
    }
    if url.scheme() == LogOutput::SCHEME {
      return Ok(OutputWrapper::LogOutput(LogOutput));
    }
    Err(OutputError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl<const W: u32, const H: u32> Render<TimedFrame<W, H>, FrameDecode> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &TimedFrame<W, H>, result: &FrameDecode) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::JsonReportOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::LogOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}
