// 该文件是 Qiyu （旗语） 项目的一部分。
// src/model.rs - 旗帜检测模型
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

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::RgbNhwcFrame};

/// 检测适配器：对一帧图像给出候选旗帜框
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  pub class_id: u32,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，像素坐标
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

mod replay;
pub use self::replay::{ReplayDetector, ReplayError};

#[cfg(feature = "model_yolo26")]
mod yolo26;
#[cfg(feature = "model_yolo26")]
pub use self::yolo26::{Yolo26, Yolo26Builder, Yolo26Error};

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("检测回放错误: {0}")]
  ReplayError(#[from] ReplayError),
  #[cfg(feature = "model_yolo26")]
  #[error("YOLO26 模型错误: {0}")]
  Yolo26Error(#[from] Yolo26Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 根据 URL 方案选择的检测模型
pub enum ModelWrapper<const W: u32, const H: u32> {
  Replay(ReplayDetector<RgbNhwcFrame<W, H>>),
  #[cfg(feature = "model_yolo26")]
  Yolo26(Yolo26<RgbNhwcFrame<W, H>>),
}

impl<const W: u32, const H: u32> FromUrl for ModelWrapper<W, H> {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() == ReplayDetector::<RgbNhwcFrame<W, H>>::SCHEME {
      return Ok(ModelWrapper::Replay(ReplayDetector::from_url(url)?));
    }
    #[cfg(feature = "model_yolo26")]
    {
      if url.scheme() == Yolo26Builder::SCHEME {
        let model = Yolo26Builder::from_url(url)?.build()?;
        return Ok(ModelWrapper::Yolo26(model));
      }
    }
    Err(ModelError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl<const W: u32, const H: u32> Model for ModelWrapper<W, H> {
  type Input = RgbNhwcFrame<W, H>;
  type Output = DetectResult;
  type Error = ModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    match self {
      ModelWrapper::Replay(model) => model.infer(input).map_err(ModelError::from),
      #[cfg(feature = "model_yolo26")]
      ModelWrapper::Yolo26(model) => model.infer(input).map_err(ModelError::from),
    }
  }
}
