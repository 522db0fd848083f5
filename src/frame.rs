// 该文件是 Qiyu （旗语） 项目的一部分。
// src/frame.rs - NHWC 帧定义
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

use std::time::Duration;

use thiserror::Error;

use crate::input::AsNhwcFrame;

const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 固定尺寸的 RGB 帧，按 NHWC 排列
#[derive(Debug, Clone)]
pub struct RgbNhwcFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

impl<const W: u32, const H: u32> RgbNhwcFrame<W, H> {
  pub const BYTES: usize = RGB_CHANNELS * W as usize * H as usize;

  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }
}

impl<const W: u32, const H: u32> TryFrom<Vec<u8>> for RgbNhwcFrame<W, H> {
  type Error = FrameError;

  fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
    if data.len() != Self::BYTES {
      return Err(FrameError::LengthMismatch {
        expected: Self::BYTES,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const W: u32, const H: u32> Default for RgbNhwcFrame<W, H> {
  fn default() -> Self {
    Self {
      data: vec![0u8; Self::BYTES].into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> AsMut<[u8]> for RgbNhwcFrame<W, H> {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsNhwcFrame for RgbNhwcFrame<W, H> {
  fn as_nhwc(&self) -> &[u8] {
    &self.data
  }
}

/// 带序号与流内时间戳的帧
///
/// 时间戳是相对于流开始的单调时间，去抖动逻辑以它为准。
#[derive(Debug, Clone)]
pub struct TimedFrame<const W: u32, const H: u32> {
  pub index: u64,
  pub timestamp: Duration,
  pub frame: RgbNhwcFrame<W, H>,
}

impl<const W: u32, const H: u32> TimedFrame<W, H> {
  pub fn new(index: u64, timestamp: Duration, frame: RgbNhwcFrame<W, H>) -> Self {
    Self {
      index,
      timestamp,
      frame,
    }
  }
}

#[cfg(feature = "image")]
mod rgb_image {
  use image::{RgbImage, imageops::FilterType};
  use tracing::debug;

  use super::RgbNhwcFrame;

  /// 等比缩放后居中放入 `W x H` 画布时的尺寸与偏移 `(width, height, x, y)`
  pub(crate) fn letterbox<const W: u32, const H: u32>(width: u32, height: u32) -> (u32, u32, u32, u32) {
    if width == 0 || height == 0 {
      return (0, 0, 0, 0);
    }
    let scale = (W as f64 / width as f64).min(H as f64 / height as f64);
    let scaled_w = ((width as f64 * scale).round() as u32).clamp(1, W);
    let scaled_h = ((height as f64 * scale).round() as u32).clamp(1, H);
    (scaled_w, scaled_h, (W - scaled_w) / 2, (H - scaled_h) / 2)
  }

  impl<const W: u32, const H: u32> RgbNhwcFrame<W, H> {
    /// 从任意尺寸的图像构造帧
    ///
    /// 尺寸不一致时保持宽高比缩放并居中补黑边。源图中心与帧中心重合，
    /// 旗帜相对中心的方位不变。
    pub fn from_rgb_image(image: &RgbImage) -> Self {
      if image.dimensions() == (W, H) {
        return Self {
          data: image.as_raw().clone().into_boxed_slice(),
        };
      }

      let (width, height) = image.dimensions();
      let (scaled_w, scaled_h, x, y) = letterbox::<W, H>(width, height);
      debug!("图像尺寸 {}x{} 等比缩放到 {}x{}, 偏移 ({}, {})", width, height, scaled_w, scaled_h, x, y);

      let mut canvas = RgbImage::new(W, H);
      if scaled_w > 0 && scaled_h > 0 {
        if (scaled_w, scaled_h) == (width, height) {
          image::imageops::overlay(&mut canvas, image, x as i64, y as i64);
        } else {
          let resized = image::imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle);
          image::imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
        }
      }
      Self {
        data: canvas.into_raw().into_boxed_slice(),
      }
    }

    pub fn to_rgb_image(&self) -> RgbImage {
      // 数据长度在构造时已经校验
      RgbImage::from_raw(W, H, self.data.to_vec()).unwrap_or_else(|| RgbImage::new(W, H))
    }
  }
}
