// 该文件是 Qiyu （旗语） 项目的一部分。
// src/input/v4l2_camera.rs - V4L2 摄像头输入
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

use std::pin::Pin;
use std::time::Instant;

use image::RgbImage;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{RgbNhwcFrame, TimedFrame},
  url_path, url_query,
};

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;
const CAPTURE_BUFFERS: u32 = 4;

#[derive(Error, Debug)]
pub enum CameraInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("无法打开设备 {0}: {1}")]
  OpenError(String, std::io::Error),
  #[error("设备格式设置失败: {0}")]
  FormatError(std::io::Error),
  #[error("无法创建捕获流: {0}")]
  StreamError(std::io::Error),
}

/// V4L2 摄像头
///
/// `v4l2:///dev/video1?fallback=/dev/video0`：主设备打不开时尝试备用设备。
/// 采集失败视为流结束。
pub struct CameraInput<const W: u32, const H: u32> {
  /// V4L2 设备（使用 Pin<Box> 固定内存位置）
  device: Pin<Box<Device>>,
  /// 捕获流（生命周期与 device 关联）
  stream: Option<Stream<'static>>,
  frame_index: u64,
  width: u32,
  height: u32,
  start_time: Instant,
}

impl<const W: u32, const H: u32> FromUrlWithScheme for CameraInput<W, H> {
  const SCHEME: &'static str = "v4l2";
}

impl<const W: u32, const H: u32> FromUrl for CameraInput<W, H> {
  type Error = CameraInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(CameraInputError::SchemeMismatch);
    }

    let primary = url_path(url);
    match Self::open(&primary) {
      Ok(camera) => Ok(camera),
      Err(e) => match url_query(url, "fallback") {
        Some(fallback) => {
          warn!("无法打开摄像头 {}: {}, 改用 {}", primary, e, fallback);
          Self::open(&fallback)
        }
        None => Err(e),
      },
    }
  }
}

impl<const W: u32, const H: u32> CameraInput<W, H> {
  pub fn open(device_path: &str) -> Result<Self, CameraInputError> {
    let device = Box::pin(
      Device::with_path(device_path)
        .map_err(|e| CameraInputError::OpenError(device_path.to_string(), e))?,
    );

    let mut format = device.format().map_err(CameraInputError::FormatError)?;
    format.width = CAPTURE_WIDTH;
    format.height = CAPTURE_HEIGHT;
    format.fourcc = FourCC::new(b"YUYV");
    let format = device.set_format(&format).map_err(CameraInputError::FormatError)?;
    info!(
      "摄像头 {} 已打开: {}x{}",
      device_path, format.width, format.height
    );

    let mut source = Self {
      device,
      stream: None,
      frame_index: 0,
      width: format.width,
      height: format.height,
      start_time: Instant::now(),
    };

    // SAFETY: device 被 Pin<Box> 固定在堆上不会移动；stream 在 Drop 中先于 device 释放
    let device_ref: &Device = &source.device;
    let stream = unsafe {
      let device_static: &'static Device = std::mem::transmute(device_ref);
      Stream::with_buffers(device_static, Type::VideoCapture, CAPTURE_BUFFERS)
        .map_err(CameraInputError::StreamError)?
    };

    source.stream = Some(stream);
    Ok(source)
  }
}

/// 将 YUYV 格式转换为 RGB
fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Vec<u8> {
  let mut rgb = Vec::with_capacity((width * height * 3) as usize);

  for chunk in yuyv.chunks_exact(4) {
    let y0 = chunk[0] as f32;
    let u = chunk[1] as f32 - 128.0;
    let y1 = chunk[2] as f32;
    let v = chunk[3] as f32 - 128.0;

    for y in [y0, y1] {
      let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
      let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
      let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
      rgb.extend_from_slice(&[r, g, b]);
    }
  }

  rgb
}

impl<const W: u32, const H: u32> Drop for CameraInput<W, H> {
  fn drop(&mut self) {
    // 确保 stream 在 device 之前被 drop
    self.stream.take();
  }
}

impl<const W: u32, const H: u32> Iterator for CameraInput<W, H> {
  type Item = TimedFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    let stream = self.stream.as_mut()?;

    let rgb = match stream.next() {
      Ok((buffer, _meta)) => yuyv_to_rgb(buffer, self.width, self.height),
      Err(e) => {
        error!("无法捕获帧: {}", e);
        return None;
      }
    };
    let Some(image) = RgbImage::from_raw(self.width, self.height, rgb) else {
      error!("摄像头数据长度与 {}x{} 不符", self.width, self.height);
      return None;
    };

    let frame = TimedFrame::new(
      self.frame_index,
      self.start_time.elapsed(),
      RgbNhwcFrame::from_rgb_image(&image),
    );
    self.frame_index += 1;
    Some(frame)
  }
}
