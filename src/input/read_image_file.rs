// 该文件是 Qiyu （旗语） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{RgbNhwcFrame, TimedFrame},
  url_path,
};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 单张图片，作为只有一帧、时间戳为 0 的流
pub struct ImageFileInput<const W: u32, const H: u32> {
  image: Option<RgbImage>,
}

impl<const W: u32, const H: u32> FromUrlWithScheme for ImageFileInput<W, H> {
  const SCHEME: &'static str = "image";
}

impl<const W: u32, const H: u32> FromUrl for ImageFileInput<W, H> {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url_path(url);
    info!("读取图像文件: {}", path);
    let image = ImageReader::open(&path)?.decode()?;

    Ok(ImageFileInput {
      image: Some(image.to_rgb8()),
    })
  }
}

impl<const W: u32, const H: u32> From<RgbImage> for ImageFileInput<W, H> {
  fn from(image: RgbImage) -> Self {
    Self { image: Some(image) }
  }
}

impl<const W: u32, const H: u32> Iterator for ImageFileInput<W, H> {
  type Item = TimedFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take().map(|image| {
      TimedFrame::new(0, Duration::ZERO, RgbNhwcFrame::from_rgb_image(&image))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn yields_a_single_frame() {
    let mut input = ImageFileInput::<4, 4>::from(RgbImage::new(4, 4));
    let frame = input.next().unwrap();
    assert_eq!(frame.index, 0);
    assert_eq!(frame.timestamp, Duration::ZERO);
    assert!(input.next().is_none());
  }

  #[test]
  fn non_square_image_keeps_flag_bearing() {
    use crate::semaphore::SemaphoreAngle;

    // 640x480 源图中 (519.5, 166.5) 处的旗帜方位约 20°，应量化为 0°
    let mut image = RgbImage::new(640, 480);
    for y in 162..172 {
      for x in 515..525 {
        image.put_pixel(x, y, image::Rgb([255, 255, 255]));
      }
    }
    let native = SemaphoreAngle::from_centroid(519.5, 166.5, 640, 480);
    assert_eq!(native, SemaphoreAngle::Deg0);

    let frame = ImageFileInput::<640, 640>::from(image).next().unwrap();
    let frame = frame.frame.to_rgb_image();
    let marked: Vec<_> = frame
      .enumerate_pixels()
      .filter(|(_, _, p)| p.0 == [255, 255, 255])
      .map(|(x, y, _)| (x as f32, y as f32))
      .collect();
    assert_eq!(marked.len(), 100);
    let cx = marked.iter().map(|p| p.0).sum::<f32>() / marked.len() as f32;
    let cy = marked.iter().map(|p| p.1).sum::<f32>() / marked.len() as f32;
    assert_eq!((cx, cy), (519.5, 246.5));
    assert_eq!(SemaphoreAngle::from_centroid(cx, cy, 640, 640), native);
  }
}
