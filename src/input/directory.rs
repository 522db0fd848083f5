// 该文件是 Qiyu （旗语） 项目的一部分。
// src/input/directory.rs - 目录帧序列输入
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
  collections::VecDeque,
  path::{Path, PathBuf},
  time::{Duration, Instant},
};

use image::ImageReader;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{RgbNhwcFrame, TimedFrame},
  url_path, url_query,
};

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

#[derive(Error, Debug)]
pub enum DirectoryInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("帧率参数无效: {0}")]
  InvalidFps(String),
}

/// 按文件名顺序读取目录中的图片作为帧序列
///
/// `folder:///path/to/frames?fps=30`：给出 fps 时时间戳为 `index / fps`，
/// 否则使用读取时的实际耗时。
pub struct DirectoryInput<const W: u32, const H: u32> {
  files: VecDeque<PathBuf>,
  fps: Option<f64>,
  frame_index: u64,
  start_time: Instant,
}

impl<const W: u32, const H: u32> FromUrlWithScheme for DirectoryInput<W, H> {
  const SCHEME: &'static str = "folder";
}

impl<const W: u32, const H: u32> FromUrl for DirectoryInput<W, H> {
  type Error = DirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DirectoryInputError::SchemeMismatch);
    }

    let fps = match url_query(url, "fps") {
      Some(value) => Some(
        value
          .parse::<f64>()
          .ok()
          .filter(|fps| fps.is_finite() && *fps > 0.0)
          .ok_or(DirectoryInputError::InvalidFps(value))?,
      ),
      None => None,
    };

    Self::open(url_path(url), fps)
  }
}

impl<const W: u32, const H: u32> DirectoryInput<W, H> {
  pub fn open(directory: impl AsRef<Path>, fps: Option<f64>) -> Result<Self, DirectoryInputError> {
    let directory = directory.as_ref();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
      let path = entry?.path();
      if path.is_file() && is_image_file(&path) {
        files.push(path);
      }
    }
    files.sort();
    info!("目录 {} 中找到 {} 帧图像", directory.display(), files.len());

    Ok(Self {
      files: files.into(),
      fps,
      frame_index: 0,
      start_time: Instant::now(),
    })
  }

  fn timestamp(&self) -> Duration {
    match self.fps {
      Some(fps) => Duration::from_secs_f64(self.frame_index as f64 / fps),
      None => self.start_time.elapsed(),
    }
  }

  pub fn remaining(&self) -> usize {
    self.files.len()
  }
}

fn is_image_file(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    .unwrap_or(false)
}

impl<const W: u32, const H: u32> Iterator for DirectoryInput<W, H> {
  type Item = TimedFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(path) = self.files.pop_front() {
      let image = match ImageReader::open(&path).map_err(image::ImageError::from).and_then(|r| r.decode()) {
        Ok(image) => image.to_rgb8(),
        Err(e) => {
          error!("无法读取帧 {}: {}", path.display(), e);
          continue;
        }
      };

      let frame = TimedFrame::new(
        self.frame_index,
        self.timestamp(),
        RgbNhwcFrame::from_rgb_image(&image),
      );
      self.frame_index += 1;
      return Some(frame);
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("qiyu-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  #[test]
  fn reads_frames_in_name_order_with_fixed_fps() {
    let dir = scratch_dir("directory-input");
    for name in ["002.png", "000.png", "001.png"] {
      image::RgbImage::new(8, 8).save(dir.join(name)).unwrap();
    }
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
    std::fs::write(dir.join("broken.png"), "not a png").unwrap();

    let input = DirectoryInput::<8, 8>::open(&dir, Some(10.0)).unwrap();
    assert_eq!(input.remaining(), 4);
    let frames: Vec<_> = input.collect();
    // broken.png 排在最后并被跳过
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[2].index, 2);
    assert_eq!(frames[2].timestamp, Duration::from_millis(200));

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn rejects_bad_fps() {
    let url = Url::parse("folder:///tmp?fps=0").unwrap();
    assert!(matches!(
      DirectoryInput::<8, 8>::from_url(&url),
      Err(DirectoryInputError::InvalidFps(_))
    ));
  }
}
