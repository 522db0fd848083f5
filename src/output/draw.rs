// 该文件是 Qiyu （旗语） 项目的一部分。
// src/output/draw.rs - 旗语解码结果可视化
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{frame::RgbNhwcFrame, semaphore::Overlay, url_query};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 18.0;
const BANNER_FONT_SIZE: f32 = 32.0;
const LABEL_TEXT_HEIGHT: i32 = 22;
const BANNER_POSITION: (i32, i32) = (10, 10);
const BOX_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const BANNER_COLOR: [u8; 3] = [255, 255, 0]; // 黄色

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("无法读取字体文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 在帧上绘制旗帜框、角度与解码字母
///
/// 没有配置字体时只绘制检测框。
pub struct Draw {
  font: Option<FontArc>,
  box_color: Rgb<u8>,
  banner_color: Rgb<u8>,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: None,
      box_color: Rgb(BOX_COLOR),
      banner_color: Rgb(BANNER_COLOR),
    }
  }
}

impl Draw {
  pub fn with_font_file(path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let data = std::fs::read(path.as_ref())?;
    let font = FontArc::try_from_vec(data)?;
    info!("加载叠加层字体: {}", path.as_ref().display());
    Ok(Self {
      font: Some(font),
      ..Self::default()
    })
  }

  /// 读取 URL 中的 `font` 参数，加载失败时退回到无文字模式
  pub fn from_url(url: &Url) -> Self {
    match url_query(url, "font") {
      Some(path) => Self::with_font_file(&path).unwrap_or_else(|e| {
        warn!("字体 {} 加载失败: {}, 叠加层不绘制文字", path, e);
        Self::default()
      }),
      None => Self::default(),
    }
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  pub fn annotate<const W: u32, const H: u32>(&self, frame: &RgbNhwcFrame<W, H>, overlay: &Overlay) -> RgbImage {
    let mut image = frame.to_rgb_image();
    self.draw_overlay(&mut image, overlay);
    image
  }

  pub fn draw_overlay(&self, image: &mut RgbImage, overlay: &Overlay) {
    for flag in &overlay.flags {
      self.draw_flag(image, &flag.bbox, &format!("Angle: {}", flag.angle));
    }

    if let (Some(banner), Some(font)) = (&overlay.banner, &self.font) {
      draw_text_mut(
        image,
        self.banner_color,
        BANNER_POSITION.0,
        BANNER_POSITION.1,
        PxScale::from(BANNER_FONT_SIZE),
        font,
        &format!("Letter: {}", banner),
      );
    }
  }

  fn draw_flag(&self, image: &mut RgbImage, bbox: &[f32; 4], label: &str) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }
    let x_min = (bbox[0].floor() as i32).clamp(0, w - 1);
    let y_min = (bbox[1].floor() as i32).clamp(0, h - 1);
    let x_max = (bbox[2].ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox[3].ceil() as i32).clamp(0, h - 1);
    if x_min >= x_max || y_min >= y_max {
      return;
    }

    // 边框加粗为2像素
    for thickness in 0..2 {
      let width = (x_max - x_min - 2 * thickness).max(1) as u32;
      let height = (y_max - y_min - 2 * thickness).max(1) as u32;
      let rect = Rect::at(x_min + thickness, y_min + thickness).of_size(width, height);
      draw_hollow_rect_mut(image, rect, self.box_color);
    }

    if let Some(font) = &self.font {
      let label_y = (y_min - LABEL_TEXT_HEIGHT).max(0);
      draw_text_mut(
        image,
        self.box_color,
        x_min,
        label_y,
        PxScale::from(LABEL_FONT_SIZE),
        font,
        label,
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::semaphore::{FlagObservation, SemaphoreAngle};

  #[test]
  fn draws_box_outline_without_font() {
    let frame = RgbNhwcFrame::<32, 32>::default();
    let overlay = Overlay {
      flags: vec![FlagObservation {
        bbox: [4.0, 4.0, 20.0, 20.0],
        score: 0.9,
        centroid: (12.0, 12.0),
        angle: SemaphoreAngle::Deg135,
      }],
      banner: None,
    };
    let draw = Draw::default();
    assert!(!draw.has_font());

    let image = draw.annotate(&frame, &overlay);
    assert_eq!(*image.get_pixel(4, 4), Rgb(BOX_COLOR));
    assert_eq!(*image.get_pixel(5, 10), Rgb(BOX_COLOR));
    assert_eq!(*image.get_pixel(12, 12), Rgb([0, 0, 0]));
  }

  #[test]
  fn degenerate_box_is_skipped() {
    let mut image = RgbImage::new(16, 16);
    Draw::default().draw_flag(&mut image, &[8.0, 8.0, 8.0, 8.0], "Angle: 0°");
    assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
  }

  #[test]
  fn missing_font_file_falls_back() {
    let url = Url::parse("image:///tmp/out.png?font=/nonexistent/font.ttf").unwrap();
    assert!(!Draw::from_url(&url).has_font());
  }
}
