// 该文件是 Qiyu （旗语） 项目的一部分。
// src/semaphore/angle.rs - 旗帜角度量化
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

use std::fmt;

use tracing::warn;

const STEP_DEGREES: f64 = 45.0;

/// 旗语中的八个标准方向
///
/// 0° 指向画面右侧，角度沿逆时针方向增加（90° 朝上，270° 朝下）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemaphoreAngle {
  Deg0,
  Deg45,
  Deg90,
  Deg135,
  Deg180,
  Deg225,
  Deg270,
  Deg315,
}

impl SemaphoreAngle {
  pub const ALL: [SemaphoreAngle; 8] = [
    SemaphoreAngle::Deg0,
    SemaphoreAngle::Deg45,
    SemaphoreAngle::Deg90,
    SemaphoreAngle::Deg135,
    SemaphoreAngle::Deg180,
    SemaphoreAngle::Deg225,
    SemaphoreAngle::Deg270,
    SemaphoreAngle::Deg315,
  ];

  pub fn degrees(self) -> u16 {
    self as u16 * 45
  }

  /// 仅接受 45 的整数倍（0..360）
  pub fn from_degrees(degrees: u16) -> Option<Self> {
    if degrees % 45 != 0 {
      return None;
    }
    Self::ALL.get((degrees / 45) as usize).copied()
  }

  /// 将任意角度量化到最近的 45° 倍数
  ///
  /// 恰好落在 `k * 45 + 22.5` 上时向上取整（取较大的倍数），360° 回绕为 0°。
  /// 非有限值返回 0°。
  pub fn quantize(degrees: f64) -> Self {
    if !degrees.is_finite() {
      warn!("角度不是有限值: {}, 使用 0°", degrees);
      return SemaphoreAngle::Deg0;
    }
    let normalized = degrees.rem_euclid(360.0);
    let step = (normalized / STEP_DEGREES + 0.5).floor() as usize % Self::ALL.len();
    Self::ALL[step]
  }

  /// 根据旗帜中心点相对画面中心的方位计算旗语角度
  ///
  /// 画面中心按整数除法取 `(width / 2, height / 2)`。中心点与画面中心重合时
  /// `atan2(0, 0)` 为 0，结果为 0°。
  pub fn from_centroid(cx: f32, cy: f32, width: u32, height: u32) -> Self {
    let center_x = (width / 2) as f64;
    let center_y = (height / 2) as f64;
    let dx = cx as f64 - center_x;
    let dy = cy as f64 - center_y;
    if !dx.is_finite() || !dy.is_finite() {
      warn!("旗帜中心点无效: ({}, {}), 使用 0°", cx, cy);
      return SemaphoreAngle::Deg0;
    }

    // 图像 y 轴朝下，需要翻转旋转方向
    let bearing = dy.atan2(dx).to_degrees().rem_euclid(360.0);
    Self::quantize((360.0 - bearing).rem_euclid(360.0))
  }
}

impl fmt::Display for SemaphoreAngle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}°", self.degrees())
  }
}
