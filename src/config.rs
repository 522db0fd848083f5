// 该文件是 Qiyu （旗语） 项目的一部分。
// src/config.rs - 旗语解码配置
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

/// 旗帜检测框的默认置信度阈值（严格大于才会被采用）
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;
/// 两次写入历史之间的最短间隔
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);
/// 历史记录容量
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// 解码会话配置
#[derive(Debug, Clone, PartialEq)]
pub struct SemaphoreConfig {
  pub confidence_threshold: f32,
  pub min_interval: Duration,
  pub history_capacity: usize,
}

impl Default for SemaphoreConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      min_interval: DEFAULT_MIN_INTERVAL,
      history_capacity: DEFAULT_HISTORY_CAPACITY,
    }
  }
}

impl SemaphoreConfig {
  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_min_interval(mut self, interval: Duration) -> Self {
    self.min_interval = interval;
    self
  }

  /// 容量至少为 1
  pub fn with_history_capacity(mut self, capacity: usize) -> Self {
    self.history_capacity = capacity.max(1);
    self
  }
}
