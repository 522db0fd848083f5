// 该文件是 Qiyu （旗语） 项目的一部分。
// src/session.rs - 旗语解码会话
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
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use tracing::debug;

use crate::{
  config::SemaphoreConfig,
  model::DetectItem,
  semaphore::{DebounceTracker, DecodedSignal, Emission, Overlay, SignalDecoder, Symbol},
};

/// 单帧解码结果
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDecode {
  pub timestamp: Duration,
  /// 本帧显示的信号（即使被去抖动拒绝也照常显示）
  pub signal: DecodedSignal,
  /// 没有尝试解码时为 None
  pub emission: Option<Emission>,
  pub overlay: Overlay,
  /// 本帧处理后的历史快照
  pub history: Vec<Symbol>,
}

impl FrameDecode {
  pub fn message(&self) -> String {
    self.signal.to_string()
  }

  pub fn history_strings(&self) -> Vec<String> {
    self.history.iter().map(Symbol::to_string).collect()
  }
}

/// 一次视频流的解码状态
///
/// 持有解码器与去抖动状态；帧必须按时间顺序依次提交。
#[derive(Debug, Clone)]
pub struct DecodeSession {
  decoder: SignalDecoder,
  tracker: DebounceTracker,
}

impl DecodeSession {
  pub fn new(config: &SemaphoreConfig) -> Self {
    Self {
      decoder: SignalDecoder::new(config.confidence_threshold),
      tracker: DebounceTracker::new(config.min_interval, config.history_capacity),
    }
  }

  pub fn decode(&mut self, detections: &[DetectItem], width: u32, height: u32, now: Duration) -> FrameDecode {
    let (signal, overlay) = self.decoder.decode_frame(detections, width, height);

    // 合格旗帜数量不对时不触碰去抖动状态
    let emission = (!signal.is_no_message()).then(|| self.tracker.offer(&signal, now));
    debug!("时间 {:.2?}: 信号 {}, 处理结果 {:?}", now, signal, emission);

    FrameDecode {
      timestamp: now,
      signal,
      emission,
      overlay,
      history: self.tracker.history().snapshot(),
    }
  }

  pub fn history(&self) -> Vec<Symbol> {
    self.tracker.history().snapshot()
  }

  pub fn tracker(&self) -> &DebounceTracker {
    &self.tracker
  }

  pub fn reset(&mut self) {
    self.tracker.reset();
  }
}

impl Default for DecodeSession {
  fn default() -> Self {
    Self::new(&SemaphoreConfig::default())
  }
}

/// 可在线程间共享的会话句柄
///
/// `decode` 在整个读改写过程中持有锁，并在锁内更新最新结果；
/// `history` 与 `latest` 只复制快照。
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
  session: Arc<Mutex<DecodeSession>>,
  latest: Arc<Mutex<Option<FrameDecode>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  // 状态在持锁期间总是完整更新，中毒后仍可继续使用
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SharedSession {
  pub fn new(session: DecodeSession) -> Self {
    Self {
      session: Arc::new(Mutex::new(session)),
      latest: Arc::new(Mutex::new(None)),
    }
  }

  pub fn decode(&self, detections: &[DetectItem], width: u32, height: u32, now: Duration) -> FrameDecode {
    let mut session = lock(&self.session);
    let decoded = session.decode(detections, width, height, now);
    // 持有会话锁时更新，`latest` 与解码顺序一致
    *lock(&self.latest) = Some(decoded.clone());
    decoded
  }

  pub fn history(&self) -> Vec<Symbol> {
    lock(&self.session).history()
  }

  /// 最近一帧的解码结果
  pub fn latest(&self) -> Option<FrameDecode> {
    lock(&self.latest).clone()
  }

  pub fn reset(&self) {
    let mut session = lock(&self.session);
    session.reset();
    *lock(&self.latest) = None;
  }
}

impl From<DecodeSession> for SharedSession {
  fn from(session: DecodeSession) -> Self {
    Self::new(session)
  }
}
