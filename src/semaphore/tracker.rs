// 该文件是 Qiyu （旗语） 项目的一部分。
// src/semaphore/tracker.rs - 去抖动与历史记录
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

use std::{collections::VecDeque, time::Duration};

use tracing::{debug, info};

use super::{DecodedSignal, Symbol};
use crate::config::{DEFAULT_HISTORY_CAPACITY, DEFAULT_MIN_INTERVAL};

/// 有界历史记录，满时丢弃最旧的符号
#[derive(Debug, Clone)]
pub struct MessageHistory {
  entries: VecDeque<Symbol>,
  capacity: usize,
}

impl MessageHistory {
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
  }

  pub fn with_capacity(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      entries: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  pub fn push(&mut self, symbol: Symbol) {
    if self.entries.len() >= self.capacity {
      self.entries.pop_front();
    }
    self.entries.push_back(symbol);
  }

  pub fn last(&self) -> Option<Symbol> {
    self.entries.back().copied()
  }

  /// 按时间顺序复制一份当前历史
  pub fn snapshot(&self) -> Vec<Symbol> {
    self.entries.iter().copied().collect()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}

impl Default for MessageHistory {
  fn default() -> Self {
    Self::new()
  }
}

/// 一次提交的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
  /// 已写入历史
  Accepted,
  /// 距上次写入不足最短间隔
  TooSoon,
  /// 与历史中最后一个符号相同
  Repeated,
  /// 本帧没有可写入的符号
  Absent,
}

impl Emission {
  pub fn is_accepted(&self) -> bool {
    matches!(self, Emission::Accepted)
  }
}

/// 去抖动状态机
///
/// 依次检查：符号有效性、最短间隔、与上一条是否重复。全部通过才写入历史并
/// 记录本次时间。初始状态下从未写入过，第一条有效符号总会被接受。
#[derive(Debug, Clone)]
pub struct DebounceTracker {
  history: MessageHistory,
  min_interval: Duration,
  last_emission: Option<Duration>,
}

impl DebounceTracker {
  pub fn new(min_interval: Duration, capacity: usize) -> Self {
    Self {
      history: MessageHistory::with_capacity(capacity),
      min_interval,
      last_emission: None,
    }
  }

  pub fn offer(&mut self, signal: &DecodedSignal, now: Duration) -> Emission {
    let Some(symbol) = signal.symbol() else {
      return Emission::Absent;
    };

    if let Some(last) = self.last_emission
      && now.saturating_sub(last) < self.min_interval
    {
      debug!("符号 {} 距上次写入不足 {:.2?}, 忽略", symbol, self.min_interval);
      return Emission::TooSoon;
    }

    if self.history.last() == Some(symbol) {
      debug!("符号 {} 与上一条相同, 忽略", symbol);
      return Emission::Repeated;
    }

    self.history.push(symbol);
    self.last_emission = Some(now);
    info!("接受符号 {}, 当前历史长度 {}", symbol, self.history.len());
    Emission::Accepted
  }

  pub fn history(&self) -> &MessageHistory {
    &self.history
  }

  pub fn last_emission(&self) -> Option<Duration> {
    self.last_emission
  }

  pub fn min_interval(&self) -> Duration {
    self.min_interval
  }

  pub fn reset(&mut self) {
    self.history.clear();
    self.last_emission = None;
  }
}

impl Default for DebounceTracker {
  fn default() -> Self {
    Self::new(DEFAULT_MIN_INTERVAL, DEFAULT_HISTORY_CAPACITY)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn letter(c: char) -> DecodedSignal {
    DecodedSignal::Symbol(Symbol::Letter(c))
  }

  fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
  }

  #[test]
  fn first_symbol_is_always_accepted() {
    let mut tracker = DebounceTracker::default();
    assert_eq!(tracker.offer(&letter('A'), Duration::ZERO), Emission::Accepted);
    assert_eq!(tracker.history().snapshot(), vec![Symbol::Letter('A')]);
    assert_eq!(tracker.last_emission(), Some(Duration::ZERO));
  }

  #[test]
  fn no_message_is_never_appended() {
    let mut tracker = DebounceTracker::default();
    assert_eq!(tracker.offer(&DecodedSignal::NoMessage, ms(5000)), Emission::Absent);
    assert!(tracker.history().is_empty());
    assert_eq!(tracker.last_emission(), None);
  }

  #[test]
  fn unknown_marker_goes_through_the_same_guards() {
    let mut tracker = DebounceTracker::default();
    let unknown = DecodedSignal::Symbol(Symbol::Unknown);
    assert_eq!(tracker.offer(&unknown, ms(0)), Emission::Accepted);
    assert_eq!(tracker.offer(&unknown, ms(2000)), Emission::Repeated);
    assert_eq!(tracker.history().snapshot(), vec![Symbol::Unknown]);
  }

  #[test]
  fn steady_pair_is_appended_once() {
    let mut tracker = DebounceTracker::default();
    let outcomes: Vec<_> = (0..5).map(|i| tracker.offer(&letter('A'), ms(i * 100))).collect();
    assert_eq!(outcomes[0], Emission::Accepted);
    assert!(outcomes[1..].iter().all(|e| *e == Emission::TooSoon));

    // 间隔 1.2 秒后仍是同一个符号，重复检查依然拦截
    assert_eq!(tracker.offer(&letter('A'), ms(1600)), Emission::Repeated);
    assert_eq!(tracker.history().snapshot(), vec![Symbol::Letter('A')]);
  }

  #[test]
  fn repeated_symbol_is_idempotent_while_time_guard_passes() {
    let mut tracker = DebounceTracker::default();
    tracker.offer(&letter('A'), ms(0));
    for i in 1..20 {
      assert_eq!(tracker.offer(&letter('A'), ms(i * 1500)), Emission::Repeated);
    }
    assert_eq!(tracker.history().len(), 1);
    // 重复被拒绝时不刷新时间
    assert_eq!(tracker.last_emission(), Some(ms(0)));
  }

  #[test]
  fn changed_symbol_blocked_by_time_guard() {
    let mut tracker = DebounceTracker::default();
    tracker.offer(&letter('A'), ms(0));
    assert_eq!(tracker.offer(&letter('B'), ms(500)), Emission::TooSoon);
    assert_eq!(tracker.history().snapshot(), vec![Symbol::Letter('A')]);
  }

  #[test]
  fn changed_symbol_accepted_once_time_guard_permits() {
    let mut tracker = DebounceTracker::default();
    tracker.offer(&letter('A'), ms(0));
    assert_eq!(tracker.offer(&letter('B'), ms(1000)), Emission::Accepted);
    assert_eq!(
      tracker.history().snapshot(),
      vec![Symbol::Letter('A'), Symbol::Letter('B')]
    );
    assert_eq!(tracker.last_emission(), Some(ms(1000)));
  }

  #[test]
  fn history_keeps_the_latest_ten() {
    let mut tracker = DebounceTracker::default();
    let letters: Vec<char> = ('A'..='K').collect();
    for (i, c) in letters.iter().enumerate() {
      assert_eq!(tracker.offer(&letter(*c), ms(i as u64 * 1000)), Emission::Accepted);
    }
    let expected: Vec<_> = letters[1..].iter().map(|c| Symbol::Letter(*c)).collect();
    assert_eq!(tracker.history().len(), 10);
    assert_eq!(tracker.history().snapshot(), expected);
  }

  #[test]
  fn clock_going_backwards_is_treated_as_too_soon() {
    let mut tracker = DebounceTracker::default();
    tracker.offer(&letter('A'), ms(5000));
    assert_eq!(tracker.offer(&letter('B'), ms(1000)), Emission::TooSoon);
  }

  #[test]
  fn reset_restores_initial_state() {
    let mut tracker = DebounceTracker::default();
    tracker.offer(&letter('A'), ms(0));
    tracker.reset();
    assert!(tracker.history().is_empty());
    assert_eq!(tracker.offer(&letter('A'), ms(10)), Emission::Accepted);
  }

  #[test]
  fn history_capacity_is_at_least_one() {
    let mut history = MessageHistory::with_capacity(0);
    history.push(Symbol::Letter('A'));
    history.push(Symbol::Letter('B'));
    assert_eq!(history.capacity(), 1);
    assert_eq!(history.snapshot(), vec![Symbol::Letter('B')]);
  }
}
