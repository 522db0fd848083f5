// 该文件是 Qiyu （旗语） 项目的一部分。
// src/semaphore/signal.rs - 解码信号定义
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

/// 角度组合不在字母表中时的显示标记
pub const UNKNOWN_MARKER: &str = "?";
/// 本帧没有尝试解码时的显示文本
pub const NO_MESSAGE: &str = "No message detected";

/// 可以进入历史记录的符号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
  Letter(char),
  Unknown,
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Symbol::Letter(letter) => write!(f, "{}", letter),
      Symbol::Unknown => f.write_str(UNKNOWN_MARKER),
    }
  }
}

/// 单帧的解码结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodedSignal {
  /// 合格旗帜数量不是两个
  NoMessage,
  Symbol(Symbol),
}

impl DecodedSignal {
  pub fn symbol(&self) -> Option<Symbol> {
    match self {
      DecodedSignal::NoMessage => None,
      DecodedSignal::Symbol(symbol) => Some(*symbol),
    }
  }

  pub fn is_no_message(&self) -> bool {
    matches!(self, DecodedSignal::NoMessage)
  }
}

impl From<Symbol> for DecodedSignal {
  fn from(symbol: Symbol) -> Self {
    DecodedSignal::Symbol(symbol)
  }
}

impl fmt::Display for DecodedSignal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DecodedSignal::NoMessage => f.write_str(NO_MESSAGE),
      DecodedSignal::Symbol(symbol) => symbol.fmt(f),
    }
  }
}
