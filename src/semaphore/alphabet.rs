// 该文件是 Qiyu （旗语） 项目的一部分。
// src/semaphore/alphabet.rs - 旗语字母表
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

use std::{collections::HashMap, fmt, sync::LazyLock};

use super::{SemaphoreAngle, Symbol};

use super::angle::SemaphoreAngle::*;

/// 一帧中左右两面旗帜的角度（按画面 x 坐标排序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnglePair {
  pub left: SemaphoreAngle,
  pub right: SemaphoreAngle,
}

impl AnglePair {
  pub fn new(left: SemaphoreAngle, right: SemaphoreAngle) -> Self {
    Self { left, right }
  }
}

impl fmt::Display for AnglePair {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.left, self.right)
  }
}

// (左旗, 右旗) -> 字母
const STANDARD_TABLE: [(SemaphoreAngle, SemaphoreAngle, char); 26] = [
  (Deg0, Deg180, 'A'),
  (Deg45, Deg135, 'B'),
  (Deg90, Deg90, 'C'),
  (Deg135, Deg45, 'D'),
  (Deg180, Deg0, 'E'),
  (Deg225, Deg315, 'F'),
  (Deg270, Deg270, 'G'),
  (Deg315, Deg225, 'H'),
  (Deg0, Deg45, 'I'),
  (Deg45, Deg0, 'J'),
  (Deg90, Deg315, 'K'),
  (Deg135, Deg270, 'L'),
  (Deg180, Deg225, 'M'),
  (Deg225, Deg180, 'N'),
  (Deg270, Deg135, 'O'),
  (Deg315, Deg90, 'P'),
  (Deg0, Deg135, 'Q'),
  (Deg45, Deg90, 'R'),
  (Deg90, Deg45, 'S'),
  (Deg135, Deg0, 'T'),
  (Deg180, Deg315, 'U'),
  (Deg225, Deg270, 'V'),
  (Deg270, Deg225, 'W'),
  (Deg315, Deg180, 'X'),
  (Deg0, Deg270, 'Y'),
  (Deg45, Deg225, 'Z'),
];

static STANDARD: LazyLock<SemaphoreAlphabet> = LazyLock::new(|| {
  SemaphoreAlphabet::from_entries(
    STANDARD_TABLE
      .iter()
      .map(|&(left, right, letter)| (AnglePair::new(left, right), letter)),
  )
});

/// 角度组合到字母的不可变映射
#[derive(Debug, Clone)]
pub struct SemaphoreAlphabet {
  letters: HashMap<AnglePair, char>,
  pairs: HashMap<char, AnglePair>,
}

impl SemaphoreAlphabet {
  /// 进程内共享的标准 A-Z 字母表，首次访问时构建
  pub fn standard() -> &'static SemaphoreAlphabet {
    &STANDARD
  }

  pub fn from_entries(entries: impl IntoIterator<Item = (AnglePair, char)>) -> Self {
    let mut letters = HashMap::new();
    let mut pairs = HashMap::new();
    for (pair, letter) in entries {
      letters.insert(pair, letter);
      pairs.insert(letter, pair);
    }
    Self { letters, pairs }
  }

  /// 查表，未收录的组合返回 `Symbol::Unknown`
  pub fn lookup(&self, pair: AnglePair) -> Symbol {
    self
      .letters
      .get(&pair)
      .map_or(Symbol::Unknown, |&letter| Symbol::Letter(letter))
  }

  /// 反向查询某个字母对应的角度组合（大小写不敏感）
  pub fn encode(&self, letter: char) -> Option<AnglePair> {
    self.pairs.get(&letter.to_ascii_uppercase()).copied()
  }

  pub fn len(&self) -> usize {
    self.letters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.letters.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_vectors() {
    let alphabet = SemaphoreAlphabet::standard();
    assert_eq!(alphabet.lookup(AnglePair::new(Deg0, Deg180)), Symbol::Letter('A'));
    assert_eq!(alphabet.lookup(AnglePair::new(Deg45, Deg135)), Symbol::Letter('B'));
    assert_eq!(alphabet.lookup(AnglePair::new(Deg45, Deg225)), Symbol::Letter('Z'));
  }

  #[test]
  fn unmapped_pair_is_unknown() {
    let alphabet = SemaphoreAlphabet::standard();
    assert_eq!(alphabet.lookup(AnglePair::new(Deg0, Deg0)), Symbol::Unknown);
    assert_eq!(alphabet.lookup(AnglePair::new(Deg180, Deg180)), Symbol::Unknown);
  }

  #[test]
  fn table_covers_every_letter_once() {
    let alphabet = SemaphoreAlphabet::standard();
    assert_eq!(alphabet.len(), 26);
    for letter in 'A'..='Z' {
      let pair = alphabet.encode(letter).expect("每个字母都应有对应角度");
      assert_eq!(alphabet.lookup(pair), Symbol::Letter(letter));
    }
    assert_eq!(alphabet.encode('q'), alphabet.encode('Q'));
    assert_eq!(alphabet.encode('1'), None);
  }
}
