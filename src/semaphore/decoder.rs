// 该文件是 Qiyu （旗语） 项目的一部分。
// src/semaphore/decoder.rs - 旗语信号解码
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

use tracing::debug;

use super::{AnglePair, DecodedSignal, SemaphoreAlphabet, SemaphoreAngle};
use crate::model::DetectItem;

/// 通过置信度过滤后的一面旗帜
#[derive(Debug, Clone, PartialEq)]
pub struct FlagObservation {
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，像素坐标
  pub score: f32,
  pub centroid: (f32, f32),
  pub angle: SemaphoreAngle,
}

impl FlagObservation {
  pub fn from_item(item: &DetectItem, width: u32, height: u32) -> Self {
    let [x_min, y_min, x_max, y_max] = item.bbox;
    let centroid = ((x_min + x_max) / 2.0, (y_min + y_max) / 2.0);
    let angle = SemaphoreAngle::from_centroid(centroid.0, centroid.1, width, height);
    Self {
      bbox: item.bbox,
      score: item.score,
      centroid,
      angle,
    }
  }
}

/// 单帧叠加层描述，由输出端绘制到图像上
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
  /// 每面旗帜的检测框与角度
  pub flags: Vec<FlagObservation>,
  /// 成功组成一对旗帜时显示的字母
  pub banner: Option<DecodedSignal>,
}

/// 把一帧的检测结果解码为旗语符号
#[derive(Debug, Clone)]
pub struct SignalDecoder {
  confidence_threshold: f32,
  alphabet: &'static SemaphoreAlphabet,
}

impl SignalDecoder {
  pub fn new(confidence_threshold: f32) -> Self {
    Self {
      confidence_threshold,
      alphabet: SemaphoreAlphabet::standard(),
    }
  }

  /// 过滤低置信度检测框并计算每面旗帜的角度
  pub fn observe(&self, detections: &[DetectItem], width: u32, height: u32) -> Vec<FlagObservation> {
    detections
      .iter()
      .filter(|item| item.score > self.confidence_threshold)
      .map(|item| FlagObservation::from_item(item, width, height))
      .collect()
  }

  /// 恰好两面旗帜时按中心点 x 坐标排出左右
  pub fn pair(observations: &[FlagObservation]) -> Option<AnglePair> {
    let [first, second] = observations else {
      return None;
    };
    // x 相同时保持检测顺序
    let (left, right) = if second.centroid.0 < first.centroid.0 {
      (second, first)
    } else {
      (first, second)
    };
    Some(AnglePair::new(left.angle, right.angle))
  }

  pub fn decode(&self, observations: &[FlagObservation]) -> DecodedSignal {
    match Self::pair(observations) {
      Some(pair) => {
        let symbol = self.alphabet.lookup(pair);
        debug!("旗帜角度 {} 解码为 {}", pair, symbol);
        DecodedSignal::Symbol(symbol)
      }
      None => {
        debug!("合格旗帜数量为 {}, 不进行解码", observations.len());
        DecodedSignal::NoMessage
      }
    }
  }

  /// 观测、解码并生成叠加层
  pub fn decode_frame(&self, detections: &[DetectItem], width: u32, height: u32) -> (DecodedSignal, Overlay) {
    let flags = self.observe(detections, width, height);
    let signal = self.decode(&flags);
    let banner = (!signal.is_no_message()).then_some(signal);
    (signal, Overlay { flags, banner })
  }
}

impl Default for SignalDecoder {
  fn default() -> Self {
    Self::new(crate::config::DEFAULT_CONFIDENCE_THRESHOLD)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::semaphore::Symbol;

  const W: u32 = 640;
  const H: u32 = 480;

  fn item(cx: f32, cy: f32, score: f32) -> DetectItem {
    DetectItem {
      class_id: 0,
      score,
      bbox: [cx - 20.0, cy - 20.0, cx + 20.0, cy + 20.0],
    }
  }

  // 双臂水平展开：画面左侧旗帜为 180°，右侧为 0°
  fn spread_arms() -> Vec<DetectItem> {
    vec![item(600.0, 240.0, 0.9), item(40.0, 240.0, 0.9)]
  }

  #[test]
  fn centroid_is_box_midpoint() {
    let observation = FlagObservation::from_item(
      &DetectItem {
        class_id: 0,
        score: 0.9,
        bbox: [10.0, 20.0, 30.0, 60.0],
      },
      W,
      H,
    );
    assert_eq!(observation.centroid, (20.0, 40.0));
  }

  #[test]
  fn confidence_filter_is_strict() {
    let decoder = SignalDecoder::new(0.6);
    let detections = vec![item(600.0, 240.0, 0.6), item(40.0, 240.0, 0.61)];
    let observations = decoder.observe(&detections, W, H);
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].score, 0.61);
  }

  #[test]
  fn decodes_by_left_to_right_order() {
    let decoder = SignalDecoder::default();
    let observations = decoder.observe(&spread_arms(), W, H);
    assert_eq!(
      SignalDecoder::pair(&observations),
      Some(AnglePair::new(SemaphoreAngle::Deg180, SemaphoreAngle::Deg0))
    );
    // 最左侧的旗帜指向 180°，组合 (180, 0) 为 E
    assert_eq!(decoder.decode(&observations), DecodedSignal::Symbol(Symbol::Letter('E')));
  }

  #[test]
  fn raised_arms_decode_as_d() {
    let decoder = SignalDecoder::default();
    // 左侧旗帜在左上方 (135°)，右侧旗帜在右上方 (45°)
    let detections = vec![item(420.0, 140.0, 0.9), item(220.0, 140.0, 0.9)];
    let observations = decoder.observe(&detections, W, H);
    assert_eq!(
      SignalDecoder::pair(&observations),
      Some(AnglePair::new(SemaphoreAngle::Deg135, SemaphoreAngle::Deg45))
    );
    assert_eq!(decoder.decode(&observations), DecodedSignal::Symbol(Symbol::Letter('D')));
  }

  #[test]
  fn unmapped_pair_decodes_to_unknown() {
    let decoder = SignalDecoder::default();
    let detections = vec![item(600.0, 200.0, 0.9), item(610.0, 280.0, 0.9)];
    let observations = decoder.observe(&detections, W, H);
    assert_eq!(
      SignalDecoder::pair(&observations),
      Some(AnglePair::new(SemaphoreAngle::Deg0, SemaphoreAngle::Deg0))
    );
    assert_eq!(decoder.decode(&observations), DecodedSignal::Symbol(Symbol::Unknown));
  }

  #[test]
  fn wrong_flag_count_yields_no_message() {
    let decoder = SignalDecoder::default();
    for count in [0usize, 1, 3] {
      let detections: Vec<_> = (0..count)
        .map(|i| item(100.0 + 150.0 * i as f32, 100.0, 0.9))
        .collect();
      let (signal, overlay) = decoder.decode_frame(&detections, W, H);
      assert_eq!(signal, DecodedSignal::NoMessage);
      assert_eq!(overlay.flags.len(), count);
      assert_eq!(overlay.banner, None);
    }
  }

  #[test]
  fn low_confidence_boxes_do_not_count() {
    let decoder = SignalDecoder::default();
    let mut detections = spread_arms();
    detections.push(item(320.0, 50.0, 0.3));
    let (signal, overlay) = decoder.decode_frame(&detections, W, H);
    assert_eq!(signal, DecodedSignal::Symbol(Symbol::Letter('E')));
    assert_eq!(overlay.flags.len(), 2);
    assert_eq!(overlay.banner, Some(signal));
  }

  #[test]
  fn equal_x_keeps_detection_order() {
    let decoder = SignalDecoder::default();
    let detections = vec![item(320.0, 40.0, 0.9), item(320.0, 440.0, 0.9)];
    let observations = decoder.observe(&detections, W, H);
    assert_eq!(
      SignalDecoder::pair(&observations),
      Some(AnglePair::new(SemaphoreAngle::Deg90, SemaphoreAngle::Deg270))
    );
  }
}
