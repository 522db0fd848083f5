// 该文件是 Qiyu （旗语） 项目的一部分。
// src/model/yolo26.rs - RKNPU 上的 YOLO26 旗帜检测模型
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

use rknpu::{Context, InitFlags, TensorType};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::AsNhwcFrame,
  model::{DetectItem, DetectResult, Model},
  url_path, url_query,
};

const YOLO26_NUM_INPUTS: u32 = 1;
const YOLO26_NUM_OUTPUTS: u32 = 6;
const YOLO26_INPUT_W: f32 = 640.0;
const YOLO26_INPUT_H: f32 = 640.0;
const YOLO26_HEAD_SIZES: [(usize, usize); 3] = [(80, 80), (40, 40), (20, 20)];
const YOLO26_STRIDES: [f32; 3] = [8.0, 16.0, 32.0];
// 旗帜模型只有一个类别
const YOLO26_DEFAULT_CLASS_NUM: usize = 1;
// 预筛选阈值，最终阈值由解码器决定
const YOLO26_OBJECT_THRESH: f32 = 0.25;

pub struct Yolo26<Frame> {
  context: Context,
  class_num: usize,
  class_filter: Option<u32>,
  _phantom: std::marker::PhantomData<Frame>,
}

#[derive(Error, Debug)]
pub enum Yolo26Error {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("模型无效: {0}, 错误: {1}")]
  ModelInvalid(String, rknpu::Error),
  #[error("RKNN 错误: {0}")]
  RknnError(#[from] rknpu::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("模型参数错误: {0}")]
  ParameterError(String),
}

impl Yolo26Error {
  pub fn invalid(msg: &str, e: rknpu::Error) -> Self {
    Yolo26Error::ModelInvalid(msg.to_string(), e)
  }
}

pub struct Yolo26Builder {
  model_path: String,
  flags: InitFlags,
  class_num: usize,
  class_filter: Option<u32>,
}

impl FromUrlWithScheme for Yolo26Builder {
  const SCHEME: &'static str = "yolo26";
}

impl FromUrl for Yolo26Builder {
  type Error = Yolo26Error;

  /// `yolo26:///path/model.rknn?classes=1&class=0`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(Yolo26Error::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let class_num = match url_query(url, "classes") {
      Some(value) => value
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Yolo26Error::ParameterError(format!("类别数量无效: {}", value)))?,
      None => YOLO26_DEFAULT_CLASS_NUM,
    };
    let class_filter = match url_query(url, "class") {
      Some(value) => Some(
        value
          .parse::<u32>()
          .map_err(|_| Yolo26Error::ParameterError(format!("类别编号无效: {}", value)))?,
      ),
      None => None,
    };

    Ok(Yolo26Builder {
      model_path: url_path(url),
      flags: InitFlags::default(),
      class_num,
      class_filter,
    })
  }
}

impl Yolo26Builder {
  pub fn flags(mut self, flags: InitFlags) -> Self {
    self.flags = flags;
    self
  }

  pub fn build<Frame>(self) -> Result<Yolo26<Frame>, Yolo26Error> {
    info!("加载模型文件: {}", self.model_path);
    let mode_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      mode_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 RKNN 推理上下文");
    let context = Context::new(&mode_data, self.flags)?;

    match context.sdk_version() {
      Ok(version) => {
        if let Ok(api_ver) = version.api_version() {
          debug!("模型 API 版本: {}", api_ver);
        }
        if let Ok(drv_ver) = version.driver_version() {
          debug!("模型驱动版本: {}", drv_ver);
        }
      }
      Err(e) => {
        error!("查询 SDK 版本失败: {}", e);
        return Err(Yolo26Error::invalid("无法查询 SDK 版本", e));
      }
    }

    let num_inputs = context
      .num_inputs()
      .map_err(|e| Yolo26Error::invalid("无法获取输入数量", e))?;
    let num_outputs = context
      .num_outputs()
      .map_err(|e| Yolo26Error::invalid("无法获取输出数量", e))?;

    if num_inputs != YOLO26_NUM_INPUTS || num_outputs != YOLO26_NUM_OUTPUTS {
      let msg = format!(
        "预期模型输入/输出数量为 {}/{}, 实际为 {}/{}",
        YOLO26_NUM_INPUTS, YOLO26_NUM_OUTPUTS, num_inputs, num_outputs
      );
      error!("{}", msg);
      return Err(Yolo26Error::invalid(&msg, rknpu::Error::InvalidModel));
    }

    info!("模型加载完成, 类别数量: {}", self.class_num);
    Ok(Yolo26 {
      context,
      class_num: self.class_num,
      class_filter: self.class_filter,
      _phantom: std::marker::PhantomData,
    })
  }
}

/// 根据张量大小匹配回归和分类输出
/// 返回 (reg, cls) 元组，如果大小不匹配则返回 None
fn match_reg_cls_tensors<'a>(
  tensor1: &'a [f32],
  tensor2: &'a [f32],
  reg_expected: usize,
  cls_expected: usize,
  head_idx: usize,
) -> Option<(&'a [f32], &'a [f32])> {
  if tensor1.len() == reg_expected && tensor2.len() == cls_expected {
    Some((tensor1, tensor2))
  } else if tensor1.len() == cls_expected && tensor2.len() == reg_expected {
    debug!("检测头 {}: 输出顺序交换", head_idx);
    Some((tensor2, tensor1))
  } else {
    error!(
      "检测头 {}: 输出大小不匹配 - 张量1: {}, 张量2: {}, 期望回归: {}, 期望分类: {}",
      head_idx,
      tensor1.len(),
      tensor2.len(),
      reg_expected,
      cls_expected
    );
    None
  }
}

impl<Frame> Yolo26<Frame> {
  fn postprocess(&self, output: rknpu::Output) -> DetectResult {
    let mut items = Vec::new();

    for (head_idx, (&(map_h, map_w), stride)) in
      YOLO26_HEAD_SIZES.iter().zip(YOLO26_STRIDES).enumerate()
    {
      let spatial = map_h * map_w;
      let reg_expected = 4 * spatial;
      let cls_expected = self.class_num * spatial;

      let (tensor1, tensor2) = match (output.get_f32(head_idx * 2), output.get_f32(head_idx * 2 + 1)) {
        (Ok(t1), Ok(t2)) => (t1, t2),
        (Err(e), _) | (_, Err(e)) => {
          error!("获取检测头 {} 的输出失败: {}", head_idx, e);
          continue;
        }
      };

      let Some((reg, cls)) = match_reg_cls_tensors(tensor1, tensor2, reg_expected, cls_expected, head_idx)
      else {
        continue;
      };

      for h in 0..map_h {
        for w in 0..map_w {
          let idx = h * map_w + w;

          let (score, class_id) = {
            let mut max_logit = f32::MIN;
            let mut cls_idx = 0usize;
            for c in 0..self.class_num {
              let logit = cls[c * spatial + idx];
              if logit > max_logit {
                max_logit = logit;
                cls_idx = c;
              }
            }
            (sigmoid(max_logit), cls_idx as u32)
          };

          if score <= YOLO26_OBJECT_THRESH {
            continue;
          }
          if self.class_filter.is_some_and(|id| id != class_id) {
            continue;
          }

          let grid_x = (w as f32) + 0.5;
          let grid_y = (h as f32) + 0.5;

          // 输出为模型输入尺寸下的像素坐标
          let xmin = ((grid_x - reg[idx]) * stride).clamp(0.0, YOLO26_INPUT_W);
          let ymin = ((grid_y - reg[spatial + idx]) * stride).clamp(0.0, YOLO26_INPUT_H);
          let xmax = ((grid_x + reg[2 * spatial + idx]) * stride).clamp(0.0, YOLO26_INPUT_W);
          let ymax = ((grid_y + reg[3 * spatial + idx]) * stride).clamp(0.0, YOLO26_INPUT_H);

          if xmin < xmax && ymin < ymax {
            items.push(DetectItem {
              class_id,
              score,
              bbox: [xmin, ymin, xmax, ymax],
            });
          }
        }
      }
    }

    debug!("检测到 {} 面旗帜候选", items.len());
    items.into()
  }
}

impl<Frame: AsNhwcFrame> Model for Yolo26<Frame> {
  type Input = Frame;
  type Output = DetectResult;
  type Error = Yolo26Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    self.context.set_input(
      0,
      input.as_nhwc(),
      rknpu::TensorFormat::NHWC,
      TensorType::UInt8,
    )?;

    debug!("执行模型推理");
    self.context.run()?;

    let output = self.context.get_outputs()?;
    Ok(self.postprocess(output))
  }
}

fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sigmoid_is_centered() {
    assert_eq!(sigmoid(0.0), 0.5);
    assert!(sigmoid(10.0) > 0.99);
    assert!(sigmoid(-10.0) < 0.01);
  }

  #[test]
  fn swapped_head_outputs_are_detected() {
    let reg = vec![0.0; 8];
    let cls = vec![0.0; 2];
    let (r, c) = match_reg_cls_tensors(&cls, &reg, 8, 2, 0).unwrap();
    assert_eq!(r.len(), 8);
    assert_eq!(c.len(), 2);
    assert!(match_reg_cls_tensors(&cls, &cls, 8, 2, 0).is_none());
  }
}
