// 该文件是 Qiyu （旗语） 项目的一部分。
// src/bin/semaphore_stream.rs - 连续解码视频流中的旗语
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use qiyu::{
  FromUrl,
  config::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_HISTORY_CAPACITY, SemaphoreConfig},
  input::InputWrapper,
  model::ModelWrapper,
  output::OutputWrapper,
  session::{DecodeSession, SharedSession},
  task::{ContinuousTask, Task},
};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 640;

/// 旗语视频流解码参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测模型，如 replay:///path/detections.jsonl 或 yolo26:///path/model.rknn
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，如 folder:///frames?fps=30 或 v4l2:///dev/video1
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出，如 jsonl:///report.jsonl、folder:///records?record 或 log://
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 旗帜检测置信度阈值
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
  pub confidence: f32,
  /// 两次接受新符号之间的最小间隔（毫秒）
  #[arg(long, value_name = "MS", default_value_t = 1000)]
  pub min_interval_ms: u64,
  /// 历史记录容量
  #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
  pub history: usize,
  /// 处理的最大帧数，0 表示不限
  #[arg(long, value_name = "FRAME_NUMBER", default_value_t = 0)]
  pub frame_number: usize,
}

impl Args {
  fn config(&self) -> SemaphoreConfig {
    SemaphoreConfig::default()
      .with_confidence_threshold(self.confidence)
      .with_min_interval(Duration::from_millis(self.min_interval_ms))
      .with_history_capacity(self.history)
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出: {}", args.output);

  let config = args.config();
  info!("解码配置: {:?}", config);

  let input = InputWrapper::<FRAME_WIDTH, FRAME_HEIGHT>::from_url(&args.input)?;
  let model = ModelWrapper::<FRAME_WIDTH, FRAME_HEIGHT>::from_url(&args.model)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let session = SharedSession::new(DecodeSession::new(&config));
  let frame_number = (args.frame_number > 0).then_some(args.frame_number);
  ContinuousTask::new(session)
    .with_frame_number(frame_number)
    .run_task(input, model, output)?;

  Ok(())
}
