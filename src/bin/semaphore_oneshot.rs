// 该文件是 Qiyu （旗语） 项目的一部分。
// src/bin/semaphore_oneshot.rs - 解码单张图像中的旗语
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use qiyu::{
  FromUrl,
  config::{DEFAULT_CONFIDENCE_THRESHOLD, SemaphoreConfig},
  input::InputWrapper,
  model::ModelWrapper,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 640;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测模型
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像，如 image:///path/to/frame.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
  pub confidence: f32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出: {}", args.output);

  let input = InputWrapper::<FRAME_WIDTH, FRAME_HEIGHT>::from_url(&args.input)?;
  let model = ModelWrapper::<FRAME_WIDTH, FRAME_HEIGHT>::from_url(&args.model)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let config = SemaphoreConfig::default().with_confidence_threshold(args.confidence);
  OneShotTask::new(config).run_task(input, model, output)?;

  Ok(())
}
