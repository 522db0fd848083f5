// 该文件是 Qiyu （旗语） 项目的一部分。
// src/task.rs - 检测、解码与输出的任务循环
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

use std::{sync::mpsc, thread, time::Duration, time::Instant};
use tracing::{debug, info, warn};

use crate::{
  config::SemaphoreConfig,
  frame::{RgbNhwcFrame, TimedFrame},
  model::{DetectResult, Model},
  output::Render,
  session::{DecodeSession, FrameDecode, SharedSession},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 单帧：推理、解码并输出一次
#[derive(Debug, Default)]
pub struct OneShotTask {
  config: SemaphoreConfig,
}

impl OneShotTask {
  pub fn new(config: SemaphoreConfig) -> Self {
    Self { config }
  }
}

impl<
  const W: u32,
  const H: u32,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = TimedFrame<W, H>>,
  M: Model<Input = RgbNhwcFrame<W, H>, Output = DetectResult, Error = ME>,
  O: Render<TimedFrame<W, H>, FrameDecode, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = Instant::now();
    let result = model.infer(&frame.frame)?;
    info!("推理完成，耗时: {:.2?}, 候选框 {} 个", now.elapsed(), result.len());

    let mut session = DecodeSession::new(&self.config);
    let decoded = session.decode(&result.items, W, H, frame.timestamp);
    info!("解码结果: {}", decoded.signal);
    output.render_result(&frame, &decoded)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 连续处理视频流，直到输入结束、达到帧数或收到中断信号
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  session: SharedSession,
}

impl ContinuousTask {
  pub fn new(session: SharedSession) -> Self {
    Self {
      frame_number: None,
      session,
    }
  }

  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 任务运行期间可从其他线程读取的会话句柄
  pub fn session(&self) -> SharedSession {
    self.session.clone()
  }
}

fn install_interrupt_handler() -> mpsc::Receiver<()> {
  let (tx, rx) = mpsc::channel();
  let installed = ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    let _ = tx.send(());
    thread::spawn(|| {
      thread::sleep(Duration::from_secs(30));
      warn!("强制退出程序");
      std::process::exit(1);
    });
  });
  // 每个进程只能设置一次
  if let Err(e) = installed {
    warn!("无法设置 Ctrl-C 处理: {}", e);
  }
  rx
}

impl<
  const W: u32,
  const H: u32,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = TimedFrame<W, H>>,
  M: Model<Input = RgbNhwcFrame<W, H>, Output = DetectResult, Error = ME>,
  O: Render<TimedFrame<W, H>, FrameDecode, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let rx = install_interrupt_handler();

    let mut processed = 0usize;
    let mut now = Instant::now();
    for frame in input {
      processed += 1;
      debug!("处理第 {} 帧图像 ({:.2?})", frame.index, frame.timestamp);
      let result = model.infer(&frame.frame)?;
      let elapsed_a = now.elapsed();
      let decoded = self.session.decode(&result.items, W, H, frame.timestamp);
      output.render_result(&frame, &decoded)?;
      let elapsed_b = now.elapsed();
      now = Instant::now();
      debug!("推理完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);
      if self.frame_number.is_some_and(|n| processed >= n) {
        info!("达到指定帧数 {}, 退出任务循环", processed);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    let history: String = self
      .session
      .history()
      .iter()
      .map(ToString::to_string)
      .collect();
    info!("任务完成，共 {} 帧, 历史: {}", processed, history);
    Ok(())
  }
}
