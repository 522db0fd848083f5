// 该文件是 Qiyu （旗语） 项目的一部分。
// src/input.rs - 视频/图像输入
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

use thiserror::Error;

use crate::{FromUrl, frame::TimedFrame};

pub trait AsNhwcFrame {
  fn as_nhwc(&self) -> &[u8];
}

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[cfg(feature = "read_image_file")]
mod directory;
#[cfg(feature = "read_image_file")]
pub use self::directory::{DirectoryInput, DirectoryInputError};

#[cfg(feature = "v4l2_input")]
mod v4l2_camera;
#[cfg(feature = "v4l2_input")]
pub use self::v4l2_camera::{CameraInput, CameraInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[cfg(feature = "read_image_file")]
  #[error("Directory input error: {0}")]
  DirectoryInputError(#[from] DirectoryInputError),
  #[cfg(feature = "v4l2_input")]
  #[error("Camera input error: {0}")]
  CameraInputError(#[from] CameraInputError),
  #[error("URI scheme mismatch: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper<const W: u32, const H: u32> {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput<W, H>),
  #[cfg(feature = "read_image_file")]
  Directory(DirectoryInput<W, H>),
  #[cfg(feature = "v4l2_input")]
  Camera(CameraInput<W, H>),
}

impl<const W: u32, const H: u32> FromUrl for InputWrapper<W, H> {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::<W, H>::SCHEME {
        let input = ImageFileInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageFile(input));
      }
      if url.scheme() == DirectoryInput::<W, H>::SCHEME {
        let input = DirectoryInput::from_url(url)?;
        return Ok(InputWrapper::Directory(input));
      }
    }
    #[cfg(feature = "v4l2_input")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == CameraInput::<W, H>::SCHEME {
        let input = CameraInput::from_url(url)?;
        return Ok(InputWrapper::Camera(input));
      }
    }
    Err(InputError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl<const W: u32, const H: u32> Iterator for InputWrapper<W, H> {
  type Item = TimedFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.next(),
      #[cfg(feature = "read_image_file")]
      InputWrapper::Directory(input) => input.next(),
      #[cfg(feature = "v4l2_input")]
      InputWrapper::Camera(input) => input.next(),
    }
  }
}
