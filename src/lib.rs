//! # lsb_stego 库
//!
//! 本库包含 BMP 图像 LSB 隐写工具的核心逻辑。

// 声明库包含的所有模块。

pub mod bits;
pub mod capacity;
pub mod cli;
pub mod codec;
pub mod constants;
pub mod error;
pub mod handler;
pub mod publish;
pub mod session;
pub mod validate;
