//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::Parser;
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位 BMP 图像中隐藏或恢复一个小文件。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位 BMP 图像中隐藏或恢复一个小文件。\n每个像素字节只修改最低位，秘密文件的扩展名会与内容一起保存。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：encode (隐藏) 和 decode (恢复)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 把秘密文件 (.txt, .c, .h, .sh) 隐藏到 BMP 图像中。
    Encode(EncodeArgs),

    /// 从经过隐写的 BMP 图像中恢复秘密文件。
    Decode(DecodeArgs),
}

/// 'encode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// 用于隐写的封面图像 (.bmp)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的秘密文件。
    #[arg(short, long)]
    pub secret: PathBuf,

    /// 输出图像路径 (.bmp)，默认为封面图像旁边的 destination.bmp。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 输出文件已存在时覆盖它。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// 已隐藏数据的图像 (.bmp)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 输出文件的基础名，扩展名会被去掉并替换为解码出的扩展名。
    /// 默认为图像旁边的 decoded。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 输出文件已存在时覆盖它。
    #[arg(short, long)]
    pub force: bool,
}
