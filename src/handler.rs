//! # 命令处理逻辑模块
//!
//! 包含处理 `encode` 和 `decode` 子命令的高级业务逻辑。
//! 本模块负责校验文件名、打开文件、运行隐写会话、发布输出以及向用户报告结果。

use crate::cli::{DecodeArgs, EncodeArgs};
use crate::codec::DecodeLimits;
use crate::constants::{BMP_HEADER_SIZE, IMAGE_EXTENSIONS, SECRET_EXTENSIONS};
use crate::publish::{
    FileSink, default_secret_base, default_stego_path, ensure_writable, publish, staging_file,
};
use crate::session::{DecodeSession, DecodeState, EncodeSession, EncodeState, SecretSource};
use crate::validate::{strip_extensions, validate_file_extension};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::File;
use std::io::{BufReader, BufWriter};

fn describe_encode(state: EncodeState) -> Option<&'static str> {
    match state {
        EncodeState::HeaderCopied => Some("BMP header copied successfully."),
        EncodeState::CapacityChecked => Some("Source image has sufficient capacity."),
        EncodeState::ContainerEncoded => {
            Some("Marker, extension and secret data encoded successfully.")
        }
        EncodeState::TailCopied => Some("Remaining image data copied successfully."),
        EncodeState::Opened | EncodeState::Done | EncodeState::Failed => None,
    }
}

fn describe_decode(state: DecodeState) -> Option<&'static str> {
    match state {
        DecodeState::HeaderSkipped => Some("BMP header skipped."),
        DecodeState::ContainerDecoded => {
            Some("Marker verified, extension and secret data decoded successfully.")
        }
        DecodeState::Done => Some("Decoded secret written."),
        DecodeState::Opened | DecodeState::Failed => None,
    }
}

fn report_steps<'a>(steps: impl Iterator<Item = &'a str>) {
    for (i, step) in steps.enumerate() {
        println!("-> Step {}: {}", (i + 1).to_string().green(), step);
    }
}

/// 处理 'Encode' 命令的执行逻辑。
///
/// 校验文件名后打开封面图像和秘密文件，运行编码会话把结果写入目标目录中的临时文件，
/// 会话成功后才发布为目标文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 文件名不符合要求，或目标文件已存在且未指定 `--force`。
/// * 无法读取输入的图像或秘密文件。
/// * 图像容量不足，或在隐写过程中数据流提前结束。
/// * 无法写入或发布目标图像文件。
pub fn handle_encode(args: EncodeArgs) -> Result<()> {
    validate_file_extension(&args.image, IMAGE_EXTENSIONS)?;
    let extension = validate_file_extension(&args.secret, SECRET_EXTENSIONS)?;

    let dest = args.dest.unwrap_or_else(|| default_stego_path(&args.image));
    validate_file_extension(&dest, IMAGE_EXTENSIONS)?;
    ensure_writable(&dest, args.force)?;

    let cover = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let secret = File::open(&args.secret).with_context(|| {
        format!(
            "Unable to read secret file: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;
    let secret_len = secret.metadata()?.len();

    let staged = staging_file(&dest).with_context(|| {
        format!(
            "Unable to create a temporary file next to: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    let source = SecretSource {
        extension,
        len: secret_len,
        reader: BufReader::new(secret),
    };
    let mut session = EncodeSession::new(BufReader::new(cover), source, BufWriter::new(staged));

    let outcome = session.run();
    report_steps(session.trace().iter().filter_map(|&s| describe_encode(s)));
    let summary = outcome?;

    if let Some(report) = summary.report {
        println!(
            "Required: {}, Available: {}",
            report.required_bytes.to_string().green().bold(),
            report.carrier_capacity_bytes.to_string().green().bold()
        );
    }

    let staged = session
        .into_output()
        .into_inner()
        .map_err(|e| e.into_error())?;

    publish(staged, &dest, args.force).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The secret has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 读取经过隐写的图像，校验标记后恢复扩展名和秘密内容，并写入 `<输出名><扩展名>`。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `DecodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 文件名不符合要求。
/// * 无法读取输入的图像文件。
/// * 图像不包含隐藏数据 (标记不匹配)，或数据被截断、长度字段超出图像大小。
/// * 输出文件已存在且未指定 `--force`，或无法写入输出文件。
pub fn handle_decode(args: DecodeArgs) -> Result<()> {
    validate_file_extension(&args.image, IMAGE_EXTENSIONS)?;

    let base = match &args.output {
        Some(output) => strip_extensions(output)?,
        None => default_secret_base(&args.image),
    };

    let stego = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    let carrier_budget = stego
        .metadata()?
        .len()
        .saturating_sub(BMP_HEADER_SIZE as u64);

    let mut session = DecodeSession::new(BufReader::new(stego), FileSink::new(base, args.force))
        .with_limits(DecodeLimits::default().with_carrier_budget(carrier_budget));

    let outcome = session.run();
    report_steps(session.trace().iter().filter_map(|&s| describe_decode(s)));
    let summary = outcome?;

    println!(
        "Recovered {} bytes with extension {}",
        summary.payload_len.to_string().green().bold(),
        summary.extension.green().bold()
    );
    println!(
        "The secret has been successfully recovered and saved: {}",
        summary.output.to_string_lossy().green().bold()
    );

    Ok(())
}
