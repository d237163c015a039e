//! # 容量规划模块
//!
//! 计算容器需要多少载体字节，并判断载体是否放得下。

use crate::constants::{
    BMP_HEADER_SIZE, BYTE_SPAN, BYTES_PER_PIXEL, HEIGHT_OFFSET, U32_SPAN, WIDTH_OFFSET,
};

/// 一次容量计算的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    pub carrier_capacity_bytes: u64,
    pub required_bytes: u64,
    pub fits: bool,
}

/// 容器占用的载体字节数：每个逻辑位占一个载体字节，两个长度字段各占 32 个。
pub fn required_bytes(marker_len: u64, extension_len: u64, payload_len: u64) -> u64 {
    let span = BYTE_SPAN as u64;
    span * marker_len
        + U32_SPAN as u64
        + span * extension_len
        + U32_SPAN as u64
        + span * payload_len
}

/// 判断容量是否足够。
///
/// 比较是严格的：容量恰好等于所需字节数时视为放不下，始终保留至少一个字节的余量。
pub fn plan(
    carrier_capacity_bytes: u64,
    marker_len: u64,
    extension_len: u64,
    payload_len: u64,
) -> CapacityReport {
    let required_bytes = required_bytes(marker_len, extension_len, payload_len);

    CapacityReport {
        carrier_capacity_bytes,
        required_bytes,
        fits: carrier_capacity_bytes > required_bytes,
    }
}

fn read_i32_le(header: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&header[offset..offset + 4]);
    i32::from_le_bytes(raw)
}

/// 根据 BMP 头部中的宽度和高度计算可用于隐写的像素字节数 (`width × height × 3`)。
///
/// 自上而下存储的位图高度为负数，这里取其绝对值。
pub fn bmp_capacity(header: &[u8; BMP_HEADER_SIZE]) -> u64 {
    let width = u64::from(read_i32_le(header, WIDTH_OFFSET).unsigned_abs());
    let height = u64::from(read_i32_le(header, HEIGHT_OFFSET).unsigned_abs());
    width * height * BYTES_PER_PIXEL
}
