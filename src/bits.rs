//! # 位打包模块
//!
//! 通过替换载体字节的最低有效位，把一个字节或一个 `u32` 分散到 8 或 32 个载体字节中。
//! 值的最低位写入第一个载体字节，载体字节的其余 7 位保持不变。
//!
//! 载体切片短于所需长度属于调用方的编程错误，函数会直接 panic 而不是越界读写。

use crate::constants::{BYTE_SPAN, U32_SPAN};

fn pack_bits(value: u32, carrier: &mut [u8], width: usize) {
    let carrier = &mut carrier[..width];

    for (i, byte) in carrier.iter_mut().enumerate() {
        *byte = (*byte & 0xFE) | ((value >> i) & 1) as u8;
    }
}

fn unpack_bits(carrier: &[u8], width: usize) -> u32 {
    carrier[..width]
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, &byte)| acc | (u32::from(byte & 1) << i))
}

/// 把 `value` 的第 i 位写入 `carrier[i]` 的最低位 (i 取 0..8)。
pub fn pack_byte(value: u8, carrier: &mut [u8]) {
    pack_bits(u32::from(value), carrier, BYTE_SPAN);
}

/// 从 8 个载体字节的最低位还原一个字节。
pub fn unpack_byte(carrier: &[u8]) -> u8 {
    unpack_bits(carrier, BYTE_SPAN) as u8
}

/// 把 `value` 的 32 位依次写入 32 个载体字节的最低位。
pub fn pack_u32(value: u32, carrier: &mut [u8]) {
    pack_bits(value, carrier, U32_SPAN);
}

/// 从 32 个载体字节的最低位还原一个 `u32`。
pub fn unpack_u32(carrier: &[u8]) -> u32 {
    unpack_bits(carrier, U32_SPAN)
}
