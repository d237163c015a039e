//! # 容器编解码模块
//!
//! 容器按固定顺序写入载体：标记、扩展名长度、扩展名、负载长度、负载。
//! 每个字节占 8 个载体字节，每个长度字段占 32 个载体字节，均为最低位优先。
//!
//! 编码时先从封面流读出整个容器区域再统一写出，载体不足时不会输出残缺的容器。

use crate::bits::{pack_byte, pack_u32, unpack_byte, unpack_u32};
use crate::constants::{BYTE_SPAN, MAX_EXTENSION_LEN, MAX_PAYLOAD_LEN, U32_SPAN};
use crate::error::{Field, StegoError};
use std::io::{Read, Write};

/// 从载体中解出的容器内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub extension: Vec<u8>,
    pub payload: Vec<u8>,
}

impl Container {
    /// 返回可以安全拼接到文件名后面的扩展名。
    ///
    /// 扩展名必须是 ASCII；非空时必须以 `.` 开头，且不能包含路径分隔符或 NUL。
    pub fn checked_extension(&self) -> Result<&str, StegoError> {
        let malformed = || {
            StegoError::MalformedExtension(String::from_utf8_lossy(&self.extension).into_owned())
        };

        let extension = std::str::from_utf8(&self.extension).map_err(|_| malformed())?;
        if extension.is_empty() {
            return Ok(extension);
        }

        let safe = extension.is_ascii()
            && extension.starts_with('.')
            && !extension.contains(['/', '\\', '\0']);

        if safe { Ok(extension) } else { Err(malformed()) }
    }
}

/// 解码时对长度字段的上限。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// 扩展名最大字节数。
    pub max_extension_len: u32,
    /// 负载最大字节数。
    pub max_payload_len: u32,
    /// 载体中可供容器使用的字节总数；已知时，声明的长度不得超出剩余部分。
    pub carrier_budget: Option<u64>,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_extension_len: MAX_EXTENSION_LEN,
            max_payload_len: MAX_PAYLOAD_LEN,
            carrier_budget: None,
        }
    }
}

impl DecodeLimits {
    pub fn with_max_payload_len(mut self, bytes: u32) -> Self {
        self.max_payload_len = bytes;
        self
    }

    pub fn with_carrier_budget(mut self, bytes: u64) -> Self {
        self.carrier_budget = Some(bytes);
        self
    }
}

fn length_prefix(bytes: &[u8], field: Field) -> Result<u32, StegoError> {
    u32::try_from(bytes.len()).map_err(|_| StegoError::LengthOverflow {
        field,
        len: bytes.len(),
    })
}

fn carrier_span(len: usize, field: Field) -> Result<usize, StegoError> {
    len.checked_mul(BYTE_SPAN)
        .ok_or(StegoError::LengthOverflow { field, len })
}

/// 从 `cover` 读取 `len` 个字节追加到 `region` 末尾，返回新增部分的起始位置。
///
/// 缓冲区只随实际读到的字节增长，声明的长度再大也不会预先分配。
fn read_span<R: Read>(
    cover: &mut R,
    region: &mut Vec<u8>,
    len: usize,
    field: Field,
) -> Result<usize, StegoError> {
    let start = region.len();
    let read = (&mut *cover)
        .take(len as u64)
        .read_to_end(region)
        .map_err(|e| StegoError::from_read(e, field))?;

    if read < len {
        return Err(StegoError::Truncation { field });
    }
    Ok(start)
}

fn embed_bytes<R: Read>(
    cover: &mut R,
    region: &mut Vec<u8>,
    bytes: &[u8],
    field: Field,
) -> Result<(), StegoError> {
    let start = read_span(cover, region, carrier_span(bytes.len(), field)?, field)?;

    region[start..]
        .chunks_exact_mut(BYTE_SPAN)
        .zip(bytes)
        .for_each(|(chunk, &byte)| pack_byte(byte, chunk));

    Ok(())
}

fn embed_u32<R: Read>(
    cover: &mut R,
    region: &mut Vec<u8>,
    value: u32,
    field: Field,
) -> Result<(), StegoError> {
    let start = read_span(cover, region, U32_SPAN, field)?;
    pack_u32(value, &mut region[start..]);
    Ok(())
}

/// 把容器隐写到 `cover` 接下来的字节中，并把修改后的字节写到 `stego`。
///
/// 返回消耗的载体字节数。封面流在任一字段中途耗尽时返回 [`StegoError::Truncation`]，
/// 此时不会向 `stego` 写入任何字节。
pub fn encode_container<R: Read, W: Write>(
    cover: &mut R,
    stego: &mut W,
    marker: &[u8],
    extension: &[u8],
    payload: &[u8],
) -> Result<u64, StegoError> {
    let extension_len = length_prefix(extension, Field::Extension)?;
    let payload_len = length_prefix(payload, Field::Payload)?;

    let mut region = Vec::new();

    embed_bytes(cover, &mut region, marker, Field::Marker)?;
    embed_u32(cover, &mut region, extension_len, Field::ExtensionLength)?;
    embed_bytes(cover, &mut region, extension, Field::Extension)?;
    embed_u32(cover, &mut region, payload_len, Field::PayloadLength)?;
    embed_bytes(cover, &mut region, payload, Field::Payload)?;

    stego.write_all(&region)?;

    Ok(region.len() as u64)
}

/// 顺序读取容器字段，记录已消耗的载体字节数。
struct Extractor<'a, R> {
    carrier: &'a mut R,
    consumed: u64,
    scratch: Vec<u8>,
}

impl<'a, R: Read> Extractor<'a, R> {
    fn new(carrier: &'a mut R) -> Self {
        Self {
            carrier,
            consumed: 0,
            scratch: Vec::new(),
        }
    }

    fn fill(&mut self, len: usize, field: Field) -> Result<(), StegoError> {
        self.scratch.clear();
        read_span(&mut *self.carrier, &mut self.scratch, len, field)?;
        self.consumed += len as u64;
        Ok(())
    }

    fn read_bytes(&mut self, count: usize, field: Field) -> Result<Vec<u8>, StegoError> {
        self.fill(carrier_span(count, field)?, field)?;
        Ok(self.scratch.chunks_exact(BYTE_SPAN).map(unpack_byte).collect())
    }

    fn read_u32(&mut self, field: Field) -> Result<u32, StegoError> {
        self.fill(U32_SPAN, field)?;
        Ok(unpack_u32(&self.scratch))
    }

    /// 在读取字段之前检查声明的长度。
    fn check_len(
        &self,
        declared: u32,
        ceiling: u64,
        budget: Option<u64>,
        field: Field,
    ) -> Result<(), StegoError> {
        let remaining = budget.map(|b| b.saturating_sub(self.consumed) / BYTE_SPAN as u64);
        let limit = remaining.map_or(ceiling, |r| ceiling.min(r));

        if u64::from(declared) > limit {
            return Err(StegoError::LengthCeiling {
                field,
                declared: u64::from(declared),
                limit,
            });
        }
        Ok(())
    }
}

/// 从 `carrier` 中读取并校验一个容器。
///
/// 先只读取标记所占的字节；标记不匹配时立即返回 [`StegoError::Integrity`]，不再继续读取。
/// 载体不足时返回 [`StegoError::Truncation`]，长度字段超出 `limits` 时返回
/// [`StegoError::LengthCeiling`]。
pub fn decode_container<R: Read>(
    carrier: &mut R,
    marker: &[u8],
    limits: DecodeLimits,
) -> Result<Container, StegoError> {
    let mut extractor = Extractor::new(carrier);

    let found = extractor.read_bytes(marker.len(), Field::Marker)?;
    if found != marker {
        return Err(StegoError::Integrity {
            expected: marker.to_vec(),
            found,
        });
    }

    let extension_len = extractor.read_u32(Field::ExtensionLength)?;
    extractor.check_len(
        extension_len,
        u64::from(limits.max_extension_len),
        limits.carrier_budget,
        Field::Extension,
    )?;
    let extension = extractor.read_bytes(extension_len as usize, Field::Extension)?;

    let payload_len = extractor.read_u32(Field::PayloadLength)?;
    extractor.check_len(
        payload_len,
        u64::from(limits.max_payload_len),
        limits.carrier_budget,
        Field::Payload,
    )?;
    let payload = extractor.read_bytes(payload_len as usize, Field::Payload)?;

    Ok(Container { extension, payload })
}
