//! # 错误类型模块
//!
//! 定义隐写核心可能产生的全部错误，以及标识容器字段的 [`Field`]。

use std::fmt;
use std::io;
use thiserror::Error;

/// 载体中的字段，按写入顺序排列：BMP 头部之后依次是容器的各个字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Header,
    Marker,
    ExtensionLength,
    Extension,
    PayloadLength,
    Payload,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Header => "BMP header",
            Field::Marker => "marker",
            Field::ExtensionLength => "extension length",
            Field::Extension => "extension",
            Field::PayloadLength => "payload length",
            Field::Payload => "payload",
        };
        f.write_str(name)
    }
}

/// 隐写核心的错误类型。
#[derive(Error, Debug)]
pub enum StegoError {
    /// 文件名不符合要求。
    #[error("Invalid file name: {0}")]
    Validation(String),

    /// 载体容量不足以容纳整个容器。
    #[error("Not enough space in the image: required {required} bytes, available {available}")]
    Capacity { required: u64, available: u64 },

    /// 标记不匹配，图像不是由本工具编码的。
    #[error("Provided image is not an encoded file (marker {found:?} does not match {expected:?})")]
    Integrity { expected: Vec<u8>, found: Vec<u8> },

    /// 载体或秘密数据流在字段中途耗尽。
    #[error("Stream ended before the {field} field was complete")]
    Truncation { field: Field },

    /// 解码出的长度超过允许的上限。
    #[error("Declared {field} length {declared} exceeds the limit of {limit}")]
    LengthCeiling { field: Field, declared: u64, limit: u64 },

    /// 数据过长，无法用 32 位长度字段表示。
    #[error("The {field} is {len} bytes long and cannot be described by a 32-bit length")]
    LengthOverflow { field: Field, len: usize },

    /// 解码出的扩展名无法安全地用作文件名。
    #[error("Decoded extension {0:?} is not a safe file extension")]
    MalformedExtension(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StegoError {
    /// 将 `read_exact` 的 `UnexpectedEof` 转换为指定字段的截断错误，其余 I/O 错误保持不变。
    pub(crate) fn from_read(err: io::Error, field: Field) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            StegoError::Truncation { field }
        } else {
            StegoError::Io(err)
        }
    }
}
