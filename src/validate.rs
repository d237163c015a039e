//! # 文件名校验模块
//!
//! 检查命令行传入的文件名：不能以 `.` 开头，必须带有扩展名，且扩展名在允许的列表中。

use crate::error::StegoError;
use std::path::{Path, PathBuf};

fn file_name(path: &Path) -> Result<&str, StegoError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            StegoError::Validation(format!("'{}' is not a usable file name", path.display()))
        })
}

/// 校验 `path` 的扩展名，返回带前导 `.` 的扩展名 (取最后一个 `.` 之后的部分)。
pub fn validate_file_extension(path: &Path, allowed: &[&str]) -> Result<String, StegoError> {
    let name = file_name(path)?;

    if name.starts_with('.') {
        return Err(StegoError::Validation(format!(
            "'{name}' is missing a name before '.'"
        )));
    }

    let dot = name
        .rfind('.')
        .ok_or_else(|| StegoError::Validation(format!("'{name}' has no extension")))?;
    let extension = &name[dot..];

    if !allowed.contains(&extension) {
        return Err(StegoError::Validation(format!(
            "'{name}' has invalid extension, expected one of: {}",
            allowed.join(", ")
        )));
    }

    Ok(extension.to_owned())
}

/// 去掉输出文件名中第一个 `.` 及其后的所有内容，扩展名稍后由解码结果提供。
pub fn strip_extensions(path: &Path) -> Result<PathBuf, StegoError> {
    let name = file_name(path)?;
    let base = name.split('.').next().unwrap_or_default();

    if base.is_empty() {
        return Err(StegoError::Validation(format!(
            "'{name}' is missing a name before '.'"
        )));
    }

    Ok(path.with_file_name(base))
}
