//! # 输出发布模块
//!
//! 输出先写入目标目录中的临时文件，会话成功后才原子地重命名为最终文件名。
//! 失败时临时文件随 `NamedTempFile` 一起删除，磁盘上不会留下残缺的输出。

use crate::constants::{DEFAULT_SECRET_BASE, DEFAULT_STEGO_NAME};
use crate::session::SecretSink;
use std::ffi::OsString;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 编码时的默认输出路径：与封面图像同目录的 `destination.bmp`。
pub fn default_stego_path(cover: &Path) -> PathBuf {
    cover.with_file_name(DEFAULT_STEGO_NAME)
}

/// 解码时的默认输出基础名：与隐写图像同目录的 `decoded`。
pub fn default_secret_base(stego: &Path) -> PathBuf {
    stego.with_file_name(DEFAULT_SECRET_BASE)
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        ErrorKind::AlreadyExists,
        format!(
            "Output file already exists: {}. Use --force to overwrite it.",
            path.display()
        ),
    )
}

/// 未指定 `force` 时，目标文件已存在即报错。
pub fn ensure_writable(path: &Path, force: bool) -> io::Result<()> {
    if !force && path.exists() {
        return Err(already_exists(path));
    }
    Ok(())
}

/// 在 `dest` 所在目录创建临时文件，保证之后的重命名不跨文件系统。
pub fn staging_file(dest: &Path) -> io::Result<NamedTempFile> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir)
}

/// 把临时文件发布到 `dest`。
pub fn publish(staged: NamedTempFile, dest: &Path, force: bool) -> io::Result<()> {
    staged.as_file().sync_all()?;

    let result = if force {
        staged.persist(dest)
    } else {
        staged.persist_noclobber(dest)
    };

    match result {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == ErrorKind::AlreadyExists => Err(already_exists(dest)),
        Err(err) => Err(err.into()),
    }
}

/// 把解码出的秘密文件写到 `<base><extension>`。
#[derive(Debug, Clone)]
pub struct FileSink {
    base: PathBuf,
    force: bool,
}

impl FileSink {
    pub fn new(base: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            base: base.into(),
            force,
        }
    }

    /// 带上扩展名之后的完整输出路径。
    pub fn path_for(&self, extension: &str) -> PathBuf {
        let mut name = OsString::from(self.base.as_os_str());
        name.push(extension);
        PathBuf::from(name)
    }
}

impl SecretSink for FileSink {
    type Output = PathBuf;

    fn persist(&mut self, extension: &str, payload: &[u8]) -> io::Result<PathBuf> {
        let dest = self.path_for(extension);
        ensure_writable(&dest, self.force)?;

        let mut staged = staging_file(&dest)?;
        staged.write_all(payload)?;
        publish(staged, &dest, self.force)?;

        Ok(dest)
    }
}
