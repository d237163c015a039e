//! # 会话编排模块
//!
//! 以显式状态机驱动一次完整的编码或解码：
//!
//! * 编码：`Opened → HeaderCopied → CapacityChecked → ContainerEncoded → TailCopied → Done`
//! * 解码：`Opened → HeaderSkipped → ContainerDecoded → Done`
//!
//! 每次状态转换返回 `Result`：成功时给出下一个状态，失败时给出 [`SessionError`]，
//! 会话随即进入 `Failed` 并终止。会话本身不打印任何内容，经过的状态可以通过 `trace()` 查看。

use crate::capacity::{CapacityReport, bmp_capacity, plan};
use crate::codec::{Container, DecodeLimits, decode_container, encode_container};
use crate::constants::{BMP_HEADER_SIZE, MAGIC_MARKER};
use crate::error::{Field, StegoError};
use std::fmt;
use std::io::{self, Read, Write};
use thiserror::Error;

/// 会话中可能失败的步骤。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CopyHeader,
    CheckCapacity,
    EncodeContainer,
    CopyTail,
    SkipHeader,
    DecodeContainer,
    PersistSecret,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CopyHeader => "Copying BMP header",
            Stage::CheckCapacity => "Checking image capacity",
            Stage::EncodeContainer => "Encoding secret data",
            Stage::CopyTail => "Copying remaining image data",
            Stage::SkipHeader => "Skipping BMP header",
            Stage::DecodeContainer => "Decoding secret data",
            Stage::PersistSecret => "Writing decoded secret",
        };
        f.write_str(name)
    }
}

/// 会话失败：记录失败的步骤和原因。
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct SessionError {
    pub stage: Stage,
    pub source: StegoError,
}

impl SessionError {
    fn at(stage: Stage) -> impl FnOnce(StegoError) -> SessionError {
        move |source| SessionError { stage, source }
    }
}

/// 编码会话的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeState {
    Opened,
    HeaderCopied,
    CapacityChecked,
    ContainerEncoded,
    TailCopied,
    Done,
    Failed,
}

/// 解码会话的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Opened,
    HeaderSkipped,
    ContainerDecoded,
    Done,
    Failed,
}

/// 待隐藏的秘密文件：扩展名、声明的长度和内容流。
pub struct SecretSource<S> {
    pub extension: String,
    pub len: u64,
    pub reader: S,
}

/// 编码会话完成后的统计信息。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    pub report: Option<CapacityReport>,
    pub embedded_bytes: u64,
    pub tail_bytes: u64,
}

/// 编码状态机的内部步骤，携带下一次转换所需的数据。
enum EncodeStep {
    Opened,
    HeaderCopied { carrier_capacity: u64 },
    CapacityChecked,
    ContainerEncoded,
    TailCopied,
    Done,
}

impl EncodeStep {
    fn state(&self) -> EncodeState {
        match self {
            EncodeStep::Opened => EncodeState::Opened,
            EncodeStep::HeaderCopied { .. } => EncodeState::HeaderCopied,
            EncodeStep::CapacityChecked => EncodeState::CapacityChecked,
            EncodeStep::ContainerEncoded => EncodeState::ContainerEncoded,
            EncodeStep::TailCopied => EncodeState::TailCopied,
            EncodeStep::Done => EncodeState::Done,
        }
    }
}

/// 把封面图像和秘密文件合成为隐写图像的会话。
pub struct EncodeSession<R, S, W> {
    cover: R,
    secret: SecretSource<S>,
    stego: W,
    marker: Vec<u8>,
    summary: EncodeSummary,
    trace: Vec<EncodeState>,
}

impl<R: Read, S: Read, W: Write> EncodeSession<R, S, W> {
    pub fn new(cover: R, secret: SecretSource<S>, stego: W) -> Self {
        Self {
            cover,
            secret,
            stego,
            marker: MAGIC_MARKER.to_vec(),
            summary: EncodeSummary::default(),
            trace: Vec::new(),
        }
    }

    pub fn with_marker(mut self, marker: &[u8]) -> Self {
        self.marker = marker.to_vec();
        self
    }

    /// 会话经过的全部状态。
    pub fn trace(&self) -> &[EncodeState] {
        &self.trace
    }

    /// 取回输出流，例如在成功后发布临时文件。
    pub fn into_output(self) -> W {
        self.stego
    }

    /// 运行会话直到 `Done` 或第一个失败。
    pub fn run(&mut self) -> Result<EncodeSummary, SessionError> {
        let mut step = EncodeStep::Opened;
        self.trace.push(step.state());

        loop {
            step = match step {
                EncodeStep::Done => return Ok(self.summary),
                current => match self.advance(current) {
                    Ok(next) => next,
                    Err(err) => {
                        self.trace.push(EncodeState::Failed);
                        return Err(err);
                    }
                },
            };
            self.trace.push(step.state());
        }
    }

    fn advance(&mut self, step: EncodeStep) -> Result<EncodeStep, SessionError> {
        match step {
            EncodeStep::Opened => self
                .copy_header()
                .map(|carrier_capacity| EncodeStep::HeaderCopied { carrier_capacity })
                .map_err(SessionError::at(Stage::CopyHeader)),
            EncodeStep::HeaderCopied { carrier_capacity } => self
                .check_capacity(carrier_capacity)
                .map(|()| EncodeStep::CapacityChecked)
                .map_err(SessionError::at(Stage::CheckCapacity)),
            EncodeStep::CapacityChecked => self
                .embed_container()
                .map(|()| EncodeStep::ContainerEncoded)
                .map_err(SessionError::at(Stage::EncodeContainer)),
            EncodeStep::ContainerEncoded => self
                .copy_tail()
                .map(|()| EncodeStep::TailCopied)
                .map_err(SessionError::at(Stage::CopyTail)),
            EncodeStep::TailCopied | EncodeStep::Done => Ok(EncodeStep::Done),
        }
    }

    /// 原样复制头部，返回头部声明的载体容量。
    fn copy_header(&mut self) -> Result<u64, StegoError> {
        let mut header = [0u8; BMP_HEADER_SIZE];
        self.cover
            .read_exact(&mut header)
            .map_err(|e| StegoError::from_read(e, Field::Header))?;
        self.stego.write_all(&header)?;
        Ok(bmp_capacity(&header))
    }

    fn check_capacity(&mut self, carrier_capacity: u64) -> Result<(), StegoError> {
        let report = plan(
            carrier_capacity,
            self.marker.len() as u64,
            self.secret.extension.len() as u64,
            self.secret.len,
        );
        self.summary.report = Some(report);

        if !report.fits {
            return Err(StegoError::Capacity {
                required: report.required_bytes,
                available: report.carrier_capacity_bytes,
            });
        }
        Ok(())
    }

    fn embed_container(&mut self) -> Result<(), StegoError> {
        let mut payload = Vec::new();
        (&mut self.secret.reader)
            .take(self.secret.len)
            .read_to_end(&mut payload)?;

        if (payload.len() as u64) < self.secret.len {
            return Err(StegoError::Truncation { field: Field::Payload });
        }

        self.summary.embedded_bytes = encode_container(
            &mut self.cover,
            &mut self.stego,
            &self.marker,
            self.secret.extension.as_bytes(),
            &payload,
        )?;
        Ok(())
    }

    fn copy_tail(&mut self) -> Result<(), StegoError> {
        self.summary.tail_bytes = io::copy(&mut self.cover, &mut self.stego)?;
        self.stego.flush()?;
        Ok(())
    }
}

/// 解码出的秘密文件的去处。
///
/// 解码会话在容器校验通过后调用一次 `persist`，扩展名已经过安全检查。
pub trait SecretSink {
    type Output;

    fn persist(&mut self, extension: &str, payload: &[u8]) -> io::Result<Self::Output>;
}

/// 解码会话完成后的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeSummary<O> {
    pub extension: String,
    pub payload_len: usize,
    pub output: O,
}

/// 解码状态机的内部步骤。
enum DecodeStep<O> {
    Opened,
    HeaderSkipped,
    ContainerDecoded(Container),
    Done(DecodeSummary<O>),
}

impl<O> DecodeStep<O> {
    fn state(&self) -> DecodeState {
        match self {
            DecodeStep::Opened => DecodeState::Opened,
            DecodeStep::HeaderSkipped => DecodeState::HeaderSkipped,
            DecodeStep::ContainerDecoded(_) => DecodeState::ContainerDecoded,
            DecodeStep::Done(_) => DecodeState::Done,
        }
    }
}

/// 从隐写图像中恢复秘密文件的会话。
pub struct DecodeSession<R, K> {
    stego: R,
    sink: K,
    marker: Vec<u8>,
    limits: DecodeLimits,
    trace: Vec<DecodeState>,
}

impl<R: Read, K: SecretSink> DecodeSession<R, K> {
    pub fn new(stego: R, sink: K) -> Self {
        Self {
            stego,
            sink,
            marker: MAGIC_MARKER.to_vec(),
            limits: DecodeLimits::default(),
            trace: Vec::new(),
        }
    }

    pub fn with_marker(mut self, marker: &[u8]) -> Self {
        self.marker = marker.to_vec();
        self
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn trace(&self) -> &[DecodeState] {
        &self.trace
    }

    /// 运行会话直到 `Done` 或第一个失败。
    pub fn run(&mut self) -> Result<DecodeSummary<K::Output>, SessionError> {
        let mut step = DecodeStep::Opened;
        self.trace.push(step.state());

        loop {
            step = match step {
                DecodeStep::Done(summary) => return Ok(summary),
                current => match self.advance(current) {
                    Ok(next) => next,
                    Err(err) => {
                        self.trace.push(DecodeState::Failed);
                        return Err(err);
                    }
                },
            };
            self.trace.push(step.state());
        }
    }

    fn advance(
        &mut self,
        step: DecodeStep<K::Output>,
    ) -> Result<DecodeStep<K::Output>, SessionError> {
        match step {
            DecodeStep::Opened => self
                .skip_header()
                .map(|()| DecodeStep::HeaderSkipped)
                .map_err(SessionError::at(Stage::SkipHeader)),
            DecodeStep::HeaderSkipped => self
                .extract_container()
                .map(DecodeStep::ContainerDecoded)
                .map_err(SessionError::at(Stage::DecodeContainer)),
            DecodeStep::ContainerDecoded(container) => self
                .persist_secret(container)
                .map(DecodeStep::Done)
                .map_err(SessionError::at(Stage::PersistSecret)),
            DecodeStep::Done(summary) => Ok(DecodeStep::Done(summary)),
        }
    }

    fn skip_header(&mut self) -> Result<(), StegoError> {
        let skipped = io::copy(
            &mut (&mut self.stego).take(BMP_HEADER_SIZE as u64),
            &mut io::sink(),
        )?;

        if skipped < BMP_HEADER_SIZE as u64 {
            return Err(StegoError::Truncation { field: Field::Header });
        }
        Ok(())
    }

    fn extract_container(&mut self) -> Result<Container, StegoError> {
        let container = decode_container(&mut self.stego, &self.marker, self.limits)?;
        container.checked_extension()?;
        Ok(container)
    }

    fn persist_secret(
        &mut self,
        container: Container,
    ) -> Result<DecodeSummary<K::Output>, StegoError> {
        let extension = container.checked_extension()?.to_owned();
        let output = self.sink.persist(&extension, &container.payload)?;

        Ok(DecodeSummary {
            extension,
            payload_len: container.payload.len(),
            output,
        })
    }
}
