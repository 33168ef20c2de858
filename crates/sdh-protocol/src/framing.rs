//! 入站消息分帧
//!
//! 上位机用 2 字节大端长度前缀 + 文本负载发送每条命令，负载以一个分隔空格开头。
//! TCP 是字节流：一条命令可能被拆成多次接收，多条命令也可能在一次接收中粘连。
//! `MessageFramer` 缓存收到的字节，只在凑齐一条完整消息时才把它交出去。
//!
//! 交出的消息**包含**长度前缀，因此前 3 个字节正好是 [`Command::parse`] 忽略的固定帧头。
//!
//! [`Command::parse`]: crate::Command::parse

use crate::ProtocolError;
use crate::constants::{LENGTH_PREFIX_LEN, MAX_MESSAGE_LEN};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// 把负载编码为带长度前缀的帧
///
/// # 错误
///
/// 负载超过 `u16::MAX` 字节时返回 `FrameTooLarge`。
pub fn encode_frame(payload: &[u8]) -> Result<Bytes, ProtocolError> {
    let len = u16::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge {
        declared: payload.len(),
        limit: u16::MAX as usize,
    })?;
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    buf.put_u16(len);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// 入站消息分帧器
///
/// # Example
///
/// ```
/// use sdh_protocol::{Command, MessageFramer};
///
/// let mut framer = MessageFramer::new();
/// let frame = Command::ReportStats.to_frame().unwrap();
///
/// // 拆成两段到达
/// framer.push(&frame[..1]);
/// assert!(framer.next_message().unwrap().is_none());
/// framer.push(&frame[1..]);
///
/// let message = framer.next_message().unwrap().unwrap();
/// assert_eq!(Command::parse(&message).unwrap(), Command::ReportStats);
/// ```
#[derive(Debug)]
pub struct MessageFramer {
    buf: BytesMut,
    max_len: usize,
    /// 超长帧尚未到达、需要跳过的字节数
    discard: usize,
}

impl MessageFramer {
    /// 使用默认最大消息长度创建分帧器
    pub fn new() -> Self {
        Self::with_max_len(MAX_MESSAGE_LEN)
    }

    /// 指定最大负载长度
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_MESSAGE_LEN),
            max_len,
            discard: 0,
        }
    }

    /// 追加一次接收到的原始字节
    pub fn push(&mut self, chunk: &[u8]) {
        let skip = self.discard.min(chunk.len());
        self.discard -= skip;
        self.buf.extend_from_slice(&chunk[skip..]);
    }

    /// 取出下一条完整消息（包含长度前缀）
    ///
    /// - `Ok(Some(msg))`: 有完整消息
    /// - `Ok(None)`: 数据不足，需要继续接收
    /// - `Err(FrameTooLarge)`: 声明长度超过上限；整帧被跳过，包括之后才到达的部分
    pub fn next_message(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        if self.buf.len() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        let declared = u16::from_be_bytes([self.buf[0], self.buf[1]]) as usize;
        let total = LENGTH_PREFIX_LEN + declared;
        if declared > self.max_len {
            if self.buf.len() >= total {
                self.buf.advance(total);
            } else {
                self.discard = total - self.buf.len();
                self.buf.clear();
            }
            return Err(ProtocolError::FrameTooLarge {
                declared,
                limit: self.max_len,
            });
        }

        if self.buf.len() < total {
            return Ok(None);
        }

        Ok(Some(self.buf.split_to(total).freeze()))
    }

    /// 缓冲区中尚未组成完整消息的字节数
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// 丢弃所有缓存字节
    pub fn clear(&mut self) {
        self.buf.clear();
        self.discard = 0;
    }
}

impl Default for MessageFramer {
    fn default() -> Self {
        Self::new()
    }
}
