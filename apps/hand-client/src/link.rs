//! 上位机连接
//!
//! 入站：按长度前缀分帧后解码为 [`Command`]；接收没有超时，一直阻塞到有完整消息、
//! 对端关闭或出错为止。出站：统计报文和抓取完成通知以纯文本写出。

use sdh_protocol::{Command, MAX_MESSAGE_LEN, MessageFramer, Outbound, ProtocolError};
use std::io::{self, Read, Write};
use tracing::trace;

/// 一次接收的结果
#[derive(Debug)]
pub enum Inbound {
    /// 解码成功的命令
    Command(Command),
    /// 无法解析的消息（已丢弃）
    Invalid(ProtocolError),
    /// 对端正常关闭连接
    Closed,
}

/// 上位机连接
pub struct SupervisorLink<S> {
    stream: S,
    framer: MessageFramer,
    buf: Vec<u8>,
}

impl<S: Read + Write> SupervisorLink<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            framer: MessageFramer::new(),
            buf: vec![0; MAX_MESSAGE_LEN],
        }
    }

    /// 阻塞直到收到下一条完整消息
    ///
    /// 只有底层 IO 错误返回 `Err`；格式错误的消息以 `Inbound::Invalid` 交给调用方记录。
    pub fn next_message(&mut self) -> io::Result<Inbound> {
        loop {
            match self.framer.next_message() {
                Ok(Some(message)) => {
                    return Ok(match Command::parse(&message) {
                        Ok(command) => Inbound::Command(command),
                        Err(e) => Inbound::Invalid(e),
                    });
                },
                Ok(None) => {},
                Err(e) => return Ok(Inbound::Invalid(e)),
            }

            let n = match self.stream.read(&mut self.buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                if self.framer.pending() > 0 {
                    trace!("Discarding {} bytes of incomplete message", self.framer.pending());
                    self.framer.clear();
                }
                return Ok(Inbound::Closed);
            }
            trace!("Received {} bytes", n);
            self.framer.push(&self.buf[..n]);
        }
    }

    /// 发送一条出站报文
    pub fn send(&mut self, message: &Outbound) -> io::Result<()> {
        let text = message.encode();
        self.stream.write_all(text.as_bytes())?;
        self.stream.flush()?;
        trace!("Sent {}: {:?}", message.name(), text);
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }
}
