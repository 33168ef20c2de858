//! # SDH Protocol
//!
//! 手端进程与上位机（supervisor）之间的 TCP 文本协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量（轴数、帧头长度、默认起始位姿等）
//! - `types`: 力采样矩阵、关节角向量等共享数据类型
//! - `command`: 入站命令解析（操作码表）
//! - `framing`: 入站消息分帧（2 字节大端长度前缀）
//! - `report`: 出站统计报文与抓取完成通知
//!
//! ## 报文格式
//!
//! ```text
//! 入站（上位机 → 手端）：
//!   [len_hi][len_lo][' '] "op arg1 arg2 ..."
//!   \_____ 3 字节帧头 ____/
//!
//! 出站（手端 → 上位机，无长度前缀）：
//!   "1 f00:f01:f10:f11:f20:f21:a0:a1:a2:a3:a4:a5:a6"
//!   "2 "
//! ```

pub mod command;
pub mod constants;
pub mod framing;
pub mod report;
pub mod types;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use framing::*;
pub use report::*;
pub use types::*;

use thiserror::Error;

/// 协议解析错误类型
///
/// 所有变体都属于可恢复错误：服务循环丢弃当前消息并继续处理下一条。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Message payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Message payload is empty")]
    Empty,

    #[error("Invalid integer token: {token:?}")]
    InvalidInteger { token: String },

    #[error("Unknown opcode: {opcode}")]
    UnknownOpcode { opcode: i64 },

    #[error("Invalid operands for {command}: expected {expected}, got {actual}")]
    InvalidOperands {
        command: &'static str,
        expected: &'static str,
        actual: usize,
    },

    #[error("Frame too large: declared {declared} bytes, limit {limit}")]
    FrameTooLarge { declared: usize, limit: usize },

    #[error("Parse error: {0}")]
    ParseError(String),
}
