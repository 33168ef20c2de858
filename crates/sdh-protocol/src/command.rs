//! 入站命令解析
//!
//! 一条入站消息的格式：3 字节固定帧头（忽略）+ 以空白分隔的整数。
//! 第一个整数是操作码，其余整数是操作数。
//!
//! | 操作码 | 命令 | 操作数 |
//! |---|---|---|
//! | 0 | `Stop` | 无 |
//! | 1 | `MoveToPose` | 7 个整数（度） |
//! | 2 | `Grasp` | 无（使用默认目标力）或 1 个整数（目标力） |
//! | 3 | `GotoStartPose` | 无 |
//! | 4 | `ReportStats` | 无 |

use crate::ProtocolError;
use crate::constants::{HEADER_LEN, NUM_AXES};
use crate::framing::encode_frame;
use crate::types::JointAngles;
use bytes::Bytes;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Opcode {
    Stop = 0,
    MoveToPose = 1,
    Grasp = 2,
    GotoStartPose = 3,
    ReportStats = 4,
}

/// 已解码的入站命令
///
/// 每条入站消息对应一个瞬时实例。
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 设置停止标志，结束服务循环
    Stop,
    /// 位置模式下运动到目标关节角（度）
    MoveToPose(JointAngles),
    /// 闭环抓取；`None` 表示使用配置中的默认目标力
    Grasp { target_force: Option<f64> },
    /// 运动到预设起始位姿
    GotoStartPose,
    /// 上报关节角和最新力采样
    ReportStats,
}

impl Command {
    /// 从一条完整的入站消息（包含 3 字节帧头）解析命令
    ///
    /// # 错误
    ///
    /// 任何格式问题都返回 [`ProtocolError`]，调用方丢弃该消息即可。
    ///
    /// # Example
    ///
    /// ```
    /// use sdh_protocol::Command;
    ///
    /// let cmd = Command::parse(b"\x00\x02 4").unwrap();
    /// assert_eq!(cmd, Command::ReportStats);
    ///
    /// assert!(Command::parse(b"\x00\x04 abc").is_err());
    /// ```
    pub fn parse(message: &[u8]) -> Result<Self, ProtocolError> {
        if message.len() < HEADER_LEN {
            return Err(ProtocolError::TooShort {
                expected: HEADER_LEN,
                actual: message.len(),
            });
        }

        let body =
            std::str::from_utf8(&message[HEADER_LEN..]).map_err(|_| ProtocolError::InvalidUtf8)?;
        Self::parse_body(body)
    }

    /// 解析去掉帧头之后的文本部分
    pub fn parse_body(body: &str) -> Result<Self, ProtocolError> {
        let values = body
            .split_whitespace()
            .map(|token| {
                token.parse::<i64>().map_err(|_| ProtocolError::InvalidInteger {
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<i64>, _>>()?;

        let (&raw_opcode, operands) = values.split_first().ok_or(ProtocolError::Empty)?;
        let opcode = u8::try_from(raw_opcode)
            .ok()
            .and_then(|byte| Opcode::try_from(byte).ok())
            .ok_or(ProtocolError::UnknownOpcode { opcode: raw_opcode })?;

        match opcode {
            Opcode::Stop => expect_no_operands("Stop", operands).map(|_| Command::Stop),
            Opcode::MoveToPose => {
                if operands.len() != NUM_AXES {
                    return Err(ProtocolError::InvalidOperands {
                        command: "MoveToPose",
                        expected: "7",
                        actual: operands.len(),
                    });
                }
                let mut angles = [0.0; NUM_AXES];
                for (slot, value) in angles.iter_mut().zip(operands) {
                    *slot = *value as f64;
                }
                Ok(Command::MoveToPose(JointAngles(angles)))
            },
            Opcode::Grasp => match operands {
                [] => Ok(Command::Grasp { target_force: None }),
                [force] => Ok(Command::Grasp {
                    target_force: Some(*force as f64),
                }),
                _ => Err(ProtocolError::InvalidOperands {
                    command: "Grasp",
                    expected: "0 or 1",
                    actual: operands.len(),
                }),
            },
            Opcode::GotoStartPose => {
                expect_no_operands("GotoStartPose", operands).map(|_| Command::GotoStartPose)
            },
            Opcode::ReportStats => {
                expect_no_operands("ReportStats", operands).map(|_| Command::ReportStats)
            },
        }
    }

    /// 命令对应的操作码
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Stop => Opcode::Stop,
            Command::MoveToPose(_) => Opcode::MoveToPose,
            Command::Grasp { .. } => Opcode::Grasp,
            Command::GotoStartPose => Opcode::GotoStartPose,
            Command::ReportStats => Opcode::ReportStats,
        }
    }

    /// 命令名（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Command::Stop => "Stop",
            Command::MoveToPose(_) => "MoveToPose",
            Command::Grasp { .. } => "Grasp",
            Command::GotoStartPose => "GotoStartPose",
            Command::ReportStats => "ReportStats",
        }
    }

    /// 编码为上位机发送的文本负载（以分隔空格开头）
    ///
    /// 角度和目标力按整数发送（四舍五入）。
    pub fn to_payload(&self) -> String {
        let mut payload = format!(" {}", u8::from(self.opcode()));
        match self {
            Command::MoveToPose(angles) => {
                for angle in angles.iter() {
                    payload.push_str(&format!(" {}", angle.round() as i64));
                }
            },
            Command::Grasp {
                target_force: Some(force),
            } => payload.push_str(&format!(" {}", force.round() as i64)),
            _ => {},
        }
        payload
    }

    /// 编码为完整的入站帧（2 字节长度前缀 + 负载）
    ///
    /// 上位机侧工具和测试使用。
    pub fn to_frame(&self) -> Result<Bytes, ProtocolError> {
        encode_frame(self.to_payload().as_bytes())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::MoveToPose(angles) => write!(f, "MoveToPose({:?})", angles.as_array()),
            Command::Grasp {
                target_force: Some(force),
            } => write!(f, "Grasp({})", force),
            other => f.write_str(other.name()),
        }
    }
}

fn expect_no_operands(command: &'static str, operands: &[i64]) -> Result<(), ProtocolError> {
    if operands.is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::InvalidOperands {
            command,
            expected: "0",
            actual: operands.len(),
        })
    }
}
