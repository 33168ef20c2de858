//! 会话错误分类
//!
//! 只有启动阶段的错误是致命的；单条命令、单个轮询周期内的失败在原地记录日志后继续。

use sdh_driver::DriverError;
use sdh_hal::HalError;
use thiserror::Error;

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 无法连接上位机
    #[error("Failed to connect to supervisor at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// 手或触觉传感器打开失败
    #[error("Failed to open hand driver: {0}")]
    DriverOpen(#[source] HalError),

    /// 轮询线程错误
    #[error("Force poller error: {0}")]
    Poller(#[from] DriverError),

    /// 配置文件无效
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// 是否导致进程退出
    pub fn is_fatal(&self) -> bool {
        match self {
            SessionError::Connect { .. } | SessionError::DriverOpen(_) | SessionError::Config(_) => {
                true
            },
            SessionError::Poller(e) => matches!(e, DriverError::ThreadSpawn(_)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        let connect = SessionError::Connect {
            addr: "127.0.0.1:1".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert!(connect.is_fatal());
        assert!(connect.to_string().starts_with("Failed to connect to supervisor at 127.0.0.1:1"));

        assert!(SessionError::DriverOpen(HalError::NotOpen).is_fatal());
        assert!(
            SessionError::Poller(DriverError::ThreadSpawn(std::io::Error::other("no threads")))
                .is_fatal()
        );
        assert!(!SessionError::Poller(DriverError::ThreadPanicked("boom".into())).is_fatal());
    }
}
