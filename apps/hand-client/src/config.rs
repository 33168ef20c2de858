//! 配置文件（TOML）
//!
//! 所有字段都有默认值，空文件也是合法配置：
//!
//! ```toml
//! [supervisor]
//! host = "192.168.1.110"
//! port = 2009
//!
//! [hand]
//! default_grasp_force = 5.0
//!
//! [poller]
//! period_ms = 500
//! ```

use crate::error::SessionError;
use sdh_control::GraspConfig;
use sdh_hal::SimConfig;
use sdh_protocol::{DEFAULT_GRASP_FORCE, DEFAULT_POSE_VELOCITY, NUM_AXES, START_POSE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 上位机地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub host: String,
    pub port: u16,
}

impl SupervisorConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.110".to_string(),
            port: 2009,
        }
    }
}

/// 手的运动参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// 起始位姿（度）
    pub start_pose: [f64; NUM_AXES],
    /// 位置模式轴速度（度/秒）
    pub pose_velocity: f64,
    /// `Grasp` 不带操作数时的目标力
    pub default_grasp_force: f64,
    /// 两条命令之间的空闲间隔（毫秒）
    pub idle_interval_ms: u64,
}

impl HandConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            start_pose: START_POSE,
            pose_velocity: DEFAULT_POSE_VELOCITY,
            default_grasp_force: DEFAULT_GRASP_FORCE,
            idle_interval_ms: 100,
        }
    }
}

/// 触觉轮询参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub period_ms: u64,
    /// 传感器后台更新帧率
    pub framerate: u32,
    pub run_length_encoding: bool,
}

impl PollerConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            period_ms: 500,
            framerate: 30,
            run_length_encoding: true,
        }
    }
}

/// 手端进程配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub supervisor: SupervisorConfig,
    pub hand: HandConfig,
    pub poller: PollerConfig,
    pub grasp: GraspConfig,
    pub sim: SimConfig,
}

impl AppConfig {
    /// 从 TOML 文件加载
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SessionError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| SessionError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SessionError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| SessionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 拒绝会让循环空转或永不终止的参数
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.poller.period_ms == 0 {
            return Err(SessionError::Config("poller.period_ms must be > 0".to_string()));
        }
        if self.grasp.loop_period_ms == 0 {
            return Err(SessionError::Config("grasp.loop_period_ms must be > 0".to_string()));
        }
        if self.grasp.min_velocity > self.grasp.max_velocity {
            return Err(SessionError::Config(
                "grasp.min_velocity must not exceed grasp.max_velocity".to_string(),
            ));
        }
        let force = self.hand.default_grasp_force;
        if !force.is_finite() || force < 0.0 {
            return Err(SessionError::Config(
                "hand.default_grasp_force must be >= 0".to_string(),
            ));
        }
        let scale = self.sim.time_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(SessionError::Config("sim.time_scale must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.supervisor.address(), "192.168.1.110:2009");
        assert_eq!(config.hand.start_pose, START_POSE);
        assert_eq!(config.hand.idle_interval(), Duration::from_millis(100));
        assert_eq!(config.poller.period(), Duration::from_millis(500));
        assert_eq!(config.poller.framerate, 30);
        assert!(config.poller.run_length_encoding);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = include_str!("../../../config/hand-client.toml");
        assert_eq!(AppConfig::from_toml_str(shipped).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [supervisor]
            host = "10.0.0.5"

            [grasp]
            gain = 0.25

            [sim]
            time_scale = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.supervisor.address(), "10.0.0.5:2009");
        assert_eq!(config.grasp.gain, 0.25);
        assert_eq!(config.grasp.max_velocity, 7.0);
        assert_eq!(config.sim.time_scale, 4.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("[poller]\nperiod_ms = 0\n"),
            Err(SessionError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[grasp]\nmin_velocity = 9.0\n"),
            Err(SessionError::Config(_))
        ));
        for scale in ["nan", "inf", "0.0", "-2.0"] {
            assert!(
                matches!(
                    AppConfig::from_toml_str(&format!("[sim]\ntime_scale = {scale}\n")),
                    Err(SessionError::Config(_))
                ),
                "time_scale = {scale} accepted"
            );
        }
        assert!(matches!(
            AppConfig::from_toml_str("[supervisor]\nport = \"x\"\n"),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[hand]\ndefault_grasp_force = 8.0").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.hand.default_grasp_force, 8.0);

        let missing = AppConfig::load(Path::new("/nonexistent/sdh.toml"));
        assert!(matches!(missing, Err(SessionError::Config(_))));
    }
}
