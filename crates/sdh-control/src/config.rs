//! 抓取控制参数

use std::time::Duration;

/// 抓取控制器配置
///
/// 默认值即控制律的标准参数：
///
/// - 远端关节速度 = (目标力 × 手指倍率 − 远端力) × `gain`
/// - 近端关节速度 = (目标力 × 手指倍率 − 近端力) × `gain` × `proximal_ratio`
/// - 所有速度饱和到 `[min_velocity, max_velocity]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraspConfig {
    /// 比例增益（度/秒 每单位力误差）
    pub gain: f64,
    /// 近端关节相对远端关节的增益比例
    pub proximal_ratio: f64,
    /// 每根手指的目标力倍率（手指 1 为对置指，目标力加倍）
    pub finger_force_scale: [f64; 3],
    /// 速度下限（度/秒）
    pub min_velocity: f64,
    /// 速度上限（度/秒）
    pub max_velocity: f64,
    /// 远端接触判定阈值
    pub contact_threshold: f64,
    /// 控制周期（毫秒）
    pub loop_period_ms: u64,
    /// 所有轴的目标加速度（度/秒²）
    pub acceleration: f64,
    /// 允许的连续手命令失败次数
    pub max_consecutive_failures: u32,
}

impl GraspConfig {
    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            gain: 0.30,
            proximal_ratio: 0.5,
            finger_force_scale: [1.0, 2.0, 1.0],
            min_velocity: -5.0,
            max_velocity: 7.0,
            contact_threshold: 0.1,
            loop_period_ms: 100,
            acceleration: 100.0,
            max_consecutive_failures: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraspConfig::default();
        assert_eq!(config.loop_period(), Duration::from_millis(100));
        assert_eq!(config.finger_force_scale, [1.0, 2.0, 1.0]);
        assert_eq!(config.max_consecutive_failures, 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GraspConfig = toml::from_str("gain = 0.5\nloop_period_ms = 20\n").unwrap();
        assert_eq!(config.gain, 0.5);
        assert_eq!(config.loop_period_ms, 20);
        assert_eq!(config.max_velocity, 7.0);
    }
}
