//! 出站报文
//!
//! 手端向上位机发送两种报文（无长度前缀的纯文本）：
//!
//! - 统计报文：`"1 "` + 13 个以冒号分隔、保留 3 位小数的数值
//!   （6 个力：finger0 近端、finger0 远端、finger1 近端 …… 然后 7 个关节角，轴 0..6）
//! - 抓取完成通知：`"2 "`

use crate::ProtocolError;
use crate::constants::{
    GRASP_COMPLETE, NUM_AXES, NUM_FINGERS, NUM_PADS, STATS_FIELD_COUNT, STATS_PREFIX,
};
use crate::types::{ForceSample, JointAngles};
use std::fmt;

/// 统计报文
///
/// # Example
///
/// ```
/// use sdh_protocol::{ForceSample, JointAngles, StatsReport};
///
/// let report = StatsReport::new(
///     ForceSample::new([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]),
///     JointAngles([0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]),
/// );
/// assert_eq!(
///     report.encode(),
///     "1 1.000:2.000:3.000:4.000:5.000:6.000:0.000:10.000:20.000:30.000:40.000:50.000:60.000"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsReport {
    pub forces: ForceSample,
    pub angles: JointAngles,
}

impl StatsReport {
    pub fn new(forces: ForceSample, angles: JointAngles) -> Self {
        Self { forces, angles }
    }

    /// 编码为报文文本
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// 从报文文本解析（上位机侧）
    ///
    /// 字段数量必须正好是 13。
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let body = text
            .strip_prefix(STATS_PREFIX)
            .ok_or_else(|| ProtocolError::ParseError(format!("missing stats prefix: {:?}", text)))?;

        let values = body
            .trim()
            .split(':')
            .map(|field| {
                field
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ProtocolError::ParseError(format!("invalid stats field: {:?}", field)))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if values.len() != STATS_FIELD_COUNT {
            return Err(ProtocolError::ParseError(format!(
                "expected {} stats fields, got {}",
                STATS_FIELD_COUNT,
                values.len()
            )));
        }

        let mut forces = [[0.0; NUM_PADS]; NUM_FINGERS];
        for (i, value) in values[..NUM_FINGERS * NUM_PADS].iter().enumerate() {
            forces[i / NUM_PADS][i % NUM_PADS] = *value;
        }
        let mut angles = [0.0; NUM_AXES];
        angles.copy_from_slice(&values[NUM_FINGERS * NUM_PADS..]);

        Ok(Self {
            forces: ForceSample::new(forces),
            angles: JointAngles(angles),
        })
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(STATS_PREFIX)?;
        let forces = self.forces.flatten();
        let fields = forces.iter().chain(self.angles.iter());
        for (i, value) in fields.enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:.3}", value)?;
        }
        Ok(())
    }
}

/// 出站报文
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outbound {
    /// 统计报文（响应 `ReportStats`）
    Stats(StatsReport),
    /// 抓取完成通知
    GraspComplete,
}

impl Outbound {
    /// 报文文本
    pub fn encode(&self) -> String {
        match self {
            Outbound::Stats(report) => report.encode(),
            Outbound::GraspComplete => GRASP_COMPLETE.to_string(),
        }
    }

    /// 报文名（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Outbound::Stats(_) => "Stats",
            Outbound::GraspComplete => "GraspComplete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> StatsReport {
        StatsReport::new(
            ForceSample::new([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]),
            JointAngles([0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]),
        )
    }

    #[test]
    fn test_stats_encoding_field_order() {
        assert_eq!(
            sample_report().encode(),
            "1 1.000:2.000:3.000:4.000:5.000:6.000:0.000:10.000:20.000:30.000:40.000:50.000:60.000"
        );
    }

    #[test]
    fn test_stats_encoding_precision_and_sign() {
        let report = StatsReport::new(
            ForceSample::new([[0.12345, -0.5], [0.0, 0.0], [0.0, 0.0]]),
            JointAngles([-60.0004, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        );
        let text = report.encode();
        assert!(text.starts_with("1 0.123:-0.500:"));
        assert!(text.contains(":-60.000:"));
        assert_eq!(text.trim_start_matches("1 ").split(':').count(), STATS_FIELD_COUNT);
    }

    #[test]
    fn test_stats_parse() {
        let text = sample_report().encode();
        assert_eq!(StatsReport::parse(&text).unwrap(), sample_report());
    }

    #[test]
    fn test_stats_parse_rejects_bad_input() {
        assert!(StatsReport::parse("2 ").is_err());
        assert!(StatsReport::parse("1 1.0:2.0").is_err());
        assert!(StatsReport::parse("1 a:b:c:d:e:f:g:h:i:j:k:l:m").is_err());
    }

    #[test]
    fn test_grasp_complete_message() {
        assert_eq!(Outbound::GraspComplete.encode(), "2 ");
        assert_eq!(Outbound::GraspComplete.name(), "GraspComplete");
    }
}
