//! 闭环抓取控制器
//!
//! 以固定周期读取最新力采样，按比例控制律下发关节速度，直到三根手指的远端触觉垫
//! 都检测到接触为止；随后下发零速度并急停，再通过回调发出抓取完成通知。
//!
//! - 循环锚点：下一个周期 = 上一个锚点 + 周期，在停止信号上等待到锚点
//! - 容错：允许连续 `max_consecutive_failures` 次速度命令失败
//! - 取消：每次迭代开始前检查停止信号，命中则急停并返回 `Aborted`

use crate::config::GraspConfig;
use crate::error::ControlError;
use crate::session::{GraspPhase, GraspSession, GraspStep};
use sdh_driver::{ForceStore, StopSignal};
use sdh_hal::{AxisSet, ControllerMode, HandDriver};
use sdh_protocol::{ForceSample, NUM_AXES};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 一次抓取的结果
#[derive(Debug, Clone, PartialEq)]
pub struct GraspOutcome {
    /// `Grasped` 或 `Aborted`
    pub phase: GraspPhase,
    pub iterations: u32,
    pub elapsed: Duration,
    /// 最后一次迭代使用的力采样
    pub final_sample: ForceSample,
}

impl GraspOutcome {
    pub fn is_grasped(&self) -> bool {
        self.phase == GraspPhase::Grasped
    }
}

/// 抓取控制器
///
/// 持有力快照存储和停止信号的句柄；手驱动在每次调用时借入。
#[derive(Debug, Clone)]
pub struct GraspController {
    config: GraspConfig,
    forces: ForceStore,
    stop: StopSignal,
}

impl GraspController {
    pub fn new(config: GraspConfig, forces: ForceStore, stop: StopSignal) -> Self {
        Self {
            config,
            forces,
            stop,
        }
    }

    pub fn config(&self) -> &GraspConfig {
        &self.config
    }

    /// 阻塞执行一次抓取
    ///
    /// 抓紧时在急停之后调用一次 `on_grasped`；中止时不调用。
    ///
    /// # 错误
    ///
    /// - 目标力为负或非有限值：`InvalidTargetForce`
    /// - 模式/加速度设置、最终急停失败：`Hal`
    /// - 速度命令连续失败超过阈值：`ConsecutiveFailures`
    pub fn grasp<H, F>(
        &self,
        hand: &mut H,
        desired_force: f64,
        on_grasped: F,
    ) -> Result<GraspOutcome, ControlError>
    where
        H: HandDriver + ?Sized,
        F: FnOnce(),
    {
        if !desired_force.is_finite() || desired_force < 0.0 {
            return Err(ControlError::InvalidTargetForce(desired_force));
        }

        hand.set_controller(ControllerMode::VelocityAcceleration)?;
        hand.set_axis_target_acceleration(AxisSet::ALL, &[self.config.acceleration; NUM_AXES])?;

        let mut session = GraspSession::new(desired_force);
        session.begin();
        info!("Grasp started (target force: {})", desired_force);

        let period = self.config.loop_period();
        let start = Instant::now();
        let mut next_tick = start;
        let mut error_count: u32 = 0;
        let mut sample = self.forces.latest();

        loop {
            if self.stop.is_triggered() {
                session.abort();
                hand.stop()?;
                info!("Grasp aborted after {} iterations", session.iterations());
                return Ok(self.outcome(&session, start, sample));
            }

            next_tick += period;
            sample = self.forces.latest();

            match session.step(&self.config, &sample) {
                Some(GraspStep::Grasped) => {
                    hand.set_axis_target_velocity(AxisSet::ALL, session.velocities())?;
                    hand.stop()?;
                    info!(
                        "Grasp achieved after {} iterations ({:?}), distal forces: {:?}",
                        session.iterations(),
                        start.elapsed(),
                        sample.distal()
                    );
                    on_grasped();
                    return Ok(self.outcome(&session, start, sample));
                },
                Some(GraspStep::Command(velocities)) => {
                    debug!("Grasp iteration {}: v = {:?}", session.iterations(), velocities);
                    match hand.set_axis_target_velocity(AxisSet::ALL, &velocities) {
                        Ok(()) => error_count = 0,
                        Err(e) => {
                            error_count += 1;
                            if error_count > self.config.max_consecutive_failures {
                                error!(
                                    "Consecutive hand failures ({}): {}. Aborting grasp.",
                                    error_count, e
                                );
                                if let Err(stop_err) = hand.stop() {
                                    warn!("Failed to stop hand after aborted grasp: {}", stop_err);
                                }
                                return Err(ControlError::ConsecutiveFailures {
                                    count: error_count,
                                    last_error: Box::new(e),
                                });
                            }
                            warn!(
                                "Transient hand error ({}): {}, retrying next tick",
                                error_count, e
                            );
                        },
                    }
                },
                None => {
                    // 会话只会在上面两个分支里进入终态
                    session.abort();
                    return Ok(self.outcome(&session, start, sample));
                },
            }

            let now = Instant::now();
            if next_tick > now {
                // 停止信号在循环顶部处理
                self.stop.wait_until(next_tick);
            } else {
                warn!(
                    "Grasp loop overrun: iteration took {:?} (period {:?})",
                    now.duration_since(next_tick - period),
                    period
                );
                next_tick = now;
            }
        }
    }

    fn outcome(&self, session: &GraspSession, start: Instant, sample: ForceSample) -> GraspOutcome {
        GraspOutcome {
            phase: session.phase(),
            iterations: session.iterations(),
            elapsed: start.elapsed(),
            final_sample: sample,
        }
    }
}
