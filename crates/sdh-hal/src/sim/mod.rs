//! 仿真后端
//!
//! `SimWorld` 保存手的运动学状态，[`SimHand`] 和 [`SimTactile`] 共享同一个世界：
//! 关节越过接触角后，对应触觉垫上的力按线性刚度增长。
//!
//! 运动学是惰性积分的：每次访问世界时按距上次访问的时间推进。

mod hand;
mod tactile;

pub use hand::SimHand;
pub use tactile::SimTactile;

use crate::{ContactInfo, ControllerMode, pad_axis};
use parking_lot::Mutex;
use rand::Rng;
use sdh_protocol::{NUM_AXES, Pad, START_POSE};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 仿真参数
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// 初始关节角（度）
    pub initial_angles: [f64; NUM_AXES],
    /// 每个轴开始产生接触力的角度（轴 0 没有触觉垫，忽略）
    pub contact_angles: [f64; NUM_AXES],
    /// 接触刚度（力 / 度）
    pub stiffness: f64,
    /// 力噪声幅值（均匀分布）
    pub noise: f64,
    /// 仿真时间相对真实时间的倍率
    pub time_scale: f64,
    /// 阻塞式位置运动立即完成
    pub instant_moves: bool,
    /// 关节下限（度）
    pub min_angle: f64,
    /// 关节上限（度）
    pub max_angle: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_angles: START_POSE,
            contact_angles: [0.0, -50.0, 40.0, -50.0, 40.0, -50.0, 40.0],
            stiffness: 0.2,
            noise: 0.0,
            time_scale: 1.0,
            instant_moves: false,
            min_angle: -90.0,
            max_angle: 90.0,
        }
    }
}

/// 默认位置模式速度（未设置目标速度时）
const FALLBACK_POSE_VELOCITY: f64 = 50.0;

/// 每度穿透对应的接触面积（mm²）
const AREA_PER_DEGREE: f64 = 4.0;

#[derive(Debug)]
struct PoseMotion {
    target: [f64; NUM_AXES],
    axes: crate::AxisSet,
}

#[derive(Debug)]
struct SimState {
    angles: [f64; NUM_AXES],
    velocity: [f64; NUM_AXES],
    target_velocity: [f64; NUM_AXES],
    target_acceleration: [f64; NUM_AXES],
    target_angle: [f64; NUM_AXES],
    mode: ControllerMode,
    motion: Option<PoseMotion>,
    last_update: Instant,
}

/// 仿真世界（手和触觉传感器共享）
#[derive(Debug)]
pub struct SimWorld {
    config: SimConfig,
    state: Mutex<SimState>,
}

impl SimWorld {
    pub fn new(config: SimConfig) -> Arc<Self> {
        let state = SimState {
            angles: config.initial_angles,
            velocity: [0.0; NUM_AXES],
            target_velocity: [0.0; NUM_AXES],
            target_acceleration: [0.0; NUM_AXES],
            target_angle: config.initial_angles,
            mode: ControllerMode::Pose,
            motion: None,
            last_update: Instant::now(),
        };
        Arc::new(Self {
            config,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// 当前关节角
    pub fn angles(&self) -> [f64; NUM_AXES] {
        let mut state = self.state.lock();
        self.advance(&mut state);
        state.angles
    }

    /// 当前控制模式
    pub fn mode(&self) -> ControllerMode {
        self.state.lock().mode
    }

    /// 当前目标速度
    pub fn target_velocity(&self) -> [f64; NUM_AXES] {
        self.state.lock().target_velocity
    }

    /// 所有轴是否静止
    pub fn is_stationary(&self) -> bool {
        let mut state = self.state.lock();
        self.advance(&mut state);
        state.motion.is_none()
            && match state.mode {
                ControllerMode::Pose => true,
                _ => state.velocity.iter().all(|v| *v == 0.0),
            }
    }

    /// 读取触觉垫接触信息
    pub fn contact(&self, finger: usize, pad: Pad) -> ContactInfo {
        let axis = pad_axis(finger, pad);
        let angle = {
            let mut state = self.state.lock();
            self.advance(&mut state);
            state.angles[axis]
        };

        let penetration = (angle - self.config.contact_angles[axis]).max(0.0);
        let mut force = penetration * self.config.stiffness;
        if self.config.noise > 0.0 {
            force += rand::thread_rng().gen_range(-self.config.noise..=self.config.noise);
        }
        let force = force.max(0.0);

        if force == 0.0 {
            return ContactInfo::default();
        }
        ContactInfo {
            force,
            cog_x: 0.0,
            cog_y: penetration.min(10.0),
            area: penetration * AREA_PER_DEGREE,
        }
    }

    pub(crate) fn set_mode(&self, mode: ControllerMode) {
        let mut state = self.state.lock();
        self.advance(&mut state);
        state.mode = mode;
        state.motion = None;
        state.velocity = [0.0; NUM_AXES];
        state.target_velocity = [0.0; NUM_AXES];
    }

    pub(crate) fn update_targets(&self, f: impl FnOnce(&mut SimTargets<'_>)) {
        let mut state = self.state.lock();
        self.advance(&mut state);
        let state = &mut *state;
        f(&mut SimTargets {
            velocity: &mut state.target_velocity,
            acceleration: &mut state.target_acceleration,
            angle: &mut state.target_angle,
        });
    }

    /// 开始位置运动，返回按目标速度估算的运动时长（仿真时间）
    pub(crate) fn begin_motion(&self, axes: crate::AxisSet) -> Duration {
        let mut state = self.state.lock();
        self.advance(&mut state);

        // 关节停在限位处，运动时长按限位内的目标计算
        let target = state.target_angle.map(|angle| self.clamp_angle(angle));
        let mut longest: f64 = 0.0;
        for axis in axes.iter() {
            let distance = (target[axis] - state.angles[axis]).abs();
            longest = longest.max(distance / pose_speed(state.target_velocity[axis]));
        }
        state.motion = Some(PoseMotion { target, axes });
        Duration::from_secs_f64(longest)
    }

    /// 立即完成当前位置运动
    pub(crate) fn finish_motion(&self) {
        let mut state = self.state.lock();
        self.advance(&mut state);
        if let Some(motion) = state.motion.take() {
            for axis in motion.axes.iter() {
                state.angles[axis] = self.clamp_angle(motion.target[axis]);
            }
        }
    }

    pub(crate) fn halt(&self) {
        let mut state = self.state.lock();
        self.advance(&mut state);
        state.motion = None;
        state.velocity = [0.0; NUM_AXES];
        state.target_velocity = [0.0; NUM_AXES];
    }

    /// 仿真时间换算为真实时间
    pub(crate) fn to_wall_time(&self, sim: Duration) -> Duration {
        let scale = self.config.time_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return sim;
        }
        Duration::from_secs_f64(sim.as_secs_f64() / scale)
    }

    fn clamp_angle(&self, angle: f64) -> f64 {
        angle.clamp(self.config.min_angle, self.config.max_angle)
    }

    fn advance(&self, state: &mut SimState) {
        let now = Instant::now();
        let dt = now.duration_since(state.last_update).as_secs_f64() * self.config.time_scale;
        state.last_update = now;
        if dt <= 0.0 {
            return;
        }

        match state.mode {
            ControllerMode::Pose => {
                let Some(motion) = &state.motion else {
                    return;
                };
                let mut done = true;
                for axis in motion.axes.iter() {
                    let step = pose_speed(state.target_velocity[axis]) * dt;
                    let remaining = motion.target[axis] - state.angles[axis];
                    if remaining.abs() <= step {
                        state.angles[axis] = motion.target[axis];
                    } else {
                        state.angles[axis] += step.copysign(remaining);
                        done = false;
                    }
                }
                if done {
                    state.motion = None;
                }
            },
            ControllerMode::Velocity => {
                state.velocity = state.target_velocity;
                for axis in 0..NUM_AXES {
                    state.angles[axis] += state.velocity[axis] * dt;
                }
            },
            ControllerMode::VelocityAcceleration => {
                for axis in 0..NUM_AXES {
                    let accel = state.target_acceleration[axis].abs();
                    let wanted = state.target_velocity[axis];
                    let start = state.velocity[axis];
                    let next = if accel == 0.0 {
                        wanted
                    } else {
                        let dv = (wanted - start).clamp(-accel * dt, accel * dt);
                        start + dv
                    };
                    state.angles[axis] += (start + next) * 0.5 * dt;
                    state.velocity[axis] = next;
                }
            },
        }

        for angle in state.angles.iter_mut() {
            *angle = self.clamp_angle(*angle);
        }
    }
}

/// 目标值的可变视图
pub(crate) struct SimTargets<'a> {
    pub velocity: &'a mut [f64; NUM_AXES],
    pub acceleration: &'a mut [f64; NUM_AXES],
    pub angle: &'a mut [f64; NUM_AXES],
}

fn pose_speed(target_velocity: f64) -> f64 {
    let speed = target_velocity.abs();
    if speed > 0.0 {
        speed
    } else {
        FALLBACK_POSE_VELOCITY
    }
}

/// 构建一对共享同一仿真世界的手和触觉传感器
pub fn pair(config: SimConfig) -> (SimHand, SimTactile, Arc<SimWorld>) {
    let world = SimWorld::new(config);
    (
        SimHand::new(Arc::clone(&world)),
        SimTactile::new(Arc::clone(&world)),
        world,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AxisSet, HandDriver, TactileSensor};

    fn fast_config() -> SimConfig {
        SimConfig {
            time_scale: 200.0,
            instant_moves: true,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_start_pose_has_no_contact() {
        let world = SimWorld::new(SimConfig::default());
        for finger in 0..3 {
            for pad in Pad::ALL {
                assert_eq!(world.contact(finger, pad), ContactInfo::default());
            }
        }
    }

    #[test]
    fn test_penetration_produces_force() {
        let mut config = SimConfig::default();
        // 远端关节已越过接触角 5 度
        config.initial_angles[2] = 45.0;
        let world = SimWorld::new(config);

        let info = world.contact(0, Pad::Distal);
        assert!((info.force - 1.0).abs() < 1e-9);
        assert!((info.area - 20.0).abs() < 1e-9);
        assert_eq!(world.contact(1, Pad::Distal).force, 0.0);
    }

    #[test]
    fn test_velocity_mode_closes_fingers() {
        let (mut hand, mut tactile, world) = pair(fast_config());
        hand.open().unwrap();
        tactile.start_updater(30, true).unwrap();

        hand.set_controller(ControllerMode::Velocity).unwrap();
        hand.set_axis_target_velocity(AxisSet::ALL, &[0.0, 0.0, 5.0, 0.0, 5.0, 0.0, 5.0])
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while tactile.get_contact_force(0, Pad::Distal).unwrap().force == 0.0 {
            assert!(Instant::now() < deadline, "distal pad never touched");
            std::thread::sleep(Duration::from_millis(5));
        }

        hand.stop().unwrap();
        let angles = world.angles();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(world.angles(), angles);
        assert!(world.is_stationary());
    }

    #[test]
    fn test_velocity_acceleration_ramps_up() {
        let world = SimWorld::new(SimConfig::default());
        world.set_mode(ControllerMode::VelocityAcceleration);
        world.update_targets(|t| {
            t.velocity[2] = 10.0;
            t.acceleration[2] = 100.0;
        });
        std::thread::sleep(Duration::from_millis(300));
        let angle = world.angles()[2];
        // 0.1 s 加速到 10 度/秒，之后匀速，移动量小于匀速 10 度/秒的理论值
        assert!(angle > 30.0);
        assert!(angle < 30.0 + 10.0 * 0.5);
    }

    #[test]
    fn test_angles_are_clamped() {
        let config = SimConfig {
            time_scale: 1000.0,
            ..SimConfig::default()
        };
        let world = SimWorld::new(config);
        world.set_mode(ControllerMode::Velocity);
        world.update_targets(|t| t.velocity[0] = 50.0);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(world.angles()[0], 90.0);
    }

    #[test]
    fn test_out_of_range_pose_duration_stops_at_limit() {
        let world = SimWorld::new(SimConfig::default());
        world.update_targets(|t| {
            t.velocity[1] = 50.0;
            t.angle[1] = 100_000.0;
        });

        // -60 → 90 度，50 度/秒
        let duration = world.begin_motion(AxisSet::single(1).unwrap());
        assert!((duration.as_secs_f64() - 3.0).abs() < 1e-6);

        world.finish_motion();
        assert_eq!(world.angles()[1], 90.0);
    }

    #[test]
    fn test_noise_never_negative() {
        let config = SimConfig {
            noise: 0.5,
            ..SimConfig::default()
        };
        let world = SimWorld::new(config);
        for _ in 0..100 {
            assert!(world.contact(1, Pad::Proximal).force >= 0.0);
        }
    }
}
