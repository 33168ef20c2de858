//! 主控制循环
//!
//! `Startup → Connected → Serving → ShuttingDown → Terminated`
//!
//! - Startup: 连接上位机，打开手并移动到起始位姿，启动触觉传感器后台更新和轮询线程
//! - Serving: 阻塞接收命令、分发、空闲等待，直到停止信号置位
//! - ShuttingDown: 停止并回收轮询线程，关闭传感器和手
//!
//! 抓取在本线程内同步执行，抓取期间不分发其它命令。

use crate::config::AppConfig;
use crate::error::SessionError;
use crate::link::{Inbound, SupervisorLink};
use parking_lot::Mutex;
use sdh_control::{GraspController, GraspPhase};
use sdh_driver::{ForceStore, PollerMetricsSnapshot, SensorPoller, StopSignal};
use sdh_hal::{AxisSet, ControllerMode, HalError, HandDriver, TactileSensor};
use sdh_protocol::{Command, JointAngles, NUM_AXES, Outbound, StatsReport};
use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 主循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Startup,
    Connected,
    Serving,
    ShuttingDown,
    Terminated,
}

/// 会话计数器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub commands: u64,
    pub parse_failures: u64,
    pub send_failures: u64,
    pub grasps_completed: u64,
}

/// 会话结束时的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub counters: SessionCounters,
    pub poller: PollerMetricsSnapshot,
}

/// 手端会话
///
/// 丢弃时若尚未 [`shutdown`](Session::shutdown)，会自动执行一次。
pub struct Session<H, T>
where
    H: HandDriver,
    T: TactileSensor + Send + 'static,
{
    config: AppConfig,
    state: LoopState,
    link: SupervisorLink<TcpStream>,
    hand: H,
    poller: Option<SensorPoller<T>>,
    forces: ForceStore,
    stop: StopSignal,
    grasp: GraspController,
    counters: SessionCounters,
    poller_metrics: PollerMetricsSnapshot,
}

impl<H, T> Session<H, T>
where
    H: HandDriver,
    T: TactileSensor + Send + 'static,
{
    /// 启动会话
    ///
    /// 任何一步失败都是致命的；手已打开时会先关闭再返回错误。
    pub fn startup(
        config: AppConfig,
        mut hand: H,
        mut tactile: T,
        stop: StopSignal,
    ) -> Result<Self, SessionError> {
        info!("Session state: {:?}", LoopState::Startup);

        let addr = config.supervisor.address();
        let stream = TcpStream::connect(&addr).map_err(|source| {
            error!("Failed to connect to supervisor at {}: {}", addr, source);
            SessionError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;
        info!("Connected to supervisor at {}", addr);
        info!("Session state: {:?}", LoopState::Connected);

        hand.open().map_err(SessionError::DriverOpen)?;
        if let Err(e) = move_to_pose(&mut hand, &config.hand.start_pose, config.hand.pose_velocity)
        {
            error!("Failed to move hand to start pose: {}", e);
            close_quietly(&mut hand, &mut tactile);
            return Err(SessionError::DriverOpen(e));
        }
        debug!("Hand at start pose {:?}", config.hand.start_pose);

        if let Err(e) =
            tactile.start_updater(config.poller.framerate, config.poller.run_length_encoding)
        {
            error!("Failed to start tactile updater: {}", e);
            close_quietly(&mut hand, &mut tactile);
            return Err(SessionError::DriverOpen(e));
        }

        let forces = ForceStore::new();
        let poller =
            match SensorPoller::start(tactile, forces.clone(), stop.clone(), config.poller.period())
            {
                Ok(poller) => poller,
                Err(e) => {
                    error!("Failed to start force poller: {}", e);
                    if let Err(close_err) = hand.close() {
                        warn!("Failed to close hand: {}", close_err);
                    }
                    return Err(SessionError::Poller(e));
                },
            };

        let grasp = GraspController::new(config.grasp.clone(), forces.clone(), stop.clone());
        Ok(Self {
            config,
            state: LoopState::Connected,
            link: SupervisorLink::new(stream),
            hand,
            poller: Some(poller),
            forces,
            stop,
            grasp,
            counters: SessionCounters::default(),
            poller_metrics: PollerMetricsSnapshot::default(),
        })
    }

    /// 服务循环：直到停止信号置位才返回
    pub fn serve(&mut self) {
        self.transition(LoopState::Serving);
        let idle = self.config.hand.idle_interval();

        while !self.stop.is_triggered() {
            match self.link.next_message() {
                Ok(Inbound::Command(command)) => self.dispatch(command),
                Ok(Inbound::Invalid(e)) => {
                    self.counters.parse_failures += 1;
                    warn!("Discarding malformed message: {}", e);
                },
                Ok(Inbound::Closed) => {
                    info!("Supervisor closed the connection");
                    self.stop.trigger();
                    break;
                },
                Err(e) => {
                    // Ctrl-C 关闭连接时也走这里
                    if self.stop.is_triggered() {
                        debug!("Receive interrupted by stop: {}", e);
                    } else {
                        error!("Receive failed: {}", e);
                        self.stop.trigger();
                    }
                    break;
                },
            }

            if self.stop.wait_timeout(idle) {
                break;
            }
        }
    }

    /// 分发一条命令
    pub fn dispatch(&mut self, command: Command) {
        self.counters.commands += 1;
        match command {
            Command::Stop => {
                info!("command to stop");
                self.stop.trigger();
            },
            Command::MoveToPose(angles) => {
                info!("command to pose {:?}", angles.as_array());
                let velocity = self.config.hand.pose_velocity;
                if let Err(e) = move_to_pose(&mut self.hand, angles.as_array(), velocity) {
                    warn!("MoveToPose failed: {}", e);
                }
            },
            Command::GotoStartPose => {
                info!("command to start pose");
                let (start_pose, velocity) = (self.config.hand.start_pose, self.config.hand.pose_velocity);
                if let Err(e) = move_to_pose(&mut self.hand, &start_pose, velocity) {
                    warn!("GotoStartPose failed: {}", e);
                }
            },
            Command::Grasp { target_force } => {
                let force = target_force.unwrap_or(self.config.hand.default_grasp_force);
                info!("command to grasp (target force: {})", force);
                self.run_grasp(force);
            },
            Command::ReportStats => {
                debug!("command to report stats");
                self.report_stats();
            },
        }
    }

    fn run_grasp(&mut self, force: f64) {
        let link = &mut self.link;
        let counters = &mut self.counters;
        let result = self.grasp.grasp(&mut self.hand, force, || {
            send_outbound(link, counters, &Outbound::GraspComplete);
        });

        match result {
            Ok(outcome) => match outcome.phase {
                GraspPhase::Grasped => {
                    self.counters.grasps_completed += 1;
                    info!(
                        "Grasp completed: {} iterations in {:?}, forces {:?}",
                        outcome.iterations,
                        outcome.elapsed,
                        outcome.final_sample.forces
                    );
                },
                phase => info!("Grasp ended in {:?} after {} iterations", phase, outcome.iterations),
            },
            Err(e) => warn!("Grasp failed: {}", e),
        }
    }

    fn report_stats(&mut self) {
        let angles = match self.hand.get_axis_actual_angle(AxisSet::ALL) {
            Ok(angles) => angles,
            Err(e) => {
                warn!("Failed to read joint angles, stats not sent: {}", e);
                return;
            },
        };
        let report = StatsReport::new(self.forces.latest(), angles);
        send_outbound(&mut self.link, &mut self.counters, &Outbound::Stats(report));
    }

    /// 关闭会话（可重复调用）
    pub fn shutdown(&mut self) -> SessionSummary {
        if self.state != LoopState::Terminated {
            self.transition(LoopState::ShuttingDown);
            self.stop.trigger();

            if let Some(mut poller) = self.poller.take() {
                self.poller_metrics = poller.metrics();
                match poller.stop() {
                    Ok(mut tactile) => {
                        if let Err(e) = tactile.close() {
                            warn!("Failed to close tactile sensor: {}", e);
                        }
                    },
                    Err(e) => warn!("Force poller did not stop cleanly: {}", e),
                }
            }

            if let Err(e) = self.hand.close() {
                warn!("Failed to close hand: {}", e);
            }

            info!(
                "Session finished: commands={}, parse_failures={}, send_failures={}, grasps={}, poller: {}",
                self.counters.commands,
                self.counters.parse_failures,
                self.counters.send_failures,
                self.counters.grasps_completed,
                self.poller_metrics
            );
            self.transition(LoopState::Terminated);
        }

        SessionSummary {
            counters: self.counters,
            poller: self.poller_metrics,
        }
    }
}

impl<H, T> Session<H, T>
where
    H: HandDriver,
    T: TactileSensor + Send + 'static,
{
    pub fn state(&self) -> LoopState {
        self.state
    }

    fn transition(&mut self, next: LoopState) {
        info!("Session state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl<H, T> Drop for Session<H, T>
where
    H: HandDriver,
    T: TactileSensor + Send + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// 中断句柄（Ctrl-C）
///
/// 在会话启动前创建：中断时置位停止信号，并关闭已挂接的上位机连接，让阻塞的接收返回。
/// 启动期间收到的中断会让随后的服务循环直接退出。
#[derive(Clone)]
pub struct InterruptHandle {
    stop: StopSignal,
    stream: Arc<Mutex<Option<TcpStream>>>,
}

impl InterruptHandle {
    pub fn new(stop: StopSignal) -> Self {
        Self {
            stop,
            stream: Arc::new(Mutex::new(None)),
        }
    }

    /// 挂接会话的上位机连接
    pub fn attach<H, T>(&self, session: &Session<H, T>) -> io::Result<()>
    where
        H: HandDriver,
        T: TactileSensor + Send + 'static,
    {
        let stream = session.link.get_ref().try_clone()?;
        *self.stream.lock() = Some(stream);
        Ok(())
    }

    pub fn interrupt(&self) {
        self.stop.trigger();
        if let Some(stream) = self.stream.lock().as_ref() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("Failed to shut down supervisor stream: {}", e);
            }
        }
    }
}

/// 位置模式运动到目标关节角（阻塞）
fn move_to_pose<H: HandDriver + ?Sized>(
    hand: &mut H,
    angles: &[f64; NUM_AXES],
    velocity: f64,
) -> Result<JointAngles, HalError> {
    hand.set_controller(ControllerMode::Pose)?;
    hand.set_axis_target_velocity(AxisSet::ALL, &[velocity; NUM_AXES])?;
    hand.set_axis_target_angle(AxisSet::ALL, angles)?;
    hand.move_axis(AxisSet::ALL, true)?;
    hand.get_axis_actual_angle(AxisSet::ALL)
}

fn send_outbound(
    link: &mut SupervisorLink<TcpStream>,
    counters: &mut SessionCounters,
    message: &Outbound,
) {
    if let Err(e) = link.send(message) {
        counters.send_failures += 1;
        warn!("Failed to send {}: {}", message.name(), e);
    }
}

fn close_quietly<H: HandDriver, T: TactileSensor>(hand: &mut H, tactile: &mut T) {
    if let Err(e) = tactile.close() {
        warn!("Failed to close tactile sensor: {}", e);
    }
    if let Err(e) = hand.close() {
        warn!("Failed to close hand: {}", e);
    }
}
