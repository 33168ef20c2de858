//! # SDH Hand Client
//!
//! 手端进程：主动连接上位机，接收位姿/抓取/停止/统计命令并驱动三指手。
//!
//! ```bash
//! # 默认连接 192.168.1.110:2009
//! sdh-hand-client --config config/hand-client.toml
//!
//! # 覆盖上位机地址，打开调试日志
//! RUST_LOG=sdh_control=debug sdh-hand-client --host 127.0.0.1 --port 2009
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use sdh_driver::StopSignal;
use std::path::PathBuf;
use tracing::{error, info, warn};

mod config;
mod error;
mod link;
mod session;

use config::AppConfig;
use session::{InterruptHandle, Session};

/// SDH 手端客户端
#[derive(Parser, Debug)]
#[command(name = "sdh-hand-client")]
#[command(about = "Hand-side client for tactile grasping with the SDH", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 上位机地址（覆盖配置文件）
    #[arg(long)]
    host: Option<String>,

    /// 上位机端口（覆盖配置文件）
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sdh_hand_client=info".parse()?)
                .add_directive("sdh_control=info".parse()?)
                .add_directive("sdh_driver=info".parse()?)
                .add_directive("sdh_hal=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(host) = cli.host {
        config.supervisor.host = host;
    }
    if let Some(port) = cli.port {
        config.supervisor.port = port;
    }

    warn!("Using simulated hand and tactile backend");
    let (hand, tactile, _world) = sdh_hal::sim_pair(config.sim.clone());

    // Ctrl-C：置位停止信号，并关闭连接让阻塞的接收返回；启动前安装，启动期间也能响应
    let stop = StopSignal::new();
    let interrupt = InterruptHandle::new(stop.clone());
    let handler = interrupt.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        handler.interrupt();
    })
    .context("failed to install Ctrl-C handler")?;

    let mut session = match Session::startup(config, hand, tactile, stop) {
        Ok(session) => session,
        Err(e) => {
            if e.is_fatal() {
                error!("Fatal startup error: {}", e);
            }
            return Err(anyhow::Error::new(e).context("hand client startup failed"));
        },
    };

    if let Err(e) = interrupt.attach(&session) {
        session.shutdown();
        return Err(anyhow::Error::new(e).context("failed to clone supervisor stream"));
    }

    session.serve();
    let summary = session.shutdown();
    info!(
        "Hand client terminated ({:?}, poller: {})",
        summary.counters, summary.poller
    );

    Ok(())
}
