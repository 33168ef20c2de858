//! 协议常量定义

/// 手的关节轴数量（轴 0 为公共/腕部轴，轴 1-6 为三根手指各两个关节）
pub const NUM_AXES: usize = 7;

/// 手指数量
pub const NUM_FINGERS: usize = 3;

/// 每根手指的触觉垫数量（0 = 近端，1 = 远端）
pub const NUM_PADS: usize = 2;

/// 入站消息固定帧头长度（2 字节长度前缀 + 1 字节分隔空格）
pub const HEADER_LEN: usize = 3;

/// 长度前缀字节数（大端 u16）
pub const LENGTH_PREFIX_LEN: usize = 2;

/// 单条入站消息允许的最大负载长度（字节）
///
/// 与原手端进程的单次接收缓冲区大小一致。
pub const MAX_MESSAGE_LEN: usize = 1024;

/// 预设起始位姿（度），轴 0..6
pub const START_POSE: [f64; NUM_AXES] = [0.0, -60.0, 30.0, -60.0, 30.0, -60.0, 30.0];

/// 位置模式下的默认轴速度（度/秒）
pub const DEFAULT_POSE_VELOCITY: f64 = 50.0;

/// `Grasp` 命令未携带操作数时的默认目标接触力
pub const DEFAULT_GRASP_FORCE: f64 = 5.0;

/// 统计报文前缀
pub const STATS_PREFIX: &str = "1 ";

/// 抓取完成通知（固定报文）
pub const GRASP_COMPLETE: &str = "2 ";

/// 统计报文中的字段数量（6 个力 + 7 个关节角）
pub const STATS_FIELD_COUNT: usize = NUM_FINGERS * NUM_PADS + NUM_AXES;
