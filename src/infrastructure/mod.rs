//! 基础设施层
//!
//! 持有单次运行独占的资源，只暴露能力：
//! - `CancellationToken`：运行级取消标志
//! - `ScoreRng`：可注入的随机源
//! - `StepPacer`：挂起点（模拟 OCR / 推理耗时）

pub mod cancellation;
pub mod pacer;
pub mod randomness;

pub use cancellation::CancellationToken;
pub use pacer::StepPacer;
pub use randomness::{entropy_rng, seeded_rng, ScoreRng};
