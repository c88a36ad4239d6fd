//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量评分和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用
//! - 管理应用生命周期（初始化、导入、运行、导出）
//! - 持有作业来源和表格输出
//! - 处理 Ctrl-C，输出全局统计信息
//!
//! ### `batch_runner` - 批量评分运行器
//! - 运行状态机（Idle → Running → Completed / Aborted）
//! - 按队列顺序逐个评分，维护进度
//! - 持有判定和随机源
//!
//! ### `queue` - 提交队列
//! - 先进先出，拒绝重复作业
//! - 开始评分的作业被锁定
//!
//! ### `progress` - 进度通知
//! - `ProgressEvent` 和几种观察者
//!
//! ## 层次关系
//!
//! ```text
//! app (导入 → 运行 → 导出)
//!     ↓
//! batch_runner (处理 SubmissionQueue)
//!     ↓
//! workflow::ArtifactFlow (处理单份作业)
//!     ↓
//! services (能力层：oracle / scoring / penalty / aggregator / export)
//!     ↓
//! infrastructure (基础设施：取消令牌、随机源、挂起点)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管生命周期，batch_runner 管一次运行
//! 2. **资源隔离**：只有编排层持有判定、随机源和报告
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体评分判断

pub mod app;
pub mod batch_runner;
pub mod progress;
pub mod queue;

// 重新导出主要类型
pub use app::App;
pub use batch_runner::BatchRunner;
pub use progress::{ChannelObserver, LogObserver, NoopObserver, ProgressEvent, ProgressObserver};
pub use queue::SubmissionQueue;
