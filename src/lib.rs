//! # Batch Grader
//!
//! 一个用于批量评分作业的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有单次运行独占的资源，只暴露能力
//! - `CancellationToken` - 运行级取消标志
//! - `ScoreRng` / `StepPacer` - 可注入的随机源和挂起点
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，一次只处理一份作业
//! - `ScoreOracle` - 判定某一项是否达标
//! - `ScoringRule` / `DeadlinePenaltyRule` - 打分和逾期扣分
//! - `ResultAggregator` / `ExportAdapter` - 汇总报告和导出表格
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份作业"的完整处理流程
//! - `ArtifactCtx` - 上下文封装（作业 ID + 位置）
//! - `ArtifactFlow` - 流程编排（打分 → 扣分 → 完成记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 运行状态机，按队列逐个评分
//! - `orchestrator/app` - 导入、运行、导出的完整流程
//!
//! 外部协作方（作业来源、表格输出）的 trait 和实现位于 `clients/`。
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{DocumentSource, SpreadsheetSink};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::CancellationToken;
pub use models::{Artifact, RubricConfig, RubricInput, RunReport, RunStatus, ScoreRecord};
pub use orchestrator::{App, BatchRunner, SubmissionQueue};
pub use workflow::{ArtifactCtx, ArtifactFlow, FlowResult};
