//! 流程层（Workflow）
//!
//! 定义"一份作业"的完整处理流程：评分 → 逾期扣分 → 完成记录

pub mod artifact_ctx;
pub mod artifact_flow;

pub use artifact_ctx::ArtifactCtx;
pub use artifact_flow::{ArtifactFlow, FlowResult};
