//! 作业处理上下文
//!
//! 封装"我正在处理本次运行的第几份作业"这一信息

use std::fmt::Display;

/// 作业处理上下文
#[derive(Debug, Clone)]
pub struct ArtifactCtx {
    /// 作业ID
    pub artifact_id: String,

    /// 本次运行中的序号（从1开始，仅用于日志显示）
    pub position: usize,

    /// 本次运行的作业总数
    pub total: usize,
}

impl ArtifactCtx {
    pub fn new(artifact_id: impl Into<String>, position: usize, total: usize) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            position,
            total,
        }
    }
}

impl Display for ArtifactCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[作业 {}/{}]", self.position, self.total)
    }
}
