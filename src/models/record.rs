//! 评分记录与运行报告

use crate::error::EngineError;
use crate::models::artifact::{Artifact, Origin};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// 单个实验的得分（仅逐项模式）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerItemScore {
    /// 从 1 开始
    pub item_index: usize,
    pub objective_score: f64,
    pub practical_score: f64,
    pub total: f64,
}

/// 记录状态：`Pending → Graded` 或 `Pending → Aborted`，只迁移一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Graded,
    Aborted,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Graded => "graded",
            RecordStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// 一次评分得出的结果，用于完成一条记录
#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub raw_score: f64,
    pub final_score: f64,
    pub is_late: bool,
    /// 逾期时实际扣除的比例
    pub penalty_percent: Option<u8>,
    pub explanation: String,
    pub per_item: Option<Vec<PerItemScore>>,
}

/// 单个作业的评分记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub artifact_id: String,
    pub artifact_name: String,
    pub origin: Origin,
    pub submitted_at: DateTime<Utc>,
    pub raw_score: f64,
    pub final_score: f64,
    pub is_late: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty_percent: Option<u8>,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_item: Option<Vec<PerItemScore>>,
    status: RecordStatus,
}

impl ScoreRecord {
    /// 运行器开始处理作业时创建
    pub fn begin(artifact: &Artifact) -> Self {
        Self {
            artifact_id: artifact.id.clone(),
            artifact_name: artifact.name.clone(),
            origin: artifact.origin,
            submitted_at: artifact.submitted_at,
            raw_score: 0.0,
            final_score: 0.0,
            is_late: false,
            penalty_percent: None,
            explanation: String::new(),
            per_item: None,
            status: RecordStatus::Pending,
        }
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    /// 写入评分结果并标记为已评分
    pub fn finish(&mut self, outcome: GradeOutcome) -> Result<(), EngineError> {
        self.transition(RecordStatus::Graded)?;
        self.raw_score = outcome.raw_score;
        self.final_score = outcome.final_score;
        self.is_late = outcome.is_late;
        self.penalty_percent = outcome.penalty_percent;
        self.explanation = outcome.explanation;
        self.per_item = outcome.per_item;
        Ok(())
    }

    /// 标记为中止，已得到的逐项分数原样保留
    pub fn abort(&mut self, partial: Vec<PerItemScore>) -> Result<(), EngineError> {
        self.transition(RecordStatus::Aborted)?;
        if !partial.is_empty() {
            self.per_item = Some(partial);
        }
        Ok(())
    }

    fn transition(&mut self, to: RecordStatus) -> Result<(), EngineError> {
        if self.status != RecordStatus::Pending {
            return Err(EngineError::InvalidState {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Aborted)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// 一次运行的结果报告
///
/// `records` 的顺序就是处理顺序，只包含已完成评分的作业。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub records: Vec<ScoreRecord>,
    pub progress_percent: f64,
    pub run_status: RunStatus,
    /// 被取消时正在处理的作业（状态为 aborted），不计入 `records`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<ScoreRecord>,
}

impl RunReport {
    pub fn graded_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status() == RecordStatus::Graded)
            .count()
    }

    pub fn late_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_late).count()
    }

    /// 平均最终得分，保留一位小数
    pub fn average_final_score(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let sum: f64 = self.records.iter().map(|r| r.final_score).sum();
        Some(crate::services::scoring::round1(sum / self.records.len() as f64))
    }

    /// 逐项模式下的题目数量（取记录中最多的一条）
    pub fn item_count(&self) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.per_item.as_ref().map(Vec::len))
            .max()
            .unwrap_or(0)
    }
}
