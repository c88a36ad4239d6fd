//! 结果汇总 - 业务能力层
//!
//! 只追加，不回头重算已有记录

use crate::models::{RunReport, RunStatus, ScoreRecord};
use tracing::debug;

/// 结果汇总器，持有正在构建的运行报告
#[derive(Debug, Default)]
pub struct ResultAggregator {
    report: RunReport,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条已完成的记录
    pub fn add_result(&mut self, record: ScoreRecord) {
        debug!(
            "追加记录: {} 原始分 {} 最终分 {}",
            record.artifact_id, record.raw_score, record.final_score
        );
        self.report.records.push(record);
    }

    pub fn get_report(&self) -> &RunReport {
        &self.report
    }

    /// 清空报告，回到初始状态
    pub fn reset(&mut self) {
        self.report = RunReport::default();
    }

    /// 更新进度，只增不减
    pub fn set_progress(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        if percent > self.report.progress_percent {
            self.report.progress_percent = percent;
        }
    }

    pub fn set_status(&mut self, status: RunStatus) {
        self.report.run_status = status;
    }

    /// 记录被取消时正在处理的作业
    pub fn set_interrupted(&mut self, record: ScoreRecord) {
        self.report.interrupted = Some(record);
    }
}
