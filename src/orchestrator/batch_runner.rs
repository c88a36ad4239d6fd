//! 批量评分运行器 - 编排层
//!
//! ## 职责
//!
//! 按队列顺序把作业逐个交给 `ArtifactFlow`，管理运行状态、进度和取消。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──start──▶ Running ──▶ Completed
//!   ▲                  └────▶ Aborted
//!   └──────reset──────────────┘
//! ```
//!
//! - 只有 `Idle` 可以进入 `Running`，终态需要先 `reset()`
//! - 规则校验失败时停留在 `Idle`，直接把 `ConfigError` 返回给调用方
//! - 每份作业开始前检查取消令牌；逐项模式在实验之间再检查一次
//! - 取消后不重试，未评分的作业不出现在报告里
//!
//! ## 设计特点
//!
//! - **单线程协作式**：不并发处理作业，同一种子下结果完全可复现
//! - **独占资源**：报告、判定和随机源只由运行器持有

use crate::error::{AppResult, EngineError};
use crate::infrastructure::{CancellationToken, ScoreRng, StepPacer};
use crate::models::{RubricConfig, RubricInput, RunReport, RunStatus};
use crate::orchestrator::progress::{ProgressEvent, ProgressObserver};
use crate::orchestrator::queue::SubmissionQueue;
use crate::services::scoring::round1;
use crate::services::{ResultAggregator, ScoreOracle};
use crate::workflow::{ArtifactCtx, ArtifactFlow, FlowResult};
use tracing::{error, info, warn};

/// 批量评分运行器
pub struct BatchRunner {
    state: RunStatus,
    aggregator: ResultAggregator,
    oracle: Box<dyn ScoreOracle>,
    rng: ScoreRng,
    pacer: StepPacer,
    verbose_logging: bool,
}

impl BatchRunner {
    pub fn new(oracle: Box<dyn ScoreOracle>, rng: ScoreRng) -> Self {
        Self {
            state: RunStatus::Idle,
            aggregator: ResultAggregator::new(),
            oracle,
            rng,
            pacer: StepPacer::immediate(),
            verbose_logging: false,
        }
    }

    /// 设置挂起点的模拟耗时
    pub fn with_pacer(mut self, pacer: StepPacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_verbose_logging(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    pub fn state(&self) -> RunStatus {
        self.state
    }

    /// 当前（或最近一次）运行的报告
    pub fn report(&self) -> &RunReport {
        self.aggregator.get_report()
    }

    /// 丢弃终态运行的报告，回到 `Idle`
    pub fn reset(&mut self) -> Result<(), EngineError> {
        if self.state == RunStatus::Running {
            return Err(EngineError::InvalidState {
                from: self.state.to_string(),
                to: RunStatus::Idle.to_string(),
            });
        }
        self.aggregator.reset();
        self.state = RunStatus::Idle;
        Ok(())
    }

    /// 运行一次批量评分
    ///
    /// 只处理队列中尚未开始的作业；返回运行结束时的状态（`Completed` 或 `Aborted`）。
    pub async fn start(
        &mut self,
        queue: &mut SubmissionQueue,
        rubric: &RubricInput,
        cancel: &CancellationToken,
        observer: &mut dyn ProgressObserver,
    ) -> AppResult<RunStatus> {
        if self.state != RunStatus::Idle {
            return Err(EngineError::InvalidState {
                from: self.state.to_string(),
                to: RunStatus::Running.to_string(),
            }
            .into());
        }

        let rubric = RubricConfig::from_input(rubric).map_err(|e| {
            error!("❌ 评分规则无效，运行未开始: {}", e);
            e
        })?;

        let total = queue.pending_len();
        self.aggregator.reset();
        self.transition(RunStatus::Running);
        self.aggregator.set_progress(0.0);
        log_run_start(&rubric, total);

        let flow = ArtifactFlow::new(&rubric, cancel, self.pacer).verbose(self.verbose_logging);
        let mut completed = 0;
        let mut cursor = 0;

        while let Some(index) = queue.next_pending(cursor) {
            cursor = index + 1;

            if cancel.is_cancelled() {
                warn!(
                    "⏹ 收到取消信号，停止运行（已完成 {}/{}）",
                    completed, total
                );
                return Ok(self.finish(RunStatus::Aborted));
            }

            let artifact = queue.lock(index).clone();
            let ctx = ArtifactCtx::new(artifact.id.clone(), completed + 1, total);

            match flow
                .run(&artifact, &ctx, self.oracle.as_mut(), self.rng.as_mut())
                .await?
            {
                FlowResult::Graded(record) => {
                    self.aggregator.add_result(record);
                    completed += 1;

                    let percent = progress_percent(completed, total);
                    self.aggregator.set_progress(percent);
                    observer.on_progress(&ProgressEvent {
                        completed,
                        total,
                        percent: self.report().progress_percent,
                        artifact_id: artifact.id.clone(),
                    });
                }
                FlowResult::Interrupted(record) => {
                    warn!("{} ⏹ 作业评分被中止，不计入报告", ctx);
                    self.aggregator.set_interrupted(record);
                    return Ok(self.finish(RunStatus::Aborted));
                }
            }
        }

        self.aggregator.set_progress(100.0);
        Ok(self.finish(RunStatus::Completed))
    }

    fn transition(&mut self, to: RunStatus) {
        self.state = to;
        self.aggregator.set_status(to);
    }

    fn finish(&mut self, status: RunStatus) -> RunStatus {
        self.transition(status);
        log_run_complete(self.report());
        status
    }
}

/// 已完成数占总数的百分比，保留一位小数
fn progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    round1(completed as f64 * 100.0 / total as f64)
}

// ========== 日志辅助函数 ==========

fn log_run_start(rubric: &RubricConfig, total: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始批量评分 - 策略: {}", rubric.strategy().name());
    info!("📄 待评分作业: {} 份", total);
    match rubric.deadline() {
        Some(deadline) => info!(
            "⏰ 截止时间: {} (逾期扣 {}%)",
            deadline.format("%Y-%m-%d %H:%M:%S"),
            rubric.late_penalty_percent()
        ),
        None => info!("⏰ 未设置截止时间"),
    }
    info!("{}", "=".repeat(60));
}

fn log_run_complete(report: &RunReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 运行结束 [{}]: 已评分 {} 份, 进度 {:.1}%",
        report.run_status,
        report.records.len(),
        report.progress_percent
    );
    info!("{}", "─".repeat(60));
}
