//! 作业处理流程 - 流程层
//!
//! 核心职责：定义"一份作业"的完整处理流程
//!
//! 流程顺序：
//! 1. 按评分策略打出原始分（逐项模式在每个实验之间检查取消）
//! 2. 逾期扣分
//! 3. 完成评分记录

use rand::RngCore;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::infrastructure::{CancellationToken, StepPacer};
use crate::models::{Artifact, GradeOutcome, PerItemScore, RubricConfig, ScoreRecord, ScoringStrategy};
use crate::services::{DeadlinePenaltyRule, ScoreOracle, ScoringRule};
use crate::utils::logging::truncate_text;
use crate::workflow::artifact_ctx::ArtifactCtx;

/// 单份作业的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    /// 评分完成，记录状态为 graded
    Graded(ScoreRecord),
    /// 在两个实验之间被取消，记录状态为 aborted
    Interrupted(ScoreRecord),
}

/// 作业处理流程
///
/// - 编排单份作业的评分顺序
/// - 不持有队列，也不更新进度
/// - 判定和随机源由运行器借给它
pub struct ArtifactFlow<'a> {
    rubric: &'a RubricConfig,
    cancel: &'a CancellationToken,
    pacer: StepPacer,
    verbose_logging: bool,
}

impl<'a> ArtifactFlow<'a> {
    pub fn new(rubric: &'a RubricConfig, cancel: &'a CancellationToken, pacer: StepPacer) -> Self {
        Self {
            rubric,
            cancel,
            pacer,
            verbose_logging: false,
        }
    }

    pub fn verbose(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    pub async fn run(
        &self,
        artifact: &Artifact,
        ctx: &ArtifactCtx,
        oracle: &mut dyn ScoreOracle,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<FlowResult, EngineError> {
        let mut record = ScoreRecord::begin(artifact);
        info!("{} 📝 开始评分: {}", ctx, artifact.name);

        let (raw_score, explanation, per_item) = match *self.rubric.strategy() {
            ScoringStrategy::Itemized {
                item_count,
                objective_points,
                practical_points,
            } => {
                let mut items: Vec<PerItemScore> = Vec::new();
                for item_index in 1..=item_count {
                    // 第一个实验之前的检查由运行器完成
                    if item_index > 1 && self.cancel.is_cancelled() {
                        warn!(
                            "{} ⏹ 在实验 {}/{} 之前收到取消信号",
                            ctx, item_index, item_count
                        );
                        record.abort(items)?;
                        return Ok(FlowResult::Interrupted(record));
                    }

                    self.pacer.pause().await;
                    let item = ScoringRule::score_item(
                        artifact,
                        item_index,
                        objective_points,
                        practical_points,
                        oracle,
                        rng,
                    );
                    if self.verbose_logging {
                        debug!(
                            "{} 实验 {}: 客观 {} 实操 {} 小计 {}",
                            ctx, item_index, item.objective_score, item.practical_score, item.total
                        );
                    }
                    items.push(item);
                }

                let raw = ScoringRule::itemized_raw_score(&items, self.rubric.max_points());
                let explanation =
                    ScoringRule::itemized_explanation(&items, objective_points, practical_points);
                (raw, explanation, Some(items))
            }
            ScoringStrategy::Banded { tier } => {
                self.pacer.pause().await;
                let banded = ScoringRule::score_banded(tier, rng);
                (banded.raw_score, banded.explanation, None)
            }
        };

        let penalty = DeadlinePenaltyRule::apply(
            raw_score,
            artifact.submitted_at,
            self.rubric.deadline(),
            self.rubric.late_penalty_percent(),
        );

        let explanation = if penalty.is_late {
            warn!(
                "{} ⏰ 逾期提交，扣除 {:.2} 分 ({}%)",
                ctx,
                penalty.deduction,
                self.rubric.late_penalty_percent()
            );
            DeadlinePenaltyRule::annotate(&explanation, self.rubric.late_penalty_percent())
        } else {
            explanation
        };

        record.finish(GradeOutcome {
            raw_score,
            final_score: penalty.final_score,
            is_late: penalty.is_late,
            penalty_percent: penalty.is_late.then_some(self.rubric.late_penalty_percent()),
            explanation,
            per_item,
        })?;

        info!(
            "{} ✓ 评分完成: 原始分 {} → 最终分 {}",
            ctx, record.raw_score, record.final_score
        );
        if self.verbose_logging {
            debug!("{} 评语: {}", ctx, truncate_text(&record.explanation, 60));
        }
        Ok(FlowResult::Graded(record))
    }
}
