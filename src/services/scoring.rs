//! 评分规则 - 业务能力层
//!
//! 纯函数：作业 + 评分规则 + 判定信号 + 随机源 → 分数和评语。
//! 不知道队列，也不知道取消。

use crate::models::{Artifact, DifficultyTier, PerItemScore};
use crate::services::oracle::{CriterionRole, ScoreOracle};
use rand::{Rng, RngCore};

/// 实操分的最大随机扣减比例
pub const PRACTICAL_VARIANCE: f64 = 0.10;

const EASY_REMARKS: &[&str] = &[
    "论点清晰，论据充分，结构完整。",
    "与参考答案高度一致，表达流畅。",
    "完成度很高，只有个别措辞可以再斟酌。",
];

const MEDIUM_REMARKS: &[&str] = &[
    "基本覆盖了要点，但论证不够深入。",
    "结构合理，部分细节与参考答案有出入。",
    "思路正确，表达还可以更简洁。",
];

const HARD_REMARKS: &[&str] = &[
    "遗漏了多个关键要点，需要对照参考答案复习。",
    "论证存在明显漏洞，结论缺乏支撑。",
    "结构松散，与题目要求偏差较大。",
];

/// 保留一位小数
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 保留一位小数，且不超过 `cap`
///
/// 分值本身不是一位小数时，四舍五入可能越过上限，此时向下取整。
pub fn round1_within(value: f64, cap: f64) -> f64 {
    let rounded = round1(value).max(0.0);
    if rounded > cap {
        (cap * 10.0).floor() / 10.0
    } else {
        rounded
    }
}

/// 整体评分结果
#[derive(Debug, Clone, PartialEq)]
pub struct BandedScore {
    pub raw_score: f64,
    pub explanation: String,
}

/// 评分规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRule;

impl ScoringRule {
    /// 逐项评分中的一项
    pub fn score_item(
        artifact: &Artifact,
        item_index: usize,
        objective_points: f64,
        practical_points: f64,
        oracle: &mut dyn ScoreOracle,
        rng: &mut dyn RngCore,
    ) -> PerItemScore {
        let objective_score =
            if oracle.criterion_met(artifact, item_index, CriterionRole::Objective, rng) {
                objective_points
            } else {
                0.0
            };

        let practical_score =
            if oracle.criterion_met(artifact, item_index, CriterionRole::Practical, rng) {
                let deduction = rng.gen_range(0.0..=PRACTICAL_VARIANCE);
                round1_within(practical_points * (1.0 - deduction), practical_points)
            } else {
                0.0
            };

        PerItemScore {
            item_index,
            objective_score,
            practical_score,
            total: round1_within(
                objective_score + practical_score,
                objective_points + practical_points,
            ),
        }
    }

    /// 逐项汇总为原始分
    pub fn itemized_raw_score(items: &[PerItemScore], max_points: f64) -> f64 {
        let sum: f64 = items.iter().map(|item| item.total).sum();
        round1_within(sum, max_points)
    }

    /// 逐项评语
    pub fn itemized_explanation(
        items: &[PerItemScore],
        objective_points: f64,
        practical_points: f64,
    ) -> String {
        items
            .iter()
            .map(|item| {
                format!(
                    "实验{}: 客观 {}/{}, 实操 {}/{}",
                    item.item_index,
                    item.objective_score,
                    objective_points,
                    item.practical_score,
                    practical_points
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// 整体评分：在难度档位区间内取分，并从同档评语中选一条
    pub fn score_banded(tier: DifficultyTier, rng: &mut dyn RngCore) -> BandedScore {
        let (low, high) = tier.band();
        let raw_score = round1(rng.gen_range(low..=high)).clamp(low, high);
        let pool = remarks(tier);
        let explanation = pool[rng.gen_range(0..pool.len())].to_string();
        BandedScore {
            raw_score,
            explanation,
        }
    }
}

/// 难度档位对应的评语池
pub fn remarks(tier: DifficultyTier) -> &'static [&'static str] {
    match tier {
        DifficultyTier::Easy => EASY_REMARKS,
        DifficultyTier::Medium => MEDIUM_REMARKS,
        DifficultyTier::Hard => HARD_REMARKS,
    }
}
