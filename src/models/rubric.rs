//! 评分规则
//!
//! `RubricInput` 是调用方（或 TOML 运行计划）给出的原始配置，未经校验；
//! `RubricConfig` 只能通过 [`RubricConfig::from_input`] 得到，一次运行内不可变。

use crate::error::ConfigError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 整体评分模式的满分
pub const BANDED_MAX_POINTS: f64 = 10.0;

/// 逐项评分模式允许的最多题目数量
pub const MAX_ITEM_COUNT: i64 = 100;

/// 难度档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    /// 该档位的分数区间（闭区间）
    pub fn band(self) -> (f64, f64) {
        match self {
            DifficultyTier::Hard => (3.0, 6.5),
            DifficultyTier::Medium => (5.5, 8.5),
            DifficultyTier::Easy => (8.0, 9.9),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DifficultyTier::Easy => "easy",
            DifficultyTier::Medium => "medium",
            DifficultyTier::Hard => "hard",
        }
    }
}

impl FromStr for DifficultyTier {
    type Err = ConfigError;

    /// 支持别名，忽略大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "simple" => Ok(DifficultyTier::Easy),
            "medium" | "normal" => Ok(DifficultyTier::Medium),
            "hard" | "difficult" => Ok(DifficultyTier::Hard),
            _ => Err(ConfigError::UnknownDifficulty {
                tier: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 评分策略，由评分规则的形状决定
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// 逐项评分：每个实验一个客观分 + 一个实操分
    Itemized {
        item_count: usize,
        objective_points: f64,
        practical_points: f64,
    },
    /// 整体评分：按难度档位给出一个总分
    Banded { tier: DifficultyTier },
}

impl ScoringStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ScoringStrategy::Itemized { .. } => "itemized",
            ScoringStrategy::Banded { .. } => "banded",
        }
    }

    /// 单个作业能拿到的最高分
    pub fn max_points(&self) -> f64 {
        match *self {
            ScoringStrategy::Itemized {
                item_count,
                objective_points,
                practical_points,
            } => item_count as f64 * (objective_points + practical_points),
            ScoringStrategy::Banded { .. } => BANDED_MAX_POINTS,
        }
    }

    /// 逐项模式下的题目数量，整体模式为 0
    pub fn item_count(&self) -> usize {
        match *self {
            ScoringStrategy::Itemized { item_count, .. } => item_count,
            ScoringStrategy::Banded { .. } => 0,
        }
    }

    /// 是否需要参考答案
    pub fn requires_reference(&self) -> bool {
        matches!(self, ScoringStrategy::Banded { .. })
    }
}

/// 未经校验的评分规则输入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RubricInput {
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub item_count: Option<i64>,
    #[serde(default)]
    pub objective_points: Option<f64>,
    #[serde(default)]
    pub practical_points: Option<f64>,
    /// RFC3339，或不带时区的 `YYYY-MM-DDTHH:MM[:SS]`（按 UTC 解释）
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub late_penalty_percent: i64,
    /// 参考答案 / 标准答案
    #[serde(default)]
    pub answer_key: Option<String>,
}

impl RubricInput {
    /// 逐项评分输入
    pub fn itemized(item_count: i64, objective_points: f64, practical_points: f64) -> Self {
        Self {
            item_count: Some(item_count),
            objective_points: Some(objective_points),
            practical_points: Some(practical_points),
            ..Default::default()
        }
    }

    /// 整体评分输入
    pub fn banded(difficulty: impl Into<String>) -> Self {
        Self {
            difficulty: Some(difficulty.into()),
            ..Default::default()
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline.to_rfc3339());
        self
    }

    pub fn with_late_penalty(mut self, percent: i64) -> Self {
        self.late_penalty_percent = percent;
        self
    }

    pub fn with_answer_key(mut self, answer_key: impl Into<String>) -> Self {
        self.answer_key = Some(answer_key.into());
        self
    }
}

/// 校验后的评分规则，一次运行内冻结
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RubricConfig {
    strategy: ScoringStrategy,
    deadline: Option<DateTime<Utc>>,
    late_penalty_percent: u8,
    answer_key: Option<String>,
}

impl RubricConfig {
    /// 校验输入并冻结为评分规则
    pub fn from_input(input: &RubricInput) -> Result<Self, ConfigError> {
        let strategy = resolve_strategy(input)?;

        if !(0..=100).contains(&input.late_penalty_percent) {
            return Err(ConfigError::PenaltyOutOfRange {
                percent: input.late_penalty_percent,
            });
        }

        let answer_key = input
            .answer_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        if strategy.requires_reference() && answer_key.is_none() {
            return Err(ConfigError::MissingReference {
                strategy: strategy.name(),
            });
        }

        let deadline = input.deadline.as_deref().map(parse_deadline).transpose()?;

        Ok(Self {
            strategy,
            deadline,
            late_penalty_percent: input.late_penalty_percent as u8,
            answer_key,
        })
    }

    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn late_penalty_percent(&self) -> u8 {
        self.late_penalty_percent
    }

    pub fn answer_key(&self) -> Option<&str> {
        self.answer_key.as_deref()
    }

    pub fn max_points(&self) -> f64 {
        self.strategy.max_points()
    }
}

fn resolve_strategy(input: &RubricInput) -> Result<ScoringStrategy, ConfigError> {
    let has_items = input.item_count.is_some()
        || input.objective_points.is_some()
        || input.practical_points.is_some();

    match (&input.difficulty, has_items) {
        (Some(tier), false) => Ok(ScoringStrategy::Banded { tier: tier.parse()? }),
        (None, true) => {
            let (Some(item_count), Some(objective_points), Some(practical_points)) = (
                input.item_count,
                input.objective_points,
                input.practical_points,
            ) else {
                return Err(ConfigError::AmbiguousStrategy);
            };

            if !(1..=MAX_ITEM_COUNT).contains(&item_count) {
                return Err(ConfigError::InvalidItemCount { item_count });
            }
            check_points("objective_points", objective_points)?;
            check_points("practical_points", practical_points)?;

            Ok(ScoringStrategy::Itemized {
                item_count: item_count as usize,
                objective_points,
                practical_points,
            })
        }
        _ => Err(ConfigError::AmbiguousStrategy),
    }
}

fn check_points(field: &'static str, value: f64) -> Result<(), ConfigError> {
    // NaN 也在这里被拒绝
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NegativePoints { field, value })
    }
}

/// 解析截止时间
pub fn parse_deadline(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ConfigError::InvalidDeadline {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn itemized_input_resolves_to_itemized_strategy() {
        let config = RubricConfig::from_input(&RubricInput::itemized(2, 5.0, 5.0)).unwrap();
        assert_eq!(
            *config.strategy(),
            ScoringStrategy::Itemized {
                item_count: 2,
                objective_points: 5.0,
                practical_points: 5.0
            }
        );
        assert_eq!(config.max_points(), 20.0);
        assert!(config.deadline().is_none());
    }

    #[test]
    fn zero_items_is_rejected() {
        let err = RubricConfig::from_input(&RubricInput::itemized(0, 5.0, 5.0)).unwrap_err();
        assert_eq!(err, ConfigError::InvalidItemCount { item_count: 0 });
    }

    #[test]
    fn oversized_item_count_is_rejected() {
        for item_count in [MAX_ITEM_COUNT + 1, i64::MAX] {
            let err =
                RubricConfig::from_input(&RubricInput::itemized(item_count, 1.0, 1.0)).unwrap_err();
            assert_eq!(err, ConfigError::InvalidItemCount { item_count });
        }
        assert!(RubricConfig::from_input(&RubricInput::itemized(MAX_ITEM_COUNT, 1.0, 1.0)).is_ok());
    }

    #[test]
    fn negative_points_are_rejected() {
        let err = RubricConfig::from_input(&RubricInput::itemized(3, 5.0, -1.0)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NegativePoints {
                field: "practical_points",
                ..
            }
        ));
    }

    #[test]
    fn penalty_must_be_a_percentage() {
        for percent in [-1, 101] {
            let input = RubricInput::itemized(1, 1.0, 1.0).with_late_penalty(percent);
            assert_eq!(
                RubricConfig::from_input(&input).unwrap_err(),
                ConfigError::PenaltyOutOfRange { percent }
            );
        }
        let edge = RubricInput::itemized(1, 1.0, 1.0).with_late_penalty(100);
        assert_eq!(RubricConfig::from_input(&edge).unwrap().late_penalty_percent(), 100);
    }

    #[test]
    fn banded_requires_answer_key() {
        let err = RubricConfig::from_input(&RubricInput::banded("hard")).unwrap_err();
        assert_eq!(err, ConfigError::MissingReference { strategy: "banded" });

        let blank = RubricInput::banded("hard").with_answer_key("   ");
        assert!(RubricConfig::from_input(&blank).is_err());

        let ok = RubricInput::banded("Difficult").with_answer_key("ideal essay");
        let config = RubricConfig::from_input(&ok).unwrap();
        assert_eq!(
            *config.strategy(),
            ScoringStrategy::Banded {
                tier: DifficultyTier::Hard
            }
        );
    }

    #[test]
    fn both_shapes_at_once_is_ambiguous() {
        let mut input = RubricInput::itemized(2, 1.0, 1.0);
        input.difficulty = Some("easy".into());
        assert_eq!(
            RubricConfig::from_input(&input).unwrap_err(),
            ConfigError::AmbiguousStrategy
        );
        assert_eq!(
            RubricConfig::from_input(&RubricInput::default()).unwrap_err(),
            ConfigError::AmbiguousStrategy
        );
    }

    #[test]
    fn deadline_accepts_naive_minutes() {
        let parsed = parse_deadline("2024-01-10T00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        assert!(parse_deadline("next tuesday").is_err());
    }
}
