//! 业务能力层（Services）
//!
//! 描述"我能做什么"，一次只处理一个作业（汇总和导出除外），不关心流程顺序

pub mod aggregator;
pub mod export;
pub mod oracle;
pub mod penalty;
pub mod scoring;

pub use aggregator::ResultAggregator;
pub use export::ExportAdapter;
pub use oracle::{CriterionRole, FixtureOracle, ScoreOracle};
pub use penalty::{DeadlinePenaltyRule, PenaltyOutcome};
pub use scoring::{BandedScore, ScoringRule};
