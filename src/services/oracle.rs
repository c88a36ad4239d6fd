//! 判定服务 - 业务能力层
//!
//! 只回答"某个作业的某一项是否达标"，是真实推理的占位实现

use crate::models::{Artifact, OracleFixture};
use rand::{Rng, RngCore};
use std::fmt;
use tracing::debug;

/// 回退随机判定时"达标"的概率
pub const DEFAULT_PASS_RATE: f64 = 0.8;

/// 判定角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriterionRole {
    /// 客观题部分
    Objective,
    /// 实操部分
    Practical,
}

impl CriterionRole {
    /// 在信号向量中的偏移
    fn offset(self) -> usize {
        match self {
            CriterionRole::Objective => 0,
            CriterionRole::Practical => 1,
        }
    }
}

impl fmt::Display for CriterionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionRole::Objective => f.write_str("客观"),
            CriterionRole::Practical => f.write_str("实操"),
        }
    }
}

/// 判定能力
///
/// 运行器只依赖这个 trait，替换实现不需要改动编排层。
/// 随机源由调用方传入，保证同一种子下结果可复现。
pub trait ScoreOracle: Send {
    /// `item_index` 从 1 开始
    fn criterion_met(
        &mut self,
        artifact: &Artifact,
        item_index: usize,
        role: CriterionRole,
        rng: &mut dyn RngCore,
    ) -> bool;
}

/// 按作业名称子串查表的判定实现
///
/// 名称和模式都先归一化（小写、去掉非字母数字），第一条命中的记录生效；
/// 没有命中或信号不够长时，按 `pass_rate` 随机判定。
#[derive(Debug, Clone)]
pub struct FixtureOracle {
    entries: Vec<(String, Vec<bool>)>,
    pass_rate: f64,
}

impl FixtureOracle {
    pub fn new(fixtures: &[OracleFixture]) -> Self {
        let entries = fixtures
            .iter()
            .map(|f| (normalize(&f.pattern), f.signals.clone()))
            .filter(|(pattern, _)| !pattern.is_empty())
            .collect();
        Self {
            entries,
            pass_rate: DEFAULT_PASS_RATE,
        }
    }

    /// 没有任何记录，完全随机判定
    pub fn random() -> Self {
        Self::new(&[])
    }

    pub fn with_pass_rate(mut self, pass_rate: f64) -> Self {
        self.pass_rate = pass_rate.clamp(0.0, 1.0);
        self
    }

    fn lookup(&self, artifact: &Artifact, item_index: usize, role: CriterionRole) -> Option<bool> {
        let name = normalize(&artifact.name);
        let (pattern, signals) = self.entries.iter().find(|(p, _)| name.contains(p.as_str()))?;
        let slot = item_index.checked_sub(1)? * 2 + role.offset();
        let signal = signals.get(slot).copied();
        debug!("判定桩命中 '{}' → 第 {} 项{}: {:?}", pattern, item_index, role, signal);
        signal
    }
}

impl ScoreOracle for FixtureOracle {
    fn criterion_met(
        &mut self,
        artifact: &Artifact,
        item_index: usize,
        role: CriterionRole,
        rng: &mut dyn RngCore,
    ) -> bool {
        self.lookup(artifact, item_index, role)
            .unwrap_or_else(|| rng.gen_bool(self.pass_rate))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
