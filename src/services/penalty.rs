//! 逾期扣分规则 - 业务能力层

use crate::services::scoring::round1;
use chrono::{DateTime, Utc};

/// 扣分结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyOutcome {
    pub final_score: f64,
    pub is_late: bool,
    pub deduction: f64,
}

/// 逾期扣分规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadlinePenaltyRule;

impl DeadlinePenaltyRule {
    /// 截止时间未设置，或提交不晚于截止时间时不扣分
    pub fn apply(
        raw_score: f64,
        submitted_at: DateTime<Utc>,
        deadline: Option<DateTime<Utc>>,
        late_penalty_percent: u8,
    ) -> PenaltyOutcome {
        let is_late = deadline.is_some_and(|deadline| submitted_at > deadline);
        if !is_late {
            return PenaltyOutcome {
                final_score: raw_score,
                is_late: false,
                deduction: 0.0,
            };
        }

        let deduction = raw_score * (f64::from(late_penalty_percent) / 100.0);
        let final_score = round1(raw_score - deduction).clamp(0.0, raw_score);
        PenaltyOutcome {
            final_score,
            is_late: true,
            deduction,
        }
    }

    /// 在评语前加上逾期标记
    pub fn annotate(explanation: &str, late_penalty_percent: u8) -> String {
        format!("{} {}", late_marker(late_penalty_percent), explanation)
    }
}

/// 逾期标记
pub fn late_marker(late_penalty_percent: u8) -> String {
    format!("[逾期扣分 {}%]", late_penalty_percent)
}
