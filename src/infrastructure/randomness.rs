//! 随机源 - 基础设施层
//!
//! 评分中的随机波动统一从这里注入，测试固定种子即可断言精确结果

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// 评分随机源
pub type ScoreRng = Box<dyn RngCore + Send>;

/// 固定种子的随机源
pub fn seeded_rng(seed: u64) -> ScoreRng {
    Box::new(StdRng::seed_from_u64(seed))
}

/// 系统熵初始化的随机源
pub fn entropy_rng() -> ScoreRng {
    Box::new(StdRng::from_entropy())
}
