//! 挂起点 - 基础设施层
//!
//! 真实实现会在这里做 OCR / 推理等 I/O 工作，目前只模拟耗时

use std::time::Duration;

/// 挂起点调度
///
/// 延迟为零时只让出一次执行权，保持协作式调度
#[derive(Debug, Clone, Copy, Default)]
pub struct StepPacer {
    delay: Duration,
}

impl StepPacer {
    /// 创建带模拟延迟的挂起点
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// 不带延迟的挂起点
    pub fn immediate() -> Self {
        Self::default()
    }

    /// 在挂起点暂停
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
    }
}
