//! 取消令牌 - 基础设施层
//!
//! 调用方持有一份克隆，运行器在每个挂起点轮询

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 协作式取消令牌
///
/// 克隆后共享同一个标志；一旦取消不可恢复，新的运行需要新的令牌。
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// 创建未取消的令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 发出取消信号
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// 是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
