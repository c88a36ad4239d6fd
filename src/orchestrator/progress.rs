//! 进度通知
//!
//! 每完成一份作业发出一次事件；观察者同步接收，可以在回调里发出取消信号

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// 进度事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// 已完成评分的作业数
    pub completed: usize,
    /// 本次运行的作业总数
    pub total: usize,
    pub percent: f64,
    /// 刚完成的作业
    pub artifact_id: String,
}

/// 进度观察者
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent) + Send,
{
    fn on_progress(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// 不关心进度
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}

/// 把进度写进日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_progress(&mut self, event: &ProgressEvent) {
        info!(
            "📊 进度 {}/{} ({:.1}%) - 刚完成: {}",
            event.completed, event.total, event.percent, event.artifact_id
        );
    }
}

/// 转发到 tokio 通道，接收端关闭后静默丢弃
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&mut self, event: &ProgressEvent) {
        let _ = self.tx.send(event.clone());
    }
}
