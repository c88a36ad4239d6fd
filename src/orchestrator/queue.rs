//! 提交队列
//!
//! 先进先出；作业一旦开始评分就被锁定，不能再移除，也不会在后续运行中重试

use crate::error::EngineError;
use crate::models::Artifact;

#[derive(Debug, Clone)]
struct QueueEntry {
    artifact: Artifact,
    started: bool,
}

/// 提交队列
#[derive(Debug, Clone, Default)]
pub struct SubmissionQueue {
    entries: Vec<QueueEntry>,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按顺序构建队列，ID 重复时报错
    pub fn from_artifacts(artifacts: Vec<Artifact>) -> Result<Self, EngineError> {
        let mut queue = Self::new();
        for artifact in artifacts {
            queue.push(artifact)?;
        }
        Ok(queue)
    }

    /// 追加到队尾
    pub fn push(&mut self, artifact: Artifact) -> Result<(), EngineError> {
        if self.entries.iter().any(|e| e.artifact.id == artifact.id) {
            return Err(EngineError::DuplicateArtifact {
                artifact_id: artifact.id,
            });
        }
        self.entries.push(QueueEntry {
            artifact,
            started: false,
        });
        Ok(())
    }

    /// 移除仍在排队的作业；已开始评分的作业返回 `ArtifactLocked`
    pub fn remove(&mut self, artifact_id: &str) -> Result<Option<Artifact>, EngineError> {
        let Some(index) = self
            .entries
            .iter()
            .position(|e| e.artifact.id == artifact_id)
        else {
            return Ok(None);
        };

        if self.entries[index].started {
            return Err(EngineError::ArtifactLocked {
                artifact_id: artifact_id.to_string(),
            });
        }
        Ok(Some(self.entries.remove(index).artifact))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 尚未开始评分的作业数量
    pub fn pending_len(&self) -> usize {
        self.entries.iter().filter(|e| !e.started).count()
    }

    /// 按队列顺序遍历全部作业
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.iter().map(|e| &e.artifact)
    }

    pub fn is_started(&self, artifact_id: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.artifact.id == artifact_id && e.started)
    }

    /// 下一份未开始的作业在队列中的位置
    pub(crate) fn next_pending(&self, from: usize) -> Option<usize> {
        (from..self.entries.len()).find(|&i| !self.entries[i].started)
    }

    /// 标记为已开始并返回作业
    pub(crate) fn lock(&mut self, index: usize) -> &Artifact {
        let entry = &mut self.entries[index];
        entry.started = true;
        &entry.artifact
    }
}
