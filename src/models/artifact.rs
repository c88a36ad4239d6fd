//! 提交的作业

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 作业来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// 从云端文件夹导入
    Drive,
    /// 本地上传
    Upload,
}

impl Origin {
    /// 导出时显示的名称
    pub fn label(self) -> &'static str {
        match self {
            Origin::Drive => "drive",
            Origin::Upload => "upload",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 待评分的作业，导入后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub origin: Origin,
    pub submitted_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        origin: Origin,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            origin,
            submitted_at,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
