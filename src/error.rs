//! 错误类型
//!
//! 顶层 `AppError` 按来源分成几类子错误，和调用方关心的处理方式一一对应：
//! - `ConfigError`：评分规则或环境配置无效，运行不会开始
//! - `SourceFetchError`：导入作业失败，不影响正在进行的运行
//! - `ExportError`：表格写入失败，结果报告保留，可重试导出
//! - `EngineError`：状态机被非法驱动
//!
//! 取消不是错误，不在这里出现。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 作业来源错误
    #[error("导入错误: {0}")]
    Source(#[from] SourceFetchError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 引擎状态错误
    #[error("引擎错误: {0}")]
    Engine(#[from] EngineError),
}

/// 配置错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// 逐项评分模式下题目数量不在 [1, 100] 内
    #[error("题目数量必须在 1 到 100 之间，当前为 {item_count}")]
    InvalidItemCount { item_count: i64 },
    /// 分值为负
    #[error("分值 {field} 不能为负数: {value}")]
    NegativePoints { field: &'static str, value: f64 },
    /// 逾期扣分比例超出范围
    #[error("逾期扣分比例必须在 [0, 100] 之间，当前为 {percent}")]
    PenaltyOutOfRange { percent: i64 },
    /// 缺少必需的参考材料
    #[error("评分策略 {strategy} 需要参考答案，但未提供")]
    MissingReference { strategy: &'static str },
    /// 既没有难度档位也没有逐项分值，或者两者同时给出
    #[error("评分规则必须二选一：难度档位，或 题目数量 + 分值")]
    AmbiguousStrategy,
    /// 无法识别的难度档位
    #[error("无法识别的难度档位: {tier}")]
    UnknownDifficulty { tier: String },
    /// 截止时间格式错误
    #[error("截止时间格式错误: {value}")]
    InvalidDeadline { value: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 作业来源错误
#[derive(Debug, Error)]
pub enum SourceFetchError {
    /// 容器不存在
    #[error("找不到容器: {container_id}")]
    NotFound { container_id: String },
    /// 没有访问权限
    #[error("无权访问容器: {container_id}")]
    PermissionDenied { container_id: String },
    /// 名称无效
    #[error("名称无效: '{name}'")]
    InvalidName { name: String },
    /// 读取失败
    #[error("读取 {path} 失败: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 表格不存在
    #[error("表格不存在: {sheet_id}")]
    SheetNotFound { sheet_id: String },
    /// 区域引用无效
    #[error("区域引用无效: {range_ref}")]
    InvalidRange { range_ref: String },
    /// 写入失败
    #[error("写入表格 {sheet_id} 失败: {reason}")]
    WriteFailed { sheet_id: String, reason: String },
}

/// 引擎状态错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// 非法状态迁移
    #[error("无法从 {from} 状态进入 {to} 状态")]
    InvalidState { from: String, to: String },
    /// 作业已开始评分，不能再移除
    #[error("作业 {artifact_id} 已开始评分，无法移除")]
    ArtifactLocked { artifact_id: String },
    /// 重复的作业 ID
    #[error("作业 ID 重复: {artifact_id}")]
    DuplicateArtifact { artifact_id: String },
}

// ========== 便捷构造函数 ==========

impl SourceFetchError {
    /// 创建带路径的读取错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SourceFetchError::Io {
            path: path.into(),
            source,
        }
    }
}

impl ExportError {
    /// 创建写入失败错误
    pub fn write_failed(sheet_id: impl Into<String>, reason: impl ToString) -> Self {
        ExportError::WriteFailed {
            sheet_id: sheet_id.into(),
            reason: reason.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
