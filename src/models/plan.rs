//! 运行计划：一次批量评分所需的全部输入

use crate::models::artifact::Artifact;
use crate::models::rubric::RubricInput;
use serde::{Deserialize, Serialize};

/// 判定桩的一条记录
///
/// `signals` 按 `[客观1, 实操1, 客观2, 实操2, ...]` 排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleFixture {
    pub pattern: String,
    pub signals: Vec<bool>,
}

/// 运行计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPlan {
    /// 导出表格的标题
    pub title: String,
    /// 容器 ID 或文件夹链接，未设置时使用配置中的目录
    #[serde(default)]
    pub container: Option<String>,
    pub rubric: RubricInput,
    #[serde(default)]
    pub oracle_fixture: Vec<OracleFixture>,
    /// 直接写在计划里的作业，非空时不再访问作业来源
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}
