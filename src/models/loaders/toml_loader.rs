use crate::models::plan::RunPlan;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载运行计划
pub async fn load_run_plan(toml_file_path: &Path) -> Result<RunPlan> {
    if !toml_file_path.exists() {
        anyhow::bail!("运行计划不存在: {}", toml_file_path.display());
    }

    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let plan = parse_run_plan(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载运行计划: {} (内联作业 {} 个, 判定桩 {} 条)",
        plan.title,
        plan.artifacts.len(),
        plan.oracle_fixture.len()
    );

    Ok(plan)
}

/// 解析 TOML 文本
pub fn parse_run_plan(content: &str) -> Result<RunPlan> {
    let plan: RunPlan = toml::from_str(content)?;
    Ok(plan)
}
