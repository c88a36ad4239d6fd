use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::RunReport;

/// 初始化全局日志订阅者
///
/// 读取 `RUST_LOG`，未设置时为 `info`；重复调用不会报错
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n批量评分日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量评分模式");
    info!("📋 运行计划: {}", config.run_file);
    match config.rng_seed {
        Some(seed) => info!("🎲 随机种子: {}", seed),
        None => info!("🎲 随机种子: 未设置（每次结果不同）"),
    }
    if config.step_delay_ms > 0 {
        info!("⏱ 每步模拟耗时: {} ms", config.step_delay_ms);
    }
    info!("{}", "=".repeat(60));
}

/// 记录作业导入信息
///
/// # 参数
/// - `imported`: 本次新加入队列的数量
/// - `pending`: 队列中待评分的数量
pub fn log_artifacts_loaded(imported: usize, pending: usize) {
    info!("✓ 导入 {} 份作业，待评分 {} 份", imported, pending);
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 运行报告
/// - `export_url`: 导出地址，导出失败时为 `None`
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(report: &RunReport, export_url: Option<&str>, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批量评分统计 [{}]", report.run_status);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已评分: {}", report.graded_count());
    info!("⏰ 逾期: {}", report.late_count());
    if let Some(average) = report.average_final_score() {
        info!("📈 平均最终分: {:.1}", average);
    }
    if let Some(record) = &report.interrupted {
        info!("⏹ 中途取消: {}", record.artifact_name);
    }
    match export_url {
        Some(url) => info!("📤 成绩表: {}", url),
        None => info!("❌ 成绩表未导出"),
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_chars() {
        assert_eq!(truncate_text("优秀的实验报告", 3), "优秀的...");
        assert_eq!(truncate_text("短", 3), "短");
    }
}
