//! 导出适配 - 业务能力层
//!
//! 只负责把运行报告转换成表格行，真正的写入交给 `SpreadsheetSink`

use crate::clients::SpreadsheetSink;
use crate::error::ExportError;
use crate::models::{RunReport, ScoreRecord};
use crate::services::penalty::late_marker;
use tracing::info;

/// 写入起点
pub const DEFAULT_RANGE: &str = "A1";

const BASE_HEADER: [&str; 7] = [
    "作业名称",
    "来源",
    "提交时间",
    "是否逾期",
    "原始分",
    "最终分",
    "评语",
];

/// 导出适配器
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportAdapter;

impl ExportAdapter {
    /// 表头 + 每条记录一行；逐项模式下每个实验追加一对客观 / 实操列
    pub fn rows(report: &RunReport) -> Vec<Vec<String>> {
        let item_count = report.item_count();

        let mut header: Vec<String> = BASE_HEADER.iter().map(|h| h.to_string()).collect();
        for index in 1..=item_count {
            header.push(format!("实验{} 客观", index));
            header.push(format!("实验{} 实操", index));
        }

        let mut rows = Vec::with_capacity(report.records.len() + 1);
        rows.push(header);
        rows.extend(report.records.iter().map(|r| Self::record_row(r, item_count)));
        rows
    }

    fn record_row(record: &ScoreRecord, item_count: usize) -> Vec<String> {
        let late = match (record.is_late, record.penalty_percent) {
            (true, Some(percent)) => format!("是 {}", late_marker(percent)),
            (true, None) => "是".to_string(),
            (false, _) => "否".to_string(),
        };

        let mut row = vec![
            record.artifact_name.clone(),
            record.origin.to_string(),
            record.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            late,
            format!("{:.1}", record.raw_score),
            format!("{:.1}", record.final_score),
            record.explanation.clone(),
        ];

        if item_count > 0 {
            let items = record.per_item.as_deref().unwrap_or_default();
            for index in 0..item_count {
                match items.get(index) {
                    Some(item) => {
                        row.push(format!("{:.1}", item.objective_score));
                        row.push(format!("{:.1}", item.practical_score));
                    }
                    None => {
                        row.push(String::new());
                        row.push(String::new());
                    }
                }
            }
        }
        row
    }

    /// 新建表格并写入，返回可分享地址
    pub async fn export(
        report: &RunReport,
        sink: &dyn SpreadsheetSink,
        title: &str,
    ) -> Result<String, ExportError> {
        let sheet_id = sink.create_sheet(title).await?;
        Self::write_to(report, sink, &sheet_id).await
    }

    /// 写入已有表格，返回可分享地址
    ///
    /// 报告只被借用，写入失败后可以对同一张表直接重试。
    pub async fn write_to(
        report: &RunReport,
        sink: &dyn SpreadsheetSink,
        sheet_id: &str,
    ) -> Result<String, ExportError> {
        let rows = Self::rows(report);
        let url = sink.write_rows(sheet_id, DEFAULT_RANGE, &rows).await?;
        info!("📤 已导出 {} 条记录: {}", rows.len() - 1, url);
        Ok(url)
    }
}
