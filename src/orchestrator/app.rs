use crate::clients::{CsvDirectorySink, DirectoryDocumentSource, DocumentSource, SpreadsheetSink};
use crate::config::Config;
use crate::error::{AppResult, ExportError};
use crate::infrastructure::{entropy_rng, seeded_rng, CancellationToken, StepPacer};
use crate::models::{load_run_plan, RunPlan, RunReport, RunStatus};
use crate::orchestrator::batch_runner::BatchRunner;
use crate::orchestrator::progress::{LogObserver, ProgressObserver};
use crate::orchestrator::queue::SubmissionQueue;
use crate::services::{ExportAdapter, FixtureOracle};
use crate::utils::logging;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 导出失败后的最多尝试次数
const EXPORT_ATTEMPTS: usize = 3;

/// 报告摘要文件名（位于输出目录下）
const SUMMARY_FILE: &str = "run_report.json";

/// 应用主结构
///
/// 串起一次完整的评分：导入作业 → 批量评分 → 导出成绩表
pub struct App {
    config: Config,
    plan: RunPlan,
    source: Box<dyn DocumentSource>,
    sink: Box<dyn SpreadsheetSink>,
    queue: SubmissionQueue,
    runner: BatchRunner,
    /// 本次报告已经创建的表格，重试导出时复用
    sheet_id: Option<String>,
}

impl App {
    pub fn new(
        config: Config,
        plan: RunPlan,
        source: Box<dyn DocumentSource>,
        sink: Box<dyn SpreadsheetSink>,
    ) -> Self {
        let oracle = FixtureOracle::new(&plan.oracle_fixture);
        let rng = match config.rng_seed {
            Some(seed) => seeded_rng(seed),
            None => entropy_rng(),
        };
        let runner = BatchRunner::new(Box::new(oracle), rng)
            .with_pacer(StepPacer::new(config.step_delay()))
            .with_verbose_logging(config.verbose_logging);

        Self {
            config,
            plan,
            source,
            sink,
            queue: SubmissionQueue::new(),
            runner,
            sheet_id: None,
        }
    }

    /// 初始化应用：日志文件、运行计划、本地目录来源和 CSV 输出
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let plan = load_run_plan(Path::new(&config.run_file)).await?;
        let source = DirectoryDocumentSource::new(&config.submissions_dir)
            .with_page_size(config.page_size);
        let sink = CsvDirectorySink::new(&config.output_dir);

        Ok(Self::new(config, plan, Box::new(source), Box::new(sink)))
    }

    pub fn queue(&self) -> &SubmissionQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut SubmissionQueue {
        &mut self.queue
    }

    pub fn report(&self) -> &RunReport {
        self.runner.report()
    }

    pub fn run_status(&self) -> RunStatus {
        self.runner.state()
    }

    /// 把作业加入队列，返回新加入的数量
    ///
    /// 计划中内联了作业时直接使用，否则从作业来源列出；已在队列中的作业跳过。
    pub async fn import(&mut self) -> AppResult<usize> {
        let artifacts = if self.plan.artifacts.is_empty() {
            let container = self.plan.container.as_deref().unwrap_or("");
            info!("\n📁 正在从作业来源导入: {}", container);
            self.source.list(container).await?
        } else {
            info!("\n📁 使用运行计划中的 {} 份作业", self.plan.artifacts.len());
            self.plan.artifacts.clone()
        };

        let mut imported = 0;
        for artifact in artifacts {
            let id = artifact.id.clone();
            match self.queue.push(artifact) {
                Ok(()) => imported += 1,
                Err(e) => warn!("跳过作业 {}: {}", id, e),
            }
        }

        logging::log_artifacts_loaded(imported, self.queue.pending_len());
        Ok(imported)
    }

    /// 评分队列中尚未开始的作业
    pub async fn run_batch(&mut self, cancel: &CancellationToken) -> AppResult<RunStatus> {
        self.run_batch_with(cancel, &mut LogObserver).await
    }

    pub async fn run_batch_with(
        &mut self,
        cancel: &CancellationToken,
        observer: &mut dyn ProgressObserver,
    ) -> AppResult<RunStatus> {
        if self.runner.state().is_terminal() {
            self.runner.reset()?;
            self.sheet_id = None;
        }
        self.runner
            .start(&mut self.queue, &self.plan.rubric, cancel, observer)
            .await
    }

    /// 导出当前报告，返回成绩表地址
    ///
    /// 报告不会因为导出失败而丢失，可以重复调用；表格只创建一次，之后的调用都写入同一张表
    pub async fn export(&mut self) -> Result<String, ExportError> {
        let sheet_id = match self.sheet_id.clone() {
            Some(sheet_id) => sheet_id,
            None => {
                let sheet_id = self.sink.create_sheet(&self.plan.title).await?;
                self.sheet_id = Some(sheet_id.clone());
                sheet_id
            }
        };
        ExportAdapter::write_to(self.runner.report(), self.sink.as_ref(), &sheet_id).await
    }

    /// 导出，失败时重试
    pub async fn export_with_retry(&mut self, attempts: usize) -> Result<String, ExportError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.export().await {
                Ok(url) => return Ok(url),
                Err(e) if attempt < attempts => {
                    warn!("导出失败（第 {}/{} 次）: {}", attempt, attempts, e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 把报告摘要写成 JSON，返回文件路径
    pub async fn write_summary(&self) -> Result<PathBuf, ExportError> {
        let report = self.runner.report();
        let summary = RunSummary {
            title: &self.plan.title,
            graded_count: report.graded_count(),
            late_count: report.late_count(),
            average_final_score: report.average_final_score(),
            report,
        };

        let dir = Path::new(&self.config.output_dir);
        let path = dir.join(SUMMARY_FILE);

        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| ExportError::write_failed(SUMMARY_FILE, e))?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ExportError::write_failed(SUMMARY_FILE, e))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| ExportError::write_failed(SUMMARY_FILE, e))?;
        Ok(path)
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        let cancel = CancellationToken::new();
        let ctrl_c = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("⏹ 收到 Ctrl-C，当前作业结束后停止");
                    cancel.cancel();
                }
            })
        };

        let imported = self.import().await.context("导入作业失败")?;
        if imported == 0 && self.queue.pending_len() == 0 {
            warn!("⚠️ 没有找到待评分的作业，程序结束");
            ctrl_c.abort();
            return Ok(());
        }

        let status = self.run_batch(&cancel).await.context("批量评分失败")?;
        ctrl_c.abort();

        let export_url = match self.export_with_retry(EXPORT_ATTEMPTS).await {
            Ok(url) => Some(url),
            Err(e) => {
                error!("❌ 导出成绩表失败: {}", e);
                None
            }
        };

        match self.write_summary().await {
            Ok(path) => info!("📝 报告摘要: {}", path.display()),
            Err(e) => error!("❌ 写入报告摘要失败: {}", e),
        }

        logging::print_final_stats(
            self.runner.report(),
            export_url.as_deref(),
            &self.config.output_log_file,
        );

        if status == RunStatus::Aborted {
            info!("运行已取消，未评分的作业保留在队列中");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct RunSummary<'a> {
    title: &'a str,
    graded_count: usize,
    late_count: usize,
    average_final_score: Option<f64>,
    report: &'a RunReport,
}
