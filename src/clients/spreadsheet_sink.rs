/// 表格写入客户端
///
/// 接收二维字符串表格，返回可分享的位置
use crate::error::ExportError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 表格写入目标
#[async_trait]
pub trait SpreadsheetSink: Send + Sync {
    /// 新建表格，返回表格 ID
    async fn create_sheet(&self, title: &str) -> Result<String, ExportError>;

    /// 从 `range_ref` 左上角开始写入，返回可分享的地址
    async fn write_rows(
        &self,
        sheet_id: &str,
        range_ref: &str,
        rows: &[Vec<String>],
    ) -> Result<String, ExportError>;
}

#[async_trait]
impl<T: SpreadsheetSink + ?Sized> SpreadsheetSink for Arc<T> {
    async fn create_sheet(&self, title: &str) -> Result<String, ExportError> {
        (**self).create_sheet(title).await
    }

    async fn write_rows(
        &self,
        sheet_id: &str,
        range_ref: &str,
        rows: &[Vec<String>],
    ) -> Result<String, ExportError> {
        (**self).write_rows(sheet_id, range_ref, rows).await
    }
}

/// 表格最多列数（`XFD`）
pub const MAX_COLUMNS: usize = 16_384;

/// 表格最多行数
pub const MAX_ROWS: usize = 1_048_576;

/// 区域引用的左上角（0 起始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub column: usize,
    pub row: usize,
}

impl CellRange {
    /// 解析 `A1`、`Sheet1!B3`、`A1:H20` 这样的引用，只取左上角
    pub fn parse(range_ref: &str) -> Result<Self, ExportError> {
        static RANGE_RE: OnceLock<Option<Regex>> = OnceLock::new();
        let invalid = || ExportError::InvalidRange {
            range_ref: range_ref.to_string(),
        };

        let caps = RANGE_RE
            .get_or_init(|| Regex::new(r"^(?:[^!]+!)?([A-Za-z]+)([0-9]+)(?::[A-Za-z]+[0-9]+)?$").ok())
            .as_ref()
            .and_then(|re| re.captures(range_ref.trim()))
            .ok_or_else(invalid)?;

        let column = caps[1]
            .to_ascii_uppercase()
            .bytes()
            .try_fold(0usize, |acc, b| {
                acc.checked_mul(26)?.checked_add(usize::from(b - b'A' + 1))
            })
            .filter(|column| *column <= MAX_COLUMNS)
            .ok_or_else(invalid)?;
        let row: usize = caps[2].parse().map_err(|_| invalid())?;
        if row == 0 || row > MAX_ROWS {
            return Err(invalid());
        }

        Ok(Self {
            column: column - 1,
            row: row - 1,
        })
    }

    /// 把行写进网格，必要时补空行空列
    fn place(self, grid: &mut Vec<Vec<String>>, rows: &[Vec<String>]) {
        for (offset, row) in rows.iter().enumerate() {
            let target_row = self.row + offset;
            if grid.len() <= target_row {
                grid.resize(target_row + 1, Vec::new());
            }
            let line = &mut grid[target_row];
            if line.len() < self.column + row.len() {
                line.resize(self.column + row.len(), String::new());
            }
            for (col, cell) in row.iter().enumerate() {
                line[self.column + col] = cell.clone();
            }
        }
    }
}

// ========== 内存实现 ==========

/// 内存表格
#[derive(Debug, Default)]
pub struct InMemorySheetSink {
    sheets: Mutex<HashMap<String, (String, Vec<Vec<String>>)>>,
    next_id: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemorySheetSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让后续写入失败（或恢复）
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 表格当前内容
    pub async fn rows(&self, sheet_id: &str) -> Option<Vec<Vec<String>>> {
        self.sheets
            .lock()
            .await
            .get(sheet_id)
            .map(|(_, rows)| rows.clone())
    }

    pub async fn sheet_count(&self) -> usize {
        self.sheets.lock().await.len()
    }
}

#[async_trait]
impl SpreadsheetSink for InMemorySheetSink {
    async fn create_sheet(&self, title: &str) -> Result<String, ExportError> {
        let id = format!("sheet-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.sheets
            .lock()
            .await
            .insert(id.clone(), (title.to_string(), Vec::new()));
        Ok(id)
    }

    async fn write_rows(
        &self,
        sheet_id: &str,
        range_ref: &str,
        rows: &[Vec<String>],
    ) -> Result<String, ExportError> {
        let origin = CellRange::parse(range_ref)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ExportError::write_failed(sheet_id, "写入被拒绝"));
        }

        let mut sheets = self.sheets.lock().await;
        let (_, grid) = sheets
            .get_mut(sheet_id)
            .ok_or_else(|| ExportError::SheetNotFound {
                sheet_id: sheet_id.to_string(),
            })?;
        origin.place(grid, rows);
        Ok(format!("memory://sheets/{}", sheet_id))
    }
}

// ========== CSV 目录实现 ==========

/// 每个表格写成输出目录下的一个 CSV 文件
#[derive(Debug, Clone)]
pub struct CsvDirectorySink {
    output_dir: PathBuf,
}

impl CsvDirectorySink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn sheet_path(&self, sheet_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", sheet_id))
    }
}

/// 文件名中只保留字母数字、`-` 和 `_`
fn sanitize(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "sheet".to_string()
    } else {
        cleaned
    }
}

async fn read_grid(sheet_id: &str, path: &Path) -> Result<Vec<Vec<String>>, ExportError> {
    let bytes = fs::read(path).await.map_err(|e| {
        ExportError::write_failed(sheet_id, format!("读取 {} 失败: {}", path.display(), e))
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());
    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExportError::write_failed(sheet_id, e))?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

#[async_trait]
impl SpreadsheetSink for CsvDirectorySink {
    async fn create_sheet(&self, title: &str) -> Result<String, ExportError> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ExportError::write_failed(title, e))?;

        let stem = sanitize(title);
        let mut sheet_id = stem.clone();
        let mut suffix = 1;
        while fs::try_exists(self.sheet_path(&sheet_id))
            .await
            .unwrap_or(false)
        {
            suffix += 1;
            sheet_id = format!("{}_{}", stem, suffix);
        }

        fs::write(self.sheet_path(&sheet_id), b"")
            .await
            .map_err(|e| ExportError::write_failed(&sheet_id, e))?;
        debug!("新建表格文件: {}", self.sheet_path(&sheet_id).display());
        Ok(sheet_id)
    }

    async fn write_rows(
        &self,
        sheet_id: &str,
        range_ref: &str,
        rows: &[Vec<String>],
    ) -> Result<String, ExportError> {
        let origin = CellRange::parse(range_ref)?;
        let path = self.sheet_path(sheet_id);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ExportError::SheetNotFound {
                sheet_id: sheet_id.to_string(),
            });
        }

        let mut grid = read_grid(sheet_id, &path).await?;
        origin.place(&mut grid, rows);

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        for row in &grid {
            writer
                .write_record(row)
                .map_err(|e| ExportError::write_failed(sheet_id, e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::write_failed(sheet_id, e))?;

        fs::write(&path, bytes)
            .await
            .map_err(|e| ExportError::write_failed(sheet_id, e))?;

        let location = fs::canonicalize(&path).await.unwrap_or(path);
        info!("✓ 已写入 {} 行到 {}", rows.len(), location.display());
        Ok(format!("file://{}", location.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn parses_range_refs() {
        assert_eq!(CellRange::parse("A1").unwrap(), CellRange { column: 0, row: 0 });
        assert_eq!(
            CellRange::parse("Sheet1!C4").unwrap(),
            CellRange { column: 2, row: 3 }
        );
        assert_eq!(
            CellRange::parse("AA10:AB20").unwrap(),
            CellRange { column: 26, row: 9 }
        );
        assert!(CellRange::parse("A0").is_err());
        assert!(CellRange::parse("11").is_err());
    }

    #[test]
    fn range_refs_beyond_sheet_limits_are_invalid() {
        assert_eq!(
            CellRange::parse("XFD1048576").unwrap(),
            CellRange {
                column: MAX_COLUMNS - 1,
                row: MAX_ROWS - 1
            }
        );
        for range_ref in [
            "AAAAAAAAAAAAAAAAAAAA1",
            "XFE1",
            "A1048577",
            "A99999999999",
            "A99999999999999999999999",
        ] {
            let err = CellRange::parse(range_ref).unwrap_err();
            assert!(matches!(err, ExportError::InvalidRange { .. }), "{}", range_ref);
        }
    }

    #[tokio::test]
    async fn in_memory_sink_places_rows_at_offset() {
        let sink = InMemorySheetSink::new();
        let id = assert_ok!(sink.create_sheet("成绩").await);
        assert_ok!(sink.write_rows(&id, "B2", &[row(&["x", "y"])]).await);

        let grid = sink.rows(&id).await.unwrap();
        assert_eq!(grid, vec![Vec::<String>::new(), row(&["", "x", "y"])]);
    }

    #[tokio::test]
    async fn in_memory_sink_failures() {
        let sink = InMemorySheetSink::new();
        let missing = assert_err!(sink.write_rows("nope", "A1", &[]).await);
        assert!(matches!(missing, ExportError::SheetNotFound { .. }));

        let id = assert_ok!(sink.create_sheet("t").await);
        sink.set_fail_writes(true);
        let failed = assert_err!(sink.write_rows(&id, "A1", &[row(&["a"])]).await);
        assert!(matches!(failed, ExportError::WriteFailed { .. }));
    }

    #[tokio::test]
    async fn csv_sink_writes_file() {
        let dir = std::env::temp_dir().join(format!("batch_grader_csv_{}", std::process::id()));
        let sink = CsvDirectorySink::new(&dir);

        let first = assert_ok!(sink.create_sheet("Lab 3 / 成绩").await);
        let second = assert_ok!(sink.create_sheet("Lab 3 / 成绩").await);
        assert_ne!(first, second);

        let url = assert_ok!(
            sink.write_rows(&first, "A1", &[row(&["name", "score"]), row(&["a,b", "7.2"])])
                .await
        );
        assert!(url.starts_with("file://"));

        let written = assert_ok!(fs::read_to_string(dir.join(format!("{}.csv", first))).await);
        assert_eq!(written, "name,score\n\"a,b\",7.2\n");

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn csv_sink_parse_failure_names_the_sheet() {
        let dir = std::env::temp_dir().join(format!("batch_grader_csv_bad_{}", std::process::id()));
        assert_ok!(fs::create_dir_all(&dir).await);
        assert_ok!(fs::write(dir.join("bad.csv"), [0xff, 0xfe, b'\n']).await);
        let sink = CsvDirectorySink::new(&dir);

        let err = assert_err!(sink.write_rows("bad", "A1", &[row(&["x"])]).await);
        assert!(matches!(err, ExportError::WriteFailed { ref sheet_id, .. } if sheet_id == "bad"));

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn csv_sink_read_failure_names_the_sheet() {
        let dir = std::env::temp_dir().join(format!("batch_grader_csv_read_{}", std::process::id()));
        // 同名目录占住表格文件路径，读取必然失败
        assert_ok!(fs::create_dir_all(dir.join("broken.csv")).await);
        let sink = CsvDirectorySink::new(&dir);

        let err = assert_err!(sink.write_rows("broken", "A1", &[row(&["x"])]).await);
        match err {
            ExportError::WriteFailed { sheet_id, reason } => {
                assert_eq!(sheet_id, "broken");
                assert!(reason.contains("broken.csv"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let _ = fs::remove_dir_all(&dir).await;
    }
}
