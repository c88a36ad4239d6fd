//! 外部协作方
//!
//! 核心只依赖这里的 trait；具体的云端协议不在本 crate 内实现，
//! 这里提供内存实现（测试用）和本地目录 / CSV 实现（命令行用）。

pub mod document_source;
pub mod spreadsheet_sink;

pub use document_source::{
    extract_container_id, CreatedContainer, DirectoryDocumentSource, DocumentSource,
    InMemoryDocumentSource,
};
pub use spreadsheet_sink::{CellRange, CsvDirectorySink, InMemorySheetSink, SpreadsheetSink};
