/// 作业来源客户端
///
/// 按容器 ID 列出作业，或新建一个容器
use crate::error::SourceFetchError;
use crate::models::{Artifact, Origin};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 默认单次列出的作业数量
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// 新建容器的结果
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedContainer {
    pub id: String,
    pub name: String,
    pub link: String,
}

/// 作业来源
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// 列出容器中的作业，保持来源给出的顺序
    async fn list(&self, container_id: &str) -> Result<Vec<Artifact>, SourceFetchError>;

    /// 新建容器
    async fn create(&self, name: &str) -> Result<CreatedContainer, SourceFetchError>;
}

#[async_trait]
impl<T: DocumentSource + ?Sized> DocumentSource for Arc<T> {
    async fn list(&self, container_id: &str) -> Result<Vec<Artifact>, SourceFetchError> {
        (**self).list(container_id).await
    }

    async fn create(&self, name: &str) -> Result<CreatedContainer, SourceFetchError> {
        (**self).create(name).await
    }
}

/// 从文件夹链接中提取容器 ID，不是链接时原样返回
pub fn extract_container_id(input: &str) -> String {
    static FOLDER_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let input = input.trim();
    FOLDER_RE
        .get_or_init(|| Regex::new(r"folders/([-a-zA-Z0-9_]+)").ok())
        .as_ref()
        .and_then(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| input.to_string())
}

fn check_name(name: &str) -> Result<&str, SourceFetchError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SourceFetchError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(name)
}

// ========== 内存实现 ==========

#[derive(Debug, Clone)]
struct Container {
    artifacts: Vec<Artifact>,
    accessible: bool,
}

/// 内存作业来源
#[derive(Debug)]
pub struct InMemoryDocumentSource {
    containers: RwLock<HashMap<String, Container>>,
    page_size: usize,
    next_id: AtomicUsize,
}

impl Default for InMemoryDocumentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentSource {
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 放入一个容器及其作业
    pub async fn insert(&self, container_id: impl Into<String>, artifacts: Vec<Artifact>) {
        self.containers.write().await.insert(
            container_id.into(),
            Container {
                artifacts,
                accessible: true,
            },
        );
    }

    /// 让容器变为无权访问
    pub async fn deny(&self, container_id: &str) {
        if let Some(container) = self.containers.write().await.get_mut(container_id) {
            container.accessible = false;
        }
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn list(&self, container_id: &str) -> Result<Vec<Artifact>, SourceFetchError> {
        let container_id = extract_container_id(container_id);
        let containers = self.containers.read().await;
        let container = containers
            .get(&container_id)
            .ok_or_else(|| SourceFetchError::NotFound {
                container_id: container_id.clone(),
            })?;

        if !container.accessible {
            return Err(SourceFetchError::PermissionDenied { container_id });
        }

        Ok(container
            .artifacts
            .iter()
            .take(self.page_size)
            .cloned()
            .collect())
    }

    async fn create(&self, name: &str) -> Result<CreatedContainer, SourceFetchError> {
        let name = check_name(name)?;
        let id = format!("container-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.insert(id.clone(), Vec::new()).await;
        debug!("新建内存容器 {} ({})", id, name);
        Ok(CreatedContainer {
            link: format!("memory://containers/{}", id),
            id,
            name: name.to_string(),
        })
    }
}

// ========== 本地目录实现 ==========

/// 本地目录作业来源
///
/// 容器 ID 是相对 `root` 的目录路径（或绝对路径），目录中的每个普通文件是一份作业，
/// 提交时间取文件修改时间，按提交时间、文件名排序。
#[derive(Debug, Clone)]
pub struct DirectoryDocumentSource {
    root: PathBuf,
    page_size: usize,
}

impl DirectoryDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn resolve(&self, container_id: &str) -> PathBuf {
        match container_id {
            "" | "." => self.root.clone(),
            id if Path::new(id).is_absolute() => PathBuf::from(id),
            id => self.root.join(id),
        }
    }
}

fn map_io(container_id: &str, path: &Path, err: std::io::Error) -> SourceFetchError {
    match err.kind() {
        ErrorKind::NotFound => SourceFetchError::NotFound {
            container_id: container_id.to_string(),
        },
        ErrorKind::PermissionDenied => SourceFetchError::PermissionDenied {
            container_id: container_id.to_string(),
        },
        _ => SourceFetchError::io(path.display().to_string(), err),
    }
}

#[async_trait]
impl DocumentSource for DirectoryDocumentSource {
    async fn list(&self, container_id: &str) -> Result<Vec<Artifact>, SourceFetchError> {
        let container_id = extract_container_id(container_id);
        let dir = self.resolve(&container_id);
        info!("📁 正在扫描作业目录: {}", dir.display());

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| map_io(&container_id, &dir, e))?;

        let mut artifacts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| map_io(&container_id, &dir, e))?
        {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name.starts_with('.') {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    warn!("读取文件信息失败 {}: {}", path.display(), e);
                    continue;
                }
            };

            let submitted_at: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            artifacts.push(Artifact::new(
                path.display().to_string(),
                file_name,
                Origin::Upload,
                submitted_at,
            ));
        }

        artifacts.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        artifacts.truncate(self.page_size);

        info!("✓ 找到 {} 份作业", artifacts.len());
        Ok(artifacts)
    }

    async fn create(&self, name: &str) -> Result<CreatedContainer, SourceFetchError> {
        let name = check_name(name)?;
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| map_io(name, &dir, e))?;

        info!("✓ 已创建作业目录: {}", dir.display());
        Ok(CreatedContainer {
            id: name.to_string(),
            name: name.to_string(),
            link: format!("file://{}", dir.display()),
        })
    }
}
