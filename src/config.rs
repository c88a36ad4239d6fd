use crate::error::ConfigError;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 运行计划（TOML）路径
    pub run_file: String,
    /// 运行计划未指定容器时使用的作业目录
    pub submissions_dir: String,
    /// CSV 表格输出目录
    pub output_dir: String,
    /// 随机种子，未设置时每次运行使用新的种子
    pub rng_seed: Option<u64>,
    /// 每个挂起点的模拟耗时（毫秒）
    pub step_delay_ms: u64,
    /// 单次导入最多列出的作业数量
    pub page_size: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_file: "run.toml".to_string(),
            submissions_dir: "submissions".to_string(),
            output_dir: "output_sheets".to_string(),
            rng_seed: None,
            step_delay_ms: 0,
            page_size: 20,
            verbose_logging: false,
            output_log_file: "grading_log.txt".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量读取配置，无法解析的值回退为默认值
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            run_file: std::env::var("RUN_FILE").unwrap_or(default.run_file),
            submissions_dir: std::env::var("SUBMISSIONS_DIR").unwrap_or(default.submissions_dir),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            rng_seed: std::env::var("RNG_SEED").ok().and_then(|v| v.parse().ok()),
            step_delay_ms: std::env::var("STEP_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.step_delay_ms),
            page_size: std::env::var("PAGE_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_size),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 严格模式：已设置但无法解析的数值型环境变量直接报错
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_env();
        config.rng_seed = parse_env::<u64>("RNG_SEED", "u64")?;
        if let Some(delay) = parse_env::<u64>("STEP_DELAY_MS", "u64")? {
            config.step_delay_ms = delay;
        }
        if let Some(size) = parse_env::<usize>("PAGE_SIZE", "usize")? {
            config.page_size = size;
        }
        Ok(config)
    }

    /// 每个挂起点的模拟耗时
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
