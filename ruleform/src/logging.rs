//! 日志初始化
//!
//! 库内部只使用 `tracing` 宏；需要输出日志的应用可以用 [`LoggingConfig`] 安装订阅者

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 紧凑格式（默认）
    Compact,
    /// 完整格式
    Full,
    /// JSON 格式
    Json,
    /// 美化格式（适合开发）
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// ruleform 自身的日志级别（默认：Info）
    pub level: LogLevel,

    /// 其它 target 的日志级别（默认：Warn）
    pub default_level: LogLevel,

    /// 日志格式（默认：Compact）
    pub format: LogFormat,

    /// 是否显示目标（模块路径）
    pub show_target: bool,

    /// 是否显示线程 ID
    pub show_thread_ids: bool,

    /// 自定义过滤器，设置后忽略上面的级别
    /// 例如："ruleform=trace,my_app=debug"
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            default_level: LogLevel::Warn,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn default_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn show_thread_ids(mut self, show: bool) -> Self {
        self.show_thread_ids = show;
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 从环境变量读取配置
    ///
    /// - `RUST_LOG`：自定义过滤器
    /// - `RULEFORM_LOG`：ruleform 的日志级别
    /// - `LOG_FORMAT`：日志格式
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(filter) = std::env::var("RUST_LOG") {
            config.filter = Some(filter);
        }
        if let Some(level) = std::env::var("RULEFORM_LOG").ok().and_then(|s| s.parse().ok()) {
            config.level = level;
        }
        if let Some(format) = std::env::var("LOG_FORMAT").ok().and_then(|s| s.parse().ok()) {
            config.format = format;
        }

        config
    }

    /// 过滤指令，例如 `warn,ruleform=info`
    pub fn directives(&self) -> String {
        match &self.filter {
            Some(filter) => filter.clone(),
            None => format!("{},ruleform={}", self.default_level, self.level),
        }
    }

    /// 安装全局订阅者
    ///
    /// 已经安装过订阅者时返回 `LoggingInitFailed`
    pub fn init(self) -> Result<()> {
        let filter = EnvFilter::try_new(self.directives())
            .map_err(|e| Error::LoggingInitFailed(e.to_string()))?;
        let builder = subscriber_fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids);

        let installed = match self.format {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Full => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        };

        installed.map_err(|e| Error::LoggingInitFailed(e.to_string()))
    }
}
