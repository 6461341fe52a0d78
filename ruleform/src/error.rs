use thiserror::Error;

/// 规则校验库的统一错误类型
///
/// 只有构造阶段会返回错误；`validate` 本身从不失败，
/// 所有运行期异常都退化为"规则未通过"或"字段被跳过"。
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported rule declaration for field '{field}' at position {position}: {reason}")]
    UnsupportedDeclaration {
        field: String,
        position: usize,
        reason: String,
    },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Duplicate rule name '{rule}' in field '{field}'")]
    DuplicateRuleName { field: String, rule: String },

    #[error("Keyword cycle detected: {}", cycle.join(" -> "))]
    KeywordCycle { cycle: Vec<String> },

    #[error("Keyword table is sealed, cannot register '{keyword}'")]
    RegistrySealed { keyword: String },

    #[error("Plugin '{plugin}' setup failed: {source}")]
    PluginSetup {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to parse rule configuration: {0}")]
    ConfigParse(String),

    #[error("Invalid plugin options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),
}

impl Error {
    pub fn unsupported(field: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        Self::UnsupportedDeclaration {
            field: field.into(),
            position,
            reason: reason.into(),
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
