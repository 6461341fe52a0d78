//! 内置插件

pub mod auto_sources;
pub mod default_keywords;
pub mod keywords;
pub mod result_log;

pub use auto_sources::{
    AutoSourcesData, AutoSourcesOptions, AutoSourcesPlugin, FieldProvider, Selector,
    AUTO_SOURCES_PLUGIN_NAME,
};
pub use default_keywords::{
    default_keywords, email_pattern, DefaultKeywordsOptions, DefaultKeywordsPlugin,
    DEFAULT_KEYWORDS_PLUGIN_NAME,
};
pub use keywords::KeywordsPlugin;
pub use result_log::{ResultLogOptions, ResultLogPlugin, ValidationStats, RESULT_LOG_PLUGIN_NAME};
