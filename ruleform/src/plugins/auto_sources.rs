//! 自动获取字段值来源的插件
//!
//! 从 [`FieldProvider`] 拉取全部字段，再按 `selector` 选项过滤

use crate::error::{Error, Result};
use crate::field::FieldSource;
use crate::plugin::{Plugin, PluginContext, PluginOptions};
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

pub const AUTO_SOURCES_PLUGIN_NAME: &str = "DefaultAutoControlsPlugin";

/// 字段提供者
pub trait FieldProvider: Send + Sync {
    fn fields(&self) -> Vec<Arc<dyn FieldSource>>;
}

impl<F> FieldProvider for F
where
    F: Fn() -> Vec<Arc<dyn FieldSource>> + Send + Sync,
{
    fn fields(&self) -> Vec<Arc<dyn FieldSource>> {
        self()
    }
}

/// 插件选项
#[derive(Debug, Clone, Deserialize)]
pub struct AutoSourcesOptions {
    /// 字段名选择器，支持 `*` 通配符
    #[serde(default = "default_selector")]
    pub selector: String,
}

fn default_selector() -> String {
    "*".to_string()
}

impl Default for AutoSourcesOptions {
    fn default() -> Self {
        Self {
            selector: default_selector(),
        }
    }
}

/// 插件私有数据，每个校验器实例独立
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSourcesData {
    pub selector: String,
    pub matched: Vec<String>,
}

/// 字段名选择器
///
/// 支持的模式：
/// - `*` - 匹配任意名称
/// - `user*` - 以 user 开头
/// - `*name` - 以 name 结尾
/// - `*pass*` - 包含 pass
/// - 不含 `*` 时要求完全相等
#[derive(Debug, Clone)]
pub enum Selector {
    Any,
    Exact(String),
    Glob(Regex),
}

impl Selector {
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern == "*" {
            return Ok(Selector::Any);
        }
        if !pattern.contains('*') {
            return Ok(Selector::Exact(pattern.to_string()));
        }

        // 其余字符按字面量转义
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let source = format!("^{}$", body);

        Regex::new(&source)
            .map(Selector::Glob)
            .map_err(|e| Error::invalid_pattern(source, e))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Selector::Any => true,
            Selector::Exact(expected) => expected == name,
            Selector::Glob(re) => re.is_match(name),
        }
    }
}

/// 自动字段来源插件
pub struct AutoSourcesPlugin {
    provider: Arc<dyn FieldProvider>,
}

impl AutoSourcesPlugin {
    pub fn new(provider: impl FieldProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// 由固定的字段列表提供
    pub fn from_fields(fields: Vec<Arc<dyn FieldSource>>) -> Self {
        Self::new(move || fields.clone())
    }
}

impl Plugin for AutoSourcesPlugin {
    fn name(&self) -> &str {
        AUTO_SOURCES_PLUGIN_NAME
    }

    fn setup(&self, context: &mut PluginContext<'_>, options: &PluginOptions) -> anyhow::Result<()> {
        let options: AutoSourcesOptions = options.parse()?;
        let selector = Selector::parse(&options.selector)?;

        let fields: Vec<Arc<dyn FieldSource>> = self
            .provider
            .fields()
            .into_iter()
            .filter(|field| selector.matches(field.name()))
            .collect();
        let matched = fields.iter().map(|f| f.name().to_string()).collect();

        context.store_data(AutoSourcesData {
            selector: options.selector,
            matched,
        });
        context.set_field_sources(fields);
        Ok(())
    }
}
