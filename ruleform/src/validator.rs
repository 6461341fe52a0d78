//! 校验器核心
//!
//! [`ValidatorBuilder`] 对应构造阶段：规范化规则、执行插件 setup；
//! `build` 完成后得到就绪的 [`FormValidator`]，可以反复调用 `validate`。

use crate::error::Result;
use crate::field::{FieldSource, FieldSources, IntoFieldSources};
use crate::normalizer::{RuleConfig, RuleSet};
use crate::plugin::{Plugin, PluginData, PluginHost, PluginOptions, PluginRegistration};
use crate::plugins::DefaultKeywordsPlugin;
use crate::registry::RuleRegistry;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 单个字段的校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// 字段名称
    pub name: String,
    /// 未通过的规则名称（按声明顺序）
    pub no_passed_rules: Vec<String>,
    /// 是否所有规则都通过
    pub all_passed: bool,
}

impl ValidationResult {
    /// 指定规则是否未通过
    pub fn failed(&self, rule: &str) -> bool {
        self.no_passed_rules.iter().any(|r| r == rule)
    }
}

/// 校验器构建器
pub struct ValidatorBuilder {
    rule_config: RuleConfig,
    sources: Vec<Arc<dyn FieldSource>>,
    registrations: Vec<PluginRegistration>,
    default_keywords: Option<PluginOptions>,
}

impl ValidatorBuilder {
    fn new(rule_config: RuleConfig) -> Self {
        Self {
            rule_config,
            sources: Vec::new(),
            registrations: Vec::new(),
            default_keywords: Some(PluginOptions::none()),
        }
    }

    /// 显式提供字段值来源
    pub fn field_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn FieldSource>>,
    {
        self.sources.extend(sources);
        self
    }

    pub fn field_source(mut self, source: Arc<dyn FieldSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// 从结构体等类型提取字段值来源
    pub fn sources_from<T>(self, value: &T) -> Self
    where
        T: IntoFieldSources + ?Sized,
    {
        self.field_sources(value.into_field_sources())
    }

    /// 注册插件，setup 按注册顺序执行
    pub fn plugin<P>(self, plugin: P, options: impl Into<PluginOptions>) -> Self
    where
        P: Plugin + 'static,
    {
        self.shared_plugin(Arc::new(plugin), options)
    }

    pub fn shared_plugin(mut self, plugin: Arc<dyn Plugin>, options: impl Into<PluginOptions>) -> Self {
        self.registrations
            .push(PluginRegistration::new(plugin, options.into()));
        self
    }

    /// 设置默认关键词插件的选项
    pub fn default_keywords_options(mut self, options: impl Into<PluginOptions>) -> Self {
        self.default_keywords = Some(options.into());
        self
    }

    /// 不加载默认关键词插件，关键词表从空开始
    pub fn without_default_keywords(mut self) -> Self {
        self.default_keywords = None;
        self
    }

    /// 完成构造
    ///
    /// 插件 setup 的错误会直接返回给调用方
    pub fn build(self) -> Result<FormValidator> {
        let rule_set = self.rule_config.normalize()?;

        let registry = Arc::new(RuleRegistry::new());
        let sources = FieldSources::new();
        sources.replace(self.sources);

        let mut registrations = self.registrations;
        if let Some(options) = self.default_keywords {
            registrations.insert(
                0,
                PluginRegistration::new(Arc::new(DefaultKeywordsPlugin::new()), options),
            );
        }

        let mut plugin_data = PluginData::new();
        let plugins = PluginHost::setup_all(registrations, &registry, &sources, &mut plugin_data)?;
        registry.seal();

        tracing::info!(
            "Validator ready: {} field(s) with rules, {} keyword(s), {} plugin(s)",
            rule_set.len(),
            registry.len(),
            plugins.len()
        );

        Ok(FormValidator {
            rule_set,
            registry,
            sources,
            plugins,
            plugin_data,
        })
    }
}

/// 就绪状态的校验器
///
/// 每次 `validate` 的结果只取决于字段值来源的当前内容
pub struct FormValidator {
    rule_set: RuleSet,
    registry: Arc<RuleRegistry>,
    sources: FieldSources,
    plugins: PluginHost,
    plugin_data: PluginData,
}

impl FormValidator {
    /// 开始构造校验器
    pub fn builder(rule_config: RuleConfig) -> ValidatorBuilder {
        ValidatorBuilder::new(rule_config)
    }

    /// 使用默认插件、不带字段来源直接构造
    pub fn new(rule_config: RuleConfig) -> Result<Self> {
        Self::builder(rule_config).build()
    }

    /// 校验所有字段值来源并返回结果
    ///
    /// 返回前会通知所有插件
    pub fn validate(&self) -> Vec<ValidationResult> {
        let results = self.evaluate();
        self.notify_plugins(&results);
        results
    }

    /// 校验并把结果交给回调
    ///
    /// 回调的第二个参数是默认上下文（校验器本身），其它上下文由闭包捕获。
    /// 回调执行后再通知插件。
    pub fn validate_with<F>(&self, callback: F)
    where
        F: FnOnce(&[ValidationResult], &FormValidator),
    {
        let results = self.evaluate();
        callback(&results, self);
        self.notify_plugins(&results);
    }

    fn evaluate(&self) -> Vec<ValidationResult> {
        let sources = self.sources.snapshot();
        if sources.is_empty() {
            tracing::warn!("No field sources configured, nothing to validate");
            return Vec::new();
        }

        sources
            .iter()
            .filter_map(|source| self.evaluate_field(source.as_ref()))
            .collect()
    }

    /// 未配置规则的字段返回 None
    fn evaluate_field(&self, source: &dyn FieldSource) -> Option<ValidationResult> {
        let rules = self.rule_set.get(source.name())?;
        let value = source.value();

        let no_passed_rules: Vec<String> = rules
            .iter()
            .filter(|rule| {
                let passed = self.registry.matches(&value, rule);
                tracing::trace!("{}.{} passed={}", source.name(), rule.name(), passed);
                !passed
            })
            .map(|rule| rule.name().to_string())
            .collect();

        Some(ValidationResult {
            name: source.name().to_string(),
            all_passed: no_passed_rules.is_empty(),
            no_passed_rules,
        })
    }

    fn notify_plugins(&self, results: &[ValidationResult]) {
        self.plugins
            .notify_all(results, &self.registry, &self.sources, &self.plugin_data);
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn field_sources(&self) -> &FieldSources {
        &self.sources
    }

    /// 已加载的插件名称（按 setup 顺序）
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.names()
    }

    /// 读取某个插件存储的数据
    pub fn plugin_data<T>(&self, plugin_name: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.plugin_data
            .get(plugin_name)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }
}

impl fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormValidator")
            .field("rule_set", &self.rule_set)
            .field("registry", &self.registry)
            .field("sources", &self.sources)
            .field("plugins", &self.plugins.names())
            .finish()
    }
}
