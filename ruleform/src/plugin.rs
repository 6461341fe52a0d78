//! 插件机制
//!
//! 插件在校验器构造时按注册顺序各执行一次 `setup`，之后每次校验结束都会收到结果通知。
//! 插件只能通过 [`PluginContext`] 提供的能力扩展校验器：
//! 注册关键词、设置字段值来源、存取以自身名称为命名空间的数据。

use crate::error::{Error, Result};
use crate::field::{FieldSource, FieldSources};
use crate::registry::RuleRegistry;
use crate::rule::RuleHandler;
use crate::validator::ValidationResult;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// 插件私有数据，按插件名称隔离
pub(crate) type PluginData = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// 校验器插件 trait
pub trait Plugin: Send + Sync {
    /// 插件名称，同时作为私有数据的命名空间
    fn name(&self) -> &str;

    /// 构造阶段执行一次
    ///
    /// 返回错误会中止校验器的构造
    fn setup(&self, context: &mut PluginContext<'_>, options: &PluginOptions) -> anyhow::Result<()>;

    /// 每次校验结束后调用（可选实现）
    fn on_validated(&self, _results: &[ValidationResult], _context: &ValidatedContext<'_>) {}
}

/// 插件选项
///
/// 包装一个 JSON 值，插件通过 [`PluginOptions::parse`] 反序列化为自己的选项类型
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginOptions(Value);

impl PluginOptions {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// 无选项
    pub fn none() -> Self {
        Self(Value::Null)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_null()
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// 反序列化为选项类型，无选项时返回默认值
    pub fn parse<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        if self.is_none() {
            return Ok(T::default());
        }
        Ok(serde_json::from_value(self.0.clone())?)
    }
}

impl From<Value> for PluginOptions {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// 插件注册项：插件及其选项
#[derive(Clone)]
pub struct PluginRegistration {
    pub plugin: Arc<dyn Plugin>,
    pub options: PluginOptions,
}

impl PluginRegistration {
    pub fn new(plugin: Arc<dyn Plugin>, options: PluginOptions) -> Self {
        Self { plugin, options }
    }
}

/// setup 阶段的插件上下文
pub struct PluginContext<'a> {
    plugin_name: String,
    registry: &'a Arc<RuleRegistry>,
    sources: &'a FieldSources,
    data: &'a mut PluginData,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(
        plugin_name: impl Into<String>,
        registry: &'a Arc<RuleRegistry>,
        sources: &'a FieldSources,
        data: &'a mut PluginData,
    ) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            registry,
            sources,
            data,
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// 共享的规则注册表
    pub fn registry(&self) -> &Arc<RuleRegistry> {
        self.registry
    }

    /// 注册关键词（后写覆盖）
    pub fn register_keyword(&self, name: impl Into<String>, handler: RuleHandler) -> Result<()> {
        self.registry.register_keyword(name, handler)
    }

    pub fn register_keywords<I, K>(&self, keywords: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, RuleHandler)>,
        K: Into<String>,
    {
        self.registry.register_keywords(keywords)
    }

    /// 字段值来源的共享句柄
    pub fn field_sources(&self) -> FieldSources {
        self.sources.clone()
    }

    /// 替换校验器的全部字段值来源
    pub fn set_field_sources<I>(&self, sources: I)
    where
        I: IntoIterator<Item = Arc<dyn FieldSource>>,
    {
        let sources: Vec<_> = sources.into_iter().collect();
        tracing::debug!(
            "Plugin '{}' set {} field source(s)",
            self.plugin_name,
            sources.len()
        );
        self.sources.replace(sources);
    }

    pub fn add_field_source(&self, source: Arc<dyn FieldSource>) {
        self.sources.push(source);
    }

    /// 以插件名称为键存储私有数据，覆盖之前的数据
    pub fn store_data<T>(&mut self, value: T)
    where
        T: Any + Send + Sync,
    {
        self.data.insert(self.plugin_name.clone(), Arc::new(value));
    }

    /// 读取本插件的私有数据
    pub fn data<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_data(&*self.data, &self.plugin_name)
    }
}

/// 校验结束后的插件上下文（只读）
pub struct ValidatedContext<'a> {
    plugin_name: &'a str,
    registry: &'a Arc<RuleRegistry>,
    sources: &'a FieldSources,
    data: &'a PluginData,
}

impl<'a> ValidatedContext<'a> {
    pub(crate) fn new(
        plugin_name: &'a str,
        registry: &'a Arc<RuleRegistry>,
        sources: &'a FieldSources,
        data: &'a PluginData,
    ) -> Self {
        Self {
            plugin_name,
            registry,
            sources,
            data,
        }
    }

    pub fn plugin_name(&self) -> &str {
        self.plugin_name
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        self.registry
    }

    pub fn field_sources(&self) -> &FieldSources {
        self.sources
    }

    pub fn data<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_data(self.data, self.plugin_name)
    }
}

fn downcast_data<T>(data: &PluginData, plugin_name: &str) -> Option<Arc<T>>
where
    T: Any + Send + Sync,
{
    data.get(plugin_name)
        .cloned()
        .and_then(|value| value.downcast::<T>().ok())
}

/// 插件宿主
///
/// 保存已完成 setup 的插件，负责分发校验结果
#[derive(Default)]
pub(crate) struct PluginHost {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginHost {
    /// 按注册顺序执行所有插件的 setup
    pub(crate) fn setup_all(
        registrations: Vec<PluginRegistration>,
        registry: &Arc<RuleRegistry>,
        sources: &FieldSources,
        data: &mut PluginData,
    ) -> Result<Self> {
        let mut plugins: Vec<Arc<dyn Plugin>> = Vec::with_capacity(registrations.len());

        for registration in registrations {
            let plugin = registration.plugin;
            let name = plugin.name().to_string();

            if plugins.iter().any(|p| p.name() == name) {
                tracing::warn!("Plugin '{}' registered more than once, data will be shared", name);
            }

            tracing::info!("Setting up plugin: {}", name);
            let mut context = PluginContext::new(name.clone(), registry, sources, data);
            plugin
                .setup(&mut context, &registration.options)
                .map_err(|source| Error::PluginSetup {
                    plugin: name.clone(),
                    source,
                })?;

            plugins.push(plugin);
        }

        Ok(Self { plugins })
    }

    /// 通知所有实现了 `on_validated` 的插件
    pub(crate) fn notify_all(
        &self,
        results: &[ValidationResult],
        registry: &Arc<RuleRegistry>,
        sources: &FieldSources,
        data: &PluginData,
    ) {
        for plugin in &self.plugins {
            let context = ValidatedContext::new(plugin.name(), registry, sources, data);
            plugin.on_validated(results, &context);
        }
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.plugins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct DemoOptions {
        #[serde(default)]
        selector: String,
        #[serde(default)]
        limit: usize,
    }

    struct Recorder;

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            "Recorder"
        }

        fn setup(&self, context: &mut PluginContext<'_>, options: &PluginOptions) -> anyhow::Result<()> {
            let options: DemoOptions = options.parse()?;
            context.store_data(options.limit);
            Ok(())
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn setup(&self, _context: &mut PluginContext<'_>, _options: &PluginOptions) -> anyhow::Result<()> {
            anyhow::bail!("missing provider")
        }
    }

    #[test]
    fn test_options_parse() {
        let parsed: DemoOptions = PluginOptions::none().parse().unwrap();
        assert_eq!(parsed, DemoOptions::default());

        let parsed: DemoOptions = PluginOptions::from(json!({"selector": "user*", "limit": 3}))
            .parse()
            .unwrap();
        assert_eq!(parsed.selector, "user*");
        assert_eq!(parsed.limit, 3);

        let err = PluginOptions::from(json!({"limit": "three"}))
            .parse::<DemoOptions>()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOptions(_)));
    }

    #[test]
    fn test_setup_stores_namespaced_data() {
        let registry = Arc::new(RuleRegistry::new());
        let sources = FieldSources::new();
        let mut data = PluginData::new();

        let host = PluginHost::setup_all(
            vec![PluginRegistration::new(
                Arc::new(Recorder),
                PluginOptions::from(json!({"limit": 7})),
            )],
            &registry,
            &sources,
            &mut data,
        )
        .unwrap();

        assert_eq!(host.names(), vec!["Recorder"]);
        assert_eq!(*downcast_data::<usize>(&data, "Recorder").unwrap(), 7);
        assert!(downcast_data::<usize>(&data, "Other").is_none());
        assert!(downcast_data::<String>(&data, "Recorder").is_none());
    }

    #[test]
    fn test_setup_failure_names_plugin() {
        let registry = Arc::new(RuleRegistry::new());
        let sources = FieldSources::new();
        let mut data = PluginData::new();

        let err = PluginHost::setup_all(
            vec![
                PluginRegistration::new(Arc::new(Recorder), PluginOptions::none()),
                PluginRegistration::new(Arc::new(Failing), PluginOptions::none()),
            ],
            &registry,
            &sources,
            &mut data,
        )
        .err()
        .unwrap();

        assert_eq!(err.to_string(), "Plugin 'Failing' setup failed: missing provider");
    }

    /// 以自己的名称存储数据，并在 setup 和校验后读回
    struct Tagged {
        name: &'static str,
        seen: Arc<parking_lot::Mutex<Vec<String>>>,
    }

    impl Plugin for Tagged {
        fn name(&self) -> &str {
            self.name
        }

        fn setup(&self, context: &mut PluginContext<'_>, _options: &PluginOptions) -> anyhow::Result<()> {
            context.store_data(self.name.to_uppercase());
            let own = context.data::<String>();
            anyhow::ensure!(
                own.as_deref().map(String::as_str) == Some(self.name.to_uppercase().as_str()),
                "unexpected data {:?}",
                own
            );
            Ok(())
        }

        fn on_validated(&self, _results: &[ValidationResult], context: &ValidatedContext<'_>) {
            if let Some(own) = context.data::<String>() {
                self.seen.lock().push(format!("{}={}", context.plugin_name(), own));
            }
        }
    }

    #[test]
    fn test_plugin_data_isolated_per_plugin() {
        let registry = Arc::new(RuleRegistry::new());
        let sources = FieldSources::new();
        let mut data = PluginData::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let host = PluginHost::setup_all(
            vec![
                PluginRegistration::new(
                    Arc::new(Tagged { name: "alpha", seen: seen.clone() }),
                    PluginOptions::none(),
                ),
                PluginRegistration::new(
                    Arc::new(Tagged { name: "beta", seen: seen.clone() }),
                    PluginOptions::none(),
                ),
            ],
            &registry,
            &sources,
            &mut data,
        )
        .unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(*downcast_data::<String>(&data, "alpha").unwrap(), "ALPHA");
        assert_eq!(*downcast_data::<String>(&data, "beta").unwrap(), "BETA");

        host.notify_all(&[], &registry, &sources, &data);
        assert_eq!(*seen.lock(), vec!["alpha=ALPHA", "beta=BETA"]);
    }
}
