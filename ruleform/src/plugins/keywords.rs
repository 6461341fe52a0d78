use crate::error::Result;
use crate::param::ParamValue;
use crate::plugin::{Plugin, PluginContext, PluginOptions};
use crate::rule::RuleHandler;

/// 自定义关键词插件
///
/// 在 setup 时按添加顺序注册关键词。注册在默认关键词插件之后，同名关键词会覆盖默认值。
#[derive(Debug, Clone)]
pub struct KeywordsPlugin {
    name: String,
    keywords: Vec<(String, RuleHandler)>,
}

impl KeywordsPlugin {
    pub fn new() -> Self {
        Self {
            name: "KeywordsPlugin".to_string(),
            keywords: Vec::new(),
        }
    }

    /// 设置插件名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>, handler: RuleHandler) -> Self {
        self.keywords.push((keyword.into(), handler));
        self
    }

    pub fn with_pattern(self, keyword: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(self.with_keyword(keyword, RuleHandler::pattern(pattern)?))
    }

    pub fn with_predicate<F>(self, keyword: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str, Option<&ParamValue>) -> bool + Send + Sync + 'static,
    {
        self.with_keyword(keyword, RuleHandler::predicate(func))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl Default for KeywordsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for KeywordsPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, context: &mut PluginContext<'_>, _options: &PluginOptions) -> anyhow::Result<()> {
        context.register_keywords(self.keywords.iter().cloned())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::field::FieldValue;
    use crate::normalizer::{RuleConfig, RuleDecl};
    use crate::validator::FormValidator;

    #[test]
    fn test_custom_keywords() {
        let plugin = KeywordsPlugin::new()
            .with_pattern("slug", "^[a-z0-9-]+$")
            .unwrap()
            .with_predicate("even", |v, _| v.parse::<i64>().is_ok_and(|n| n % 2 == 0));
        assert_eq!(plugin.len(), 2);

        let config = RuleConfig::new()
            .field("slug", "slug")
            .field("count", vec![RuleDecl::keyword("required"), RuleDecl::keyword("even")]);
        let validator = FormValidator::builder(config)
            .plugin(plugin, PluginOptions::none())
            .field_source(FieldValue::shared("slug", "hello-world"))
            .field_source(FieldValue::shared("count", "3"))
            .build()
            .unwrap();

        let results = validator.validate();
        assert!(results[0].all_passed);
        assert_eq!(results[1].no_passed_rules, vec!["even"]);
    }

    #[test]
    fn test_cycle_aborts_construction() {
        let plugin = KeywordsPlugin::new()
            .with_name("Aliases")
            .with_keyword("a", RuleHandler::keyword("b"))
            .with_keyword("b", RuleHandler::keyword("a"));

        let err = FormValidator::builder(RuleConfig::new())
            .plugin(plugin, PluginOptions::none())
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::PluginSetup { ref plugin, .. } if plugin == "Aliases"));
        assert!(err.to_string().contains("b -> a -> b"));
    }
}
