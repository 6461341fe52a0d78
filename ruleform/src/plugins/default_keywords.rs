//! 默认关键词插件
//!
//! 预设常用的关键词规则，以便在规则配置中直接用名称复用

use crate::field::FieldSources;
use crate::param::ParamValue;
use crate::plugin::{Plugin, PluginContext, PluginOptions};
use crate::rule::RuleHandler;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

pub const DEFAULT_KEYWORDS_PLUGIN_NAME: &str = "DefaultRulerKeywordPlugin";

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email pattern is valid")
});

/// 内置的邮箱正则
pub fn email_pattern() -> &'static Regex {
    &EMAIL_PATTERN
}

/// 默认关键词表
///
/// - `email`：邮箱格式
/// - `required`：非空
/// - `maxlength` / `minlength`：按字符数比较，参数缺失或不是数字时不通过
/// - `equalToField`：与参数指定字段的当前值相等，字段不存在时不通过
pub fn default_keywords(sources: FieldSources) -> Vec<(&'static str, RuleHandler)> {
    vec![
        ("email", RuleHandler::Pattern(email_pattern().clone())),
        ("required", RuleHandler::predicate(|value, _| !value.is_empty())),
        (
            "maxlength",
            RuleHandler::predicate(|value, param| {
                param
                    .and_then(ParamValue::as_usize)
                    .is_some_and(|max| value.chars().count() <= max)
            }),
        ),
        (
            "minlength",
            RuleHandler::predicate(|value, param| {
                param
                    .and_then(ParamValue::as_usize)
                    .is_some_and(|min| value.chars().count() >= min)
            }),
        ),
        (
            "equalToField",
            RuleHandler::predicate(move |value, param| {
                param
                    .and_then(ParamValue::as_str)
                    .and_then(|field| sources.value_of(field))
                    .is_some_and(|other| other == value)
            }),
        ),
    ]
}

/// 默认关键词插件的选项
///
/// 在默认关键词之后合并，同名时覆盖默认值
#[derive(Debug, Default, Deserialize)]
pub struct DefaultKeywordsOptions {
    /// 关键词 → 正则
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,

    /// 关键词 → 另一个关键词
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// 默认关键词插件
#[derive(Debug, Default)]
pub struct DefaultKeywordsPlugin;

impl DefaultKeywordsPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for DefaultKeywordsPlugin {
    fn name(&self) -> &str {
        DEFAULT_KEYWORDS_PLUGIN_NAME
    }

    fn setup(&self, context: &mut PluginContext<'_>, options: &PluginOptions) -> anyhow::Result<()> {
        let options: DefaultKeywordsOptions = options.parse()?;

        context.register_keywords(default_keywords(context.field_sources()))?;

        for (keyword, source) in options.patterns {
            context.register_keyword(keyword, RuleHandler::pattern(&source)?)?;
        }
        for (keyword, target) in options.aliases {
            context.register_keyword(keyword, RuleHandler::Keyword(target))?;
        }

        tracing::debug!("Default keywords registered, table has {} keyword(s)", context.registry().len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use crate::normalizer::{RuleConfig, RuleDecl};
    use crate::registry::RuleRegistry;
    use crate::rule::Rule;
    use crate::validator::FormValidator;
    use serde_json::json;

    fn registry_with_defaults(sources: FieldSources) -> RuleRegistry {
        let registry = RuleRegistry::new();
        registry.register_keywords(default_keywords(sources)).unwrap();
        registry
    }

    fn keyword_rule(keyword: &str, param: Option<ParamValue>) -> Rule {
        Rule::new(keyword, RuleHandler::keyword(keyword)).with_param(param)
    }

    #[test]
    fn test_email() {
        let registry = registry_with_defaults(FieldSources::new());
        let rule = keyword_rule("email", None);

        assert!(registry.matches("someone@example.com", &rule));
        assert!(registry.matches("first.last@sub.example.org", &rule));
        assert!(!registry.matches("someone@", &rule));
        assert!(!registry.matches("not an email", &rule));
        assert!(!registry.matches("", &rule));
    }

    #[test]
    fn test_required() {
        let registry = registry_with_defaults(FieldSources::new());
        let rule = keyword_rule("required", None);

        assert!(registry.matches("x", &rule));
        assert!(!registry.matches("", &rule));
    }

    #[test]
    fn test_lengths_count_chars() {
        let registry = registry_with_defaults(FieldSources::new());
        let min = keyword_rule("minlength", Some(ParamValue::from(3)));
        let max = keyword_rule("maxlength", Some(ParamValue::from(3)));

        assert!(registry.matches("héé", &min));
        assert!(registry.matches("héé", &max));
        assert!(!registry.matches("hé", &min));
        assert!(!registry.matches("héééé", &max));
    }

    #[test]
    fn test_lengths_without_usable_param_fail() {
        let registry = registry_with_defaults(FieldSources::new());

        assert!(!registry.matches("abc", &keyword_rule("minlength", None)));
        assert!(!registry.matches("abc", &keyword_rule("maxlength", Some(ParamValue::from("many")))));
    }

    #[test]
    fn test_equal_to_missing_field_fails() {
        let sources = FieldSources::new();
        sources.push(FieldValue::shared("password", "secret"));
        let registry = registry_with_defaults(sources);

        let rule = keyword_rule("equalToField", Some(ParamValue::from("password")));
        assert!(registry.matches("secret", &rule));
        assert!(!registry.matches("other", &rule));

        let missing = keyword_rule("equalToField", Some(ParamValue::from("confirm")));
        assert!(!registry.matches("secret", &missing));
    }

    #[test]
    fn test_options_merge_over_defaults() {
        let config = RuleConfig::new()
            .field("email", "email")
            .field("code", vec![RuleDecl::keyword("notEmpty"), RuleDecl::keyword("zip")]);
        let validator = FormValidator::builder(config)
            .default_keywords_options(json!({
                "patterns": {"email": "@corp\\.com$", "zip": "^[0-9]{5}$"},
                "aliases": {"notEmpty": "required"}
            }))
            .field_source(FieldValue::shared("email", "someone@example.com"))
            .field_source(FieldValue::shared("code", "12345"))
            .build()
            .unwrap();

        let results = validator.validate();
        assert_eq!(results[0].no_passed_rules, vec!["email"]);
        assert!(results[1].all_passed);
    }
}
