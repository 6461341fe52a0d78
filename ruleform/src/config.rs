//! 文本规则配置
//!
//! 从内存中的 JSON 或 TOML 文档解析 [`RuleConfig`]。文档的顶层是字段表：
//!
//! ```toml
//! username = ["required", ["minlength", 3]]
//! email = { name = "email", handler = "email" }
//! code = [{ pattern = "^[0-9]{6}$" }]
//! ```
//!
//! - 字符串：关键词
//! - 二元数组 `[handler, param]`：handler 是关键词字符串或 `{ pattern = "..." }`
//! - 表 `{ name?, handler? | pattern?, param? }`：显式对象
//! - 字段层的数组始终是声明列表，二元组需要放在列表里
//!
//! 参数可以是字符串、整数、浮点数、布尔值，或 `{ pattern = "..." }`。
//! 无法识别的形式会让解析直接失败。

use crate::error::{Error, Result};
use crate::normalizer::{FieldRules, RuleConfig, RuleDecl};
use crate::param::ParamValue;
use crate::rule::RuleHandler;
use regex::Regex;
use serde_json::{Map, Value};

const OBJECT_KEYS: &[&str] = &["name", "handler", "pattern", "param"];

/// toml 把日期时间序列化为带这个键的表
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

impl RuleConfig {
    /// 解析 JSON 文档
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))?;
        Self::from_value(value)
    }

    /// 解析 TOML 文档
    pub fn from_toml(text: &str) -> Result<Self> {
        let value: toml::Value =
            toml::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))?;
        let value = serde_json::to_value(value).map_err(|e| Error::ConfigParse(e.to_string()))?;
        Self::from_value(value)
    }

    /// 从 JSON 值解析
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(Error::ConfigParse(
                "rule configuration must be a table keyed by field name".to_string(),
            ));
        };

        let mut config = RuleConfig::new();
        for (field, value) in fields {
            let rules = match value {
                Value::Array(items) => FieldRules::List(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| parse_decl(&field, index + 1, item))
                        .collect::<Result<Vec<_>>>()?,
                ),
                other => FieldRules::Single(parse_decl(&field, 1, other)?),
            };
            config.insert(field, rules);
        }

        tracing::debug!("Parsed rule configuration with {} field(s)", config.len());
        Ok(config)
    }
}

fn parse_decl(field: &str, position: usize, value: Value) -> Result<RuleDecl> {
    match value {
        Value::String(keyword) => Ok(RuleDecl::Keyword(keyword)),
        Value::Array(mut items) => {
            if items.len() != 2 {
                return Err(Error::unsupported(
                    field,
                    position,
                    format!("pair must have exactly 2 elements, found {}", items.len()),
                ));
            }
            let param = items.pop().unwrap_or(Value::Null);
            let handler = items.pop().unwrap_or(Value::Null);
            Ok(RuleDecl::Pair(
                parse_handler(field, position, handler)?,
                parse_param(field, position, param)?,
            ))
        }
        Value::Object(map) => parse_object(field, position, map),
        other => Err(Error::unsupported(
            field,
            position,
            format!("{} is not a rule declaration", value_kind(&other)),
        )),
    }
}

fn parse_object(field: &str, position: usize, mut map: Map<String, Value>) -> Result<RuleDecl> {
    if let Some(unknown) = map.keys().find(|k| !OBJECT_KEYS.contains(&k.as_str())) {
        return Err(Error::unsupported(
            field,
            position,
            format!("unknown key '{}'", unknown),
        ));
    }

    let name = match map.remove("name") {
        None => None,
        Some(Value::String(name)) => Some(name),
        Some(other) => {
            return Err(Error::unsupported(
                field,
                position,
                format!("rule name must be a string, found {}", value_kind(&other)),
            ))
        }
    };

    let handler = match (map.remove("handler"), map.remove("pattern")) {
        (Some(Value::String(keyword)), None) => RuleHandler::Keyword(keyword),
        (None, Some(Value::String(source))) => RuleHandler::pattern(&source)?,
        (Some(_), Some(_)) => {
            return Err(Error::unsupported(
                field,
                position,
                "'handler' and 'pattern' are mutually exclusive",
            ))
        }
        (None, None) => {
            return Err(Error::unsupported(
                field,
                position,
                "missing 'handler' or 'pattern'",
            ))
        }
        _ => {
            return Err(Error::unsupported(
                field,
                position,
                "'handler' and 'pattern' must be strings",
            ))
        }
    };

    let param = map
        .remove("param")
        .map(|value| parse_param(field, position, value))
        .transpose()?;

    Ok(RuleDecl::Object {
        name,
        handler,
        param,
    })
}

fn parse_handler(field: &str, position: usize, value: Value) -> Result<RuleHandler> {
    match value {
        Value::String(keyword) => Ok(RuleHandler::Keyword(keyword)),
        Value::Object(map) => Ok(RuleHandler::Pattern(parse_pattern_table(field, position, map)?)),
        other => Err(Error::unsupported(
            field,
            position,
            format!("{} is not a rule handler", value_kind(&other)),
        )),
    }
}

fn parse_param(field: &str, position: usize, value: Value) -> Result<ParamValue> {
    match value {
        Value::String(s) => Ok(ParamValue::String(s)),
        Value::Bool(b) => Ok(ParamValue::Bool(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ParamValue::Int(i))
            } else if n.is_f64() {
                Ok(ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)))
            } else {
                Err(Error::unsupported(
                    field,
                    position,
                    format!("integer {} is out of range", n),
                ))
            }
        }
        Value::Object(map) if map.contains_key(TOML_DATETIME_KEY) => Err(Error::unsupported(
            field,
            position,
            "datetime is not a rule parameter",
        )),
        Value::Object(map) => Ok(ParamValue::Pattern(parse_pattern_table(field, position, map)?)),
        other => Err(Error::unsupported(
            field,
            position,
            format!("{} is not a rule parameter", value_kind(&other)),
        )),
    }
}

/// `{ pattern = "..." }`
fn parse_pattern_table(field: &str, position: usize, mut map: Map<String, Value>) -> Result<Regex> {
    match map.remove("pattern") {
        Some(Value::String(source)) if map.is_empty() => {
            Regex::new(&source).map_err(|e| Error::invalid_pattern(source, e))
        }
        _ => Err(Error::unsupported(
            field,
            position,
            "expected a table with a single 'pattern' string",
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_RULES: &str = r#"
username = ["required", ["minlength", 3]]
email = { name = "email", handler = "email" }
code = [{ pattern = "^[0-9]{6}$" }, [{ pattern = "^1" }, 0]]
password2 = ["required", { name = "equalToPassword", handler = "equalToField", param = "password" }]
"#;

    fn names(set: &crate::normalizer::RuleSet, field: &str) -> Vec<String> {
        set.get(field)
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }

    #[test]
    fn test_toml_rules() {
        let set = RuleConfig::from_toml(TOML_RULES).unwrap().normalize().unwrap();

        assert_eq!(set.len(), 4);
        assert_eq!(names(&set, "username"), vec!["required", "rule2"]);
        assert_eq!(names(&set, "email"), vec!["email"]);
        assert_eq!(names(&set, "code"), vec!["rule1", "rule2"]);
        assert_eq!(names(&set, "password2"), vec!["required", "equalToPassword"]);

        let min = &set.get("username").unwrap()[1];
        assert_eq!(min.handler().as_keyword(), Some("minlength"));
        assert_eq!(min.param(), Some(&ParamValue::Int(3)));

        let code = &set.get("code").unwrap()[0];
        assert_eq!(code.handler().kind(), "pattern");
    }

    #[test]
    fn test_json_rules() {
        let config = RuleConfig::from_json(
            r#"{"age": [["range", 1.5], {"handler": "digits", "param": {"pattern": "^9"}}], "agree": "required"}"#,
        )
        .unwrap();
        let set = config.normalize().unwrap();

        let age = set.get("age").unwrap();
        assert_eq!(age[0].param(), Some(&ParamValue::Float(1.5)));
        assert!(age[1].param().unwrap().as_pattern().is_some());
        assert_eq!(names(&set, "agree"), vec!["required"]);
    }

    #[test]
    fn test_unsupported_shapes_fail() {
        let cases = [
            r#"{"age": 18}"#,
            r#"{"age": [true]}"#,
            r#"{"age": [["minlength"]]}"#,
            r#"{"age": [["minlength", 1, 2]]}"#,
            r#"{"age": [[3, 1]]}"#,
            r#"{"age": {"name": "x"}}"#,
            r#"{"age": {"handler": "a", "pattern": "b"}}"#,
            r#"{"age": {"handler": "a", "message": "b"}}"#,
            r#"{"age": [["minlength", null]]}"#,
            r#"{"age": [["minlength", {"regex": "x"}]]}"#,
        ];

        for case in cases {
            let err = RuleConfig::from_json(case).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedDeclaration { .. }),
                "{} should be rejected, got {:?}",
                case,
                err
            );
        }
    }

    #[test]
    fn test_out_of_range_integer_rejected() {
        let err = RuleConfig::from_json(r#"{"age": [["minlength", 18446744073709551615]]}"#)
            .unwrap_err();
        if let Error::UnsupportedDeclaration { field, reason, .. } = err {
            assert_eq!(field, "age");
            assert!(reason.contains("out of range"));
        } else {
            panic!("Expected UnsupportedDeclaration error");
        }
    }

    #[test]
    fn test_datetime_param_rejected() {
        let err = RuleConfig::from_toml("birthday = [[\"minlength\", 1979-05-27T07:32:00Z]]")
            .unwrap_err();
        if let Error::UnsupportedDeclaration { reason, .. } = err {
            assert_eq!(reason, "datetime is not a rule parameter");
        } else {
            panic!("Expected UnsupportedDeclaration error");
        }
    }

    #[test]
    fn test_position_reported() {
        let err = RuleConfig::from_json(r#"{"age": ["required", 5]}"#).unwrap_err();
        if let Error::UnsupportedDeclaration { field, position, .. } = err {
            assert_eq!(field, "age");
            assert_eq!(position, 2);
        } else {
            panic!("Expected UnsupportedDeclaration error");
        }
    }

    #[test]
    fn test_invalid_pattern_and_document() {
        assert!(matches!(
            RuleConfig::from_json(r#"{"code": {"pattern": "("}}"#).unwrap_err(),
            Error::InvalidPattern { .. }
        ));
        assert!(matches!(
            RuleConfig::from_json("[1, 2]").unwrap_err(),
            Error::ConfigParse(_)
        ));
        assert!(matches!(
            RuleConfig::from_toml("username = ").unwrap_err(),
            Error::ConfigParse(_)
        ));
    }
}
