//! 规则定义
//!
//! 规则由名称、处理器和可选参数组成。处理器的种类在规范化时就已确定，
//! 只有关键词引用会延迟到匹配时才解析。

use crate::error::{Error, Result};
use crate::param::ParamValue;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// 断言函数签名：`(value, param?) -> bool`
pub type PredicateFn = dyn Fn(&str, Option<&ParamValue>) -> bool + Send + Sync;

/// 可共享的断言函数
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&str, Option<&ParamValue>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    /// 执行断言
    pub fn call(&self, value: &str, param: Option<&ParamValue>) -> bool {
        (self.0)(value, param)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate(...)")
    }
}

/// 规则处理器
///
/// 用显式的标签变体代替运行时类型判断
#[derive(Clone)]
pub enum RuleHandler {
    /// 正则匹配
    Pattern(Regex),

    /// 自定义断言
    Predicate(Predicate),

    /// 关键词引用，匹配时到注册表中解析
    Keyword(String),
}

impl RuleHandler {
    /// 编译正则处理器
    pub fn pattern(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(RuleHandler::Pattern)
            .map_err(|e| Error::invalid_pattern(source, e))
    }

    pub fn predicate<F>(func: F) -> Self
    where
        F: Fn(&str, Option<&ParamValue>) -> bool + Send + Sync + 'static,
    {
        RuleHandler::Predicate(Predicate::new(func))
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        RuleHandler::Keyword(name.into())
    }

    /// 处理器种类（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            RuleHandler::Pattern(_) => "pattern",
            RuleHandler::Predicate(_) => "predicate",
            RuleHandler::Keyword(_) => "keyword",
        }
    }

    /// 如果是关键词引用，返回关键词
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            RuleHandler::Keyword(k) => Some(k.as_str()),
            _ => None,
        }
    }
}

impl fmt::Debug for RuleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleHandler::Pattern(re) => write!(f, "Pattern(/{}/)", re.as_str()),
            RuleHandler::Predicate(_) => write!(f, "Predicate(...)"),
            RuleHandler::Keyword(k) => write!(f, "Keyword({})", k),
        }
    }
}

impl From<Regex> for RuleHandler {
    fn from(re: Regex) -> Self {
        RuleHandler::Pattern(re)
    }
}

impl From<Predicate> for RuleHandler {
    fn from(p: Predicate) -> Self {
        RuleHandler::Predicate(p)
    }
}

impl From<&str> for RuleHandler {
    fn from(keyword: &str) -> Self {
        RuleHandler::Keyword(keyword.to_string())
    }
}

impl From<String> for RuleHandler {
    fn from(keyword: String) -> Self {
        RuleHandler::Keyword(keyword)
    }
}

/// 单条规则
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    handler: RuleHandler,
    param: Option<ParamValue>,
}

impl Rule {
    pub fn new(name: impl Into<String>, handler: RuleHandler) -> Self {
        Self {
            name: name.into(),
            handler,
            param: None,
        }
    }

    pub fn with_param(mut self, param: Option<ParamValue>) -> Self {
        self.param = param;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &RuleHandler {
        &self.handler
    }

    pub fn param(&self) -> Option<&ParamValue> {
        self.param.as_ref()
    }

    /// 用新的处理器替换，保留名称和参数
    pub(crate) fn resolved(&self, handler: RuleHandler) -> Self {
        Self {
            name: self.name.clone(),
            handler,
            param: self.param.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern() {
        let err = RuleHandler::pattern("(").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_resolved_keeps_name_and_param() {
        let rule = Rule::new("rule1", RuleHandler::keyword("minlength"))
            .with_param(Some(ParamValue::from(3)));
        let resolved = rule.resolved(RuleHandler::predicate(|v, _| !v.is_empty()));

        assert_eq!(resolved.name(), "rule1");
        assert_eq!(resolved.param(), Some(&ParamValue::Int(3)));
        assert_eq!(resolved.handler().kind(), "predicate");
    }

    #[test]
    fn test_handler_debug() {
        let handler = RuleHandler::pattern("^a+$").unwrap();
        assert_eq!(format!("{:?}", handler), "Pattern(/^a+$/)");
        assert_eq!(format!("{:?}", RuleHandler::keyword("email")), "Keyword(email)");
    }
}
