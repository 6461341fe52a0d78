//! 规则配置规范化
//!
//! 用户的规则声明支持多种简写形式，这里把它们统一整理为每个字段一个有序的 [`Rule`] 列表。
//!
//! 匿名声明按其在本字段列表中的位置（从 1 开始）命名为 `ruleN`。
//! 二元组声明 `[handler, param]` 同样使用位置命名，即使 handler 是关键词。

use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::rule::{Predicate, Rule, RuleHandler};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// 单条规则声明
#[derive(Debug, Clone)]
pub enum RuleDecl {
    /// 关键词，规则以关键词命名
    Keyword(String),

    /// 匿名正则
    Pattern(Regex),

    /// 匿名断言
    Predicate(Predicate),

    /// `[handler, param]` 二元组
    Pair(RuleHandler, ParamValue),

    /// 显式对象 `{name?, handler, param?}`
    Object {
        name: Option<String>,
        handler: RuleHandler,
        param: Option<ParamValue>,
    },
}

impl RuleDecl {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        RuleDecl::Keyword(keyword.into())
    }

    /// 编译正则声明
    pub fn pattern(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(RuleDecl::Pattern)
            .map_err(|e| Error::invalid_pattern(source, e))
    }

    pub fn predicate<F>(func: F) -> Self
    where
        F: Fn(&str, Option<&ParamValue>) -> bool + Send + Sync + 'static,
    {
        RuleDecl::Predicate(Predicate::new(func))
    }

    pub fn pair(handler: impl Into<RuleHandler>, param: impl Into<ParamValue>) -> Self {
        RuleDecl::Pair(handler.into(), param.into())
    }

    pub fn object(handler: impl Into<RuleHandler>) -> Self {
        RuleDecl::Object {
            name: None,
            handler: handler.into(),
            param: None,
        }
    }

    /// 设置规则名称
    ///
    /// 非对象声明会先转换为等价的对象声明，名称不会被丢弃
    pub fn named(self, rule_name: impl Into<String>) -> Self {
        let (_, handler, param) = self.into_parts();
        RuleDecl::Object {
            name: Some(rule_name.into()),
            handler,
            param,
        }
    }

    /// 设置规则参数
    ///
    /// 关键词转换后仍以关键词命名；正则、断言和二元组保持位置命名
    pub fn with_param(self, value: impl Into<ParamValue>) -> Self {
        let (name, handler, _) = self.into_parts();
        RuleDecl::Object {
            name,
            handler,
            param: Some(value.into()),
        }
    }

    /// 拆分为 `(name?, handler, param?)`
    fn into_parts(self) -> (Option<String>, RuleHandler, Option<ParamValue>) {
        match self {
            RuleDecl::Keyword(keyword) => (Some(keyword.clone()), RuleHandler::Keyword(keyword), None),
            RuleDecl::Pattern(re) => (None, RuleHandler::Pattern(re), None),
            RuleDecl::Predicate(p) => (None, RuleHandler::Predicate(p), None),
            RuleDecl::Pair(handler, param) => (None, handler, Some(param)),
            RuleDecl::Object {
                name,
                handler,
                param,
            } => (name, handler, param),
        }
    }

    /// 整理为规则，`position` 从 1 开始
    fn into_rule(self, position: usize) -> Rule {
        let positional = || format!("rule{}", position);

        match self {
            RuleDecl::Keyword(keyword) => Rule::new(keyword.clone(), RuleHandler::Keyword(keyword)),
            RuleDecl::Pattern(re) => Rule::new(positional(), RuleHandler::Pattern(re)),
            RuleDecl::Predicate(p) => Rule::new(positional(), RuleHandler::Predicate(p)),
            RuleDecl::Pair(handler, param) => {
                Rule::new(positional(), handler).with_param(Some(param))
            }
            RuleDecl::Object {
                name,
                handler,
                param,
            } => Rule::new(name.unwrap_or_else(positional), handler).with_param(param),
        }
    }
}

impl From<&str> for RuleDecl {
    fn from(keyword: &str) -> Self {
        RuleDecl::Keyword(keyword.to_string())
    }
}

impl From<Regex> for RuleDecl {
    fn from(re: Regex) -> Self {
        RuleDecl::Pattern(re)
    }
}

impl From<Predicate> for RuleDecl {
    fn from(p: Predicate) -> Self {
        RuleDecl::Predicate(p)
    }
}

/// 一个字段的规则声明：单条或列表
#[derive(Debug, Clone)]
pub enum FieldRules {
    Single(RuleDecl),
    List(Vec<RuleDecl>),
}

impl FieldRules {
    fn into_decls(self) -> Vec<RuleDecl> {
        match self {
            FieldRules::Single(decl) => vec![decl],
            FieldRules::List(decls) => decls,
        }
    }
}

impl From<RuleDecl> for FieldRules {
    fn from(decl: RuleDecl) -> Self {
        FieldRules::Single(decl)
    }
}

impl From<Vec<RuleDecl>> for FieldRules {
    fn from(decls: Vec<RuleDecl>) -> Self {
        FieldRules::List(decls)
    }
}

impl From<&str> for FieldRules {
    fn from(keyword: &str) -> Self {
        FieldRules::Single(RuleDecl::from(keyword))
    }
}

/// 用户规则配置：字段名 → 规则声明
#[derive(Debug, Clone, Default)]
pub struct RuleConfig {
    fields: BTreeMap<String, FieldRules>,
}

impl RuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加字段规则（构建器风格），同名字段会被替换
    pub fn field(mut self, name: impl Into<String>, rules: impl Into<FieldRules>) -> Self {
        self.insert(name, rules);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, rules: impl Into<FieldRules>) {
        self.fields.insert(name.into(), rules.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// 规范化为规则集
    pub fn normalize(self) -> Result<RuleSet> {
        let mut rules = BTreeMap::new();

        for (field, field_rules) in self.fields {
            let normalized = normalize_field(&field, field_rules)?;
            tracing::debug!("Field '{}' normalized into {} rule(s)", field, normalized.len());
            rules.insert(field, normalized);
        }

        Ok(RuleSet { rules })
    }
}

fn normalize_field(field: &str, field_rules: FieldRules) -> Result<Vec<Rule>> {
    let mut seen = HashSet::new();
    let mut rules = Vec::new();

    for (index, decl) in field_rules.into_decls().into_iter().enumerate() {
        let rule = decl.into_rule(index + 1);
        if !seen.insert(rule.name().to_string()) {
            return Err(Error::DuplicateRuleName {
                field: field.to_string(),
                rule: rule.name().to_string(),
            });
        }
        rules.push(rule);
    }

    Ok(rules)
}

/// 规范化后的规则集
///
/// 构造完成后不可变
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, Vec<Rule>>,
}

impl RuleSet {
    /// 字段的规则（按声明顺序）
    pub fn get(&self, field: &str) -> Option<&[Rule]> {
        self.rules.get(field).map(Vec::as_slice)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
