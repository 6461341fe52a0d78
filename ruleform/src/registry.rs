//! 规则注册表
//!
//! 持有关键词表，并负责把规则与字段值进行匹配

use crate::error::{Error, Result};
use crate::rule::{Rule, RuleHandler};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// 规则注册表
///
/// 关键词表采用"后写覆盖"语义：同名关键词后注册的处理器会静默覆盖先注册的。
/// 关键词表只允许在校验器构造期间（插件 setup）写入，构造完成后即被封存。
pub struct RuleRegistry {
    keywords: RwLock<HashMap<String, RuleHandler>>,
    sealed: AtomicBool,
}

impl RuleRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            keywords: RwLock::new(HashMap::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// 注册关键词
    ///
    /// 如果处理器本身是关键词引用，会沿引用链检查是否形成环；
    /// 形成环时拒绝注册，关键词表保持不变。
    pub fn register_keyword(&self, name: impl Into<String>, handler: RuleHandler) -> Result<()> {
        let name = name.into();
        if self.is_sealed() {
            return Err(Error::RegistrySealed { keyword: name });
        }

        let mut keywords = self.keywords.write();
        if let Some(cycle) = find_alias_cycle(&keywords, &name, &handler) {
            return Err(Error::KeywordCycle { cycle });
        }

        tracing::debug!("Registering keyword '{}' ({})", name, handler.kind());
        if let Some(previous) = keywords.insert(name.clone(), handler) {
            tracing::debug!(
                "Keyword '{}' overridden, previous handler was {}",
                name,
                previous.kind()
            );
        }
        Ok(())
    }

    /// 批量注册关键词，按迭代顺序写入
    pub fn register_keywords<I, K>(&self, keywords: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, RuleHandler)>,
        K: Into<String>,
    {
        for (name, handler) in keywords {
            self.register_keyword(name, handler)?;
        }
        Ok(())
    }

    /// 获取关键词对应的处理器
    pub fn keyword(&self, name: &str) -> Option<RuleHandler> {
        self.keywords.read().get(name).cloned()
    }

    pub fn contains_keyword(&self, name: &str) -> bool {
        self.keywords.read().contains_key(name)
    }

    /// 所有关键词（按名称排序）
    pub fn keyword_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.keywords.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.keywords.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.read().is_empty()
    }

    /// 封存关键词表，之后的写入都会失败
    pub(crate) fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
        tracing::debug!("Keyword table sealed with {} keyword(s)", self.len());
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// 匹配规则
    ///
    /// 1. 正则：测试字段值
    /// 2. 断言：以 `(value, param)` 调用
    /// 3. 关键词：未注册的关键词一律不通过；已注册的用解析出的处理器重新匹配
    pub fn matches(&self, value: &str, rule: &Rule) -> bool {
        match rule.handler() {
            RuleHandler::Pattern(re) => re.is_match(value),
            RuleHandler::Predicate(predicate) => predicate.call(value, rule.param()),
            RuleHandler::Keyword(keyword) => {
                // 先释放读锁，再执行处理器
                let resolved = self.keyword(keyword);
                match resolved {
                    Some(handler) => self.matches(value, &rule.resolved(handler)),
                    None => {
                        tracing::debug!(
                            "Rule '{}' references unknown keyword '{}'",
                            rule.name(),
                            keyword
                        );
                        false
                    }
                }
            }
        }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("keywords", &self.keyword_names())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

/// 沿关键词引用链查找环
///
/// 注册前的关键词表不含环，所以只需从待注册项出发检查。
/// 返回形成环的链路，例如 `["a", "b", "a"]`。
fn find_alias_cycle(
    keywords: &HashMap<String, RuleHandler>,
    name: &str,
    handler: &RuleHandler,
) -> Option<Vec<String>> {
    let mut chain = vec![name.to_string()];
    let mut next = handler.as_keyword();

    while let Some(current) = next {
        if let Some(start) = chain.iter().position(|k| k == current) {
            let mut cycle = chain[start..].to_vec();
            cycle.push(current.to_string());
            return Some(cycle);
        }
        chain.push(current.to_string());
        next = keywords.get(current).and_then(RuleHandler::as_keyword);
    }

    None
}
