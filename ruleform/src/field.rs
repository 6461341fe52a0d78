//! 字段值来源
//!
//! 校验器不关心字段值从哪里读取，只要求来源有稳定的名称和当前的字符串值

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// 字段值来源 trait
///
/// 名称即身份
pub trait FieldSource: Send + Sync {
    /// 字段名称
    fn name(&self) -> &str;

    /// 字段当前值
    fn value(&self) -> String;
}

/// 内置的字段值来源，值可在校验之间修改
pub struct FieldValue {
    name: String,
    value: RwLock<String>,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: RwLock::new(value.into()),
        }
    }

    /// 创建可共享的字段值
    pub fn shared(name: impl Into<String>, value: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name, value))
    }

    /// 修改当前值
    pub fn set_value(&self, value: impl Into<String>) {
        *self.value.write() = value.into();
    }
}

impl FieldSource for FieldValue {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> String {
        self.value.read().clone()
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValue")
            .field("name", &self.name)
            .field("value", &*self.value.read())
            .finish()
    }
}

/// 能转换为字段值来源的类型
///
/// 通常通过 `#[derive(IntoFieldSources)]` 实现
pub trait IntoFieldSources {
    fn into_field_sources(&self) -> Vec<Arc<dyn FieldSource>>;
}

/// 校验器持有的字段值来源列表
///
/// 可克隆的共享句柄；关键词断言（如 `equalToField`）通过它读取其它字段
#[derive(Clone, Default)]
pub struct FieldSources {
    inner: Arc<RwLock<Vec<Arc<dyn FieldSource>>>>,
}

impl FieldSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// 替换全部来源
    pub(crate) fn replace(&self, sources: Vec<Arc<dyn FieldSource>>) {
        *self.inner.write() = sources;
    }

    pub(crate) fn push(&self, source: Arc<dyn FieldSource>) {
        self.inner.write().push(source);
    }

    /// 按名称查找第一个来源
    pub fn find(&self, name: &str) -> Option<Arc<dyn FieldSource>> {
        self.inner.read().iter().find(|s| s.name() == name).cloned()
    }

    /// 按名称读取当前值
    pub fn value_of(&self, name: &str) -> Option<String> {
        self.find(name).map(|s| s.value())
    }

    /// 当前来源的快照，读锁在返回前释放
    pub fn snapshot(&self) -> Vec<Arc<dyn FieldSource>> {
        self.inner.read().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.read().iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl fmt::Debug for FieldSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSources")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_mutation() {
        let field = FieldValue::shared("username", "ab");
        assert_eq!(field.value(), "ab");

        field.set_value("abc");
        assert_eq!(field.value(), "abc");
    }

    #[test]
    fn test_sources_lookup() {
        let sources = FieldSources::new();
        assert!(sources.is_empty());

        sources.push(FieldValue::shared("password", "secret"));
        sources.push(FieldValue::shared("password2", "secret"));

        assert_eq!(sources.len(), 2);
        assert_eq!(sources.value_of("password").as_deref(), Some("secret"));
        assert!(sources.find("email").is_none());
        assert_eq!(sources.names(), vec!["password", "password2"]);
    }

    #[test]
    fn test_cloned_handle_shares_list() {
        let sources = FieldSources::new();
        let handle = sources.clone();

        sources.replace(vec![FieldValue::shared("email", "a@b.co")]);
        assert_eq!(handle.len(), 1);
    }
}
