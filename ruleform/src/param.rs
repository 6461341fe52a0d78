//! 规则参数
//!
//! 规则的可选参数，例如 `minlength` 的长度、`equalToField` 的参考字段名

use regex::Regex;
use std::fmt;

/// 规则参数值
#[derive(Debug, Clone)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Pattern(Regex),
}

impl ParamValue {
    /// 转换为字符串
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 转换为整数
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 转换为长度（负数无效）
    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|i| usize::try_from(i).ok())
    }

    /// 转换为浮点数
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 转换为布尔值
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// 转换为正则
    pub fn as_pattern(&self) -> Option<&Regex> {
        match self {
            ParamValue::Pattern(re) => Some(re),
            _ => None,
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::String(a), ParamValue::String(b)) => a == b,
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            (ParamValue::Float(a), ParamValue::Float(b)) => a == b,
            (ParamValue::Bool(a), ParamValue::Bool(b)) => a == b,
            (ParamValue::Pattern(a), ParamValue::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Regex> for ParamValue {
    fn from(value: Regex) -> Self {
        ParamValue::Pattern(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(ParamValue::from(6).as_usize(), Some(6));
        assert_eq!(ParamValue::from("12").as_usize(), Some(12));
        assert_eq!(ParamValue::from(-1).as_usize(), None);
        assert_eq!(ParamValue::from(3).as_f64(), Some(3.0));
        assert_eq!(ParamValue::from("abc").as_i64(), None);
    }

    #[test]
    fn test_bool_conversion() {
        assert_eq!(ParamValue::from("yes").as_bool(), Some(true));
        assert_eq!(ParamValue::from(false).as_bool(), Some(false));
        assert_eq!(ParamValue::from(1).as_bool(), None);
    }

    #[test]
    fn test_pattern_equality() {
        let a = ParamValue::from(Regex::new("^a").unwrap());
        let b = ParamValue::from(Regex::new("^a").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "/^a/");
        assert!(a.as_pattern().unwrap().is_match("abc"));
    }
}
