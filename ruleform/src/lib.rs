//! Ruleform - 声明式字段规则校验
//!
//! 按字段配置规则，对一组具名字段值进行校验，并通过插件扩展：
//! - 多种规则简写（关键词、正则、断言、二元组、显式对象）统一规范化
//! - 关键词规则延迟解析，未注册的关键词一律不通过
//! - 插件在构造时注册关键词、提供字段值来源，并在每次校验后收到结果
//!
//! ```ignore
//! use ruleform::prelude::*;
//!
//! let config = RuleConfig::from_toml(r#"username = ["required", ["minlength", 3]]"#)?;
//! let validator = FormValidator::builder(config)
//!     .field_source(FieldValue::shared("username", "ab"))
//!     .build()?;
//!
//! let results = validator.validate();
//! assert_eq!(results[0].no_passed_rules, vec!["rule2"]);
//! ```

// 让派生宏生成的 `::ruleform::...` 路径在本 crate 内也能解析
extern crate self as ruleform;

pub mod config;
pub mod error;
pub mod field;
pub mod logging;
pub mod normalizer;
pub mod param;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod rule;
pub mod validator;

pub use error::{Error, Result};
pub use field::{FieldSource, FieldSources, FieldValue, IntoFieldSources};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use normalizer::{FieldRules, RuleConfig, RuleDecl, RuleSet};
pub use param::ParamValue;
pub use plugin::{Plugin, PluginContext, PluginOptions, PluginRegistration, ValidatedContext};
pub use registry::RuleRegistry;
pub use rule::{Predicate, Rule, RuleHandler};
pub use validator::{FormValidator, ValidationResult, ValidatorBuilder};

// 重新导出派生宏
pub use ruleform_macros::IntoFieldSources;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::field::{FieldSource, FieldSources, FieldValue};
    // trait 与派生宏同名，一并导出
    pub use crate::IntoFieldSources;
    pub use crate::normalizer::{FieldRules, RuleConfig, RuleDecl};
    pub use crate::param::ParamValue;
    pub use crate::plugin::{Plugin, PluginContext, PluginOptions, ValidatedContext};
    pub use crate::plugins::{
        AutoSourcesPlugin, DefaultKeywordsPlugin, KeywordsPlugin, ResultLogPlugin,
    };
    pub use crate::registry::RuleRegistry;
    pub use crate::rule::{Rule, RuleHandler};
    pub use crate::validator::{FormValidator, ValidationResult};
}
