use ruleform::plugins::{AutoSourcesData, AUTO_SOURCES_PLUGIN_NAME};
use ruleform::prelude::*;
use ruleform::LoggingConfig;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

// ==================== 规则配置 ====================

const RULES: &str = r#"
username = { pattern = "[a-zA-Z]" }
password2 = ["required", { name = "equalToPassword", handler = "equalToField", param = "password" }]
email = [{ name = "email", handler = "email" }]
nickname = ["required", "noSpaces"]
"#;

// ==================== 表单 ====================

#[derive(IntoFieldSources)]
struct SignupForm {
    username: String,
    password: String,
    password2: String,
    email: String,
    #[field(rename = "nickname")]
    display_name: Option<String>,
}

fn main() -> anyhow::Result<()> {
    LoggingConfig::from_env().init()?;

    println!("=== Ruleform Demo ===\n");

    // 断言规则无法写进文本配置，在代码中追加
    let mut config = RuleConfig::from_toml(RULES)?;
    config.insert(
        "password",
        vec![
            RuleDecl::keyword("required"),
            RuleDecl::pair("minlength", 12i64),
            RuleDecl::object("maxlength").with_param(6i64),
            RuleDecl::pair(
                RuleHandler::predicate(|value, param| {
                    param
                        .and_then(|p| p.as_pattern())
                        .is_some_and(|re| re.is_match(value))
                }),
                Regex::new("^[a-zA-Z]")?,
            ),
        ],
    );

    // ==================== 结构体来源 ====================

    let form = SignupForm {
        username: "alice".to_string(),
        password: "abc123".to_string(),
        password2: "abc124".to_string(),
        email: "alice@example".to_string(),
        display_name: None,
    };

    let no_spaces = KeywordsPlugin::new()
        .with_name("DemoKeywords")
        .with_predicate("noSpaces", |value, _| !value.contains(' '));

    let validator = FormValidator::builder(config.clone())
        .sources_from(&form)
        .plugin(no_spaces, PluginOptions::none())
        .plugin(ResultLogPlugin::new(), json!({ "log_passed": true }))
        .build()?;

    println!("📋 Plugins: {:?}", validator.plugin_names());
    validator.validate_with(|results, _| print_results(results));

    // ==================== 插件提供来源 ====================

    let controls: Vec<Arc<dyn FieldSource>> = vec![
        FieldValue::shared("username", "bob"),
        FieldValue::shared("password", "Bobby1"),
        FieldValue::shared("password2", "Bobby1"),
        FieldValue::shared("email", "bob@example.com"),
        FieldValue::shared("nickname", "bob"),
    ];

    let validator = FormValidator::builder(config)
        .plugin(
            AutoSourcesPlugin::from_fields(controls),
            json!({ "selector": "*" }),
        )
        .plugin(
            KeywordsPlugin::new().with_predicate("noSpaces", |value, _| !value.contains(' ')),
            PluginOptions::none(),
        )
        .build()?;

    if let Some(data) = validator.plugin_data::<AutoSourcesData>(AUTO_SOURCES_PLUGIN_NAME) {
        println!("🔌 Auto sources matched: {:?}", data.matched);
    }
    validator.validate_with(|results, _| print_results(results));

    tracing::info!("Demo finished");
    Ok(())
}

fn print_results(results: &[ValidationResult]) {
    for result in results {
        if result.all_passed {
            println!("  ✓ {}", result.name);
        } else {
            println!("  ✗ {} -> {:?}", result.name, result.no_passed_rules);
        }
    }
    println!();
}
