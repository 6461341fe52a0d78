use crate::plugin::{Plugin, PluginContext, PluginOptions, ValidatedContext};
use crate::validator::ValidationResult;
use parking_lot::Mutex;
use serde::Deserialize;

pub const RESULT_LOG_PLUGIN_NAME: &str = "ResultLogPlugin";

/// 结果日志插件的选项
#[derive(Debug, Default, Deserialize)]
pub struct ResultLogOptions {
    /// 是否同时记录通过的字段
    #[serde(default)]
    pub log_passed: bool,
}

/// 校验统计
#[derive(Debug, Default)]
pub struct ValidationStats {
    inner: Mutex<StatsInner>,
    log_passed: bool,
}

#[derive(Debug, Default, Clone)]
struct StatsInner {
    runs: usize,
    last_failed: Vec<String>,
}

impl ValidationStats {
    /// 已完成的校验次数
    pub fn runs(&self) -> usize {
        self.inner.lock().runs
    }

    /// 最近一次未通过的字段
    pub fn last_failed(&self) -> Vec<String> {
        self.inner.lock().last_failed.clone()
    }
}

/// 校验结果日志插件
///
/// 每次校验后用 tracing 记录未通过的字段，并维护统计数据
#[derive(Debug, Default)]
pub struct ResultLogPlugin;

impl ResultLogPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for ResultLogPlugin {
    fn name(&self) -> &str {
        RESULT_LOG_PLUGIN_NAME
    }

    fn setup(&self, context: &mut PluginContext<'_>, options: &PluginOptions) -> anyhow::Result<()> {
        let options: ResultLogOptions = options.parse()?;
        context.store_data(ValidationStats {
            inner: Mutex::new(StatsInner::default()),
            log_passed: options.log_passed,
        });
        Ok(())
    }

    fn on_validated(&self, results: &[ValidationResult], context: &ValidatedContext<'_>) {
        let Some(stats) = context.data::<ValidationStats>() else {
            return;
        };

        let mut failed = Vec::new();
        for result in results {
            if result.all_passed {
                if stats.log_passed {
                    tracing::info!("✓ {}", result.name);
                }
            } else {
                tracing::info!("✗ {} failed: {}", result.name, result.no_passed_rules.join(", "));
                failed.push(result.name.clone());
            }
        }

        let mut inner = stats.inner.lock();
        inner.runs += 1;
        inner.last_failed = failed;
    }
}
