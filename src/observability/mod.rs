pub mod metrics;
pub(crate) mod tracing;

use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};

use self::metrics::Metrics;

pub use self::tracing::{LogFormat, init as init_tracing};

/// メトリクスレジストリとコレクターをまとめて保持する。
#[derive(Debug, Clone)]
pub struct Telemetry {
    registry: Arc<Registry>,
    metrics: Arc<Metrics>,
}

impl Telemetry {
    /// 専用レジストリにメトリクスを登録する。
    ///
    /// # Errors
    /// メトリクスの登録に失敗した場合。
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(
            Metrics::new(Arc::clone(&registry)).context("failed to register analyzer metrics")?,
        );
        Ok(Self { registry, metrics })
    }

    #[must_use]
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Prometheusテキスト形式でレンダリングする。
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_counters() {
        let telemetry = Telemetry::new().expect("telemetry");
        telemetry.metrics().records_attempted.inc_by(3.0);

        let rendered = telemetry.render_prometheus();

        assert!(rendered.contains("recipe_analyzer_records_attempted_total 3"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let first = Telemetry::new();
        let second = Telemetry::new();
        assert!(first.is_ok());
        assert!(second.is_ok());
    }
}
