use anyhow::Result;
use opentelemetry::{trace::TracerProvider, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    logs::{BatchLogProcessor, LoggerProvider},
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider as SdkTracerProvider},
    Resource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::TraceIdLogEnricher;

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub otel_endpoint: String,
    pub otel_enabled: bool,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "backoffice".to_string(),
            otel_endpoint: "http://localhost:4317".to_string(),
            otel_enabled: false,
            log_level: "info".to_string(),
        }
    }
}

/// OTLP providers to flush on shutdown; empty when export is disabled
#[derive(Default)]
pub struct TelemetryGuard {
    providers: Option<(SdkTracerProvider, LoggerProvider)>,
}

impl TelemetryGuard {
    pub fn is_exporting(&self) -> bool {
        self.providers.is_some()
    }

    /// Flush and stop the exporters
    pub fn shutdown(self) {
        if let Some((tracer_provider, logger_provider)) = self.providers {
            if let Err(e) = tracer_provider.shutdown() {
                eprintln!("Error shutting down tracer provider: {:?}", e);
            }
            if let Err(e) = logger_provider.shutdown() {
                eprintln!("Error shutting down logger provider: {:?}", e);
            }
        }
    }
}

fn env_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

fn otel_providers(config: &TelemetryConfig) -> Result<(SdkTracerProvider, LoggerProvider)> {
    let resource = Resource::new(vec![KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        config.service_name.clone(),
    )]);

    let span_exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otel_endpoint)
        .build()?;
    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter, runtime::Tokio)
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource.clone())
        .build();

    let log_exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otel_endpoint)
        .build()?;
    let batch = BatchLogProcessor::builder(log_exporter, runtime::Tokio).build();
    let logger_provider = LoggerProvider::builder()
        .with_log_processor(TraceIdLogEnricher::new(batch))
        .with_resource(resource)
        .build();

    Ok((tracer_provider, logger_provider))
}

/// Install the global subscriber: JSON lines on stdout, plus OTLP traces
/// and logs when `otel_enabled` is set
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard> {
    if !config.otel_enabled {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_list(true)
            .with_current_span(true);

        tracing_subscriber::registry()
            .with(env_filter(config))
            .with(fmt_layer)
            .try_init()?;
        return Ok(TelemetryGuard::default());
    }

    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
    let (tracer_provider, logger_provider) = otel_providers(config)?;

    let tracer = tracer_provider.tracer("backoffice");
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_span_list(true)
        .with_current_span(true);

    // Span layer must precede the log bridge so bridged events see the OTel context
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(OpenTelemetryTracingBridge::new(&logger_provider))
        .with(fmt_layer)
        .try_init()?;

    Ok(TelemetryGuard {
        providers: Some((tracer_provider, logger_provider)),
    })
}
