//! Metrics Surface (C13): a `prometheus::Registry` wrapping the
//! counters and histograms the rest of the crate records against, with
//! text-exposition output. No HTTP listener lives here; scraping
//! transport is out of scope.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    intents_total: IntCounterVec,
    rejects_total: IntCounterVec,
    caps_denied_total: IntCounterVec,
    stage_latency_ms: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let intents_total = IntCounterVec::new(
            Opts::new("kestrel_intents_total", "intents processed, by terminal decision"),
            &["decision"],
        )?;
        let rejects_total = IntCounterVec::new(
            Opts::new("kestrel_rejects_total", "pipeline rejections, by reason code"),
            &["reason_code"],
        )?;
        let caps_denied_total = IntCounterVec::new(
            Opts::new("kestrel_caps_denied_total", "capital policy denials, by reason"),
            &["reason"],
        )?;
        let stage_latency_ms = HistogramVec::new(
            HistogramOpts::new("kestrel_stage_latency_ms", "pipeline stage latency in milliseconds")
                .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0]),
            &["stage"],
        )?;

        registry.register(Box::new(intents_total.clone()))?;
        registry.register(Box::new(rejects_total.clone()))?;
        registry.register(Box::new(caps_denied_total.clone()))?;
        registry.register(Box::new(stage_latency_ms.clone()))?;

        Ok(Self {
            registry,
            intents_total,
            rejects_total,
            caps_denied_total,
            stage_latency_ms,
        })
    }

    pub fn record_intent(&self, decision: &str) {
        self.intents_total.with_label_values(&[decision]).inc();
    }

    pub fn record_reject(&self, reason_code: &str) {
        self.rejects_total.with_label_values(&[reason_code]).inc();
    }

    pub fn record_capital_denied(&self, reason: &str) {
        self.caps_denied_total.with_label_values(&[reason]).inc();
    }

    pub fn observe_stage_latency_ms(&self, stage: &str, elapsed_ms: f64) {
        self.stage_latency_ms.with_label_values(&[stage]).observe(elapsed_ms);
    }

    /// Prometheus text-format exposition of every registered family.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
