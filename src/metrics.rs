//! Labelled metric families with Prometheus text exposition
//!
//! An injectable registry owning counter, gauge, and histogram families.
//! Handlers and the gateway share one registry through an `Arc`; tests
//! construct their own so assertions never depend on global state.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::Mutex;

/// Label set attached to one child of a metric family
///
/// BTreeMap keeps label ordering stable across scrapes.
pub type LabelSet = BTreeMap<String, String>;

/// Build a label set from (key, value) pairs
pub fn labels(pairs: &[(&str, &str)]) -> LabelSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Metric family names
///
/// Fixed strings: the scrape dashboards key off them.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
    pub const IN_FLIGHT_REQUESTS: &str = "in_flight_requests";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
    pub const PREDICTIONS_TOTAL: &str = "predictions_total";
    pub const PREDICTION_CONFIDENCE: &str = "prediction_confidence";
    pub const FEEDBACK_TOTAL: &str = "feedback_total";
    pub const CORRECTIONS_TOTAL: &str = "corrections_total";
    pub const FLAGS_TOTAL: &str = "flags_total";
}

/// Default latency buckets in seconds
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Decile buckets for scores in [0, 1]
pub const CONFIDENCE_BUCKETS: &[f64] = &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

#[derive(Debug, Default)]
struct CounterFamily {
    help: String,
    children: HashMap<LabelSet, f64>,
}

#[derive(Debug, Default)]
struct GaugeFamily {
    help: String,
    value: f64,
}

#[derive(Debug, Clone, Default)]
struct HistogramChild {
    /// Observation count per bucket bound (non-cumulative)
    bucket_counts: Vec<u64>,
    sum: f64,
    count: u64,
}

#[derive(Debug, Default)]
struct HistogramFamily {
    help: String,
    bounds: Vec<f64>,
    children: HashMap<LabelSet, HistogramChild>,
}

/// Registry of metric families, rendered as Prometheus text exposition
///
/// All operations take `&self`; the short Mutex critical sections keep
/// the structure consistent under concurrent request handlers without
/// promising ordering across families.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: Mutex<BTreeMap<String, CounterFamily>>,
    gauges: Mutex<BTreeMap<String, GaugeFamily>>,
    histograms: Mutex<BTreeMap<String, HistogramFamily>>,
}

impl MetricsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a counter family; idempotent
    pub fn register_counter(&self, name: &str, help: &str) {
        let mut counters = self.counters.lock().unwrap();
        counters
            .entry(name.to_string())
            .or_default()
            .help = help.to_string();
    }

    /// Register a gauge family; idempotent
    pub fn register_gauge(&self, name: &str, help: &str) {
        let mut gauges = self.gauges.lock().unwrap();
        gauges.entry(name.to_string()).or_default().help = help.to_string();
    }

    /// Register a histogram family with its bucket bounds; idempotent
    pub fn register_histogram(&self, name: &str, help: &str, bounds: &[f64]) {
        let mut histograms = self.histograms.lock().unwrap();
        let family = histograms.entry(name.to_string()).or_default();
        family.help = help.to_string();
        family.bounds = bounds.to_vec();
    }

    /// Increment a labelled counter by one
    pub fn inc_counter(&self, name: &str, labels: LabelSet) {
        self.add_counter(name, labels, 1.0);
    }

    /// Increment a labelled counter by an arbitrary amount
    pub fn add_counter(&self, name: &str, labels: LabelSet, value: f64) {
        let mut counters = self.counters.lock().unwrap();
        let family = counters.entry(name.to_string()).or_default();
        *family.children.entry(labels).or_insert(0.0) += value;
    }

    /// Current value of a counter child; zero if never incremented
    pub fn counter_value(&self, name: &str, labels: &LabelSet) -> f64 {
        let counters = self.counters.lock().unwrap();
        counters
            .get(name)
            .and_then(|family| family.children.get(labels))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn inc_gauge(&self, name: &str) {
        self.add_gauge(name, 1.0);
    }

    pub fn dec_gauge(&self, name: &str) {
        self.add_gauge(name, -1.0);
    }

    fn add_gauge(&self, name: &str, delta: f64) {
        let mut gauges = self.gauges.lock().unwrap();
        gauges.entry(name.to_string()).or_default().value += delta;
    }

    /// Current gauge value; zero if never touched
    pub fn gauge_value(&self, name: &str) -> f64 {
        let gauges = self.gauges.lock().unwrap();
        gauges.get(name).map(|family| family.value).unwrap_or(0.0)
    }

    /// Record an observation in a labelled histogram
    ///
    /// An unregistered name is created on the fly with [`LATENCY_BUCKETS`].
    pub fn observe(&self, name: &str, labels: LabelSet, value: f64) {
        let mut histograms = self.histograms.lock().unwrap();
        let family = histograms.entry(name.to_string()).or_default();
        if family.bounds.is_empty() {
            family.bounds = LATENCY_BUCKETS.to_vec();
        }
        let bounds_len = family.bounds.len();
        let child = family
            .children
            .entry(labels)
            .or_insert_with(|| HistogramChild {
                bucket_counts: vec![0; bounds_len],
                ..Default::default()
            });
        for (i, bound) in family.bounds.iter().enumerate() {
            if value <= *bound {
                child.bucket_counts[i] += 1;
                break;
            }
        }
        child.sum += value;
        child.count += 1;
    }

    /// Total observation count of a histogram child
    pub fn histogram_count(&self, name: &str, labels: &LabelSet) -> u64 {
        let histograms = self.histograms.lock().unwrap();
        histograms
            .get(name)
            .and_then(|family| family.children.get(labels))
            .map(|child| child.count)
            .unwrap_or(0)
    }

    /// Render every family in the Prometheus text exposition format
    pub fn render(&self) -> String {
        let mut out = String::new();

        let counters = self.counters.lock().unwrap();
        for (name, family) in counters.iter() {
            write_header(&mut out, name, &family.help, "counter");
            let mut children: Vec<_> = family.children.iter().collect();
            children.sort_by(|a, b| a.0.cmp(b.0));
            for (labels, value) in children {
                let _ = writeln!(out, "{}{} {}", name, render_labels(labels, None), value);
            }
        }
        drop(counters);

        let gauges = self.gauges.lock().unwrap();
        for (name, family) in gauges.iter() {
            write_header(&mut out, name, &family.help, "gauge");
            let _ = writeln!(out, "{} {}", name, family.value);
        }
        drop(gauges);

        let histograms = self.histograms.lock().unwrap();
        for (name, family) in histograms.iter() {
            write_header(&mut out, name, &family.help, "histogram");
            let mut children: Vec<_> = family.children.iter().collect();
            children.sort_by(|a, b| a.0.cmp(b.0));
            for (labels, child) in children {
                let mut cumulative = 0u64;
                for (bound, count) in family.bounds.iter().zip(&child.bucket_counts) {
                    cumulative += count;
                    let _ = writeln!(
                        out,
                        "{}_bucket{} {}",
                        name,
                        render_labels(labels, Some(&format_bound(*bound))),
                        cumulative
                    );
                }
                let _ = writeln!(
                    out,
                    "{}_bucket{} {}",
                    name,
                    render_labels(labels, Some("+Inf")),
                    child.count
                );
                let _ = writeln!(out, "{}_sum{} {}", name, render_labels(labels, None), child.sum);
                let _ = writeln!(
                    out,
                    "{}_count{} {}",
                    name,
                    render_labels(labels, None),
                    child.count
                );
            }
        }

        out
    }
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    if !help.is_empty() {
        let _ = writeln!(out, "# HELP {} {}", name, help);
    }
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

fn format_bound(bound: f64) -> String {
    format!("{}", bound)
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn render_labels(labels: &LabelSet, le: Option<&str>) -> String {
    if labels.is_empty() && le.is_none() {
        return String::new();
    }
    let mut parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();
    if let Some(le) = le {
        parts.push(format!("le=\"{}\"", le));
    }
    format!("{{{}}}", parts.join(","))
}

/// Registry pre-populated with every family the gateway emits
pub fn gateway_registry() -> MetricsRegistry {
    let registry = MetricsRegistry::new();
    registry.register_counter(names::HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    registry.register_gauge(names::IN_FLIGHT_REQUESTS, "Number of in-flight requests");
    registry.register_histogram(
        names::HTTP_REQUEST_DURATION_SECONDS,
        "Duration of HTTP requests in seconds",
        LATENCY_BUCKETS,
    );
    registry.register_counter(
        names::PREDICTIONS_TOTAL,
        "Prediction requests by outcome and version",
    );
    registry.register_histogram(
        names::PREDICTION_CONFIDENCE,
        "Model confidence of successful predictions",
        CONFIDENCE_BUCKETS,
    );
    registry.register_counter(
        names::FEEDBACK_TOTAL,
        "User feedback submissions by original label and verdict",
    );
    registry.register_counter(
        names::CORRECTIONS_TOTAL,
        "User corrections by original and corrected label",
    );
    registry.register_counter(names::FLAGS_TOTAL, "Flagged predictions by reason");
    registry
}
