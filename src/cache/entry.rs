use std::cmp::Ordering;
use std::collections::HashMap;

/// The value kind shared by all metrics of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Counter,
    Gauge,
    Untyped,
}

impl ValueKind {
    /// The kind's name as it appears in a `# TYPE` exposition line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Counter => "counter",
            ValueKind::Gauge => "gauge",
            ValueKind::Untyped => "untyped",
        }
    }
}

/// A metric value. Exactly one variant is populated at a time; overwriting a
/// metric with a value of a different kind replaces the old variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Counter(f64),
    Gauge(f64),
    Untyped(f64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Counter(_) => ValueKind::Counter,
            Value::Gauge(_) => ValueKind::Gauge,
            Value::Untyped(_) => ValueKind::Untyped,
        }
    }

    pub fn get(&self) -> f64 {
        match self {
            Value::Counter(v) | Value::Gauge(v) | Value::Untyped(v) => *v,
        }
    }
}

/// One (name, value) label pair of a metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPair {
    name: String,
    value: String,
}

impl LabelPair {
    pub(super) fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// One concrete time series within a family.
///
/// The label pairs are stored sorted by label name; that ordering is part of
/// the metric's identity, not just a display choice.
#[derive(Debug, Clone)]
pub struct Metric {
    pub(super) labels: Vec<LabelPair>,
    pub(super) value: Value,
    pub(super) timestamp_ms: Option<i64>,
    pub(super) touched: bool,
}

impl Metric {
    /// The metric's label pairs, sorted by label name.
    pub fn labels(&self) -> &[LabelPair] {
        &self.labels
    }

    pub fn value(&self) -> Value {
        self.value
    }

    /// Explicit sample timestamp in milliseconds since the epoch, if the
    /// producer supplied one.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp_ms
    }
}

/// Output order of metrics within a family: label count first, then the
/// label values compared in label-name order, then the timestamp with
/// missing timestamps last. The label-count key only matters for malformed
/// input where metrics of one family disagree on their label schema.
pub(super) fn output_order(a: &Metric, b: &Metric) -> Ordering {
    a.labels
        .len()
        .cmp(&b.labels.len())
        .then_with(|| {
            a.labels
                .iter()
                .map(|l| l.value.as_str())
                .cmp(b.labels.iter().map(|l| l.value.as_str()))
        })
        .then_with(|| match (a.timestamp_ms, b.timestamp_ms) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// All metrics sharing one family name, plus the family metadata.
///
/// `ordered` caches the identity hashes of `metrics` in output order; it is
/// regenerated at commit time whenever `dirty` is set, which happens only on
/// membership changes, never on in-place value updates.
#[derive(Debug)]
pub(super) struct Family {
    pub(super) help: String,
    pub(super) kind: ValueKind,
    pub(super) metrics: HashMap<u64, Metric>,
    pub(super) touched: bool,
    pub(super) dirty: bool,
    pub(super) ordered: Vec<u64>,
}

impl Family {
    pub(super) fn new() -> Self {
        Self {
            help: String::new(),
            kind: ValueKind::Untyped,
            metrics: HashMap::new(),
            touched: false,
            dirty: false,
            ordered: Vec::new(),
        }
    }

    /// Regenerates the cached output order from the current metric map.
    pub(super) fn rebuild(&mut self) {
        let mut ordered: Vec<u64> = self.metrics.keys().copied().collect();
        ordered.sort_unstable_by(|a, b| output_order(&self.metrics[a], &self.metrics[b]));
        self.ordered = ordered;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(label_values: &[(&str, &str)], timestamp_ms: Option<i64>) -> Metric {
        Metric {
            labels: label_values
                .iter()
                .map(|(n, v)| LabelPair::new(*n, *v))
                .collect(),
            value: Value::Gauge(0.0),
            timestamp_ms,
            touched: false,
        }
    }

    #[test]
    fn test_order_by_label_values() {
        let a = metric(&[("b", "1"), ("c", "1")], None);
        let b = metric(&[("b", "1"), ("c", "2")], None);
        assert_eq!(output_order(&a, &b), Ordering::Less);
        assert_eq!(output_order(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_order_by_label_count_first() {
        let short = metric(&[("z", "9")], None);
        let long = metric(&[("a", "1"), ("b", "1")], None);
        assert_eq!(output_order(&short, &long), Ordering::Less);
    }

    #[test]
    fn test_order_missing_timestamp_last() {
        let stamped = metric(&[("a", "1")], Some(42));
        let unstamped = metric(&[("a", "1")], None);
        assert_eq!(output_order(&stamped, &unstamped), Ordering::Less);
        assert_eq!(output_order(&unstamped, &stamped), Ordering::Greater);
    }

    #[test]
    fn test_order_by_timestamp_when_labels_equal() {
        let early = metric(&[("a", "1")], Some(1));
        let late = metric(&[("a", "1")], Some(2));
        assert_eq!(output_order(&early, &late), Ordering::Less);
    }
}
