//! Prometheus text exposition of a cache snapshot.
//!
//! Rendering is a pure function of the snapshot: families arrive sorted by
//! name and metrics in the order fixed at the last commit, so two renders
//! with no intervening session produce byte-identical output.

use std::fmt::Write;

use crate::cache::{Metric, Snapshot};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Renders all families of the snapshot into the text exposition format.
pub fn render(snapshot: &Snapshot<'_>) -> String {
    let mut out = String::new();
    for family in snapshot.families() {
        if !family.help().is_empty() {
            let _ = writeln!(out, "# HELP {} {}", family.name(), escape_help(family.help()));
        }
        let _ = writeln!(out, "# TYPE {} {}", family.name(), family.kind().as_str());
        for metric in family.metrics() {
            render_metric(&mut out, family.name(), metric);
        }
    }
    out
}

fn render_metric(out: &mut String, family_name: &str, metric: &Metric) {
    out.push_str(family_name);
    if !metric.labels().is_empty() {
        out.push('{');
        for (i, label) in metric.labels().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}=\"{}\"", label.name(), escape_label_value(label.value()));
        }
        out.push('}');
    }
    out.push(' ');
    out.push_str(&format_value(metric.value().get()));
    if let Some(timestamp_ms) = metric.timestamp_ms() {
        let _ = write!(out, " {timestamp_ms}");
    }
    out.push('\n');
}

/// Formats a sample value, mapping the non-finite cases to the exposition
/// format's spellings.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    }
    format!("{value}")
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, Mode, Value};

    #[test]
    fn test_render_counter_and_gauge() {
        let cache = Cache::new(Mode::Reset);
        let mut session = cache.begin_session();
        session
            .insert(
                "requests_total",
                &["method"],
                &["get"],
                "Total requests.",
                Value::Counter(3.0),
                None,
            )
            .unwrap();
        session
            .insert(
                "memory_bytes",
                &[],
                &[],
                "Memory in use.",
                Value::Gauge(1.5),
                None,
            )
            .unwrap();
        session.commit();

        let snapshot = cache.gather();
        assert_eq!(
            render(&snapshot),
            "\
# HELP memory_bytes Memory in use.
# TYPE memory_bytes gauge
memory_bytes 1.5
# HELP requests_total Total requests.
# TYPE requests_total counter
requests_total{method=\"get\"} 3
"
        );
    }

    #[test]
    fn test_render_multiple_label_pairs_and_timestamp() {
        let cache = Cache::new(Mode::Reset);
        let mut session = cache.begin_session();
        session
            .insert(
                "io_bytes_total",
                &["op", "device"],
                &["read", "sda"],
                "",
                Value::Counter(4096.0),
                Some(1700000000123),
            )
            .unwrap();
        session.commit();

        let snapshot = cache.gather();
        // No HELP line when the help text is empty; labels in name order.
        assert_eq!(
            render(&snapshot),
            "\
# TYPE io_bytes_total counter
io_bytes_total{device=\"sda\",op=\"read\"} 4096 1700000000123
"
        );
    }

    #[test]
    fn test_render_escapes_label_values_and_help() {
        let cache = Cache::new(Mode::Reset);
        let mut session = cache.begin_session();
        session
            .insert(
                "fam",
                &["path"],
                &["C:\\tmp\"x\"\nend"],
                "multi\nline \\help",
                Value::Untyped(0.0),
                None,
            )
            .unwrap();
        session.commit();

        let snapshot = cache.gather();
        assert_eq!(
            render(&snapshot),
            "\
# HELP fam multi\\nline \\\\help
# TYPE fam untyped
fam{path=\"C:\\\\tmp\\\"x\\\"\\nend\"} 0
"
        );
    }

    #[test]
    fn test_render_non_finite_values() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(1.0), "1");
        assert_eq!(format_value(0.25), "0.25");
    }

    #[test]
    fn test_render_is_deterministic_between_sessions() {
        let cache = Cache::new(Mode::Reset);
        let mut session = cache.begin_session();
        for (family, value) in [("b_total", 1.0), ("a_total", 2.0)] {
            session
                .insert(family, &["l"], &["v"], "h", Value::Counter(value), None)
                .unwrap();
        }
        session.commit();

        let first = render(&cache.gather());
        let second = render(&cache.gather());
        assert_eq!(first, second);
        assert!(first.find("a_total").unwrap() < first.find("b_total").unwrap());
    }
}
