//! Prometheus text exposition (format version 0.0.4).
//!
//! Byte-level format compliance matters here: external scrapers parse this
//! output. Label values are escaped per the format's quoting rules; a series
//! carrying a non-finite value is skipped with a warning instead of failing
//! the whole render.

use std::fmt::Write;

use crate::metric::{FamilySnapshot, MetricKind, RegistrySnapshot, SeriesValue};

/// Content type advertised by the scrape endpoint.
pub const TEXT_FORMAT_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Escape a label value: backslash, double quote, newline.
fn escape_label_value(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for c in v.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a HELP text: backslash and newline only (quotes are legal there).
fn escape_help(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for c in v.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn format_value(v: f64) -> String {
    if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{v}")
    }
}

fn label_pairs(names: &[String], values: &[String]) -> String {
    names
        .iter()
        .zip(values)
        .map(|(n, v)| format!("{n}=\"{}\"", escape_label_value(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn write_sample(out: &mut String, name: &str, labels: &str, value: f64) {
    if labels.is_empty() {
        let _ = writeln!(out, "{name} {}", format_value(value));
    } else {
        let _ = writeln!(out, "{name}{{{labels}}} {}", format_value(value));
    }
}

fn render_family(out: &mut String, family: &FamilySnapshot) {
    let _ = writeln!(out, "# HELP {} {}", family.name, escape_help(&family.help));
    let _ = writeln!(
        out,
        "# TYPE {} {}",
        family.name,
        family.kind.exposition_keyword()
    );

    for series in &family.series {
        match &series.value {
            SeriesValue::Counter(v) | SeriesValue::Gauge(v) => {
                if !v.is_finite() {
                    tracing::warn!(metric = %family.name, "skipping series with non-finite value");
                    continue;
                }
                let labels = label_pairs(&family.label_names, &series.label_values);
                write_sample(out, &family.name, &labels, *v);
            }
            SeriesValue::Histogram(h) => {
                if !h.sum.is_finite() {
                    tracing::warn!(metric = %family.name, "skipping histogram with non-finite sum");
                    continue;
                }
                let labels = label_pairs(&family.label_names, &series.label_values);
                let prefix = if labels.is_empty() {
                    String::new()
                } else {
                    format!("{labels},")
                };
                for (boundary, cum) in h.boundaries.iter().zip(&h.cumulative) {
                    let _ = writeln!(
                        out,
                        "{}_bucket{{{prefix}le=\"{}\"}} {cum}",
                        family.name,
                        format_value(*boundary)
                    );
                }
                let total = h.cumulative.last().copied().unwrap_or(0);
                let _ = writeln!(out, "{}_bucket{{{prefix}le=\"+Inf\"}} {total}", family.name);
                write_sample(out, &format!("{}_sum", family.name), &labels, h.sum);
                write_sample(
                    out,
                    &format!("{}_count", family.name),
                    &labels,
                    total as f64,
                );
            }
            SeriesValue::Info(pairs) => {
                // Info renders as a gauge fixed at 1 carrying constant labels.
                let labels = pairs
                    .iter()
                    .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                write_sample(out, &family.name, &labels, 1.0);
            }
        }
    }
}

/// Render a full snapshot. An empty registry yields an empty body, which is a
/// valid exposition.
pub fn render(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();
    for family in &snapshot.families {
        render_family(&mut out, family);
    }
    out
}
