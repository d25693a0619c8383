//! Exposition round-trip tests: every registry state must parse back through
//! a strict reading of the text format grammar.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;

use vitals_core::expose;
use vitals_core::metric::{MetricDescriptor, Registry};

/// A parsed sample line: metric name, label pairs, value.
#[derive(Debug)]
struct Sample {
    name: String,
    labels: Vec<(String, String)>,
    value: f64,
}

/// Minimal strict parser for the text exposition format. Panics on any line
/// that does not match the grammar, which is exactly what the test wants.
fn parse(text: &str) -> (HashMap<String, String>, Vec<Sample>) {
    let mut types = HashMap::new();
    let mut samples = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("# TYPE ") {
            let mut parts = rest.splitn(2, ' ');
            let name = parts.next().unwrap().to_string();
            let kind = parts.next().expect("TYPE line missing kind").to_string();
            assert!(
                ["counter", "gauge", "histogram"].contains(&kind.as_str()),
                "unknown kind {kind}"
            );
            types.insert(name, kind);
            continue;
        }
        if line.starts_with("# HELP ") {
            continue;
        }
        assert!(!line.starts_with('#'), "unexpected comment: {line}");
        samples.push(parse_sample(line));
    }
    (types, samples)
}

fn parse_sample(line: &str) -> Sample {
    let (name_and_labels, value) = line.rsplit_once(' ').expect("no value separator");
    let value = match value {
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        other => other.parse().expect("unparseable value"),
    };

    let (name, labels) = match name_and_labels.split_once('{') {
        None => (name_and_labels.to_string(), Vec::new()),
        Some((name, rest)) => {
            let body = rest.strip_suffix('}').expect("unterminated label set");
            (name.to_string(), parse_labels(body))
        }
    };
    for c in name.chars() {
        assert!(
            c.is_ascii_alphanumeric() || c == '_' || c == ':',
            "invalid metric name char {c:?}"
        );
    }
    Sample {
        name,
        labels,
        value,
    }
}

fn parse_labels(body: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        let mut key = String::new();
        for c in chars.by_ref() {
            if c == '=' {
                break;
            }
            key.push(c);
        }
        assert!(!key.is_empty(), "empty label name");
        assert_eq!(chars.next(), Some('"'), "label value must be quoted");

        let mut value = String::new();
        loop {
            match chars.next().expect("unterminated label value") {
                '\\' => match chars.next().expect("dangling escape") {
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    'n' => value.push('\n'),
                    other => panic!("invalid escape \\{other}"),
                },
                '"' => break,
                '\n' => panic!("raw newline in label value"),
                c => value.push(c),
            }
        }
        pairs.push((key, value));

        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(other) => panic!("unexpected char after label pair: {other:?}"),
        }
    }
    pairs
}

#[test]
fn empty_registry_round_trips() {
    let reg = Registry::new();
    let (types, samples) = parse(&expose::render(&reg.snapshot()));
    assert!(types.is_empty());
    assert!(samples.is_empty());
}

#[test]
fn single_label_series_round_trips() {
    let reg = Registry::new();
    let handle = reg
        .register(MetricDescriptor::counter(
            "jobs_total",
            "Jobs processed",
            &["queue"],
        ))
        .unwrap();
    handle.counter(&["default"]).unwrap().inc(7.0).unwrap();

    let (types, samples) = parse(&expose::render(&reg.snapshot()));
    assert_eq!(types.get("jobs_total").unwrap(), "counter");
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name, "jobs_total");
    assert_eq!(
        samples[0].labels,
        vec![("queue".to_string(), "default".to_string())]
    );
    assert_eq!(samples[0].value, 7.0);
}

#[test]
fn awkward_label_values_survive_the_round_trip() {
    let reg = Registry::new();
    let handle = reg
        .register(MetricDescriptor::counter("odd_total", "Odd", &["path"]))
        .unwrap();
    let raw = "quote\" slash\\ line\nend";
    handle.counter(&[raw]).unwrap().inc(1.0).unwrap();

    let (_, samples) = parse(&expose::render(&reg.snapshot()));
    assert_eq!(samples[0].labels[0].1, raw);
}

#[test]
fn multi_bucket_histogram_round_trips_consistently() {
    let reg = Registry::new();
    let handle = reg
        .register(MetricDescriptor::histogram(
            "latency_seconds",
            "Latency",
            &["method"],
            &[0.01, 0.1, 1.0, 10.0],
        ))
        .unwrap();
    let h = handle.histogram(&["GET"]).unwrap();
    for v in [0.005, 0.05, 0.05, 0.5, 5.0, 50.0] {
        h.observe(v);
    }

    let (types, samples) = parse(&expose::render(&reg.snapshot()));
    assert_eq!(types.get("latency_seconds").unwrap(), "histogram");

    let buckets: Vec<&Sample> = samples
        .iter()
        .filter(|s| s.name == "latency_seconds_bucket")
        .collect();
    assert_eq!(buckets.len(), 5); // 4 boundaries + +Inf

    // cumulative counts are monotone over ascending le
    let counts: Vec<f64> = buckets.iter().map(|s| s.value).collect();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));

    let count = samples
        .iter()
        .find(|s| s.name == "latency_seconds_count")
        .unwrap();
    assert_eq!(count.value, 6.0);
    assert_eq!(buckets.last().unwrap().value, count.value);

    let sum = samples
        .iter()
        .find(|s| s.name == "latency_seconds_sum")
        .unwrap();
    assert!((sum.value - 55.605).abs() < 1e-9);
}

#[test]
fn mixed_registry_parses_cleanly() {
    let reg = Registry::new();
    reg.register(MetricDescriptor::gauge("active", "Active now", &[]))
        .unwrap()
        .gauge(&[])
        .unwrap()
        .set(3.0);
    let info = reg
        .register(MetricDescriptor::info("build_info", "Build", &[]))
        .unwrap();
    info.set_info(&[("version", "0.1.0")]);

    let (types, samples) = parse(&expose::render(&reg.snapshot()));
    assert_eq!(types.get("active").unwrap(), "gauge");
    assert_eq!(types.get("build_info").unwrap(), "gauge");
    assert_eq!(samples.len(), 2);
}
