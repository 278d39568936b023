//! Language-basics walkthrough printed by `serverless-kit basics`.
//!
//! Maps with typed values and defaulted lookups, small functions, branching
//! and stepped iteration. Everything returns lines instead of printing so
//! the output can be checked.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

/// A value in the options map.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Text(String),
    Flag(bool),
    Minutes(u32),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Text(text) => f.write_str(text),
            OptionValue::Flag(flag) => write!(f, "{flag}"),
            OptionValue::Minutes(minutes) => write!(f, "{minutes}"),
        }
    }
}

pub type Options = BTreeMap<&'static str, OptionValue>;

pub fn sample_options() -> Options {
    BTreeMap::from([
        ("Database", OptionValue::Text("127.0.0.1".into())),
        ("Cache", OptionValue::Flag(true)),
        ("CachePeriod", OptionValue::Minutes(15)),
    ])
}

/// Describe database, cache period and cache server; a missing
/// `CacheServer` entry falls back to "Redis".
pub fn describe_options(options: &Options) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(database) = options.get("Database") {
        lines.push(format!("Database: {database}"));
    }
    if let Some(OptionValue::Flag(true)) = options.get("Cache") {
        if let Some(period) = options.get("CachePeriod") {
            lines.push(format!("Cached for {period} minutes."));
        }
    }
    let server = options
        .get("CacheServer")
        .map(ToString::to_string)
        .unwrap_or_else(|| "Redis".to_string());
    lines.push(format!("Cache server: {server}"));
    lines
}

pub fn say_hello() -> &'static str {
    "Saying Hello"
}

pub fn do_sum(a: i64, b: i64) -> i64 {
    a + b
}

pub fn compare(a: i64, b: i64) -> &'static str {
    match a.cmp(&b) {
        Ordering::Equal => "a equals b",
        Ordering::Less => "a is less than b",
        Ordering::Greater => "a >= b",
    }
}

/// `start..stop` stepping by `step`, each value followed by `-`.
pub fn stepped_range(start: i64, stop: i64, step: usize) -> String {
    (start..stop)
        .step_by(step.max(1))
        .map(|i| format!("{i}-"))
        .collect()
}

/// Full walkthrough output, one entry per printed line.
pub fn run() -> Vec<String> {
    let mut lines = describe_options(&sample_options());
    lines.push(say_hello().to_string());
    lines.push(format!("a+b = {}", do_sum(5, 3)));
    lines.push(compare(5, 10).to_string());
    lines.push(stepped_range(0, 10, 2));
    lines
}
