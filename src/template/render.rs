//! Document renderer: resolves every placeholder and substitutes it.
//!
//! Resolution order for a tag:
//!
//! 1. a value in the data mapping (static)
//! 2. a stored rule, run against the whole mapping (dynamic)
//! 3. otherwise the `[MISSING_RULE:<tag>]` sentinel
//!
//! A failing rule becomes `[RULE_ERROR:<tag>]` and never aborts the render.
//! Dynamic rules run concurrently, bounded by `max_concurrent`.

use super::placeholders::{extract_placeholders, replace_placeholders};
use crate::data::DataMapping;
use crate::rules::RuleRunner;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

pub fn missing_rule_marker(tag: &str) -> String {
    format!("[MISSING_RULE:{}]", tag)
}

pub fn rule_error_marker(tag: &str) -> String {
    format!("[RULE_ERROR:{}]", tag)
}

/// Where a placeholder's substitution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Static,
    Dynamic,
    Missing,
    Error,
}

/// Per-placeholder report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub tag: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Substituted HTML plus how each placeholder was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderResult {
    pub html: String,
    pub placeholders: Vec<Resolution>,
}

/// Render `html` against `data`, running dynamic rules through `runner`.
pub async fn render(
    html: &str,
    data: &DataMapping,
    runner: &dyn RuleRunner,
    max_concurrent: usize,
) -> RenderResult {
    let tags = extract_placeholders(html);

    let mut values: HashMap<String, String> = HashMap::with_capacity(tags.len());
    let mut resolutions: HashMap<String, Resolution> = HashMap::with_capacity(tags.len());
    let mut dynamic = Vec::new();

    for tag in &tags {
        if let Some(value) = data.get(tag) {
            values.insert(tag.clone(), value.to_string());
            resolutions.insert(tag.clone(), resolution(tag, Source::Static, None));
        } else if runner.has_rule(tag) {
            dynamic.push(tag.clone());
        } else {
            values.insert(tag.clone(), missing_rule_marker(tag));
            resolutions.insert(tag.clone(), resolution(tag, Source::Missing, None));
        }
    }

    debug!(
        placeholders = tags.len(),
        dynamic = dynamic.len(),
        "resolving placeholders"
    );

    let outcomes: Vec<_> = stream::iter(dynamic)
        .map(|tag: String| async move {
            let outcome = runner.run(&tag, data).await;
            (tag, outcome)
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    for (tag, outcome) in outcomes {
        let tag = tag.as_str();
        match outcome {
            Ok(value) => {
                values.insert(tag.to_string(), value);
                resolutions.insert(tag.to_string(), resolution(tag, Source::Dynamic, None));
            }
            Err(e) => {
                warn!(tag, error = %e, "rule failed during render");
                values.insert(tag.to_string(), rule_error_marker(tag));
                resolutions.insert(
                    tag.to_string(),
                    resolution(tag, Source::Error, Some(e.to_string())),
                );
            }
        }
    }

    let html = replace_placeholders(html, |tag| {
        values
            .get(tag)
            .cloned()
            .unwrap_or_else(|| missing_rule_marker(tag))
    });

    let placeholders = tags
        .iter()
        .filter_map(|tag| resolutions.remove(tag))
        .collect();

    RenderResult { html, placeholders }
}

fn resolution(tag: &str, source: Source, error: Option<String>) -> Resolution {
    Resolution {
        tag: tag.to_string(),
        source,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocfillError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Rule runner backed by canned outcomes.
    #[derive(Default)]
    struct FakeRunner {
        rules: HashMap<String, std::result::Result<String, String>>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl FakeRunner {
        fn with(mut self, tag: &str, outcome: std::result::Result<&str, &str>) -> Self {
            self.rules.insert(
                tag.to_string(),
                outcome.map(str::to_string).map_err(str::to_string),
            );
            self
        }
    }

    #[async_trait]
    impl RuleRunner for FakeRunner {
        fn has_rule(&self, tag: &str) -> bool {
            self.rules.contains_key(tag)
        }

        async fn run(&self, tag: &str, _data: &DataMapping) -> Result<String> {
            self.calls.lock().unwrap().push(tag.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match &self.rules[tag] {
                Ok(value) => Ok(value.clone()),
                Err(message) => Err(DocfillError::Execution {
                    status: "exit code 3".to_string(),
                    stderr: message.clone(),
                }),
            }
        }
    }

    fn data(pairs: &[(&str, &str)]) -> DataMapping {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_example_document_with_missing_rule() {
        let result = render(
            "<p>/*Name*/ earns /*Salary*/</p>",
            &data(&[("Name", "Ann")]),
            &FakeRunner::default(),
            4,
        )
        .await;

        assert_eq!(result.html, "<p>Ann earns [MISSING_RULE:Salary]</p>");
        assert_eq!(result.placeholders[0].source, Source::Static);
        assert_eq!(result.placeholders[1].source, Source::Missing);
    }

    #[tokio::test]
    async fn test_all_static_leaves_no_markers_or_sentinels() {
        let result = render(
            "<h1>/*Title*/</h1><p>/*Name*/, /*Name*/ lives in /*City*/</p>",
            &data(&[("Title", "Offer"), ("Name", "Ann"), ("City", "Oslo")]),
            &FakeRunner::default(),
            4,
        )
        .await;

        assert_eq!(result.html, "<h1>Offer</h1><p>Ann, Ann lives in Oslo</p>");
        assert!(extract_placeholders(&result.html).is_empty());
        assert!(!result.html.contains("[MISSING_RULE:"));
        assert!(!result.html.contains("[RULE_ERROR:"));
    }

    #[tokio::test]
    async fn test_static_value_wins_over_rule() {
        let runner = FakeRunner::default().with("Name", Ok("from rule"));
        let result = render("/*Name*/", &data(&[("Name", "Ann")]), &runner, 4).await;

        assert_eq!(result.html, "Ann");
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dynamic_values_and_failures_are_isolated() {
        let runner = FakeRunner::default()
            .with("Summary", Ok("A summary"))
            .with("Broken", Err("boom"));
        let result = render(
            "/*Summary*/|/*Broken*/|/*Name*/|/*Broken*/",
            &data(&[("Name", "Ann")]),
            &runner,
            4,
        )
        .await;

        assert_eq!(result.html, "A summary|[RULE_ERROR:Broken]|Ann|[RULE_ERROR:Broken]");
        let broken = &result.placeholders[1];
        assert_eq!(broken.source, Source::Error);
        assert!(broken.error.as_deref().unwrap().contains("boom"));
        assert_eq!(result.placeholders[0].source, Source::Dynamic);
    }

    #[tokio::test]
    async fn test_each_dynamic_rule_runs_once() {
        let runner = FakeRunner::default().with("X", Ok("x"));
        render("/*X*/ /*X*/ /*X*/", &DataMapping::new(), &runner, 4).await;
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rule_output_is_not_rescanned() {
        let runner = FakeRunner::default().with("A", Ok("/*B*/"));
        let result = render("/*A*/ /*B*/", &data(&[("B", "b")]), &runner, 4).await;
        assert_eq!(result.html, "/*B*/ b");
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut runner = FakeRunner {
            delay: Duration::from_millis(50),
            ..FakeRunner::default()
        };
        for tag in ["A", "B", "C", "D", "E", "F"] {
            runner = runner.with(tag, Ok(tag));
        }
        let result = render(
            "/*A*//*B*//*C*//*D*//*E*//*F*/",
            &DataMapping::new(),
            &runner,
            2,
        )
        .await;

        assert_eq!(result.html, "ABCDEF");
        assert!(runner.peak.load(Ordering::SeqCst) <= 2);
        assert!(runner.peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_report_follows_extraction_order() {
        let runner = FakeRunner::default().with("Dyn", Ok("d"));
        let result = render(
            "/*Missing*/ /*Dyn*/ /*Static*/",
            &data(&[("Static", "s")]),
            &runner,
            1,
        )
        .await;

        let order: Vec<_> = result.placeholders.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(order, vec!["Missing", "Dyn", "Static"]);
    }

    #[tokio::test]
    async fn test_report_serializes_without_empty_errors() {
        let result = render("/*X*/", &DataMapping::new(), &FakeRunner::default(), 1).await;
        let json = serde_json::to_value(&result.placeholders).unwrap();
        assert_eq!(json, serde_json::json!([{"tag": "X", "source": "missing"}]));
    }
}
