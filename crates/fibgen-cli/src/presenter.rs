//! Presenters for the result of a generator run.

use std::io::{self, Write};
use std::time::Duration;

use num_bigint::BigUint;
use serde::Serialize;

use crate::output::{format_duration, format_number, format_value};

/// Everything the binary reports about one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Name of the consumption mode that was used.
    pub operation: String,
    /// Values the consumer kept, in the order they were received.
    pub values: Vec<BigUint>,
    /// Number of values the generator yielded before it returned.
    pub yield_calls: u64,
    /// Whether the run ended by cancellation.
    pub cancelled: bool,
    /// Time spent generating and consuming.
    pub duration: Duration,
    /// Message of the error the generator failed with, if any.
    pub failure: Option<String>,
}

/// Trait for presenting a run report to the user.
pub trait ReportPresenter {
    /// Render the report to `out`.
    fn render(&self, report: &RunReport, out: &mut dyn Write) -> io::Result<()>;

    /// Render the report to standard output.
    fn present(&self, report: &RunReport) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.render(report, &mut lock)
    }
}

/// Plain-text presenter.
pub struct TextPresenter {
    verbose: bool,
    quiet: bool,
}

impl TextPresenter {
    #[must_use]
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

impl ReportPresenter for TextPresenter {
    fn render(&self, report: &RunReport, out: &mut dyn Write) -> io::Result<()> {
        for value in &report.values {
            writeln!(out, "{}", format_value(value, self.verbose))?;
        }
        if self.quiet {
            return Ok(());
        }

        writeln!(out, "{} values returned", format_number(report.values.len() as u64))?;
        writeln!(out, "{} yield() call count", format_number(report.yield_calls))?;
        if report.cancelled {
            writeln!(out, "generator cancelled ({})", report.operation)?;
        }
        if let Some(failure) = &report.failure {
            writeln!(out, "generator failed: {failure}")?;
        }
        writeln!(
            out,
            "Generate Fibonacci Sequence runtime duration: {}",
            format_duration(report.duration)
        )?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    operation: &'a str,
    values: Vec<String>,
    count: usize,
    yield_calls: u64,
    cancelled: bool,
    duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<&'a str>,
}

/// JSON presenter: one document per run, values as decimal strings.
pub struct JsonPresenter {
    pretty: bool,
}

impl JsonPresenter {
    #[must_use]
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl ReportPresenter for JsonPresenter {
    fn render(&self, report: &RunReport, out: &mut dyn Write) -> io::Result<()> {
        let doc = JsonReport {
            operation: &report.operation,
            values: report.values.iter().map(ToString::to_string).collect(),
            count: report.values.len(),
            yield_calls: report.yield_calls,
            cancelled: report.cancelled,
            duration_ms: report.duration.as_secs_f64() * 1000.0,
            failure: report.failure.as_deref(),
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &doc)?;
        } else {
            serde_json::to_writer(&mut *out, &doc)?;
        }
        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(values: &[u64]) -> RunReport {
        RunReport {
            operation: "stream-all".into(),
            values: values.iter().map(|&v| BigUint::from(v)).collect(),
            yield_calls: values.len() as u64,
            cancelled: false,
            duration: Duration::from_millis(3),
            failure: None,
        }
    }

    fn render_to_string(presenter: &dyn ReportPresenter, report: &RunReport) -> String {
        let mut buf = Vec::new();
        presenter.render(report, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_lists_values_and_counts() {
        let text = render_to_string(&TextPresenter::new(false, false), &report(&[0, 1, 1, 2]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[..4], ["0", "1", "1", "2"]);
        assert_eq!(lines[4], "4 values returned");
        assert_eq!(lines[5], "4 yield() call count");
        assert!(lines[6].starts_with("Generate Fibonacci Sequence runtime duration"));
    }

    #[test]
    fn text_quiet_prints_values_only() {
        let text = render_to_string(&TextPresenter::new(false, true), &report(&[5, 8]));
        assert_eq!(text, "5\n8\n");
    }

    #[test]
    fn text_mentions_cancel_and_failure() {
        let mut r = report(&[13]);
        r.cancelled = true;
        r.operation = "iter-cancel".into();
        r.failure = Some("disk full".into());
        let text = render_to_string(&TextPresenter::new(false, false), &r);
        assert!(text.contains("generator cancelled (iter-cancel)"));
        assert!(text.contains("generator failed: disk full"));
    }

    #[test]
    fn text_empty_report() {
        let text = render_to_string(&TextPresenter::new(false, false), &report(&[]));
        assert!(text.starts_with("0 values returned"));
    }

    #[test]
    fn json_document() {
        let text = render_to_string(&JsonPresenter::new(false), &report(&[21, 34]));
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["operation"], "stream-all");
        assert_eq!(doc["values"], serde_json::json!(["21", "34"]));
        assert_eq!(doc["count"], 2);
        assert_eq!(doc["yield_calls"], 2);
        assert_eq!(doc["cancelled"], false);
        assert!(doc.get("failure").is_none());
    }

    #[test]
    fn json_pretty_includes_failure() {
        let mut r = report(&[]);
        r.failure = Some("boom".into());
        let text = render_to_string(&JsonPresenter::new(true), &r);
        assert!(text.contains('\n'));
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["failure"], "boom");
    }
}
