//! Application entry point and dispatch.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use num_bigint::BigUint;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use fibgen_cli::output::write_values_to_file;
use fibgen_cli::presenter::{JsonPresenter, ReportPresenter, RunReport, TextPresenter};
use fibgen_cli::ui;
use fibgen_core::{fibonacci, CancelHandle, CursorState, GeneratorCursor, Runner};

use crate::config::{AppConfig, Operation, OutputFormat};
use crate::errors::AppError;
use crate::filter::{SubsetFilter, Verdict};

/// Settings for one generator run, independent of the command line.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub ceiling: BigUint,
    pub operation: Operation,
    pub depth: usize,
    pub poll_interval: Duration,
}

impl RunSettings {
    fn from_config(config: &AppConfig) -> Result<Self> {
        let ceiling = config
            .ceiling
            .clone()
            .context("a ceiling value is required")?;
        Ok(Self {
            ceiling,
            operation: config.operation,
            depth: config.depth,
            poll_interval: config.poll_interval,
        })
    }
}

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        fibgen_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    let settings = RunSettings::from_config(config)?;
    debug!(version = %crate::version::full_version(), ?settings, "starting run");

    let presenter: Box<dyn ReportPresenter> = match config.format {
        OutputFormat::Text => {
            if !config.quiet {
                ui::print_header("fibgen: Generate Fibonacci Sequence values");
            }
            Box::new(TextPresenter::new(config.verbose, config.quiet))
        }
        OutputFormat::Json => Box::new(JsonPresenter::new(config.verbose)),
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    let report = generate(&settings, move |handle| ctrlc_handler(handle, flag))?;

    presenter.present(&report)?;

    if let Some(ref path) = config.output {
        write_values_to_file(path, &report.values)
            .with_context(|| format!("writing values to {path}"))?;
    }

    if interrupted.load(Ordering::SeqCst) {
        return Err(AppError::Interrupted.into());
    }
    if let Some(failure) = report.failure {
        return Err(AppError::Generator(failure).into());
    }
    Ok(())
}

/// Generate Fibonacci values up to the configured ceiling and consume them
/// the way `settings.operation` says.
///
/// `on_start` receives a handle that cancels the run, once the producer is
/// running and before any value is consumed.
pub fn generate(
    settings: &RunSettings,
    on_start: impl FnOnce(CancelHandle),
) -> Result<RunReport> {
    let yield_calls = Arc::new(AtomicU64::new(0));
    let failure = Arc::new(Mutex::new(None::<String>));

    let counter = Arc::clone(&yield_calls);
    let failure_slot = Arc::clone(&failure);
    let mut cursor = Runner::run_seeded(settings.ceiling.clone(), move |ceiling, y| {
        let result = fibonacci::yield_up_to(&ceiling, y);
        counter.store(y.sent_count(), Ordering::Relaxed);
        result.map(|_| ())
    })
    .buffer_depth(settings.depth)
    .poll_interval(settings.poll_interval)
    .on_completion(|| info!("completion callback invoked: generator is done (or cancelled)"))
    .on_exception(move |err| {
        error!(error = %err, "exception handler invoked for generator error");
        *failure_slot.lock() = Some(format!("{err:#}"));
    })
    .build()?;

    on_start(cursor.cancel_handle());

    let start = Instant::now();
    let filter = SubsetFilter::default();
    let (values, state) = match settings.operation {
        Operation::StreamAll => {
            let mut seq = cursor.into_sequence();
            let values: Vec<BigUint> = seq.by_ref().collect();
            (values, seq.state())
        }
        Operation::StreamCancel => {
            let mut seq = cursor.into_sequence();
            let stop = seq.cancel_handle();
            let values: Vec<BigUint> = seq
                .by_ref()
                .filter(|v| match filter.check(v) {
                    Verdict::Keep => true,
                    Verdict::Skip => false,
                    Verdict::Stop => {
                        stop.cancel();
                        false
                    }
                })
                .collect();
            (values, seq.state())
        }
        Operation::IterAll => {
            let mut values = Vec::new();
            while cursor.advance() {
                if let Some(v) = cursor.current() {
                    values.push(v.clone());
                }
            }
            (values, cursor.state())
        }
        Operation::IterCancel => {
            let values = consume_subset(&mut cursor, &filter);
            (values, cursor.state())
        }
    };
    let duration = start.elapsed();

    let failure = failure.lock().take();
    Ok(RunReport {
        operation: settings.operation.name().to_string(),
        values,
        yield_calls: yield_calls.load(Ordering::Relaxed),
        cancelled: state == CursorState::Cancelled,
        duration,
        failure,
    })
}

fn consume_subset(cursor: &mut GeneratorCursor<BigUint>, filter: &SubsetFilter) -> Vec<BigUint> {
    let mut values = Vec::new();
    while cursor.advance() {
        let Some(value) = cursor.current() else {
            continue;
        };
        match filter.check(value) {
            Verdict::Keep => values.push(value.clone()),
            Verdict::Skip => {}
            Verdict::Stop => cursor.cancel(),
        }
    }
    values
}

fn ctrlc_handler(cancel: CancelHandle, interrupted: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        interrupted.store(true, Ordering::SeqCst);
        cancel.cancel();
    });
    if let Err(err) = result {
        // Only one handler per process; the run still works without it.
        debug!(error = %err, "Ctrl+C handler not installed");
    }
}
