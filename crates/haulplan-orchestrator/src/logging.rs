use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use tracing::Level;
use tracing::event;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_flame::FlameLayer;
use tracing_flame::FlushGuard;
use tracing_subscriber::Registry;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::filter::Filtered;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::fmt::format::Format;
use tracing_subscriber::fmt::format::Json;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload;
use tracing_subscriber::reload::Handle;

pub const LOG_DIRECTORY_VARIABLE: &str = "HAULPLAN_LOG_DIR";
const LOG_FILE_NAME: &str = "haulplan.developer.log";

type LogLayer =
    Filtered<Layer<Registry, JsonFields, Format<Json>, NonBlocking>, EnvFilter, Registry>;

#[derive(Clone, Debug)]
pub struct LogHandles {
    pub file_handle: Handle<LogLayer, Registry>,
}

impl LogHandles {
    /// Replaces the filter of the file layer, e.g. with
    /// `"info,haulplan_scheduling_engine=trace"`.
    pub fn set_file_filter(&self, directives: &str) -> Result<()> {
        let env_filter = EnvFilter::try_new(directives)
            .with_context(|| format!("invalid tracing directives: {directives}"))?;

        self.file_handle
            .modify(|file_layer| *file_layer.filter_mut() = env_filter)
            .context("the logging subscriber is no longer running")?;

        event!(Level::INFO, directives = %directives, "file log filter replaced");
        Ok(())
    }
}

/// Keeps the background writers alive. Dropping it flushes the log file and
/// the profiling output.
pub struct LoggingGuards {
    _file_guard: WorkerGuard,
    _flame_guard: Option<FlushGuard<BufWriter<File>>>,
}

pub fn setup_logging() -> Result<(LogHandles, LoggingGuards)> {
    let log_dir = dotenvy::var(LOG_DIRECTORY_VARIABLE)
        .with_context(|| format!("{LOG_DIRECTORY_VARIABLE} has to point at the log directory"))?;

    fs::create_dir_all(&log_dir)
        .with_context(|| format!("could not create log directory {log_dir}"))?;
    remove_previous_log_files(Path::new(&log_dir))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_filter(EnvFilter::from_env("TRACING_LEVEL"));

    let (file_layer, file_handle) = reload::Layer::new(file_layer);

    let mut layers = vec![file_layer.boxed()];

    let flame_guard = match dotenvy::var("PROFILING_FILE") {
        Ok(profiling_file) => {
            let (flame_layer, flame_guard) = FlameLayer::with_file(&profiling_file)
                .with_context(|| format!("could not open profiling file {profiling_file}"))?;
            layers.push(
                flame_layer
                    .with_filter(EnvFilter::from_env("PROFILING_LEVEL"))
                    .boxed(),
            );
            Some(flame_guard)
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("a global tracing subscriber was already installed")?;

    event!(Level::INFO, log_dir = %log_dir, "starting logging");

    Ok((
        LogHandles { file_handle },
        LoggingGuards {
            _file_guard: file_guard,
            _flame_guard: flame_guard,
        },
    ))
}

fn remove_previous_log_files(log_dir: &Path) -> Result<()> {
    let previous_log_files = fs::read_dir(log_dir)
        .with_context(|| format!("could not read log directory {}", log_dir.display()))?;

    for log_file in previous_log_files {
        let path = log_file?.path();
        if path.is_file() && path.extension().is_some_and(|extension| extension == "log") {
            fs::remove_file(&path)
                .with_context(|| format!("could not remove old log file {}", path.display()))?;
        }
    }
    Ok(())
}
