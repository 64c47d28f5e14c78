//! Structured telemetry initialisation for the daemon.
//!
//! Events are written to stderr and, through [`BusLayer`], published to the
//! log bus so `Log` subscribers see the daemon's own output.

use std::fmt::{self, Write as _};
use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use tiller_config::{Config, LogFormat};

use crate::log_bus::LogBus;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: only the first invocation installs the
/// subscriber, so only the bus passed to that call receives daemon events.
pub fn initialise(config: &Config, bus: &LogBus) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config, bus))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config, bus: &LogBus) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |filter: EnvFilter| {
        tracing_subscriber::fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
    };

    let bus_layer = BusLayer::new(bus.clone());
    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => {
            let json = builder(filter).json().flatten_event(true).finish();
            Box::new(json.with(bus_layer))
        }
        LogFormat::Compact => Box::new(builder(filter).compact().finish().with(bus_layer)),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

/// Layer rendering each event as a single line and publishing it to a
/// [`LogBus`].
///
/// Lines read `LEVEL target: message key=value ...`.
#[derive(Debug, Clone)]
pub struct BusLayer {
    bus: LogBus,
}

impl BusLayer {
    /// Creates a layer publishing to `bus`.
    #[must_use]
    pub fn new(bus: LogBus) -> Self {
        Self { bus }
    }
}

impl<S> Layer<S> for BusLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let mut line = format!("{} {}:", metadata.level(), metadata.target());
        if !visitor.message.is_empty() {
            line.push(' ');
            line.push_str(&visitor.message);
        }
        line.push_str(&visitor.fields);
        self.bus.publish(&line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            drop(write!(self.fields, " {}={value}", field.name()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            drop(write!(self.message, "{value:?}"));
        } else {
            drop(write!(self.fields, " {}={value:?}", field.name()));
        }
    }
}
