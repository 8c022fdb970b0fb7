use log::{debug, error};
use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceCell<Handle<EnvFilter, Registry>> = OnceCell::new();

/// The log filter for a verbosity level.
///
/// Only our own crates log below `trace` verbosity.
fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,databank=error,databank_sdk=error,databank_catalog=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,databank=warn,databank_sdk=warn,databank_catalog=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,databank=info,databank_sdk=info,databank_catalog=info",
        // Also show debug from our libraries
        Verbosity::Verbose(2) => "off,databank=debug,databank_sdk=debug,databank_catalog=debug",
        Verbosity::Verbose(3) => "off,databank=trace,databank_sdk=trace,databank_catalog=trace",
        // Also show logs of dependencies like hyper and reqwest
        Verbosity::Verbose(_) => "trace",
    }
}

pub fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter(verbosity));
}

/// Replace the active filter, `$RUST_LOG` takes precedence over `log_filter`
pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

pub fn create_registry_and_filter_reload_handle() -> (
    impl tracing_subscriber::layer::SubscriberExt,
    Handle<EnvFilter, Registry>,
) {
    debug!("Initializing logger");
    // The first filter establishes an upper boundary for `log` verbosity,
    // so start with `trace` and narrow it down through the reload handle.
    let filter = EnvFilter::new("trace");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(log_layer);

    (registry, filter_reload_handle)
}
