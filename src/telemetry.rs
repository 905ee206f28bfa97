use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let _ = INIT.get_or_init(|| {
        let default_level = if verbose { "debug" } else { "info" };
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},dsl_server={default_level}")));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(env_filter)
            .try_init();
    });
}
