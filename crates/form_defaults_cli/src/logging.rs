use color_eyre::eyre::{eyre, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging on stderr so stdout stays machine readable.
///
/// `RUST_LOG` wins when set; otherwise warnings only, or the engine's debug
/// events with `--debug`.
pub fn init(debug: bool) -> Result<()> {
    let fallback = if debug { "warn,form_defaults=debug" } else { "warn" };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(fallback)?,
    };

    let console_layer = fmt::Layer::default()
        .with_target(debug)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(filter)
        .try_init()
        .map_err(|err| eyre!("failed to install logger: {err}"))
}
