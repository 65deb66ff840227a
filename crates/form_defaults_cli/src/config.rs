use config::{Config, ConfigError, Environment, File};
use form_defaults::EngineConfig;
use std::path::Path;
use tracing::debug;

pub const ENV_PREFIX: &str = "FORM_DEFAULTS";

/// Layered engine configuration: built-in defaults, then the optional file,
/// then `FORM_DEFAULTS_*` environment variables.
pub fn load(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    load_with_env(path, Environment::with_prefix(ENV_PREFIX))
}

fn load_with_env(path: Option<&Path>, env: Environment) -> Result<EngineConfig, ConfigError> {
    let defaults = EngineConfig::default();
    let mut builder = Config::builder()
        .set_default("show_debug", defaults.show_debug)?
        .set_default("loop_tag", defaults.loop_tag)?
        .set_default("excluded_components", defaults.excluded_components)?;

    if let Some(path) = path {
        debug!(path = %path.display(), "loading engine config");
        builder = builder.add_source(File::from(path).required(true));
    }

    let env = env
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("excluded_components");

    builder.add_source(env).build()?.try_deserialize()
}
