use crate::cli::Cmd;
use crate::merge::merge_edit;
use color_eyre::eyre::{Result, WrapErr};
use form_defaults::{DefaultMode, DefaultRegistry, DefaultsEngine, EngineConfig, FormSchema};
use serde_json::{json, Value};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

pub fn run(cmd: Cmd, config: EngineConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cmd {
        Cmd::Scan { schema } => scan(&read_schema(&schema)?, &config, &mut out),
        Cmd::Apply {
            schema,
            data,
            mode,
            output,
        } => {
            let data = match data {
                Some(path) => read_json(&path)?,
                None => json!({}),
            };
            let result = apply(read_schema(&schema)?, data, &mode, config)?;
            let text = serde_json::to_string_pretty(&result)?;
            match output {
                Some(path) => fs::write(&path, text + "\n")
                    .wrap_err_with(|| format!("writing {}", path.display()))?,
                None => writeln!(out, "{text}")?,
            }
            Ok(())
        }
        Cmd::Replay {
            schema,
            edits,
            mode,
        } => {
            let edits = fs::read_to_string(&edits)
                .wrap_err_with(|| format!("reading edits {}", edits.display()))?;
            replay(read_schema(&schema)?, &edits, &mode, config, &mut out)
        }
    }
}

fn read_schema(path: &Path) -> Result<FormSchema> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading schema {}", path.display()))?;
    FormSchema::from_json(&text).wrap_err_with(|| format!("parsing schema {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).wrap_err_with(|| format!("reading data {}", path.display()))?;
    serde_json::from_str(&text).wrap_err_with(|| format!("parsing data {}", path.display()))
}

fn mode_name(mode: DefaultMode) -> &'static str {
    match mode {
        DefaultMode::Js => "js",
        DefaultMode::Basic => "basic",
    }
}

/// One JSON line per managed field, in the order defaults are applied.
pub fn scan<W: Write>(schema: &FormSchema, config: &EngineConfig, out: &mut W) -> Result<()> {
    let mut registry = DefaultRegistry::new(config.excluded_components.clone());
    registry.initialize(schema);
    if registry.is_empty() {
        warn!("schema declares no defaults");
    }

    for record in registry.records() {
        let Some(spec) = record.spec() else {
            continue;
        };
        let line = json!({
            "path": record.path().as_str(),
            "mode": mode_name(spec.mode()),
            "source": spec.source(),
        });
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Mount the engine on `data` and return the reconciled form data.
pub fn apply(schema: FormSchema, mut data: Value, mode: &str, config: EngineConfig) -> Result<Value> {
    let mut engine = DefaultsEngine::builder(schema)
        .mode(mode)
        .config(config)
        .build();
    let pushed = engine.attach(&mut data)?;
    info!(pushed, active = engine.registry().active_count(), "defaults applied");
    Ok(data)
}

/// Feed a sequence of edits through the engine and print the data after each.
pub fn replay<W: Write>(
    schema: FormSchema,
    edits: &str,
    mode: &str,
    config: EngineConfig,
    out: &mut W,
) -> Result<()> {
    let mut engine = DefaultsEngine::builder(schema)
        .mode(mode)
        .config(config)
        .build();
    let mut data = Value::Null;

    let lines = edits.lines().filter(|line| !line.trim().is_empty());
    for (index, line) in lines.enumerate() {
        let edit: Value = serde_json::from_str(line)
            .wrap_err_with(|| format!("edit {} is not valid JSON", index + 1))?;
        if index == 0 {
            data = edit;
            engine.attach(&mut data)?;
        } else {
            merge_edit(&mut data, &edit);
            engine.data_changed(&mut data)?;
        }
        writeln!(out, "{}", serde_json::to_string(&data)?)?;
    }
    Ok(())
}
