//! Config commands.

use std::path::Path;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::Context;
use crate::output::format_duration;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Init { force } => init(force, ctx),
        ConfigCommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    if ctx.output.is_json() {
        ctx.output.json(config);
        return Ok(());
    }

    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let store = &config.store;
    ctx.output.header("Store");
    ctx.output.kv("backend", store.backend.as_str());
    ctx.output.kv("key_prefix", &store.settings.key_prefix);
    ctx.output.kv("ttl", &format_duration(store.settings.ttl_secs));
    ctx.output
        .kv("concurrency", &format!("{:?}", store.settings.concurrency));
    ctx.output
        .kv("max_attempts", &store.settings.max_attempts.to_string());

    let redis = &store.settings.redis;
    ctx.output.header("Redis");
    ctx.output.kv("host", &redis.host);
    ctx.output.kv("port", &redis.port.to_string());
    ctx.output.kv("db", &redis.db.to_string());
    ctx.output.kv(
        "password",
        if redis.password.is_some() { "(set)" } else { "(none)" },
    );

    let catalog = &config.catalog;
    ctx.output.header("Catalog");
    ctx.output.kv(
        "products_file",
        &catalog
            .products_file
            .as_ref()
            .map(|p| ctx.resolve_path(p).display().to_string())
            .unwrap_or_else(|| "(none)".to_string()),
    );
    ctx.output.kv("currency", catalog.currency.code());
    ctx.output
        .kv("timeout", &format!("{}ms", catalog.client.timeout_ms));

    ctx.output.header("Log");
    ctx.output.kv("level", &format!("{:?}", config.log.level));
    ctx.output.kv("format", &format!("{:?}", config.log.format));
    Ok(())
}

fn init(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.cwd.join("cart.toml");
    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(&path, generate_default_config())?;
    ctx.output
        .success(&format!("Created {}", path.display()));
    Ok(())
}

fn validate(ctx: &Context) -> Result<()> {
    let problems = problems(&ctx.config, |p| ctx.resolve_path(p).exists());

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "valid": problems.is_empty(),
            "problems": problems,
        }));
    } else {
        for problem in &problems {
            ctx.output.warn(problem);
        }
    }

    if !problems.is_empty() {
        bail!("Configuration has {} problem(s)", problems.len());
    }
    ctx.output.success("Configuration is valid");
    Ok(())
}

fn problems(config: &CliConfig, exists: impl Fn(&Path) -> bool) -> Vec<String> {
    let mut problems = Vec::new();
    let store = &config.store.settings;

    if store.ttl_secs == 0 {
        problems.push("store.ttl_secs must be greater than zero".to_string());
    }
    if store.max_attempts == 0 {
        problems.push("store.max_attempts must be at least 1".to_string());
    }
    if store.key_prefix.is_empty() {
        problems.push("store.key_prefix must not be empty".to_string());
    }
    if config.catalog.client.timeout_ms == 0 {
        problems.push("catalog.timeout_ms must be greater than zero".to_string());
    }
    if let Some(path) = &config.catalog.products_file {
        if !exists(path) {
            problems.push(format!(
                "catalog.products_file not found: {}",
                path.display()
            ));
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_problems() {
        assert!(problems(&CliConfig::default(), |_| true).is_empty());
    }

    #[test]
    fn test_problems_reported() {
        let mut config = CliConfig::default();
        config.store.settings.ttl_secs = 0;
        config.store.settings.max_attempts = 0;
        config.catalog.products_file = Some("missing.toml".into());

        let problems = problems(&config, |_| false);
        assert_eq!(problems.len(), 3);
        assert!(problems[2].contains("missing.toml"));
    }
}
