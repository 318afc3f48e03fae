//! Command implementations for docfill.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command except `serve` runs one operation of the
//! shared [`TemplateService`] and prints its result.

mod documents;
mod events;
mod render;
mod rules;
mod serve;

use crate::cli::{Cli, Command, RulesAction};
use crate::config::Config;
use crate::error::Result;
use crate::service::TemplateService;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. The config is
/// resolved once here and handed to the handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        Command::Serve(args) => serve::cmd_serve(config, args).await,
        Command::Upload(args) => documents::cmd_upload(&service(config)?, args),
        Command::Tags(args) => documents::cmd_tags(&service(config)?, args),
        Command::Generate(args) => rules::cmd_generate(&service(config)?, args).await,
        Command::TestRule(args) => rules::cmd_test_rule(&service(config)?, args).await,
        Command::Rules(rules_cmd) => match rules_cmd.action {
            RulesAction::List(args) => rules::cmd_rules_list(&service(config)?, args),
            RulesAction::Remove(args) => rules::cmd_rules_remove(&service(config)?, args),
        },
        Command::Render(args) => render::cmd_render(&service(config)?, args).await,
        Command::Pdf(args) => render::cmd_pdf(&service(config)?, args).await,
        Command::Events(args) => events::cmd_events(&config, args),
    }
}

/// Resolve the config file and apply the `--data-dir` override.
pub fn load_config(explicit: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::resolve(explicit)?;
    if let Some(dir) = data_dir {
        debug!(data_dir = %dir.display(), "data directory overridden");
        config.data_dir = dir;
        config.validate()?;
    }
    Ok(config)
}

fn service(config: Config) -> Result<TemplateService> {
    TemplateService::from_config(config)
}
