//! Implementation of the `docfill serve` command.

use crate::cli::ServeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::server;
use crate::service::TemplateService;
use std::sync::Arc;

/// Execute the `docfill serve` command.
///
/// Flag values override `server.host` and `server.port` from the config.
/// The data directory is created before the listener starts.
pub async fn cmd_serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let host = config.server.host.clone();
    let port = config.server.port;

    let service = TemplateService::from_config(config)?;
    service.workspace().ensure()?;

    server::serve(Arc::new(service), &host, port).await
}
