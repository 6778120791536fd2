//! Operations hub terminal console.

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod console_config;
mod render;

use std::sync::Arc;

use clap::Parser;
use opshub_application::{RequestGateway, Session};
use opshub_core::AppError;
use opshub_domain::UserId;
use opshub_infrastructure::{HttpRequestGateway, InMemoryRequestGateway};
use tracing::{info, warn};

use crate::cli::{Cli, Command};
use crate::commands::Console;
use crate::console_config::{ConsoleConfig, init_tracing};

/// Acting user of demo mode when none is configured.
const DEMO_ACTING_USER_ID: i64 = 1;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = ConsoleConfig::load()?;
    if let Some(api_url) = cli.api_url.clone() {
        config.api_url = api_url;
    }
    if let Some(user_id) = cli.acting_user_id {
        config.acting_user_id = Some(UserId::new(user_id));
    }

    let gateway = build_gateway(&mut config, cli.demo)?;
    let session = match Session::resolve(gateway.as_ref(), config.acting_user_id).await {
        Ok(session) => session,
        Err(error) => {
            warn!(error = %error, "continuing without an acting user");
            Session::anonymous()
        }
    };

    let console = Console::new(gateway, session, config.history_policy);
    let output = match cli.command {
        Command::Users(args) => console.users(args).await?,
        Command::Audit(args) => console.audit(args).await?,
    };

    println!("{output}");
    Ok(())
}

fn build_gateway(
    config: &mut ConsoleConfig,
    demo: bool,
) -> Result<Arc<dyn RequestGateway>, AppError> {
    if demo {
        let acting_user_id = *config
            .acting_user_id
            .get_or_insert(UserId::new(DEMO_ACTING_USER_ID));
        info!(acting_user_id = %acting_user_id, "using demo data");

        return Ok(Arc::new(
            InMemoryRequestGateway::with_demo_data().acting_as(Some(acting_user_id)),
        ));
    }

    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;
    let gateway = HttpRequestGateway::new(
        http_client,
        config.api_url.as_str(),
        config.acting_user_id,
    )?;
    info!(api_url = %gateway.base_url(), "using backend");

    Ok(Arc::new(gateway))
}
