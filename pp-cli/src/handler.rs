//! Command Handlers

use pp_api::{init_metrics, roles_for, start_server, ApiConfig, AppState, JwtConfig};
use pp_store::{PgConfig, PgStore};
use tracing::info;

use crate::client::PpClient;
use crate::commands::{Cli, Commands, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Serve {
            host,
            port,
            database_url,
            redis_url,
        } => {
            let mut config = ApiConfig::from_env();
            apply_overrides(&mut config, host, port, database_url, redis_url);
            handle_serve(config).await
        }
        Commands::InitSchema { database_url } => handle_init_schema(&database_url).await,
        Commands::IssueToken {
            player_id,
            admin,
            telegram_id,
        } => handle_issue_token(ApiConfig::from_env(), player_id, telegram_id, admin, cli.format),
        Commands::Status { api_url } => handle_status(&api_url, cli.format).await,
    }
}

/// Flags win over environment values
fn apply_overrides(
    config: &mut ApiConfig,
    host: Option<String>,
    port: Option<u16>,
    database_url: Option<String>,
    redis_url: Option<String>,
) {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if database_url.is_some() {
        config.database_url = database_url;
    }
    if redis_url.is_some() {
        config.redis_url = redis_url;
    }
}

async fn handle_serve(config: ApiConfig) -> CliResult<()> {
    let metrics = init_metrics(config.metrics_enabled).map_err(CliError::server)?;
    info!(
        addr = %config.listen_addr(),
        store = if config.database_url.is_some() { "postgres" } else { "memory" },
        cache = config.redis_url.is_some(),
        metrics = metrics.is_some(),
        "Starting People Power"
    );

    let state = AppState::from_config(config).await?.with_metrics(metrics);
    start_server(state)
        .await
        .map_err(|e| CliError::server(e.to_string()))
}

async fn handle_init_schema(database_url: &str) -> CliResult<()> {
    let store = PgStore::connect(&PgConfig::new(database_url)).await?;
    store.init_schema().await?;
    println!("Database schema initialized.");
    Ok(())
}

fn handle_issue_token(
    config: ApiConfig,
    player_id: uuid::Uuid,
    telegram_id: i64,
    admin: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let secret = config
        .jwt_secret
        .ok_or_else(|| CliError::config("PP_JWT_SECRET must be set"))?;
    let jwt = JwtConfig::try_new(secret, config.jwt_ttl_secs)?;
    let issued = jwt.issue(player_id, telegram_id, roles_for(admin))?;
    output::print_token(&issued, format);
    Ok(())
}

async fn handle_status(api_url: &str, format: OutputFormat) -> CliResult<()> {
    let client = PpClient::new(api_url)?;
    let health = client.health().await?;
    output::print_health(&health, format);
    if health.status != "healthy" {
        return Err(CliError::api(503, format!("server reports {}", health.status)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_env_values() {
        let mut config = ApiConfig {
            database_url: Some("postgres://env".to_string()),
            ..ApiConfig::default()
        };
        apply_overrides(
            &mut config,
            Some("127.0.0.1".to_string()),
            Some(8080),
            None,
            Some("redis://flag".to_string()),
        );

        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.database_url.as_deref(), Some("postgres://env"));
        assert_eq!(config.redis_url.as_deref(), Some("redis://flag"));
    }

    #[test]
    fn test_issue_token_requires_secret() {
        let config = ApiConfig {
            jwt_secret: None,
            ..ApiConfig::default()
        };
        let err = handle_issue_token(config, uuid::Uuid::new_v4(), 0, false, OutputFormat::Plain)
            .unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_issue_token_with_secret() {
        let config = ApiConfig {
            jwt_secret: Some("cli-test-secret-that-is-long-enough".to_string()),
            ..ApiConfig::default()
        };
        assert!(handle_issue_token(config, uuid::Uuid::new_v4(), 5, true, OutputFormat::Json).is_ok());
    }
}
