mod app;
mod auth;
mod components;
mod config;
mod error;
mod event;
mod graphql;
mod handler;
mod logging;
#[cfg(test)]
mod test_support;
mod theme;
mod tree;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::app::App;
use crate::auth::session::SessionService;
use crate::auth::storage::SessionStorage;
use crate::config::{AppConfig, GeneralConfig, ServerConfig, ThemeConfig, TreeConfig};
use crate::error::AppError;
use crate::event::{forward_session_changes, EventHandler};
use crate::graphql::client::{GraphQlTransport, HttpExecutor};
use crate::tui::{install_panic_hook, Tui};

/// Browse the profile node hierarchy of a GraphQL backend.
#[derive(Parser, Debug)]
#[command(name = "ptree", version, about)]
struct Cli {
    /// Path to a config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// GraphQL endpoint URL
    #[arg(long)]
    graphql_url: Option<String>,

    /// Auth service base URL
    #[arg(long)]
    auth_url: Option<String>,

    /// Children fetched per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,

    /// Color scheme: dark, light, or custom
    #[arg(long)]
    theme: Option<String>,
}

impl Cli {
    /// Partial config built from the flags that were given.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
                ..Default::default()
            },
            server: ServerConfig {
                graphql_url: self.graphql_url.clone(),
                auth_url: self.auth_url.clone(),
                ..Default::default()
            },
            tree: TreeConfig {
                page_size: self.page_size,
                ..Default::default()
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                custom: None,
            },
            ..Default::default()
        }
    }
}

fn validate(config: &AppConfig) -> error::Result<()> {
    for (name, url) in [
        ("graphql_url", config.graphql_url()),
        ("auth_url", config.auth_url()),
    ] {
        reqwest::Url::parse(url)
            .map_err(|e| AppError::Config(format!("{name} {url:?} is not a valid URL: {e}")))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    validate(&config)?;

    logging::init(config.log_level(), config.log_file().as_deref())?;
    info!(
        graphql_url = config.graphql_url(),
        auth_url = config.auth_url(),
        page_size = config.page_size(),
        "starting ptree"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs()))
        .build()
        .map_err(error::FetchError::from)?;

    let session = Arc::new(SessionService::new(
        http.clone(),
        config.auth_url(),
        SessionStorage::default_location(),
    ));
    let executor = Arc::new(HttpExecutor::new(
        http,
        config.graphql_url(),
        Arc::clone(&session),
    ));
    let transport = Arc::new(GraphQlTransport::new(executor));

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(config.tick_rate_ms()));
    let event_tx = events.sender();
    forward_session_changes(session.subscribe(), event_tx.clone());

    let mut app = App::new(session, transport, event_tx, config.page_size());
    app.theme = theme::resolve_theme(&config.theme);
    app.use_icons = config.use_icons();

    loop {
        tui.draw(|frame| ui::render(&mut app, frame))?;

        let event = events.next().await?;
        app.handle_event(event);

        if app.should_quit {
            break;
        }
    }

    app.actions.cleanup();
    tui.restore()?;
    info!("exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_only_given_flags() {
        let cli = Cli::parse_from(["ptree", "--page-size", "20", "--no-mouse"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.tree.page_size, Some(20));
        assert_eq!(overrides.general.mouse, Some(false));
        assert!(overrides.server.graphql_url.is_none());
        assert!(overrides.theme.scheme.is_none());
    }

    #[test]
    fn test_cli_urls_and_theme() {
        let cli = Cli::parse_from([
            "ptree",
            "--graphql-url",
            "https://router.example.dev/graphql",
            "--theme",
            "light",
        ]);
        let merged = AppConfig::default().merge(&cli.overrides());
        assert_eq!(merged.graphql_url(), "https://router.example.dev/graphql");
        assert_eq!(merged.theme_scheme(), "light");
        assert!(merged.mouse_enabled());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = AppConfig {
            server: ServerConfig {
                graphql_url: Some("not a url".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(validate(&config), Err(AppError::Config(_))));
        assert!(validate(&AppConfig::default()).is_ok());
    }
}
