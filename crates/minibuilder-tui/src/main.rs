use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use minibuilder_core::Config;
use tracing::{error, info};

mod app;
mod handler;
mod headless;
mod logging;
#[cfg(test)]
mod test_support;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "minibuilder", version)]
#[command(about = "Describe an app, get a navigable mock of it in your terminal")]
struct Cli {
    /// Extraction service URL
    #[arg(long, global = true, env = "MINIBUILDER_ENDPOINT")]
    endpoint: Option<String>,

    /// Seconds to wait for the extraction service
    #[arg(long, global = true, env = "MINIBUILDER_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file for the terminal UI
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one extraction and print the requirements summary
    Extract {
        /// Free-text description of the app
        description: String,
        /// Verification token to send with the request
        #[arg(long, env = "MINIBUILDER_TOKEN")]
        token: String,
        /// Print the raw blueprint JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Extract { description, token, json }) => {
            logging::init_stderr()?;
            headless::run(&config, &description, &token, json).await
        }
        None => {
            let log_path = match cli.log_file {
                Some(path) => path,
                None => logging::default_log_path()?,
            };
            logging::init_file(&log_path)?;
            run_tui(&config).await
        }
    }
}

async fn run_tui(config: &Config) -> Result<()> {
    let mut app = App::new(config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(tui::TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    if let Err(e) = &result {
        error!(error = %e, "terminal UI exited with an error");
    } else {
        info!("terminal UI closed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"endpoint":"http://file/extract","timeout_secs":7}"#).unwrap();

        let cli = Cli::parse_from([
            "minibuilder",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "http://flag/extract",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.endpoint, "http://flag/extract");
        assert_eq!(config.timeout_secs, 7);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_malformed_default_config_is_an_error() {
        let dir = tempdir().unwrap();
        let config_dir = dir.path().join("minibuilder");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.json"),
            r#"{"endpoint":"http://mine/extract","timeout_secs":"oops"}"#,
        )
        .unwrap();

        std::env::set_var("XDG_CONFIG_HOME", dir.path());
        let result = load_config(&Cli::parse_from(["minibuilder"]));
        std::env::remove_var("XDG_CONFIG_HOME");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_extract_subcommand_parses() {
        let cli = Cli::parse_from(["minibuilder", "extract", "a todo app", "--token", "abc", "--json"]);
        match cli.command {
            Some(Commands::Extract { description, token, json }) => {
                assert_eq!(description, "a todo app");
                assert_eq!(token, "abc");
                assert!(json);
            }
            None => panic!("expected extract subcommand"),
        }
    }
}
