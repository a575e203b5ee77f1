use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use m365ctl::commands::app_add::{self, AppAddOptions};
use m365ctl::commands::external_connection_add::{self, ExternalConnectionAddOptions};
use m365ctl::commands::group_user_list::{self, GroupUserListOptions};
use m365ctl::commands::teams_app_list::{self, TeamsAppListOptions};
use m365ctl::commands::user_get::{self, UserGetOptions};
use m365ctl::commands::CommandContext;
use m365ctl::config::Config;
use m365ctl::graph::auth::GraphCredentials;
use m365ctl::graph::http::error_hint;
use m365ctl::graph::GraphClient;
use m365ctl::output::{self, OutputMode};
use serde_json::Value;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Microsoft 365 from the command line
#[derive(Parser, Debug)]
#[command(name = "m365ctl", version = m365ctl::VERSION, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Access token to call Microsoft Graph with (otherwise M365_ACCESS_TOKEN or Azure CLI)
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Microsoft Graph endpoint, e.g. https://graph.microsoft.us
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    output: Option<OutputMode>,

    /// Print progress on stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Print progress and intermediate data on stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Log level for the log file
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Azure Active Directory
    Aad {
        #[command(subcommand)]
        command: AadCommand,
    },
    /// Microsoft Search
    Search {
        #[command(subcommand)]
        command: SearchCommand,
    },
    /// Microsoft Teams
    Teams {
        #[command(subcommand)]
        command: TeamsCommand,
    },
    /// Persistent settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AadCommand {
    /// App registrations
    App {
        #[command(subcommand)]
        command: AadAppCommand,
    },
    /// Microsoft 365 groups
    #[command(name = "o365group")]
    O365Group {
        #[command(subcommand)]
        command: O365GroupCommand,
    },
    /// Users
    User {
        #[command(subcommand)]
        command: AadUserCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AadAppCommand {
    /// Create an Azure AD app registration
    Add(AppAddOptions),
}

#[derive(Subcommand, Debug)]
enum O365GroupCommand {
    /// Group users
    User {
        #[command(subcommand)]
        command: O365GroupUserCommand,
    },
}

#[derive(Subcommand, Debug)]
enum O365GroupUserCommand {
    /// List owners, members and guests of a group
    List(GroupUserListOptions),
}

#[derive(Subcommand, Debug)]
enum AadUserCommand {
    /// Get a single user
    Get(UserGetOptions),
}

#[derive(Subcommand, Debug)]
enum SearchCommand {
    /// External connections
    #[command(name = "externalconnection")]
    ExternalConnection {
        #[command(subcommand)]
        command: ExternalConnectionCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ExternalConnectionCommand {
    /// Add an external connection
    Add(ExternalConnectionAddOptions),
}

#[derive(Subcommand, Debug)]
enum TeamsCommand {
    /// Teams apps
    App {
        #[command(subcommand)]
        command: TeamsAppCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TeamsAppCommand {
    /// List catalog apps or the apps installed in a team
    List(TeamsAppListOptions),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show the stored settings
    Show,
    /// Change a stored setting
    Set(ConfigSetArgs),
}

#[derive(Args, Debug)]
struct ConfigSetArgs {
    /// Default Microsoft Graph endpoint
    #[arg(long)]
    graph_endpoint: Option<String>,

    /// Default output format
    #[arg(long = "default-output", value_enum)]
    default_output: Option<OutputMode>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("m365ctl started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("m365ctl").join("m365ctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".m365ctl").join("m365ctl.log");
    }
    PathBuf::from("m365ctl.log")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _log_guard = setup_logging(cli.log_level);

    if let Err(err) = run(cli).await {
        tracing::error!("Command failed: {:#}", err);
        eprintln!("{}", error_message(&err));
        if let Some(hint) = error_hint(&err) {
            eprintln!("{hint}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load();
    let mode = config.effective_output(cli.output);

    if let Command::Config { command } = &cli.command {
        return run_config(&mut config, command, mode);
    }

    let endpoint = config.effective_endpoint(cli.endpoint.as_deref());
    tracing::info!("Using Graph endpoint: {}", endpoint);

    let credentials = GraphCredentials::discover(cli.access_token.clone(), &endpoint);
    let client = GraphClient::new(&endpoint, credentials)?;

    let mut ctx = CommandContext::new(&client, &endpoint);
    ctx.output = mode;
    ctx.verbose = cli.verbose;
    ctx.debug = cli.debug;

    let result = match &cli.command {
        Command::Aad { command } => match command {
            AadCommand::App {
                command: AadAppCommand::Add(options),
            } => serde_json::to_value(app_add::run(&ctx, options).await?)?,
            AadCommand::O365Group {
                command:
                    O365GroupCommand::User {
                        command: O365GroupUserCommand::List(options),
                    },
            } => serde_json::to_value(group_user_list::run(&ctx, options).await?)?,
            AadCommand::User {
                command: AadUserCommand::Get(options),
            } => user_get::run(&ctx, options).await?,
        },
        Command::Search {
            command:
                SearchCommand::ExternalConnection {
                    command: ExternalConnectionCommand::Add(options),
                },
        } => external_connection_add::run(&ctx, options).await?,
        Command::Teams {
            command: TeamsCommand::App {
                command: TeamsAppCommand::List(options),
            },
        } => teams_app_list::run(&ctx, options).await?,
        Command::Config { .. } => Value::Null,
    };

    print_result(&result, mode)?;

    if ctx.verbose || ctx.debug {
        eprintln!("DONE");
    }

    Ok(())
}

fn run_config(config: &mut Config, command: &ConfigCommand, mode: OutputMode) -> Result<()> {
    match command {
        ConfigCommand::Show => {}
        ConfigCommand::Set(args) => {
            if let Some(endpoint) = args.graph_endpoint.as_deref() {
                config.set_endpoint(endpoint)?;
            }
            if let Some(output) = args.default_output {
                config.set_output(output)?;
            }
        }
    }

    print_result(&serde_json::to_value(&*config)?, mode)
}

fn print_result(value: &Value, mode: OutputMode) -> Result<()> {
    let rendered = output::render(value, mode)?;
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    Ok(())
}

/// `Error: ` followed by the whole context chain
fn error_message(err: &anyhow::Error) -> String {
    format!("Error: {err:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_message_includes_cause() {
        let err = serde_json::from_str::<Value>("{ broken")
            .context("Unexpected response when creating the app registration")
            .unwrap_err();

        let message = error_message(&err);
        assert!(message.starts_with("Error: Unexpected response when creating the app registration: "));
        assert!(message.contains("key must be a string"));
    }
}
