//! Loop Social CLI - command-line client for the Loop Social network.

mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use loop_config::{Config, Paths};
use tracing::debug;

/// Loop Social CLI - sign in, browse groups and react to posts.
#[derive(Parser)]
#[command(name = "loop")]
#[command(about = "Loop Social client for authentication, groups and posts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config value
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Data source (live or demo); defaults to the config value
    #[arg(long, global = true, env = "LOOP_DATA_MODE")]
    mode: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account
    Signup {
        /// Full name shown on your profile
        #[arg(short, long)]
        name: Option<String>,
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Logout and clear session
    Logout,

    /// Check authentication status
    Status,

    /// Refresh the access token
    Refresh,

    /// Check whether a page may be shown
    Authorize {
        /// Page path, e.g. /feed
        path: String,
    },

    /// List groups
    Groups {
        /// Only groups you belong to
        #[arg(short, long)]
        joined: bool,
    },

    /// Show posts, newest first
    Feed {
        /// Limit to one group
        #[arg(short, long)]
        group: Option<i64>,
    },

    /// Join a group, or leave it if already a member
    Join {
        /// Group ID
        id: String,
    },

    /// Like a post, or unlike it if already liked
    Like {
        /// Post ID
        id: String,
    },

    /// Publish a post
    Post {
        /// Post text
        content: String,
        /// Group to publish into
        #[arg(short, long)]
        group: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    paths.ensure_dirs()?;
    let mut config = Config::load(&paths)?;
    if let Some(mode) = &cli.mode {
        config.data_mode = mode.parse()?;
    }

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let level = loop_config::parse_level(level).as_str().to_ascii_lowercase();
    loop_config::init_logging("cli", &level, &paths, false);
    debug!(mode = %config.data_mode, "Starting CLI");

    let client = client::Client::open(&config, &paths, cli.format)?;
    let format = &cli.format;

    match cli.command {
        Commands::Login { email } => commands::login(&client, email, format).await,
        Commands::Signup { name, email } => commands::signup(&client, name, email, format).await,
        Commands::Logout => commands::logout(&client, format).await,
        Commands::Status => commands::status(&client, format).await,
        Commands::Refresh => commands::refresh(&client, format).await,
        Commands::Authorize { path } => commands::authorize(&client, &path, format).await,
        Commands::Groups { joined } => commands::groups_list(&client, joined, format).await,
        Commands::Feed { group } => commands::feed(&client, group, format).await,
        Commands::Join { id } => commands::join(&client, &id, format).await,
        Commands::Like { id } => commands::like(&client, &id, format).await,
        Commands::Post { content, group } => {
            commands::post(&client, &content, group, format).await
        }
    }
}
