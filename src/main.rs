use std::path::{Path, PathBuf};

use clap::Parser;
use passport_auth::{
    auth::{AuthError, Authenticator, LoginRequest, PassportAuthenticator},
    config::PassportConfig,
    db, observability,
};

#[derive(Parser, Debug)]
#[command(version, about = "Passport identity provider authenticator", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file
    #[arg(short, long, global = true, default_value = "passport.toml")]
    config: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Authenticate against the passport IdP and provision the local user
    Login {
        /// Passport session token
        #[arg(long, conflicts_with_all = ["username", "password"])]
        token: Option<String>,
        /// Passport username
        #[arg(short, long)]
        username: Option<String>,
        /// Passport password
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Look up a provisioned user by username
    Search {
        #[arg(short, long)]
        username: String,
    },
    /// Load and validate the configuration file, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = load_config(&args.config);

    match args.command {
        Command::CheckConfig => {
            println!("Configuration OK: {}", args.config.display());
        }
        Command::Login {
            token,
            username,
            password,
        } => {
            let request = LoginRequest {
                token: token.unwrap_or_default(),
                principal: username.unwrap_or_default(),
                password: password.unwrap_or_default(),
            };
            run_login(&config, request).await;
        }
        Command::Search { username } => {
            run_search(&config, &username).await;
        }
    }
}

fn load_config(path: &Path) -> PassportConfig {
    match PassportConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

async fn build_authenticator(config: &PassportConfig) -> PassportAuthenticator {
    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let repo = match db::create_user_repo(&config.database).await {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open user store");
            eprintln!("Error: Failed to open user store: {}", e);
            std::process::exit(1);
        }
    };

    match PassportAuthenticator::from_config(config, repo) {
        Ok(authenticator) => authenticator,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build authenticator");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_login(config: &PassportConfig, request: LoginRequest) {
    let authenticator = build_authenticator(config).await;

    match authenticator.login(&request).await {
        Ok(user) => print_json(&user),
        Err(e) => exit_with(e),
    }
}

async fn run_search(config: &PassportConfig, username: &str) {
    let authenticator = build_authenticator(config).await;

    match authenticator.search_user(username).await {
        Ok(Some(user)) => print_json(&user),
        Ok(None) => {
            eprintln!("No local user named '{}'", username);
            std::process::exit(2);
        }
        Err(e) => exit_with(e),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Failed to serialize output: {}", e);
            std::process::exit(1);
        }
    }
}

fn exit_with(error: AuthError) -> ! {
    tracing::error!(code = error.code(), error = %error, "Command failed");
    eprintln!("Error: {}", error);
    std::process::exit(1);
}
