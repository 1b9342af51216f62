//! cognito-stack - synthesize and inspect the Cognito Google sign-in stack.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use cognito_stack::commands::{render_graph, render_outputs};
use cognito_stack::{CognitoStack, StackConfig};
use shared::secrets::{get_google_oauth_credentials, secrets_client};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cognito-stack", version, about = "Cognito user pool with Google sign-in")]
struct Cli {
    /// Stack config JSON; read from the environment when omitted
    #[arg(long, global = true, env = "COGNITO_STACK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the CloudFormation template
    Synth {
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print resources in creation order with their dependencies
    Graph,
    /// Print stack outputs for deployed values
    Outputs {
        #[arg(long, env = "AWS_REGION")]
        region: String,
        #[arg(long)]
        user_pool_id: String,
        #[arg(long)]
        client_id: String,
        /// Needed to render the user pool ARN
        #[arg(long)]
        account_id: Option<String>,
    },
    /// Check that the Google OAuth secret exists and has client_id and client_secret
    CheckSecret,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StackConfig::load(cli.config.as_deref()).context("Failed to load stack config")?;

    match cli.command {
        Command::Synth { out } => {
            let json = CognitoStack::synthesize(&config)?.to_json_pretty()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json + "\n")
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote template for {} to {}", config.stack_name, path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Graph => {
            let template = CognitoStack::synthesize(&config)?;
            print!("{}", render_graph(&template)?);
        }
        Command::Outputs {
            region,
            user_pool_id,
            client_id,
            account_id,
        } => {
            let template = CognitoStack::synthesize(&config)?;
            let bindings = CognitoStack::deployed_bindings(
                &region,
                account_id.as_deref(),
                &user_pool_id,
                &client_id,
            );
            print!("{}", render_outputs(&template, &bindings));
        }
        Command::CheckSecret => {
            let client = secrets_client().await;
            let secret_name = &config.google_oauth_client_secret_name;
            match get_google_oauth_credentials(&client, secret_name).await {
                Ok(_) => println!("{}: client_id and client_secret present", secret_name),
                Err(e) => bail!("Secret {} is not usable: {}", secret_name, e),
            }
        }
    }

    Ok(())
}
