use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::auth;
use crate::client::{UploadClient, UploadError, UploadResult};
use crate::config::Config;
use crate::report;
use crate::token::TokenStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "terracost",
    version,
    about = "A CLI tool for getting the cost of your terraform plan"
)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputMode::Text)]
    output: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login to TerraCost and save your auth token (an empty token is rejected)
    Login,
    /// Upload a terraform plan (JSON) and print its estimated cost
    Upload {
        /// Path to the plan file
        file_path: PathBuf,
        /// Authorization key (overrides saved login and .env; use '-' to read from stdin)
        #[arg(short, long)]
        auth: Option<String>,
        /// Upload URL (defaults to http://<IP>:8080/upload)
        #[arg(short, long)]
        url: Option<String>,
    },
}

// -- helpers --

fn print_json(result: &UploadResult, out: &mut impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("failed to serialize result")?;
    writeln!(out, "{json}").context("failed to write output")
}

/// `--url` wins over the endpoint built from the configured host.
fn upload_endpoint(config: &Config, cli_url: Option<&str>) -> String {
    cli_url.map_or_else(|| config.default_endpoint(), str::to_string)
}

/// Prompt on stderr and read a single line; stdout stays clean for piping.
fn prompt_token(input: &mut impl BufRead) -> Result<String> {
    eprint!("Enter your TerraCost API token: ");
    std::io::stderr()
        .flush()
        .context("failed to flush stderr")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read token")?;
    let token = line.trim().to_string();
    anyhow::ensure!(!token.is_empty(), "no token entered");
    Ok(token)
}

// -- command handlers --

fn handle_login(store: &TokenStore, mut input: impl BufRead) -> Result<()> {
    let token = prompt_token(&mut input)?;
    store.save(&token).context("failed to save token")?;
    println!("Login successful. Token saved.");
    Ok(())
}

struct UploadArgs<'a> {
    file_path: &'a Path,
    cli_auth: Option<&'a str>,
    cli_url: Option<&'a str>,
    mode: OutputMode,
}

fn handle_upload(
    config: &Config,
    store: &TokenStore,
    args: UploadArgs<'_>,
    new_client: impl FnOnce() -> Result<UploadClient, UploadError>,
    out: &mut impl Write,
) -> Result<()> {
    let UploadArgs {
        file_path,
        cli_auth,
        cli_url,
        mode,
    } = args;
    let credential =
        auth::resolve_credential(cli_auth, store, config.default_auth.as_deref())?;
    let endpoint = upload_endpoint(config, cli_url);

    let client = new_client().context("failed to build HTTP client")?;
    let result = client
        .upload(file_path, &endpoint, &credential)
        .context("upload failed")?;
    log::info!(
        "{} ({} bytes): {}",
        result.filename,
        result.size,
        result.message
    );

    match mode {
        OutputMode::Json => print_json(&result, out),
        OutputMode::Text => out
            .write_all(report::render(&result.costing).as_bytes())
            .context("failed to write output"),
    }
}

// -- main dispatch --

/// Parse CLI arguments and execute the corresponding TerraCost command.
pub fn run<I, T>(args: I, config: &Config) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let stdout = std::io::stdout();
    dispatch(cli, config, UploadClient::new, &mut stdout.lock())
}

fn dispatch(
    cli: Cli,
    config: &Config,
    new_client: impl FnOnce() -> Result<UploadClient, UploadError>,
    out: &mut impl Write,
) -> Result<()> {
    let store = TokenStore::new(config.token_path.clone());

    match cli.command {
        Commands::Login => handle_login(&store, std::io::stdin().lock()),
        Commands::Upload {
            file_path,
            auth,
            url,
        } => {
            let args = UploadArgs {
                file_path: &file_path,
                cli_auth: auth.as_deref(),
                cli_url: url.as_deref(),
                mode: cli.output,
            };
            handle_upload(config, &store, args, new_client, out)
        }
    }
}
