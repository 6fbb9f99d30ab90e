use std::io::Read;

use anyhow::{Context, Result, bail};

use crate::token::{TokenError, TokenStore};

const NO_TOKEN: &str = "No TerraCost token found. Run `terracost login`, pass --auth, \
                        or set TERRACOST_AUTHORIZATION_KEY in .env";

/// A credential source. `Ok(None)` means "nothing here, try the next one".
pub type Resolver<'a> = (&'static str, Box<dyn FnOnce() -> Result<Option<String>> + 'a>);

/// Evaluate resolvers in order and return the first non-empty credential.
pub fn first_credential<'a>(resolvers: impl IntoIterator<Item = Resolver<'a>>) -> Result<String> {
    for (source, resolve) in resolvers {
        if let Some(token) = resolve()?
            && !token.trim().is_empty()
        {
            log::debug!("using credential from {source}");
            return Ok(token);
        }
        log::debug!("no credential from {source}");
    }
    bail!(NO_TOKEN)
}

/// Resolve the upload credential: `--auth` flag, then saved login, then the
/// configured key. Pass `Some("-")` to read the flag value from stdin.
pub fn resolve_credential(
    cli_auth: Option<&str>,
    store: &TokenStore,
    configured: Option<&str>,
) -> Result<String> {
    resolve_credential_with(cli_auth, store, configured, std::io::stdin())
}

fn resolve_credential_with<'a>(
    cli_auth: Option<&'a str>,
    store: &'a TokenStore,
    configured: Option<&'a str>,
    stdin: impl Read + 'a,
) -> Result<String> {
    let resolvers: [Resolver<'a>; 3] = [
        ("--auth flag", Box::new(move || from_flag(cli_auth, stdin))),
        ("saved login", Box::new(move || from_store(store))),
        (
            "TERRACOST_AUTHORIZATION_KEY",
            Box::new(move || Ok(configured.map(str::to_string))),
        ),
    ];
    first_credential(resolvers)
}

fn from_flag(cli_auth: Option<&str>, stdin: impl Read) -> Result<Option<String>> {
    let Some(token) = cli_auth else {
        return Ok(None);
    };
    if token == "-" {
        return read_token_from_reader(stdin).map(Some);
    }
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

fn from_store(store: &TokenStore) -> Result<Option<String>> {
    match store.load() {
        Ok(token) => Ok(Some(token)),
        Err(e @ (TokenError::NotFound(_) | TokenError::NoHome)) => {
            log::debug!("{e}");
            Ok(None)
        }
        Err(e) => Err(e).context("failed to load saved token"),
    }
}

fn read_token_from_reader(mut reader: impl Read) -> Result<String> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .context("failed to read token from stdin")?;
    let trimmed = buf.trim().to_string();
    anyhow::ensure!(!trimmed.is_empty(), "stdin was empty; expected a token");
    Ok(trimmed)
}
