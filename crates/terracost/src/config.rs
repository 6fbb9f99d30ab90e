use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::token;

const ENV_FILE: &str = ".env";
const HOST_KEY: &str = "IP";
const AUTH_KEY: &str = "TERRACOST_AUTHORIZATION_KEY";
const TOKEN_FILE_VAR: &str = "TERRACOST_TOKEN_FILE";
const DEFAULT_HOST: &str = "localhost";
const UPLOAD_PORT: u16 = 8080;

/// Process-wide settings, resolved once at startup and handed to [`crate::run`].
#[derive(Clone, Default)]
pub struct Config {
    /// Host of the TerraCost service, used to build the default endpoint.
    pub host: String,
    /// Authorization key used when neither `--auth` nor a saved login is available.
    pub default_auth: Option<String>,
    /// Location of the saved login token. `None` if no home directory could be found.
    pub token_path: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field(
                "default_auth",
                &self.default_auth.as_ref().map(|_| "[redacted]"),
            )
            .field("token_path", &self.token_path)
            .finish()
    }
}

impl Config {
    /// Read `.env` from the working directory. A missing or malformed file
    /// yields defaults so that `login` and `--help` keep working.
    pub fn load() -> Self {
        Self::load_from(Path::new(ENV_FILE))
    }

    fn load_from(path: &Path) -> Self {
        let entries = read_env_file(path).unwrap_or_else(|e| {
            log::warn!("ignoring {}: {e:#}", path.display());
            HashMap::new()
        });
        let token_path = std::env::var_os(TOKEN_FILE_VAR)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(token::default_path);
        Self::from_entries(&entries, token_path)
    }

    fn from_entries(entries: &HashMap<String, String>, token_path: Option<PathBuf>) -> Self {
        let non_empty = |key: &str| {
            entries
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            host: non_empty(HOST_KEY).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            default_auth: non_empty(AUTH_KEY),
            token_path,
        }
    }

    pub fn default_endpoint(&self) -> String {
        format!("http://{}:{UPLOAD_PORT}/upload", self.host)
    }
}

/// Parse a dotenv file without exporting it into the process environment.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to open {}", path.display()));
        }
    };
    iter.map(|item| item.with_context(|| format!("failed to parse {}", path.display())))
        .collect()
}
