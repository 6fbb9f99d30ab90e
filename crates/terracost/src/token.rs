use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

const TOKEN_FILE: &str = ".terracost_token";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("could not determine home directory for the token file")]
    NoHome,
    #[error("no saved token at {}", .0.display())]
    NotFound(PathBuf),
    #[error("token file {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// `~/.terracost_token`, or `None` when the home directory is unknown.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(TOKEN_FILE))
}

/// Single saved credential, stored as plain text readable only by its owner.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: Option<PathBuf>,
}

impl TokenStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn path(&self) -> Result<&Path, TokenError> {
        self.path.as_deref().ok_or(TokenError::NoHome)
    }

    pub fn save(&self, token: &str) -> Result<(), TokenError> {
        let path = self.path()?;
        let io_err = |source| TokenError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(io_err)?;

        // mode() only applies on create
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }

        file.write_all(token.trim().as_bytes()).map_err(io_err)?;
        log::debug!("saved token to {}", path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<String, TokenError> {
        let path = self.path()?;
        match fs::read_to_string(path) {
            Ok(data) => Ok(data.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(TokenError::NotFound(path.to_path_buf()))
            }
            Err(source) => Err(TokenError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
