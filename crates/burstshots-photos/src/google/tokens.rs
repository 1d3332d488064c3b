//! Per-identity token file.
//!
//! Each identity has one JSON file (`google-tokens-{identity}.json`) holding
//! the grant obtained from the consent flow. [`TokenStorage`] keeps the
//! parsed grant in memory so requests only touch the disk when the grant
//! changes.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PhotosError, PhotosResult};

/// Access tokens are treated as expired this long before Google says so.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The grant stored for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// `None` when the token endpoint gave no lifetime.
    pub expires_at: Option<DateTime<Utc>>,
    /// Scopes the user consented to.
    pub scopes: Vec<String>,
    pub obtained_at: DateTime<Utc>,
}

impl TokenInfo {
    /// Builds a grant from a token endpoint response received now.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(|secs| expiry(now, secs)),
            scopes,
            obtained_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// True when every scope in `required` was granted.
    pub fn covers(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }
}

fn expiry(from: DateTime<Utc>, expires_in_secs: i64) -> DateTime<Utc> {
    from + Duration::seconds(expires_in_secs - EXPIRY_MARGIN_SECS)
}

/// The token file of one identity plus its in-memory copy.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    cached: RwLock<Option<TokenInfo>>,
}

impl TokenStorage {
    /// Storage backed by `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the token file into memory.
    ///
    /// Returns `Ok(false)` when the identity has never been authorized.
    pub fn load(&self) -> PhotosResult<bool> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no token file at {:?}", self.path);
                return Ok(false);
            }
            Err(e) => {
                return Err(PhotosError::configuration(format!(
                    "failed to read token file {:?}: {}",
                    self.path, e
                )));
            }
        };

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            PhotosError::configuration(format!("failed to parse token file {:?}: {}", self.path, e))
        })?;

        info!("loaded tokens from {:?}", self.path);
        *self.write_cache() = Some(tokens);
        Ok(true)
    }

    pub fn get(&self) -> Option<TokenInfo> {
        self.read_cache().clone()
    }

    /// The stored grant, if it is unexpired and covers `scopes`.
    pub fn usable(&self, scopes: &[String]) -> Option<TokenInfo> {
        self.read_cache()
            .as_ref()
            .filter(|t| !t.is_expired() && t.covers(scopes))
            .cloned()
    }

    /// The refresh token of a grant that covers `scopes`.
    ///
    /// A grant for narrower scopes cannot be refreshed into a wider one, so
    /// it needs a new consent instead.
    pub fn refresh_token(&self, scopes: &[String]) -> Option<String> {
        self.read_cache()
            .as_ref()
            .filter(|t| t.covers(scopes))
            .and_then(|t| t.refresh_token.clone())
    }

    /// Replaces the grant and writes it to disk.
    pub fn set(&self, tokens: TokenInfo) -> PhotosResult<()> {
        *self.write_cache() = Some(tokens.clone());
        self.persist(&tokens)
    }

    /// Stores the result of a refresh grant, keeping the refresh token.
    pub fn update_access_token(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> PhotosResult<TokenInfo> {
        let updated = {
            let mut cache = self.write_cache();
            let tokens = cache
                .as_mut()
                .ok_or_else(|| PhotosError::internal("no stored grant to refresh"))?;
            let now = Utc::now();
            tokens.access_token = access_token.into();
            tokens.expires_at = expires_in_secs.map(|secs| expiry(now, secs));
            tokens.obtained_at = now;
            tokens.clone()
        };

        self.persist(&updated)?;
        Ok(updated)
    }

    /// Forgets the grant and removes the token file.
    pub fn clear(&self) -> PhotosResult<()> {
        *self.write_cache() = None;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("removed token file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PhotosError::configuration(format!(
                "failed to remove token file {:?}: {}",
                self.path, e
            ))),
        }
    }

    /// Writes `tokens` next to the target and renames it into place.
    fn persist(&self, tokens: &TokenInfo) -> PhotosResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                PhotosError::configuration(format!("failed to create token directory: {}", e))
            })?;
        }

        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        let write = |file: File| -> std::io::Result<()> {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, tokens)?;
            writer.flush()
        };
        create_private(&temp_path)
            .and_then(write)
            .and_then(|()| fs::rename(&temp_path, &self.path))
            .map_err(|e| {
                let _ = fs::remove_file(&temp_path);
                PhotosError::configuration(format!(
                    "failed to write token file {:?}: {}",
                    self.path, e
                ))
            })?;

        debug!("saved tokens to {:?}", self.path);
        Ok(())
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Option<TokenInfo>> {
        self.cached.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Option<TokenInfo>> {
        self.cached.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates (or truncates) a file readable only by the owner on Unix.
fn create_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
