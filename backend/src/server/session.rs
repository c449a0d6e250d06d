//! Session cookie key and policy derived from [`ServerSettings`].
//!
//! Debug builds tolerate a missing key file and odd cookie toggles, warning
//! instead of failing. Release builds insist on a readable key of at least
//! [`SESSION_KEY_MIN_LEN`] bytes and a coherent `SameSite` policy.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use tracing::warn;
use zeroize::Zeroize;

use super::config::ServerSettings;

/// Shortest key file accepted in release builds.
pub const SESSION_KEY_MIN_LEN: usize = 64;

const SAME_SITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for session validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// Mode of the running binary, from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated cookie settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Errors raised while validating session settings.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("invalid same_site '{value}'; expected {expected}")]
    InvalidSameSite {
        value: String,
        expected: &'static str,
    },
    #[error("same_site=None requires cookie_secure")]
    InsecureSameSiteNone,
    #[error("session_allow_ephemeral must be false in release builds")]
    EphemeralNotAllowed,
}

/// Derive the session key and cookie policy.
///
/// # Errors
///
/// Returns [`SessionConfigError`] when a release build lacks a usable key or
/// the cookie toggles contradict each other.
pub fn session_settings(
    settings: &ServerSettings,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    if settings.session_allow_ephemeral() && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let same_site = same_site(settings.same_site.as_deref(), settings.cookie_secure(), mode)?;
    let key = load_key(
        &settings.session_key_file(),
        settings.session_allow_ephemeral(),
        mode,
    )?;
    Ok(SessionSettings {
        key,
        cookie_secure: settings.cookie_secure(),
        same_site,
    })
}

fn same_site(
    value: Option<&str>,
    cookie_secure: bool,
    mode: BuildMode,
) -> Result<SameSite, SessionConfigError> {
    let fallback = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let Some(value) = value else {
        return Ok(fallback);
    };

    match value.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" if mode.is_debug() => {
            warn!("same_site=None without cookie_secure; browsers may reject the cookie");
            Ok(SameSite::None)
        }
        "none" => Err(SessionConfigError::InsecureSameSiteNone),
        _ if mode.is_debug() => {
            warn!(value, "invalid same_site; using default");
            Ok(fallback)
        }
        _ => Err(SessionConfigError::InvalidSameSite {
            value: value.to_owned(),
            expected: SAME_SITE_EXPECTED,
        }),
    }
}

/// Read and derive the signing key, wiping the raw bytes afterwards.
fn load_key(
    path: &Path,
    allow_ephemeral: bool,
    mode: BuildMode,
) -> Result<Key, SessionConfigError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if !mode.is_debug() && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}
