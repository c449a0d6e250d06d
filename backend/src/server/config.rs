//! Process settings loaded via OrthoConfig, and the server configuration
//! derived from them.

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use helpdesk::outbound::persistence::{DEFAULT_MAX_CONNECTIONS, DbPool};
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Settings read from `HELPDESK_*` environment variables, configuration
/// files and the command line.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HELPDESK")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; without one the server runs on the in-memory store.
    pub database_url: Option<String>,
    /// Connection pool ceiling.
    pub db_max_connections: Option<u32>,
    /// Seed the in-memory store with demo users and reference data.
    pub demo_data: Option<bool>,
    /// File holding at least 64 bytes of session key material.
    pub session_key_file: Option<PathBuf>,
    /// Fall back to a random session key when the key file is unreadable.
    pub session_allow_ephemeral: Option<bool>,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: Option<bool>,
    /// `Strict`, `Lax` or `None`.
    pub same_site: Option<String>,
    /// Shared password accepted for every user; unset disables login.
    pub login_password: Option<String>,
}

impl ServerSettings {
    /// The configured bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the configured value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    /// Demo seeding is on unless explicitly disabled.
    pub fn demo_data(&self) -> bool {
        self.demo_data.unwrap_or(true)
    }

    pub fn session_allow_ephemeral(&self) -> bool {
        self.session_allow_ephemeral.unwrap_or(false)
    }

    /// Cookies are `Secure` unless explicitly disabled.
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }
}

/// Everything [`super::create_server`] needs to start listening.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) demo_data: bool,
    pub(crate) login_password: Option<String>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            demo_data: true,
            login_password: None,
        }
    }

    /// Serve from PostgreSQL instead of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Whether an in-memory store starts with the demo directory.
    #[must_use]
    pub fn with_demo_data(mut self, demo_data: bool) -> Self {
        self.demo_data = demo_data;
        self
    }

    #[must_use]
    pub fn with_login_password(mut self, password: Option<String>) -> Self {
        self.login_password = password;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "HELPDESK_BIND_ADDR",
        "HELPDESK_DATABASE_URL",
        "HELPDESK_DB_MAX_CONNECTIONS",
        "HELPDESK_DEMO_DATA",
        "HELPDESK_SESSION_KEY_FILE",
        "HELPDESK_SESSION_ALLOW_EPHEMERAL",
        "HELPDESK_COOKIE_SECURE",
        "HELPDESK_SAME_SITE",
        "HELPDESK_LOGIN_PASSWORD",
    ];

    fn load() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("helpdesk")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load();
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert!(settings.database_url.is_none());
        assert_eq!(settings.db_max_connections(), DEFAULT_MAX_CONNECTIONS);
        assert!(settings.demo_data());
        assert!(settings.cookie_secure());
        assert!(!settings.session_allow_ephemeral());
        assert_eq!(
            settings.session_key_file(),
            PathBuf::from(DEFAULT_SESSION_KEY_FILE)
        );
        assert!(settings.login_password.is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(VARS.map(|name| {
            let value = match name {
                "HELPDESK_BIND_ADDR" => Some("127.0.0.1:9000"),
                "HELPDESK_DATABASE_URL" => Some("postgres://localhost/helpdesk"),
                "HELPDESK_DB_MAX_CONNECTIONS" => Some("4"),
                "HELPDESK_COOKIE_SECURE" => Some("false"),
                "HELPDESK_SAME_SITE" => Some("Strict"),
                "HELPDESK_LOGIN_PASSWORD" => Some("hunter2"),
                _ => None,
            };
            (name, value.map(str::to_owned))
        }));

        let settings = load();
        assert_eq!(
            settings.bind_addr().expect("parses"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/helpdesk")
        );
        assert_eq!(settings.db_max_connections(), 4);
        assert!(!settings.cookie_secure());
        assert!(settings.demo_data());
        assert_eq!(settings.same_site.as_deref(), Some("Strict"));
        assert_eq!(settings.login_password.as_deref(), Some("hunter2"));
    }

    #[rstest]
    #[case("HELPDESK_DEMO_DATA", "false")]
    #[case("HELPDESK_COOKIE_SECURE", "false")]
    #[case("HELPDESK_SESSION_ALLOW_EPHEMERAL", "true")]
    fn boolean_flags_flip_their_defaults(#[case] var: &str, #[case] value: &str) {
        let _guard = lock_env(VARS.map(|name| (name, (name == var).then(|| value.to_owned()))));

        let settings = load();
        let flipped = (
            !settings.demo_data(),
            !settings.cookie_secure(),
            settings.session_allow_ephemeral(),
        );
        let expected = (
            var == "HELPDESK_DEMO_DATA",
            var == "HELPDESK_COOKIE_SECURE",
            var == "HELPDESK_SESSION_ALLOW_EPHEMERAL",
        );
        assert_eq!(flipped, expected);
    }

    #[rstest]
    fn malformed_bind_addresses_are_reported() {
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "HELPDESK_BIND_ADDR").then(|| "not-an-address".to_owned());
            (name, value)
        }));

        assert!(load().bind_addr().is_err());
    }
}
