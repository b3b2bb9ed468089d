use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::authz::gate::DEFAULT_ROLES_HEADER;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    pub authz: Authz,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Authz {
    /// Serve the unauthenticated /v1/check and /v1/expand API on its own listener.
    #[serde(default)]
    pub api_enabled: bool,
    /// Port for the check API. Defaults to server.port + 1 if not set.
    #[serde(default)]
    pub api_port: Option<u16>,
    /// JSON role source. Default: roles.json
    pub roles_file: PathBuf,
    /// Request header carrying the caller's comma separated roles.
    pub roles_header: String,
    /// Permission required for the /admin/dashboard route.
    pub protected_permission: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8087,
        }
    }
}

impl Default for Authz {
    fn default() -> Self {
        Self {
            api_enabled: false,
            api_port: None, // Defaults to port + 1 if not set
            roles_file: PathBuf::from("roles.json"),
            roles_header: DEFAULT_ROLES_HEADER.to_string(),
            protected_permission: "view:admin.dashboard".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("server.host", Server::default().host)
            .into_diagnostic()?
            .set_default("server.port", Server::default().port)
            .into_diagnostic()?
            .set_default("authz.api_enabled", Authz::default().api_enabled)
            .into_diagnostic()?
            .set_default(
                "authz.roles_file",
                Authz::default().roles_file.to_string_lossy().to_string(),
            )
            .into_diagnostic()?
            .set_default("authz.roles_header", Authz::default().roles_header)
            .into_diagnostic()?
            .set_default(
                "authz.protected_permission",
                Authz::default().protected_permission,
            )
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: ROLEGATE__SERVER__PORT=9090, etc.
        builder = builder.add_source(config::Environment::with_prefix("ROLEGATE").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        if s.authz.roles_file.is_relative() {
            s.authz.roles_file = std::env::current_dir()
                .into_diagnostic()?
                .join(&s.authz.roles_file);
        }

        Ok(s)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn api_addr(&self) -> String {
        let port = self
            .authz
            .api_port
            .unwrap_or(self.server.port.saturating_add(1));
        format!("{}:{}", self.server.host, port)
    }
}
