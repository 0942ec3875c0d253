//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "rentgate.toml";

/// Load configuration from rentgate.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load rentgate.toml if present, otherwise the defaults
pub fn load_config_or_default() -> Result<Config> {
    match load_config() {
        Err(Error::ConfigNotFound) => Ok(Config::default()),
        other => other,
    }
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.api.timeout_secs == 0 {
        return Err(Error::Config("api.timeout_secs must be greater than 0".to_string()));
    }

    let guard = &config.guard;
    let paths = std::iter::once(&guard.login_path)
        .chain(std::iter::once(&guard.fallback_landing))
        .chain(guard.public_paths.iter())
        .chain(guard.rules.iter().map(|rule| &rule.prefix))
        .chain(guard.landing_pages.iter().map(|page| &page.path));

    for path in paths {
        if !path.starts_with('/') {
            return Err(Error::Config(format!(
                "guard path '{}' must start with '/'",
                path
            )));
        }
    }

    if !guard.is_public(&guard.login_path) {
        return Err(Error::Config(format!(
            "login path '{}' must be listed in guard.public_paths",
            guard.login_path
        )));
    }

    Ok(())
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // Compile-time constant pattern; a failure here is a bug, not a runtime condition
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Rentgate Configuration

[api]
base_url = "${RENTGATE_API_URL:-http://localhost:8000/api}"
timeout_secs = 10

[storage]
path = "./.rentgate/session.json"

[server]
host = "0.0.0.0"
port = 3456
pages_dir = "./public"

[guard]
login_path = "/login"
public_paths = ["/login", "/register", "/forgot-password"]
bypass_prefixes = ["/api", "/static", "/assets", "/favicon.ico", "/health"]
fallback_landing = "/client"

[[guard.rules]]
prefix = "/dashboard"
role = "system_admin"
mismatch_redirect = "/client"

[[guard.rules]]
prefix = "/client"
role = "landlord"

[[guard.rules]]
prefix = "/tenant"
role = "tenant"

[[guard.rules]]
prefix = "/manager"
role = "manager"

[[guard.rules]]
prefix = "/partner"
role = "partner"

[[guard.landing_pages]]
role = "system_admin"
path = "/dashboard"

[[guard.landing_pages]]
role = "landlord"
path = "/client"

[[guard.landing_pages]]
role = "tenant"
path = "/tenant"

[[guard.landing_pages]]
role = "manager"
path = "/manager"

[[guard.landing_pages]]
role = "partner"
path = "/partner"
"#
}
