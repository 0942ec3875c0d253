//! CLI command implementations

use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;

use crate::api;
use crate::auth::{AuthService, Credentials, FileStorage, Registration, TokenStore, UserRole};
use crate::cli::{error, info, print_decision, print_route_table, print_user_detail, success, warn, OutputFormat};
use crate::client::ApiClient;
use crate::config::{self, Config};
use crate::error::Error;
use crate::guard::RouteCookies;

/// Initialize a new rentgate.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn("rentgate.toml already exists");
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success("Created rentgate.toml");
    info("Set RENTGATE_API_URL or edit [api] and run 'rentgate login --email <email>'");

    Ok(())
}

/// Sign in with email and password
pub async fn login(email: &str, password: Option<String>) -> Result<()> {
    let (config, auth) = auth_service()?;

    let password = match password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let credentials = Credentials {
        email: email.to_string(),
        password,
    };

    match auth.login(&credentials).await {
        Ok(user) => {
            success(&format!("Signed in as {} ({})", user.display_name(), user.user_type));
            info(&format!(
                "Landing page: {}",
                config.guard.landing_for(Some(user.user_type))
            ));
            Ok(())
        }
        Err(e) => {
            error(&format!("Login failed: {}", e));
            Err(e.into())
        }
    }
}

/// Create an account
pub async fn register(
    email: &str,
    first_name: &str,
    last_name: &str,
    user_type: UserRole,
    referral_code: Option<String>,
) -> Result<()> {
    let (_, auth) = auth_service()?;

    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .context("Failed to read password")?;

    let registration = Registration {
        email: email.to_string(),
        password,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        user_type,
        referral_code,
    };

    match auth.register(&registration).await {
        Ok(user) => {
            success(&format!("Registered {} as {}", user.email, user.user_type));
            Ok(())
        }
        Err(e) => {
            error(&format!("Registration failed: {}", e));
            Err(e.into())
        }
    }
}

/// Sign out
pub async fn logout() -> Result<()> {
    let (_, auth) = auth_service()?;

    if !auth.store().is_authenticated() {
        warn("Not signed in");
    }

    auth.logout().await?;
    success("Signed out");
    Ok(())
}

/// Show the current user
pub async fn whoami(format: OutputFormat) -> Result<()> {
    let (_, auth) = auth_service()?;

    if !auth.store().is_authenticated() {
        warn("Not signed in. Run 'rentgate login --email <email>'");
        return Ok(());
    }

    let Some(user) = auth.current_user().await else {
        error("Could not load the current user; the session may have expired");
        return Err(Error::Unauthorized.into());
    };

    match format {
        OutputFormat::Table => print_user_detail(&user),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&user)?),
    }

    Ok(())
}

/// Refresh the access token
pub async fn refresh() -> Result<()> {
    let (_, auth) = auth_service()?;

    match auth.refresh().await {
        Ok(_) => {
            success("Access token refreshed");
            Ok(())
        }
        Err(e) if e.is_unauthorized() => {
            error("No session to refresh. Run 'rentgate login --email <email>'");
            Err(e.into())
        }
        Err(e) => {
            error(&format!("Refresh failed, session cleared: {}", e));
            Err(e.into())
        }
    }
}

/// Evaluate the route guard for the given cookies
pub async fn route(
    path: &str,
    token: Option<String>,
    user_type: Option<String>,
    preferred: Option<String>,
) -> Result<()> {
    let config = config::load_config_or_default()?;
    let cookies = RouteCookies {
        token,
        user_type,
        preferred_landing_page: preferred,
    };

    let decision = config.guard.decide(path, &cookies);
    print_decision(path, &decision);
    Ok(())
}

/// Print the route table
pub async fn routes() -> Result<()> {
    let config = config::load_config_or_default()?;
    print_route_table(&config.guard);
    Ok(())
}

/// Run the edge server
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = config::load_config_or_default()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting edge server on {}:{}", host, port));
    api::run_server(config, &host, port).await?;

    Ok(())
}

fn auth_service() -> Result<(Config, AuthService)> {
    let config = config::load_config_or_default()?;
    let storage = Arc::new(FileStorage::new(config.storage.path.clone()));
    let store = TokenStore::init(storage)?;
    let client = ApiClient::from_config(&config, store)?;
    Ok((config, AuthService::new(client)))
}
