//! CLI interface for Rentgate

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

use crate::auth::UserRole;

#[derive(Parser)]
#[command(name = "rentgate")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Session handling and route protection for the rental dashboards", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new rentgate.toml configuration file
    Init,

    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "RENTGATE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and store the session
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// One of system_admin, landlord, tenant, manager, partner
        #[arg(short = 't', long, default_value = "landlord")]
        user_type: UserRole,

        /// Partner referral code
        #[arg(long)]
        referral_code: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Evaluate the route guard for a path and cookie values
    Route {
        /// Requested path, e.g. /client/units
        path: String,

        /// Value of the `token` cookie
        #[arg(long)]
        token: Option<String>,

        /// Value of the `userType` cookie
        #[arg(short = 't', long)]
        user_type: Option<String>,

        /// Value of the `preferredLandingPage` cookie
        #[arg(long)]
        preferred: Option<String>,
    },

    /// Print the route protection table
    Routes,

    /// Run the edge server with the route guard
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
