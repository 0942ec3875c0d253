//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::{User, UserRole};
use crate::guard::{RouteDecision, RouteTable};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

fn role_color(role: UserRole) -> Color {
    match role {
        UserRole::SystemAdmin => Color::Red,
        UserRole::Landlord => Color::Green,
        UserRole::Tenant => Color::Blue,
        UserRole::Manager => Color::Yellow,
        UserRole::Partner => Color::Magenta,
    }
}

/// Print the route protection table
pub fn print_route_table(table: &RouteTable) {
    let mut rules = Table::new();
    rules
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Prefix").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Other roles go to").fg(Color::Cyan),
            Cell::new("Landing page").fg(Color::Cyan),
        ]);

    for rule in &table.rules {
        rules.add_row(vec![
            Cell::new(&rule.prefix),
            Cell::new(rule.role).fg(role_color(rule.role)),
            Cell::new(rule.mismatch_redirect.as_deref().unwrap_or(&table.login_path)),
            Cell::new(table.landing_for(Some(rule.role))),
        ]);
    }

    println!("{rules}");
    println!();
    println!("  {} {}", "Login:".bold(), table.login_path);
    println!("  {} {}", "Public:".bold(), table.public_paths.join(", "));
    println!("  {} {}", "Bypassed:".bold(), table.bypass_prefixes.join(", "));
    println!("  {} {}", "Fallback landing:".bold(), table.fallback_landing);
    println!(
        "  {} {}",
        "Unrestricted role:".bold(),
        UserRole::SystemAdmin.to_string().red()
    );
}

/// Print a routing decision
pub fn print_decision(path: &str, decision: &RouteDecision) {
    match decision {
        RouteDecision::Allow => success(&format!("{} → allow", path)),
        RouteDecision::Redirect(redirect) => {
            warn(&format!("{} → redirect {}", path, redirect.location().cyan()));
            if redirect.clear_session {
                info("Session cookies would be cleared");
            }
        }
    }
}

/// Print the signed-in user
pub fn print_user_detail(user: &User) {
    println!("{}", "Signed In".bold().underline());
    println!();
    println!("  {} {}", "Name:".bold(), user.display_name());
    println!("  {} {}", "Email:".bold(), user.email);
    println!("  {} {}", "Role:".bold(), user.user_type.to_string().cyan());
    println!("  {} {}", "ID:".bold(), user.id);
}
