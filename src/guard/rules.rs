//! Declarative route table and the routing decision

use crate::auth::UserRole;
use crate::guard::cookies::RouteCookies;
use serde::{Deserialize, Serialize};

pub const CALLBACK_PARAM: &str = "callbackUrl";

/// A protected path prefix and the role allowed under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub prefix: String,
    pub role: UserRole,
    /// Where other roles are sent; the login page when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch_redirect: Option<String>,
}

impl RouteRule {
    pub fn new(prefix: &str, role: UserRole) -> Self {
        Self {
            prefix: prefix.to_string(),
            role,
            mismatch_redirect: None,
        }
    }

    pub fn redirect_mismatch_to(mut self, path: &str) -> Self {
        self.mismatch_redirect = Some(path.to_string());
        self
    }
}

/// Default page for a role after sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingPage {
    pub role: UserRole,
    pub path: String,
}

/// Where to send a redirected request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    /// Originally requested path, carried as `callbackUrl`
    pub callback: Option<String>,
    /// The session cookies carry no usable role and should be expired
    pub clear_session: bool,
}

impl Redirect {
    fn to(path: &str) -> Self {
        Self {
            path: path.to_string(),
            callback: None,
            clear_session: false,
        }
    }

    /// `Location` header value
    pub fn location(&self) -> String {
        match &self.callback {
            Some(callback) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair(CALLBACK_PARAM, callback)
                    .finish();
                let separator = if self.path.contains('?') { '&' } else { '?' };
                format!("{}{}{}", self.path, separator, query)
            }
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(Redirect),
}

impl RouteDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RouteDecision::Allow)
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            RouteDecision::Allow => None,
            RouteDecision::Redirect(redirect) => Some(redirect),
        }
    }
}

/// Route protection rules. Evaluation is pure: the same path and cookies
/// always give the same decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Landing page for sessions without a recognized role
    #[serde(default = "default_fallback_landing")]
    pub fallback_landing: String,

    /// Paths reachable without a session
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// Prefixes the guard never inspects (assets, API proxy, health)
    #[serde(default = "default_bypass_prefixes")]
    pub bypass_prefixes: Vec<String>,

    #[serde(default = "default_rules")]
    pub rules: Vec<RouteRule>,

    #[serde(default = "default_landing_pages")]
    pub landing_pages: Vec<LandingPage>,
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_public_paths() -> Vec<String> {
    ["/login", "/register", "/forgot-password"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_bypass_prefixes() -> Vec<String> {
    ["/api", "/static", "/assets", "/favicon.ico", "/health"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_rules() -> Vec<RouteRule> {
    vec![
        RouteRule::new("/dashboard", UserRole::SystemAdmin).redirect_mismatch_to("/client"),
        RouteRule::new("/client", UserRole::Landlord),
        RouteRule::new("/tenant", UserRole::Tenant),
        RouteRule::new("/manager", UserRole::Manager),
        RouteRule::new("/partner", UserRole::Partner),
    ]
}

fn default_landing_pages() -> Vec<LandingPage> {
    [
        (UserRole::SystemAdmin, "/dashboard"),
        (UserRole::Landlord, "/client"),
        (UserRole::Tenant, "/tenant"),
        (UserRole::Manager, "/manager"),
        (UserRole::Partner, "/partner"),
    ]
    .into_iter()
    .map(|(role, path)| LandingPage {
        role,
        path: path.to_string(),
    })
    .collect()
}

fn default_fallback_landing() -> String {
    "/client".to_string()
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            fallback_landing: default_fallback_landing(),
            public_paths: default_public_paths(),
            bypass_prefixes: default_bypass_prefixes(),
            rules: default_rules(),
            landing_pages: default_landing_pages(),
        }
    }
}

/// `path` equals `prefix` or continues it with a new segment
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl RouteTable {
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| matches_prefix(path, p))
    }

    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass_prefixes.iter().any(|p| matches_prefix(path, p))
    }

    /// Most specific rule covering `path`
    pub fn rule_for(&self, path: &str) -> Option<&RouteRule> {
        self.rules
            .iter()
            .filter(|rule| matches_prefix(path, &rule.prefix))
            .max_by_key(|rule| rule.prefix.len())
    }

    /// Default landing page for a role
    pub fn landing_for(&self, role: Option<UserRole>) -> &str {
        role.and_then(|role| self.landing_pages.iter().find(|page| page.role == role))
            .map(|page| page.path.as_str())
            .unwrap_or(&self.fallback_landing)
    }

    /// Decide whether a navigation to `target` proceeds.
    ///
    /// `target` is a path with an optional query; rules match the path only and
    /// the login redirect carries the whole target back as `callbackUrl`.
    pub fn decide(&self, target: &str, cookies: &RouteCookies) -> RouteDecision {
        let path = target.split_once('?').map_or(target, |(path, _)| path);

        if self.is_bypassed(path) {
            return RouteDecision::Allow;
        }

        let authenticated = cookies.is_authenticated();
        let role = cookies.role();

        if self.is_public(path) {
            if !authenticated {
                return RouteDecision::Allow;
            }
            return RouteDecision::Redirect(Redirect::to(self.signed_in_landing(role, cookies)));
        }

        if !authenticated {
            return RouteDecision::Redirect(Redirect {
                path: self.login_path.clone(),
                callback: Some(target.to_string()),
                clear_session: false,
            });
        }

        if role.is_some_and(|r| r.is_admin()) {
            return RouteDecision::Allow;
        }

        if let Some(rule) = self.rule_for(path) {
            if role != Some(rule.role) {
                let target = rule.mismatch_redirect.as_deref().unwrap_or(&self.login_path);
                return RouteDecision::Redirect(Redirect {
                    path: target.to_string(),
                    callback: None,
                    clear_session: role.is_none(),
                });
            }
        }

        RouteDecision::Allow
    }

    /// Landing page for a signed-in session hitting a public page
    fn signed_in_landing<'a>(&'a self, role: Option<UserRole>, cookies: &'a RouteCookies) -> &'a str {
        if role == Some(UserRole::SystemAdmin) {
            if let Some(preferred) = cookies
                .preferred_landing_page
                .as_deref()
                .filter(|p| self.is_safe_landing(p))
            {
                return preferred;
            }
        }
        self.landing_for(role)
    }

    /// Same-origin path that would not bounce back to a public page
    fn is_safe_landing(&self, path: &str) -> bool {
        path.starts_with('/') && !path.starts_with("//") && !self.is_public(path)
    }
}
