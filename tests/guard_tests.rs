//! Route guard decision tests
//!
//! Exhaustive over roles and protected prefixes of the default table.

use rentgate::auth::UserRole;
use rentgate::guard::{Redirect, RouteCookies, RouteDecision, RouteTable};

const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/dashboard",
    "/dashboard/commissions",
    "/client",
    "/client/properties/12/units",
    "/tenant/payments",
    "/manager",
    "/partner/referrals",
    "/settings",
];

const PUBLIC_PATHS: &[&str] = &["/login", "/register", "/forgot-password"];

fn signed_in(role: UserRole) -> RouteCookies {
    RouteCookies {
        token: Some("tok".to_string()),
        user_type: Some(role.as_str().to_string()),
        preferred_landing_page: None,
    }
}

fn redirect_path(decision: &RouteDecision) -> &str {
    decision
        .redirect()
        .map(|r| r.path.as_str())
        .expect("expected a redirect")
}

#[test]
fn test_unauthenticated_protected_paths_go_to_login_with_callback() {
    let table = RouteTable::default();
    let anonymous = [
        RouteCookies::default(),
        RouteCookies::parse("token=; userType=landlord"),
        RouteCookies::parse("userType=system_admin"),
    ];

    for cookies in &anonymous {
        for path in PROTECTED_PATHS {
            assert_eq!(
                table.decide(path, cookies),
                RouteDecision::Redirect(Redirect {
                    path: "/login".to_string(),
                    callback: Some(path.to_string()),
                    clear_session: false,
                }),
                "path {}",
                path
            );
        }
    }
}

#[test]
fn test_unauthenticated_public_paths_allowed() {
    let table = RouteTable::default();
    for path in PUBLIC_PATHS {
        assert!(table.decide(path, &RouteCookies::default()).is_allowed());
    }
}

#[test]
fn test_admin_preferred_landing_page() {
    let table = RouteTable::default();
    let mut cookies = signed_in(UserRole::SystemAdmin);
    cookies.preferred_landing_page = Some("/dashboard/payments".to_string());

    for path in PUBLIC_PATHS {
        let decision = table.decide(path, &cookies);
        assert_eq!(redirect_path(&decision), "/dashboard/payments");
    }
}

#[test]
fn test_admin_without_preference_lands_on_dashboard() {
    let table = RouteTable::default();
    let decision = table.decide("/login", &signed_in(UserRole::SystemAdmin));
    assert_eq!(redirect_path(&decision), "/dashboard");
}

#[test]
fn test_preference_ignored_for_other_roles() {
    let table = RouteTable::default();
    let mut cookies = signed_in(UserRole::Tenant);
    cookies.preferred_landing_page = Some("/dashboard".to_string());

    let decision = table.decide("/login", &cookies);
    assert_eq!(redirect_path(&decision), "/tenant");
}

#[test]
fn test_signed_in_public_paths_go_to_role_landing() {
    let table = RouteTable::default();
    let expected = [
        (UserRole::SystemAdmin, "/dashboard"),
        (UserRole::Landlord, "/client"),
        (UserRole::Tenant, "/tenant"),
        (UserRole::Manager, "/manager"),
        (UserRole::Partner, "/partner"),
    ];

    for (role, landing) in expected {
        for path in PUBLIC_PATHS {
            let decision = table.decide(path, &signed_in(role));
            assert_eq!(redirect_path(&decision), landing, "{} on {}", role, path);
        }
    }
}

#[test]
fn test_unknown_role_lands_on_landlord_portal() {
    let table = RouteTable::default();
    let cookies = RouteCookies::parse("token=tok; userType=owner");
    assert_eq!(redirect_path(&table.decide("/login", &cookies)), "/client");

    let cookies = RouteCookies::parse("token=tok");
    assert_eq!(redirect_path(&table.decide("/register", &cookies)), "/client");
}

#[test]
fn test_admin_allowed_everywhere() {
    let table = RouteTable::default();
    for path in PROTECTED_PATHS {
        assert!(
            table.decide(path, &signed_in(UserRole::SystemAdmin)).is_allowed(),
            "admin blocked from {}",
            path
        );
    }
}

#[test]
fn test_role_mismatch_never_allowed() {
    let table = RouteTable::default();

    for rule in &table.rules {
        for role in UserRole::ALL {
            if role == rule.role || role.is_admin() {
                continue;
            }
            for path in [rule.prefix.clone(), format!("{}/deep/link", rule.prefix)] {
                let decision = table.decide(&path, &signed_in(role));
                let target = redirect_path(&decision);
                assert!(
                    !target.starts_with(&rule.prefix),
                    "{} sent back into {}",
                    role,
                    rule.prefix
                );
            }
        }
    }
}

#[test]
fn test_non_admin_on_admin_dashboard_goes_to_client() {
    let table = RouteTable::default();
    for role in [UserRole::Landlord, UserRole::Tenant, UserRole::Manager, UserRole::Partner] {
        let decision = table.decide("/dashboard/users", &signed_in(role));
        assert_eq!(redirect_path(&decision), "/client");
        assert!(decision.redirect().unwrap().callback.is_none());
    }
}

#[test]
fn test_other_mismatches_go_to_login() {
    let table = RouteTable::default();
    let cases = [
        (UserRole::Tenant, "/client/properties"),
        (UserRole::Landlord, "/tenant"),
        (UserRole::Manager, "/partner"),
        (UserRole::Partner, "/manager/tasks"),
    ];

    for (role, path) in cases {
        let decision = table.decide(path, &signed_in(role));
        let redirect = decision.redirect().unwrap();
        assert_eq!(redirect.path, "/login");
        assert!(!redirect.clear_session);
    }
}

#[test]
fn test_matching_role_allowed() {
    let table = RouteTable::default();
    for rule in &table.rules {
        let path = format!("{}/anything", rule.prefix);
        assert!(table.decide(&path, &signed_in(rule.role)).is_allowed());
    }
}

#[test]
fn test_unprotected_prefix_allowed_for_any_signed_in_role() {
    let table = RouteTable::default();
    for role in UserRole::ALL {
        assert!(table.decide("/settings/profile", &signed_in(role)).is_allowed());
    }
}

#[test]
fn test_mismatch_redirect_targets_are_stable() {
    // Following redirects settles on an allowed page for every known role
    let table = RouteTable::default();

    for role in UserRole::ALL {
        let cookies = signed_in(role);
        let mut path = "/dashboard/reports".to_string();
        for _ in 0..4 {
            match table.decide(&path, &cookies) {
                RouteDecision::Allow => break,
                RouteDecision::Redirect(redirect) => path = redirect.path,
            }
        }
        assert!(table.decide(&path, &cookies).is_allowed(), "{} loops", role);
    }
}

#[test]
fn test_decision_is_pure() {
    let table = RouteTable::default();
    let cookies = signed_in(UserRole::Tenant);
    let first = table.decide("/client", &cookies);
    for _ in 0..10 {
        assert_eq!(table.decide("/client", &cookies), first);
    }
}

#[test]
fn test_custom_rule_from_toml() {
    let table: RouteTable = toml::from_str(
        r#"
login_path = "/signin"
public_paths = ["/signin"]

[[rules]]
prefix = "/owners"
role = "landlord"
"#,
    )
    .unwrap();

    let decision = table.decide("/owners/1", &RouteCookies::default());
    assert_eq!(decision.redirect().unwrap().location(), "/signin?callbackUrl=%2Fowners%2F1");

    let decision = table.decide("/owners/1", &signed_in(UserRole::Tenant));
    assert_eq!(redirect_path(&decision), "/signin");
}
