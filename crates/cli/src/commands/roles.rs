//! Permission matrix inspection. No database needed.

use salon_core::{Action, PermissionArea, Role, actions_for, has_permission_named};

/// Print the capability table for one role or all of them.
#[allow(clippy::print_stdout)]
pub fn print_matrix(role: Option<Role>) {
    let roles = role.map_or_else(|| Role::ALL.to_vec(), |role| vec![role]);

    for role in roles {
        let info = role.info();
        println!("{} ({role})", info.label);
        println!("  {}", info.description);

        for area in PermissionArea::ALL {
            let actions = actions_for(role, area);
            if actions.is_empty() {
                continue;
            }
            let names: Vec<&str> = actions.iter().map(Action::as_str).collect();
            println!("  {:<22} {}", area.as_str(), names.join(", "));
        }
        println!();
    }
}

/// Print and return whether `role` may perform `action` on `area`.
///
/// Unknown names are denied.
#[allow(clippy::print_stdout)]
pub fn check(role: &str, area: &str, action: &str) -> bool {
    let allowed = has_permission_named(role, area, action);
    println!("{role} {action} {area}: {}", if allowed { "allowed" } else { "denied" });
    allowed
}
