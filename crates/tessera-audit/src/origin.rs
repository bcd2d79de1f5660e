//! Ambient origin metadata attached to every logged action.

use tessera_config::OriginSettings;
use tessera_contracts::event::Origin;

/// Placeholder used when neither configuration nor environment names a value.
pub const UNKNOWN: &str = "unknown";

const HOST_VARS: &[&str] = &["HOSTNAME", "COMPUTERNAME"];
const USER_VARS: &[&str] = &["USER", "USERNAME", "LOGNAME"];

/// Resolve origin from configuration, then the process environment.
pub fn detect_origin(settings: &OriginSettings) -> Origin {
    resolve_origin(settings, |name| std::env::var(name).ok())
}

/// Resolve origin using `lookup` in place of the process environment.
pub fn resolve_origin<F>(settings: &OriginSettings, lookup: F) -> Origin
where
    F: Fn(&str) -> Option<String>,
{
    let first_set = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
    };

    let host = settings
        .host
        .clone()
        .or_else(|| first_set(HOST_VARS))
        .unwrap_or_else(|| UNKNOWN.to_string());
    let user = settings
        .user
        .clone()
        .or_else(|| first_set(USER_VARS))
        .unwrap_or_else(|| UNKNOWN.to_string());

    Origin { host, user }
}
