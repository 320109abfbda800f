//! Baseline auth modules
//!
//! Deliberately small modules that exercise the chain executor end to end:
//! `allow` and `deny` for policy composition, `header-token` for a shared
//! secret carried in the call property bag. None of them implement real
//! cryptography; hosts bring their own modules for that.

pub mod allow;
pub mod deny;
pub mod header_token;

pub use allow::AllowModule;
pub use deny::DenyModule;
pub use header_token::HeaderTokenModule;

use std::collections::BTreeMap;

/// Split a comma-separated option value into trimmed, non-empty items
pub(crate) fn split_list(options: &BTreeMap<String, String>, key: &str) -> Vec<String> {
    options
        .get(key)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
