use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

static UUID_V4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}")
        .expect("UUID v4 pattern compiles")
});

/// Makes `key` process-unique by appending a fresh UUID v4.
///
/// Idempotent: a key that already carries a UUID v4 is returned unchanged. Underscores in
/// the short key are replaced with `-` because anchor ids use `_` as their separator.
pub fn attach_unique_suffix(key: &str) -> String {
    if UUID_V4.is_match(key) {
        return key.to_string();
    }
    format!("{}-{}", key.replace('_', "-"), Uuid::new_v4())
}

/// Turns a display name into a lowercase, dash-separated identifier.
pub fn format_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
