//! Input checks shared by commands

use uuid::Uuid;

/// Hyphenated GUID, e.g. `68be84bf-a585-4776-80b3-30aa5207aa21`
pub fn is_valid_guid(value: &str) -> bool {
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}

/// Split a comma-separated option value, trimming each entry
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}
