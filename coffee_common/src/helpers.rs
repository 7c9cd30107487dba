/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Returns true if the value is one of the conventional "switch this off" words (`none`, `false`, `0`, `off`).
pub fn is_disabled_value(value: &str) -> bool {
    ["none", "false", "0", "off"].contains(&value.trim().to_ascii_lowercase().as_str())
}

/// Splits a comma-separated configuration value into trimmed, non-empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}
