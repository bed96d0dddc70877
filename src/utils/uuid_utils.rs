use uuid::Uuid;

/// Parses a full UUID typed by the user
pub fn validate_uuid(uuid_str: &str) -> Result<Uuid, String> {
    Uuid::parse_str(uuid_str.trim()).map_err(|e| format!("Invalid UUID: {}", e))
}

/// First block of the hyphenated form, enough to tell records apart on screen
pub fn short_id(id: Uuid) -> String {
    let hyphenated = id.hyphenated().to_string();
    hyphenated
        .split('-')
        .next()
        .unwrap_or_default()
        .to_string()
}
