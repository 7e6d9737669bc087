//! Naming - Logical ID sanitization and name composition

use crate::template::TemplateError;

/// Convert an arbitrary name into a CloudFormation logical ID
///
/// Logical IDs must be alphanumeric, so the name is split on every other
/// character and the parts are joined in PascalCase:
/// `chef-deregistration_acme_prod` -> `ChefDeregistrationAcmeProd`
pub fn sanitize_id(name: &str) -> Result<String, TemplateError> {
    let id: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .map(capitalize_first)
        .collect();

    if id.is_empty() {
        return Err(TemplateError::InvalidLogicalId(name.to_string()));
    }
    Ok(id)
}

/// Join a prefix and the name parts with a separator
/// e.g., `join_name("babysitter", &["acme", "prod"], '.')` -> `babysitter.acme.prod`
pub fn join_name(prefix: &str, parts: &[&str], separator: char) -> String {
    let mut name = prefix.to_string();
    for part in parts {
        name.push(separator);
        name.push_str(part);
    }
    name
}

/// Capitalize first letter of a string
/// e.g., "deregistration" -> "Deregistration"
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
