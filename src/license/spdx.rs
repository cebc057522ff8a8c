/// Identifiers a source may report when it found license text but could not
/// map it to an SPDX identifier.
const UNCLASSIFIED: &[&str] = &["NOASSERTION"];

/// `true` when `id` carries no usable license identifier.
pub fn is_unclassified(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || UNCLASSIFIED.iter().any(|s| s.eq_ignore_ascii_case(id))
}

/// Map display names that stand for exactly one SPDX identifier. Anything
/// else, including version-less names like "BSD" or "GPL", is kept as is.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed {
        "Apache 2.0" | "Apache License 2.0" | "Apache License, Version 2.0" => {
            "Apache-2.0".to_string()
        }
        "MIT License" | "The MIT License" => "MIT".to_string(),
        "Mozilla Public License 2.0" => "MPL-2.0".to_string(),
        "ISC License" => "ISC".to_string(),
        other => other.to_string(),
    }
}
