//! Object references (CURIEs) and their MOO expression forms

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::MoorError;
use crate::literal::escape_string;

/// A remote object named by id, by system-object property, or by fuzzy match
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// `oid:42` or `#42`
    ByOid(i64),
    /// `sysobj:room` or `$room`
    BySysobjName(String),
    /// Anything else, matched by the server at evaluation time
    ByMatch(String),
}

/// Parse a reference string
///
/// `oid:<int>` and `sysobj:<name>` are the recognised schemes; the rendered
/// forms `#<int>` and `$<name>` are accepted too. Any other input, including
/// unknown schemes such as `uuid:...`, becomes a [`Reference::ByMatch`] of the
/// whole (trimmed) string.
pub fn resolve(curie: &str) -> Result<Reference, MoorError> {
    debug!(%curie, "resolve: called");
    let curie = curie.trim();
    if curie.is_empty() {
        return Err(MoorError::invalid_reference("object identifier must not be empty"));
    }

    match curie.split_once(':') {
        Some(("oid", id)) => parse_oid(id)
            .map(Reference::ByOid)
            .ok_or_else(|| MoorError::invalid_reference(format!("invalid object id in '{}'", curie))),
        Some(("sysobj", name)) if name.is_empty() => Err(MoorError::invalid_reference(format!(
            "missing system object name in '{}'",
            curie
        ))),
        Some(("sysobj", name)) => Ok(Reference::BySysobjName(name.to_string())),
        _ => Ok(resolve_rendered(curie).unwrap_or_else(|| Reference::ByMatch(curie.to_string()))),
    }
}

fn parse_oid(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn resolve_rendered(text: &str) -> Option<Reference> {
    if let Some(id) = text.strip_prefix('#') {
        return parse_oid(id).map(Reference::ByOid);
    }
    if let Some(name) = text.strip_prefix('$')
        && is_identifier(name)
    {
        return Some(Reference::BySysobjName(name.to_string()));
    }
    None
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

impl Reference {
    /// Render as a MOO expression denoting the object
    pub fn render(&self) -> String {
        match self {
            Self::ByOid(id) => format!("#{}", id),
            Self::BySysobjName(name) if is_identifier(name) => format!("${}", name),
            // `$name` is sugar for `#0.name`; names that are not identifiers need the dynamic form
            Self::BySysobjName(name) => format!("#0.({})", escape_string(name)),
            Self::ByMatch(text) => format!("match({})", escape_string(text)),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for Reference {
    type Err = MoorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}

/// Pull an object CURIE out of a property or evaluation payload
///
/// Object values come back either as `{"obj": "oid:1"}` or wrapped in a
/// property record as `{"value": {"obj": "oid:1"}}`.
pub fn extract_obj_curie(payload: &Value) -> Option<&str> {
    let map = payload.as_object()?;
    if let Some(obj) = map.get("obj").and_then(Value::as_str) {
        return Some(obj);
    }
    map.get("value")?.get("obj")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_resolve_oid() {
        let reference = resolve("oid:42").unwrap();
        assert_eq!(reference, Reference::ByOid(42));
        assert_eq!(reference.render(), "#42");
        assert_eq!(resolve("oid:-1").unwrap().render(), "#-1");
    }

    #[test]
    fn test_resolve_sysobj() {
        let reference = resolve("sysobj:wiz_utils").unwrap();
        assert_eq!(reference, Reference::BySysobjName("wiz_utils".to_string()));
        assert_eq!(reference.render(), "$wiz_utils");
    }

    #[test]
    fn test_resolve_bare_string_is_match() {
        let reference = resolve("bob").unwrap();
        assert_eq!(reference, Reference::ByMatch("bob".to_string()));
        assert_eq!(reference.render(), r#"match("bob")"#);
    }

    #[test]
    fn test_resolve_unknown_scheme_keeps_whole_string() {
        let reference = resolve("uuid:0a1b-2c3d").unwrap();
        assert_eq!(reference, Reference::ByMatch("uuid:0a1b-2c3d".to_string()));
        assert_eq!(reference.render(), r#"match("uuid:0a1b-2c3d")"#);
    }

    #[test]
    fn test_resolve_rejects_bad_oid() {
        let err = resolve("oid:notanumber").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidReference);
        assert!(resolve("oid:").is_err());
        assert!(resolve("oid:+5").is_err());
        assert!(resolve("oid:99999999999999999999").is_err());
    }

    #[test]
    fn test_resolve_rejects_empty() {
        assert_eq!(resolve("   ").unwrap_err().kind, ErrorKind::InvalidReference);
        assert_eq!(resolve("sysobj:").unwrap_err().kind, ErrorKind::InvalidReference);
    }

    #[test]
    fn test_resolve_rendered_forms() {
        assert_eq!(resolve(" #12 ").unwrap(), Reference::ByOid(12));
        assert_eq!(resolve("$room").unwrap(), Reference::BySysobjName("room".to_string()));
        assert_eq!(resolve("#abc").unwrap(), Reference::ByMatch("#abc".to_string()));
        assert_eq!(resolve("$").unwrap(), Reference::ByMatch("$".to_string()));
    }

    #[test]
    fn test_match_text_is_escaped() {
        let reference = resolve(r#"the "big" \ box"#).unwrap();
        assert_eq!(reference.render(), r#"match("the \"big\" \\ box")"#);
    }

    #[test]
    fn test_odd_sysobj_name_uses_dynamic_lookup() {
        let reference = resolve("sysobj:my room").unwrap();
        assert_eq!(reference.render(), r##"#0.("my room")"##);
    }

    #[test]
    fn test_from_str() {
        let reference: Reference = "oid:7".parse().unwrap();
        assert_eq!(reference.to_string(), "#7");
    }

    #[test]
    fn test_extract_obj_curie() {
        assert_eq!(extract_obj_curie(&json!({"obj": "oid:3"})), Some("oid:3"));
        assert_eq!(
            extract_obj_curie(&json!({"name": "owner", "value": {"obj": "oid:9"}})),
            Some("oid:9")
        );
        assert_eq!(extract_obj_curie(&json!({"value": 5})), None);
        assert_eq!(extract_obj_curie(&json!("oid:3")), None);
    }
}
