//! Kubernetes object naming rules
//!
//! Each function returns the list of violations; an empty list means the
//! value is valid.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

/// Maximum length of a DNS-1123 subdomain (object names, label prefixes)
pub const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;

/// Maximum length of a DNS-1123 label (namespaces)
pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;

/// Maximum length of the name part of a qualified name and of a label value
pub const QUALIFIED_NAME_MAX_LENGTH: usize = 63;

/// Maximum combined size of all annotation keys and values (256 KiB)
pub const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * 1024;

lazy_static! {
    static ref DNS1123_SUBDOMAIN: Regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap();
    static ref DNS1123_LABEL: Regex = Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap();
    static ref QUALIFIED_NAME: Regex =
        Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").unwrap();
}

/// Validate an object name (RFC 1123 subdomain)
pub fn validate_name(value: &str) -> Vec<String> {
    is_dns1123_subdomain(value)
}

/// Validate a namespace name (RFC 1123 label)
pub fn validate_namespace(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        errors.push(format!(
            "must be no more than {} characters",
            DNS1123_LABEL_MAX_LENGTH
        ));
    }
    if !DNS1123_LABEL.is_match(value) {
        errors.push(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errors
}

/// Validate a label map: qualified-name keys and short values
pub fn validate_labels(labels: &BTreeMap<String, String>) -> Vec<String> {
    let mut errors = Vec::new();
    for (key, value) in labels {
        for err in is_qualified_name(key) {
            errors.push(format!("label key '{}': {}", key, err));
        }
        for err in is_valid_label_value(value) {
            errors.push(format!("label value '{}' for key '{}': {}", value, key, err));
        }
    }
    errors
}

/// Validate an annotation map: qualified-name keys and a total size limit
pub fn validate_annotations(annotations: &BTreeMap<String, String>) -> Vec<String> {
    let mut errors = Vec::new();
    let mut total_size = 0;
    for (key, value) in annotations {
        for err in is_qualified_name(&key.to_lowercase()) {
            errors.push(format!("annotation key '{}': {}", key, err));
        }
        total_size += key.len() + value.len();
    }
    if total_size > TOTAL_ANNOTATION_SIZE_LIMIT {
        errors.push(format!(
            "annotations are too long: must have at most {} bytes, got {}",
            TOTAL_ANNOTATION_SIZE_LIMIT, total_size
        ));
    }
    errors
}

fn is_dns1123_subdomain(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        errors.push(format!(
            "must be no more than {} characters",
            DNS1123_SUBDOMAIN_MAX_LENGTH
        ));
    }
    if !DNS1123_SUBDOMAIN.is_match(value) {
        errors.push(
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, \
             '-' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errors
}

fn is_qualified_name(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let parts: Vec<&str> = value.split('/').collect();
    let name = match parts.as_slice() {
        [name] => *name,
        [prefix, name] => {
            if prefix.is_empty() {
                errors.push("prefix part must be non-empty".to_string());
            } else {
                for err in is_dns1123_subdomain(prefix) {
                    errors.push(format!("prefix part {}", err));
                }
            }
            *name
        }
        _ => {
            errors.push(
                "a qualified name must consist of alphanumeric characters, '-', '_' or '.', \
                 with an optional DNS subdomain prefix and '/'"
                    .to_string(),
            );
            return errors;
        }
    };

    if name.is_empty() {
        errors.push("name part must be non-empty".to_string());
    } else if name.len() > QUALIFIED_NAME_MAX_LENGTH {
        errors.push(format!(
            "name part must be no more than {} characters",
            QUALIFIED_NAME_MAX_LENGTH
        ));
    }
    if !name.is_empty() && !QUALIFIED_NAME.is_match(name) {
        errors.push(
            "name part must consist of alphanumeric characters, '-', '_' or '.', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errors
}

fn is_valid_label_value(value: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if value.len() > QUALIFIED_NAME_MAX_LENGTH {
        errors.push(format!(
            "must be no more than {} characters",
            QUALIFIED_NAME_MAX_LENGTH
        ));
    }
    if !value.is_empty() && !QUALIFIED_NAME.is_match(value) {
        errors.push(
            "a valid label must be an empty string or consist of alphanumeric characters, \
             '-', '_' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn accepts_valid_names() {
        for name in ["demo", "my-app", "a", "app.example.com", "0abc"] {
            assert!(validate_name(name).is_empty(), "{} should be valid", name);
        }
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "Demo", "-demo", "demo-", "demo_app", "demo..app", "a/b"] {
            assert!(!validate_name(name).is_empty(), "{} should be invalid", name);
        }
    }

    #[test]
    fn rejects_names_over_253_characters() {
        let name = "a".repeat(254);
        let errors = validate_name(&name);
        assert!(errors.iter().any(|e| e.contains("253")));
    }

    #[test]
    fn namespaces_are_labels_not_subdomains() {
        assert!(validate_namespace("kube-system").is_empty());
        assert!(!validate_namespace("kube.system").is_empty());
        assert!(!validate_namespace(&"a".repeat(64)).is_empty());
    }

    #[test]
    fn accepts_prefixed_label_keys() {
        let labels = map(&[
            ("app.kubernetes.io/name", "postgres"),
            ("tier", ""),
            ("team_name", "A.b-c_d"),
        ]);
        assert!(validate_labels(&labels).is_empty());
    }

    #[test]
    fn rejects_bad_label_keys_and_values() {
        let errors = validate_labels(&map(&[("/name", "x")]));
        assert!(errors.iter().any(|e| e.contains("prefix part must be non-empty")));

        let errors = validate_labels(&map(&[("a/b/c", "x")]));
        assert_eq!(errors.len(), 1);

        let errors = validate_labels(&map(&[("app", "-bad")]));
        assert!(errors.iter().any(|e| e.contains("label value")));

        let long = "v".repeat(64);
        let errors = validate_labels(&map(&[("app", long.as_str())]));
        assert!(errors.iter().any(|e| e.contains("63")));
    }

    #[test]
    fn annotation_values_are_free_form() {
        let annotations = map(&[("example.com/Note", "Anything goes: {\"a\": 1}")]);
        assert!(validate_annotations(&annotations).is_empty());
    }

    #[test]
    fn annotations_have_a_total_size_limit() {
        let big = "x".repeat(TOTAL_ANNOTATION_SIZE_LIMIT);
        let errors = validate_annotations(&map(&[("note", big.as_str())]));
        assert!(errors.iter().any(|e| e.contains("too long")));
    }
}
