use super::SchemaDocument;
use serde::Serialize;
use serde_json::Value;

pub const SENSITIVE_KEYWORDS: &[&str] = &["delete", "update", "remove", "admin", "password"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationFinding {
    pub name: String,
    pub sensitive: bool,
}

pub fn is_sensitive(name: &str) -> bool {
    let lower = name.to_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Mutation fields in schema-declared order, each flagged against the
/// keyword set. A schema without a mutation root yields nothing.
pub fn extract_mutations(doc: &SchemaDocument) -> Vec<MutationFinding> {
    let Some(fields) = doc
        .get_mutation_type()
        .and_then(|t| t.get("fields"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    fields
        .iter()
        .filter_map(|f| f.get("name").and_then(Value::as_str))
        .map(|name| MutationFinding {
            name: name.to_string(),
            sensitive: is_sensitive(name),
        })
        .collect()
}
