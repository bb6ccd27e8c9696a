use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

pub const CAPABILITY_QUERY: &str = "{ __schema { queryType { name } } }";

/// Full schema dump. Type references unwrap three levels of `ofType`, enough
/// for `[Type!]!`; deeper wrappers come back truncated.
pub const FULL_INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
    __schema {
        queryType { name }
        mutationType { name }
        subscriptionType { name }
        types {
            ...FullType
        }
    }
}

fragment FullType on __Type {
    kind
    name
    description
    fields(includeDeprecated: true) {
        name
        description
        args {
            ...InputValue
        }
        type {
            ...TypeRef
        }
    }
    inputFields {
        ...InputValue
    }
    enumValues {
        name
        description
    }
    possibleTypes {
        ...TypeRef
    }
}

fragment InputValue on __InputValue {
    name
    description
    type {
        ...TypeRef
    }
    defaultValue
}

fragment TypeRef on __Type {
    kind
    name
    ofType {
        kind
        name
        ofType {
            kind
            name
            ofType {
                kind
                name
            }
        }
    }
}
"#;

/// Raw introspection response body. Read-only once parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaDocument(Value);

impl SchemaDocument {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(raw)?))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn schema(&self) -> Option<&Value> {
        self.0.get("data")?.get("__schema")
    }

    pub fn mutation_type_name(&self) -> Option<&str> {
        self.schema()?.get("mutationType")?.get("name")?.as_str()
    }

    pub fn get_type(&self, name: &str) -> Option<&Value> {
        self.schema()?
            .get("types")?
            .as_array()?
            .iter()
            .find(|t| t.get("name").and_then(Value::as_str) == Some(name))
    }

    pub fn get_mutation_type(&self) -> Option<&Value> {
        self.get_type(self.mutation_type_name()?)
    }

    pub fn type_count(&self) -> usize {
        self.schema()
            .and_then(|s| s.get("types"))
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.0.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_pretty_json()?)?;
        Ok(())
    }
}
