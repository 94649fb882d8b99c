use super::type_ref::{IntrospectionTypeRef, TypeKind};
use serde::{Deserialize, Deserializer, Serialize};

/// The operation name of [INTROSPECTION_QUERY].
pub const INTROSPECTION_OPERATION_NAME: &str = "IntrospectionQuery";

/// The query that's sent to a remote service to reconstruct its schema.
///
/// Type references are requested up to eight levels deep, which covers wrapping types such as
/// `[[String!]!]!`.
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      ...FullType
    }
    directives {
      name
      description
      locations
      args {
        ...InputValue
      }
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
    isDeprecated
    deprecationReason
  }
  inputFields {
    ...InputValue
  }
  interfaces {
    ...TypeRef
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
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
        ofType {
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
      }
    }
  }
}
"#;

/// The `data` payload of a response to [INTROSPECTION_QUERY].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IntrospectionQuery {
    #[serde(rename = "__schema", default)]
    pub schema: Option<IntrospectionSchema>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    #[serde(default)]
    pub query_type: Option<IntrospectionNamedTypeRef>,
    #[serde(default)]
    pub mutation_type: Option<IntrospectionNamedTypeRef>,
    #[serde(default)]
    pub subscription_type: Option<IntrospectionNamedTypeRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub types: Vec<IntrospectionType>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub directives: Vec<IntrospectionDirective>,
}

impl IntrospectionSchema {
    /// Returns the name of the root query type or an empty string if none was reported.
    #[inline]
    pub fn query_type_name(&self) -> &str {
        named(&self.query_type)
    }

    #[inline]
    pub fn mutation_type_name(&self) -> &str {
        named(&self.mutation_type)
    }

    #[inline]
    pub fn subscription_type_name(&self) -> &str {
        named(&self.subscription_type)
    }
}

/// Decodes a list that may be reported as `null` into an empty list.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[inline]
fn named(type_ref: &Option<IntrospectionNamedTypeRef>) -> &str {
    type_ref
        .as_ref()
        .and_then(|type_ref| type_ref.name.as_deref())
        .unwrap_or("")
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionNamedTypeRef {
    #[serde(default)]
    pub kind: Option<TypeKind>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A type as reported by the `__Type` introspection type, flattened across all kinds.
///
/// Lists that don't apply to a given kind are reported as `null` and deserialize to `None`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionType {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<IntrospectionField>>,
    #[serde(default)]
    pub input_fields: Option<Vec<IntrospectionInputValue>>,
    #[serde(default)]
    pub interfaces: Option<Vec<IntrospectionTypeRef>>,
    #[serde(default)]
    pub enum_values: Option<Vec<IntrospectionEnumValue>>,
    #[serde(default)]
    pub possible_types: Option<Vec<IntrospectionTypeRef>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionField {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub args: Vec<IntrospectionInputValue>,
    #[serde(rename = "type")]
    pub of_type: IntrospectionTypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionInputValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub of_type: IntrospectionTypeRef,
    /// The default value printed as GraphQL source text.
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionEnumValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

/// A directive as reported by the `__Directive` introspection type.
///
/// Locations are kept as raw strings and are only checked when the schema is built, so that an
/// unknown location surfaces as an error rather than a failure to decode the response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionDirective {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub locations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub args: Vec<IntrospectionInputValue>,
}
