use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a type as reported by the `__TypeKind` introspection enum.
///
/// [Reference](https://spec.graphql.org/October2021/#sec-The-__Type-Type)
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// A wire-format type reference, nesting wrapping types via `ofType`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionTypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<IntrospectionTypeRef>>,
}

/// A normalized type expression for fields, arguments, and input fields.
///
/// Wrapping types are kept in the exact order they were reported in, so `[String]!` is a
/// `NonNullType(ListType(Type("String")))`.
/// [Reference](https://spec.graphql.org/October2021/#sec-Wrapping-Types)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Type(String),
    ListType(Box<TypeRef>),
    NonNullType(Box<TypeRef>),
}

impl TypeRef {
    /// Returns the name of the innermost named type.
    pub fn of_type(&self) -> &str {
        match self {
            TypeRef::Type(name) => name,
            TypeRef::ListType(of_type) | TypeRef::NonNullType(of_type) => of_type.of_type(),
        }
    }

    #[inline]
    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNullType(_))
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        match self {
            TypeRef::ListType(_) => true,
            TypeRef::NonNullType(of_type) => of_type.is_list(),
            TypeRef::Type(_) => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Type(name) => f.write_str(name),
            TypeRef::ListType(of_type) => write!(f, "[{}]", of_type),
            TypeRef::NonNullType(of_type) => write!(f, "{}!", of_type),
        }
    }
}

#[inline]
fn name_of(type_ref: Option<&IntrospectionTypeRef>) -> String {
    type_ref
        .and_then(|type_ref| type_ref.name.clone())
        .unwrap_or_default()
}

impl From<&IntrospectionTypeRef> for TypeRef {
    /// Resolves a wire reference into a [TypeRef].
    ///
    /// A `NON_NULL` wrapping a `LIST` has to be matched before the plain `LIST` and `NON_NULL`
    /// cases, since it's the only case that descends two levels before recursing.
    fn from(type_ref: &IntrospectionTypeRef) -> Self {
        let of_type = type_ref.of_type.as_deref();
        match (type_ref.kind, of_type) {
            (TypeKind::NonNull, Some(list)) if list.kind == TypeKind::List => {
                let inner = match list.of_type.as_deref() {
                    Some(inner) => TypeRef::from(inner),
                    None => TypeRef::Type(String::new()),
                };
                TypeRef::NonNullType(Box::new(TypeRef::ListType(Box::new(inner))))
            }
            (TypeKind::List, of_type) => {
                let inner = match of_type {
                    Some(inner) => TypeRef::from(inner),
                    None => TypeRef::Type(String::new()),
                };
                TypeRef::ListType(Box::new(inner))
            }
            (TypeKind::NonNull, of_type) => {
                TypeRef::NonNullType(Box::new(TypeRef::Type(name_of(of_type))))
            }
            _ => TypeRef::Type(name_of(Some(type_ref))),
        }
    }
}
