use super::type_ref::{TypeKind, TypeRef};
use crate::error::{Error, ErrorType, Result};
use graphql_query::ast::OperationKind;
use hashbrown::HashMap;
use std::str::FromStr;

/// Names of the scalars and introspection types every GraphQL service defines implicitly.
pub const BUILT_IN_TYPES: [&str; 13] = [
    "ID",
    "Int",
    "Float",
    "String",
    "Boolean",
    "__Schema",
    "__Type",
    "__InputValue",
    "__TypeKind",
    "__DirectiveLocation",
    "__Field",
    "__EnumValue",
    "__Directive",
];

/// Names of the directives every GraphQL service defines implicitly.
pub const BUILT_IN_DIRECTIVES: [&str; 3] = ["skip", "include", "deprecated"];

/// Schema Definition
///
/// A schema as reconstructed from a remote service's introspection result. Types refer to each
/// other by name only; relationships between abstract and concrete types are kept in the
/// `possible_types` and `implements` indexes rather than on the types themselves.
/// [Reference](https://spec.graphql.org/October2021/#sec-Schema)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub(crate) query_type: String,
    pub(crate) mutation_type: Option<String>,
    pub(crate) subscription_type: Option<String>,
    pub(crate) types: HashMap<String, SchemaType>,
    pub(crate) directives: HashMap<String, SchemaDirective>,
    pub(crate) possible_types: HashMap<String, Vec<String>>,
    pub(crate) implements: HashMap<String, Vec<String>>,
}

impl Schema {
    /// Returns the root object type for query operations
    #[inline]
    pub fn query_type(&self) -> Option<&SchemaType> {
        self.types.get(&self.query_type)
    }

    /// Returns the root object type for mutation operations
    #[inline]
    pub fn mutation_type(&self) -> Option<&SchemaType> {
        self.mutation_type
            .as_ref()
            .and_then(|name| self.types.get(name))
    }

    /// Returns the root object type for subscription operations
    #[inline]
    pub fn subscription_type(&self) -> Option<&SchemaType> {
        self.subscription_type
            .as_ref()
            .and_then(|name| self.types.get(name))
    }

    /// Returns the appropriate object type depending on the passed operation kind
    #[inline]
    pub fn get_root_type(&self, operation_kind: OperationKind) -> Option<&SchemaType> {
        match operation_kind {
            OperationKind::Query => self.query_type(),
            OperationKind::Mutation => self.mutation_type(),
            OperationKind::Subscription => self.subscription_type(),
        }
    }

    /// Retrieves a kind by name from known schema types.
    #[inline]
    pub fn get_type(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    /// Retrieves a mutable type by name, e.g. to annotate a reconstructed schema.
    #[inline]
    pub fn get_type_mut(&mut self, name: &str) -> Option<&mut SchemaType> {
        self.types.get_mut(name)
    }

    /// Returns all known types, built-in types included.
    pub fn types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values()
    }

    /// Returns the types that the remote service defines itself, excluding built-in scalars and
    /// introspection types.
    pub fn user_types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values().filter(|schema_type| !schema_type.built_in)
    }

    /// Retrieves a directive definition by name.
    #[inline]
    pub fn get_directive(&self, name: &str) -> Option<&SchemaDirective> {
        self.directives.get(name)
    }

    pub fn directives(&self) -> impl Iterator<Item = &SchemaDirective> {
        self.directives.values()
    }

    /// Returns the names of the concrete types that may satisfy the given type.
    pub fn possible_types(&self, name: &str) -> &[String] {
        self.possible_types
            .get(name)
            .map(|types| types.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the names of the types the given type satisfies, including itself.
    pub fn implements(&self, name: &str) -> &[String] {
        self.implements
            .get(name)
            .map(|types| types.as_slice())
            .unwrap_or(&[])
    }

    /// Checks whether `concrete_type` is registered as a possible type of `abstract_type`.
    #[inline]
    pub fn is_possible_type(&self, abstract_type: &str, concrete_type: &str) -> bool {
        self.possible_types(abstract_type)
            .iter()
            .any(|name| name == concrete_type)
    }

    /// Checks whether a given type is a sub type of another.
    ///
    /// This is typically used for return types of fields. A return type may be any given sub type
    /// of the return type of said field.
    pub fn is_sub_type(&self, abstract_type: &SchemaType, sub_type: &SchemaType) -> bool {
        match abstract_type.kind {
            TypeKind::Union | TypeKind::Interface => {
                self.is_possible_type(&abstract_type.name, &sub_type.name)
            }
            TypeKind::Object => {
                sub_type.kind == TypeKind::Object && sub_type.name == abstract_type.name
            }
            _ => false,
        }
    }

    /// Registers `concrete_type` as a possible type of `abstract_type` unless it already is one.
    pub fn add_possible_type(&mut self, abstract_type: &str, concrete_type: &str) {
        add_once(&mut self.possible_types, abstract_type, concrete_type);
    }

    /// Registers `super_type` as a type that `sub_type` satisfies unless it already is one.
    pub fn add_implements(&mut self, sub_type: &str, super_type: &str) {
        add_once(&mut self.implements, sub_type, super_type);
    }
}

fn add_once(index: &mut HashMap<String, Vec<String>>, key: &str, value: &str) {
    match index.get_mut(key) {
        Some(values) => {
            if !values.iter().any(|name| name == value) {
                values.push(value.to_string());
            }
        }
        None => {
            index.insert(key.to_string(), vec![value.to_string()]);
        }
    }
}

/// A named type definition of any kind.
///
/// Fields are populated for objects, interfaces, and input objects (as input fields without
/// arguments). `types` lists the members of a union and stays empty for every other kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaType {
    pub kind: TypeKind,
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<SchemaField>,
    pub enum_values: Vec<SchemaEnumValue>,
    pub interfaces: Vec<String>,
    pub types: Vec<String>,
    pub built_in: bool,
}

impl SchemaType {
    pub fn new<S: Into<String>>(kind: TypeKind, name: S) -> Self {
        let name = name.into();
        SchemaType {
            kind,
            built_in: BUILT_IN_TYPES.contains(&name.as_str()),
            name,
            description: None,
            fields: Vec::new(),
            enum_values: Vec::new(),
            interfaces: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Get a known field by name
    pub fn get_field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks whether this type lists the given interface as implemented.
    #[inline]
    pub fn implements_interface(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|name| name == interface)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Union)
    }
}

/// A field of an object, interface, or input object type.
///
/// [Reference](https://spec.graphql.org/October2021/#FieldsDefinition)
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<SchemaInputValue>,
    pub field_type: TypeRef,
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

impl SchemaField {
    pub fn new<S: Into<String>>(name: S, field_type: TypeRef) -> Self {
        SchemaField {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            field_type,
            is_deprecated: false,
            deprecation_reason: None,
        }
    }

    /// Get a known argument by name
    pub fn get_argument(&self, name: &str) -> Option<&SchemaInputValue> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

/// An argument of a field or directive.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaInputValue {
    pub name: String,
    pub description: Option<String>,
    pub input_type: TypeRef,
    /// The default value as GraphQL source text, if any.
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEnumValue {
    pub name: String,
    pub description: Option<String>,
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDirective {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<SchemaInputValue>,
    pub locations: Vec<DirectiveLocation>,
    pub built_in: bool,
}

/// A location a directive may be applied to.
///
/// [Reference](https://spec.graphql.org/October2021/#DirectiveLocations)
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl FromStr for DirectiveLocation {
    type Err = Error;

    fn from_str(location: &str) -> Result<Self> {
        let location = match location {
            "QUERY" => DirectiveLocation::Query,
            "MUTATION" => DirectiveLocation::Mutation,
            "SUBSCRIPTION" => DirectiveLocation::Subscription,
            "FIELD" => DirectiveLocation::Field,
            "FRAGMENT_DEFINITION" => DirectiveLocation::FragmentDefinition,
            "FRAGMENT_SPREAD" => DirectiveLocation::FragmentSpread,
            "INLINE_FRAGMENT" => DirectiveLocation::InlineFragment,
            "VARIABLE_DEFINITION" => DirectiveLocation::VariableDefinition,
            "SCHEMA" => DirectiveLocation::Schema,
            "SCALAR" => DirectiveLocation::Scalar,
            "OBJECT" => DirectiveLocation::Object,
            "FIELD_DEFINITION" => DirectiveLocation::FieldDefinition,
            "ARGUMENT_DEFINITION" => DirectiveLocation::ArgumentDefinition,
            "INTERFACE" => DirectiveLocation::Interface,
            "UNION" => DirectiveLocation::Union,
            "ENUM" => DirectiveLocation::Enum,
            "ENUM_VALUE" => DirectiveLocation::EnumValue,
            "INPUT_OBJECT" => DirectiveLocation::InputObject,
            "INPUT_FIELD_DEFINITION" => DirectiveLocation::InputFieldDefinition,
            _ => {
                return Err(Error::new(
                    format!("encountered unknown directive location: {}", location),
                    ErrorType::Protocol,
                ))
            }
        };
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_flag() {
        assert!(SchemaType::new(TypeKind::Scalar, "String").built_in);
        assert!(SchemaType::new(TypeKind::Object, "__Schema").built_in);
        assert!(!SchemaType::new(TypeKind::Scalar, "DateTime").built_in);
    }

    #[test]
    fn possible_types_are_idempotent() {
        let mut schema = Schema::default();
        schema.add_possible_type("Node", "User");
        schema.add_possible_type("Node", "User");
        schema.add_possible_type("Node", "Post");
        assert_eq!(schema.possible_types("Node"), ["User", "Post"]);
        assert!(schema.is_possible_type("Node", "Post"));
        assert!(!schema.is_possible_type("Node", "Comment"));
        assert!(schema.possible_types("Comment").is_empty());
    }

    #[test]
    fn implements_are_idempotent() {
        let mut schema = Schema::default();
        schema.add_implements("User", "User");
        schema.add_implements("User", "Node");
        schema.add_implements("User", "Node");
        assert_eq!(schema.implements("User"), ["User", "Node"]);
    }

    #[test]
    fn sub_types() {
        let mut schema = Schema::default();
        schema.add_possible_type("Node", "User");
        let node = SchemaType::new(TypeKind::Interface, "Node");
        let user = SchemaType::new(TypeKind::Object, "User");
        let post = SchemaType::new(TypeKind::Object, "Post");
        assert!(schema.is_sub_type(&node, &user));
        assert!(!schema.is_sub_type(&node, &post));
        assert!(schema.is_sub_type(&user, &user));
        assert!(!schema.is_sub_type(&user, &post));
    }

    #[test]
    fn directive_locations() {
        assert_eq!(
            "VARIABLE_DEFINITION".parse::<DirectiveLocation>().unwrap(),
            DirectiveLocation::VariableDefinition
        );
        assert_eq!(
            "INPUT_FIELD_DEFINITION".parse::<DirectiveLocation>().unwrap(),
            DirectiveLocation::InputFieldDefinition
        );
        let error = "FIELDS".parse::<DirectiveLocation>().unwrap_err();
        assert_eq!(
            error.message(),
            "encountered unknown directive location: FIELDS"
        );
    }
}
