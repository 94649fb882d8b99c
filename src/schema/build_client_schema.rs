use self::private::BuildSchemaContext;

use super::introspection::{IntrospectionQuery, IntrospectionSchema};
use super::schema::Schema;
use crate::error::Result;

pub(crate) mod private {
    use super::super::{introspection::*, schema::*, type_ref::*};
    use crate::error::{Error, Result};

    impl From<&IntrospectionInputValue> for SchemaInputValue {
        fn from(value: &IntrospectionInputValue) -> Self {
            SchemaInputValue {
                name: value.name.clone(),
                description: value.description.clone(),
                input_type: TypeRef::from(&value.of_type),
                default_value: value.default_value.clone(),
            }
        }
    }

    impl From<&IntrospectionField> for SchemaField {
        fn from(field: &IntrospectionField) -> Self {
            SchemaField {
                name: field.name.clone(),
                description: field.description.clone(),
                arguments: field.args.iter().map(SchemaInputValue::from).collect(),
                field_type: TypeRef::from(&field.of_type),
                is_deprecated: field.is_deprecated,
                deprecation_reason: field.deprecation_reason.clone(),
            }
        }
    }

    impl From<&IntrospectionEnumValue> for SchemaEnumValue {
        fn from(value: &IntrospectionEnumValue) -> Self {
            SchemaEnumValue {
                name: value.name.clone(),
                description: value.description.clone(),
                is_deprecated: value.is_deprecated,
                deprecation_reason: value.deprecation_reason.clone(),
            }
        }
    }

    /// Input fields are fields without arguments that can't be deprecated.
    impl From<&IntrospectionInputValue> for SchemaField {
        fn from(value: &IntrospectionInputValue) -> Self {
            SchemaField {
                name: value.name.clone(),
                description: value.description.clone(),
                arguments: Vec::new(),
                field_type: TypeRef::from(&value.of_type),
                is_deprecated: false,
                deprecation_reason: None,
            }
        }
    }

    #[derive(Default)]
    pub struct BuildSchemaContext {
        pub(crate) schema: Schema,
    }

    impl BuildSchemaContext {
        pub(crate) fn new() -> Self {
            BuildSchemaContext::default()
        }

        pub fn build_schema(mut self, introspection: &IntrospectionSchema) -> Result<Schema> {
            let query_type = introspection.query_type_name();
            if query_type.is_empty() {
                return Err(Error::protocol("Could not find the root query"));
            }

            // Every type is registered before any of them are wired up, since types refer to each
            // other by name in any order.
            for introspection_type in introspection.types.iter() {
                let schema_type = introspection_type.on_create();
                self.schema
                    .types
                    .insert(schema_type.name.clone(), schema_type);
            }

            if !self.schema.types.contains_key(query_type) {
                return Err(Error::protocol("Could not find the root query"));
            }
            self.schema.query_type = query_type.to_string();
            self.schema.mutation_type = self.root_type(introspection.mutation_type_name());
            self.schema.subscription_type =
                self.root_type(introspection.subscription_type_name());

            for introspection_type in introspection.types.iter() {
                introspection_type.on_build(&mut self)?;
            }

            for directive in introspection.directives.iter() {
                self.add_directive(directive)?;
            }

            Ok(self.schema)
        }

        fn root_type(&self, name: &str) -> Option<String> {
            if !name.is_empty() && self.schema.types.contains_key(name) {
                Some(name.to_string())
            } else {
                None
            }
        }

        /// Resolves a reference to another type by name.
        pub(crate) fn resolve_name<'b>(
            &self,
            type_ref: &'b IntrospectionTypeRef,
            relation: &str,
        ) -> Result<&'b str> {
            let name = match type_ref.name.as_deref() {
                Some(name) if !name.is_empty() => name,
                _ => return Err(Error::protocol("Could not find name of type")),
            };
            if self.schema.types.contains_key(name) {
                Ok(name)
            } else {
                Err(Error::protocol(format!(
                    "Could not find type definition for {}: {}",
                    relation, name
                )))
            }
        }

        fn add_directive(&mut self, directive: &IntrospectionDirective) -> Result<()> {
            if directive.name.is_empty() {
                return Err(Error::protocol("could not find directive name"));
            }

            let locations = directive
                .locations
                .iter()
                .map(|location| location.parse::<DirectiveLocation>())
                .collect::<Result<Vec<_>>>()?;

            self.schema.directives.insert(
                directive.name.clone(),
                SchemaDirective {
                    name: directive.name.clone(),
                    description: directive.description.clone(),
                    arguments: directive.args.iter().map(SchemaInputValue::from).collect(),
                    locations,
                    built_in: BUILT_IN_DIRECTIVES.contains(&directive.name.as_str()),
                },
            );
            Ok(())
        }
    }

    pub trait BuildSchemaType: Sized {
        /// Creates the type's shell, without any references to other types.
        fn on_create(&self) -> SchemaType;

        /// Wires the already registered shell up to the types it refers to.
        fn on_build(&self, ctx: &mut BuildSchemaContext) -> Result<()>;
    }

    impl BuildSchemaType for IntrospectionType {
        fn on_create(&self) -> SchemaType {
            let mut schema_type = SchemaType::new(self.kind, self.name.as_str());
            schema_type.description = self.description.clone();
            if self.kind == TypeKind::Enum {
                if let Some(enum_values) = &self.enum_values {
                    schema_type.enum_values =
                        enum_values.iter().map(SchemaEnumValue::from).collect();
                }
            }
            schema_type
        }

        fn on_build(&self, ctx: &mut BuildSchemaContext) -> Result<()> {
            let name = self.name.as_str();
            if !ctx.schema.types.contains_key(name) {
                return Err(Error::protocol("Could not find name of type"));
            }

            // Objects are possible types of themselves when matching fragments.
            ctx.schema.add_implements(name, name);
            if self.kind == TypeKind::Object {
                ctx.schema.add_possible_type(name, name);
            }

            let mut members = Vec::new();
            for possible_type in self.possible_types.iter().flatten() {
                let possible_name = ctx.resolve_name(possible_type, "possible type")?;
                if possible_name == name {
                    continue;
                }
                if self.kind == TypeKind::Union {
                    members.push(possible_name.to_string());
                }
                ctx.schema.add_possible_type(name, possible_name);
                ctx.schema.add_implements(possible_name, name);
            }

            let mut interfaces = Vec::new();
            for interface in self.interfaces.iter().flatten() {
                let interface_name = ctx.resolve_name(interface, "interface")?;
                interfaces.push(interface_name.to_string());
                ctx.schema.add_possible_type(interface_name, name);
                ctx.schema.add_implements(name, interface_name);
            }

            let fields = self
                .fields
                .iter()
                .flatten()
                .map(SchemaField::from)
                .chain(self.input_fields.iter().flatten().map(SchemaField::from))
                .collect::<Vec<_>>();

            if let Some(schema_type) = ctx.schema.types.get_mut(name) {
                schema_type.types.extend(members);
                schema_type.interfaces.extend(interfaces);
                schema_type.fields = fields;
            }
            Ok(())
        }
    }
}

/// Build a [Schema] from introspection data of a remote service.
///
/// The build fails without returning a partial schema when the root query type is missing, when
/// a type refers to an unknown type, or when a directive is nameless or has an unknown location.
pub trait BuildClientSchema {
    /// Converts the introspected data to a [Schema].
    fn build_client_schema(&self) -> Result<Schema>;
}

impl BuildClientSchema for IntrospectionSchema {
    /// Converts the introspected data to a [Schema].
    fn build_client_schema(&self) -> Result<Schema> {
        BuildSchemaContext::new().build_schema(self)
    }
}

impl BuildClientSchema for IntrospectionQuery {
    /// Converts the introspected data to a [Schema].
    fn build_client_schema(&self) -> Result<Schema> {
        match self.schema {
            Some(ref schema) => schema.build_client_schema(),
            None => Err(crate::error::Error::protocol("Could not find the root query")),
        }
    }
}
