use crate::error::{Error, ErrorType, Result};
use bumpalo::Bump;
use graphql_query::ast::{
    ASTContext, Definition, Document, Field, FragmentDefinition, Selection, SelectionSet,
};
use hashbrown::{hash_map::DefaultHashBuilder, HashMap};

/// A map of fragment names to their definitions, as returned by `Document::fragments`.
pub type FragmentMap<'a> =
    HashMap<&'a str, &'a FragmentDefinition<'a>, DefaultHashBuilder, &'a Bump>;

/// A field as first seen under a response key, along with the merged sub-selections of every
/// occurrence of that key.
pub struct FieldEntry<'a> {
    field: &'a Field<'a>,
    selection_set: FieldSet<'a>,
}

impl<'a> FieldEntry<'a> {
    /// Returns the field this entry was created from. Its alias, arguments, and directives are
    /// the ones that are kept when the set is converted back into a selection set.
    #[inline]
    pub fn field(&self) -> &'a Field<'a> {
        self.field
    }

    #[inline]
    pub fn selection_set(&self) -> &FieldSet<'a> {
        &self.selection_set
    }

    /// Creates a copy of the original field with the merged selection set.
    fn make(&self, ctx: &'a ASTContext) -> Field<'a> {
        Field {
            alias: self.field.alias,
            name: self.field.name,
            arguments: self.field.arguments.clone(),
            directives: self.field.directives.clone(),
            selection_set: self.selection_set.to_selection_set(ctx),
        }
    }
}

/// A set of fields keyed by their response key, with all fragments resolved.
///
/// Adding a field whose response key is already present merges its sub-selections into the
/// existing entry instead of replacing it. The first occurrence's arguments and directives win;
/// conflicting occurrences are assumed to have been rejected by validation beforehand.
///
/// Inline fragments are merged without checking their type condition.
pub struct FieldSet<'a> {
    arena: &'a Bump,
    entries: HashMap<&'a str, FieldEntry<'a>, DefaultHashBuilder, &'a Bump>,
}

impl<'a> FieldSet<'a> {
    /// Creates an empty set allocated in the given AST Context's arena.
    pub fn new_in(ctx: &'a ASTContext) -> Self {
        FieldSet::with_arena(&ctx.arena)
    }

    fn with_arena(arena: &'a Bump) -> Self {
        FieldSet {
            arena,
            entries: HashMap::new_in(arena),
        }
    }

    /// Collects all selections of a selection set into a new set.
    pub fn from_selection_set(
        ctx: &'a ASTContext,
        selection_set: &'a SelectionSet<'a>,
        fragments: &FragmentMap<'a>,
    ) -> Result<Self> {
        let mut set = FieldSet::new_in(ctx);
        for selection in selection_set.selections.iter() {
            set.add(selection, fragments)?;
        }
        Ok(set)
    }

    /// Adds a selection to the set, resolving fragment spreads using the given fragments.
    pub fn add(&mut self, selection: &'a Selection<'a>, fragments: &FragmentMap<'a>) -> Result<()> {
        match selection {
            Selection::Field(field) => {
                let arena = self.arena;
                let entry = self
                    .entries
                    .entry(field.alias_or_name())
                    .or_insert_with(|| FieldEntry {
                        field,
                        selection_set: FieldSet::with_arena(arena),
                    });
                for selection in field.selection_set.selections.iter() {
                    entry.selection_set.add(selection, fragments)?;
                }
            }
            Selection::InlineFragment(fragment) => {
                for selection in fragment.selection_set.selections.iter() {
                    self.add(selection, fragments)?;
                }
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.name.name;
                let definition: &'a FragmentDefinition<'a> =
                    *fragments.get(name).ok_or_else(|| {
                        Error::new(
                            format!("could not find fragment definition: {}", name),
                            ErrorType::Selection,
                        )
                    })?;
                for selection in definition.selection_set.selections.iter() {
                    self.add(selection, fragments)?;
                }
            }
        }
        Ok(())
    }

    /// Returns the entry for a response key.
    #[inline]
    pub fn get(&self, response_key: &str) -> Option<&FieldEntry<'a>> {
        self.entries.get(response_key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.keys().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = &FieldEntry<'a>> {
        self.entries.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the set back into a selection set containing only fields.
    ///
    /// The order of the resulting selections is unspecified and may differ between calls.
    pub fn to_selection_set(&self, ctx: &'a ASTContext) -> SelectionSet<'a> {
        let mut selections =
            bumpalo::collections::Vec::with_capacity_in(self.entries.len(), &ctx.arena);
        for entry in self.entries.values() {
            selections.push(Selection::Field(entry.make(ctx)));
        }
        SelectionSet { selections }
    }
}

/// Merges a selection set into a flat set of fields, inlining every fragment spread and inline
/// fragment along the way.
pub fn apply_fragments<'a>(
    ctx: &'a ASTContext,
    selection_set: &'a SelectionSet<'a>,
    fragments: &FragmentMap<'a>,
) -> Result<SelectionSet<'a>> {
    Ok(FieldSet::from_selection_set(ctx, selection_set, fragments)?.to_selection_set(ctx))
}

/// Merges the selection set of an operation using the document's own fragment definitions.
///
/// When no operation name is passed the document must contain exactly one operation.
pub fn apply_fragments_in_document<'a>(
    ctx: &'a ASTContext,
    document: &'a Document<'a>,
    operation_name: Option<&str>,
) -> Result<SelectionSet<'a>> {
    let operation = document.operation(operation_name)?;
    let fragments = document.fragments(ctx);
    apply_fragments(ctx, &operation.selection_set, &fragments)
}

/// Collects a list of fragment definitions into a [FragmentMap].
pub fn fragment_map<'a>(
    ctx: &'a ASTContext,
    definitions: &[&'a FragmentDefinition<'a>],
) -> FragmentMap<'a> {
    let mut map = HashMap::new_in(&ctx.arena);
    for definition in definitions.iter() {
        map.insert(definition.name.name, *definition);
    }
    map
}

/// Returns every fragment definition of a document, in the order they're defined.
pub fn fragment_definitions<'a>(document: &'a Document<'a>) -> Vec<&'a FragmentDefinition<'a>> {
    document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Fragment(fragment) => Some(fragment),
            Definition::Operation(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_query::ast::{ParseNode, PrintNode};
    use serde_json::{json, Map, Value};

    fn shape(set: &FieldSet) -> Value {
        let mut map = Map::new();
        for key in set.keys() {
            let entry = set.get(key).unwrap();
            map.insert(key.to_string(), shape(entry.selection_set()));
        }
        Value::Object(map)
    }

    fn merge<'a>(ctx: &'a ASTContext, source: &str) -> Result<FieldSet<'a>> {
        let document = Document::parse(ctx, source).unwrap();
        let operation = document.operation(None).unwrap();
        let fragments = document.fragments(ctx);
        FieldSet::from_selection_set(ctx, &operation.selection_set, &fragments)
    }

    #[test]
    fn merges_duplicate_fields() {
        let ctx = ASTContext::new();
        let set = merge(&ctx, "{ a { x } a { y } }").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(shape(&set), json!({ "a": { "x": {}, "y": {} } }));
    }

    #[test]
    fn first_field_wins() {
        let ctx = ASTContext::new();
        let set = merge(&ctx, "{ a(id: 1) { x } a(id: 2) { y } }").unwrap();
        let entry = set.get("a").unwrap();
        assert_eq!(entry.field().arguments.children.len(), 1);
        assert_eq!(
            entry.field().arguments.children[0].value,
            graphql_query::ast::Value::Int(graphql_query::ast::IntValue { value: "1" })
        );
        assert_eq!(entry.selection_set().len(), 2);
    }

    #[test]
    fn aliases_are_kept_apart() {
        let ctx = ASTContext::new();
        let set = merge(&ctx, "{ first: user(id: 1) { id } second: user(id: 2) { name } }")
            .unwrap();
        assert_eq!(
            shape(&set),
            json!({ "first": { "id": {} }, "second": { "name": {} } })
        );
        assert_eq!(set.get("first").unwrap().field().name, "user");
    }

    #[test]
    fn fragment_spread_equals_inlining() {
        let ctx = ASTContext::new();
        let spread = merge(
            &ctx,
            "{ user { ...UserFields id } } fragment UserFields on User { name friends { id } }",
        )
        .unwrap();
        let inlined = merge(&ctx, "{ user { name friends { id } id } }").unwrap();
        assert_eq!(shape(&spread), shape(&inlined));
    }

    #[test]
    fn inline_fragments() {
        let ctx = ASTContext::new();
        let set = merge(
            &ctx,
            "{ node { id ... on User { name } ... on Post { id title } } }",
        )
        .unwrap();
        assert_eq!(
            shape(&set),
            json!({ "node": { "id": {}, "name": {}, "title": {} } })
        );
    }

    #[test]
    fn nested_fragments() {
        let ctx = ASTContext::new();
        let set = merge(
            &ctx,
            indoc::indoc! {"
                query {
                    ...Root
                    viewer { ...Viewer }
                }
                fragment Root on Query { viewer { id } }
                fragment Viewer on User { ... on User { ...Name } }
                fragment Name on User { name }
            "},
        )
        .unwrap();
        assert_eq!(shape(&set), json!({ "viewer": { "id": {}, "name": {} } }));
    }

    #[test]
    fn merging_is_idempotent() {
        let ctx = ASTContext::new();
        let document = Document::parse(
            &ctx,
            "{ a { x ...F } a { y } b } fragment F on A { z { w } }",
        )
        .unwrap();
        let operation = document.operation(None).unwrap();
        let fragments = document.fragments(&ctx);

        let once = FieldSet::from_selection_set(&ctx, &operation.selection_set, &fragments)
            .unwrap();
        let merged = ctx.alloc(once.to_selection_set(&ctx));
        let twice = FieldSet::from_selection_set(&ctx, merged, &fragments).unwrap();

        assert_eq!(shape(&once), shape(&twice));
        assert_eq!(
            shape(&twice),
            json!({ "a": { "x": {}, "y": {}, "z": { "w": {} } }, "b": {} })
        );
    }

    #[test]
    fn missing_fragment() {
        let ctx = ASTContext::new();
        let error = merge(&ctx, "{ a { ...Missing } }").err().unwrap();
        assert_eq!(error.message(), "could not find fragment definition: Missing");
        assert_eq!(error.error_type(), &ErrorType::Selection);
    }

    #[test]
    fn selections_in_document() {
        let ctx = ASTContext::new();
        let document = Document::parse(
            &ctx,
            "query A { a } query B { ...F b } fragment F on Query { c(arg: 1) @skip(if: false) }",
        )
        .unwrap();

        let selection_set = apply_fragments_in_document(&ctx, document, Some("B")).unwrap();
        assert_eq!(selection_set.selections.len(), 2);
        assert!(selection_set
            .selections
            .iter()
            .all(|selection| matches!(selection, Selection::Field(_))));

        let printed = selection_set
            .selections
            .iter()
            .filter_map(|selection| selection.field())
            .map(|field| field.print())
            .collect::<Vec<_>>();
        assert!(printed.contains(&"b".to_string()));
        assert!(printed.contains(&"c(arg: 1) @skip(if: false)".to_string()));

        let error = apply_fragments_in_document(&ctx, document, None)
            .err()
            .unwrap();
        assert_eq!(error.error_type(), &ErrorType::Selection);
    }

    #[test]
    fn explicit_fragment_lists() {
        let ctx = ASTContext::new();
        let document = Document::parse(
            &ctx,
            "{ ...A } fragment A on Query { a ...B } fragment B on Query { b }",
        )
        .unwrap();
        let definitions = fragment_definitions(document);
        assert_eq!(definitions.len(), 2);

        let fragments = fragment_map(&ctx, &definitions);
        let operation = document.operation(None).unwrap();
        let selection_set = apply_fragments(&ctx, &operation.selection_set, &fragments).unwrap();
        assert_eq!(selection_set.selections.len(), 2);
    }
}
