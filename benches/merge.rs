#[macro_use]
extern crate bencher;

use bencher::Bencher;

fn graphql_merge_selection_set(bench: &mut Bencher) {
    use graphql_query::ast::*;
    use graphql_remote::selection::*;

    bench.iter(|| {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, QUERY).unwrap();
        let operation = document.operation(None).unwrap();
        let fragments = document.fragments(&ctx);
        let field_set =
            FieldSet::from_selection_set(&ctx, &operation.selection_set, &fragments).unwrap();
        field_set.len()
    });
}

fn graphql_apply_fragments(bench: &mut Bencher) {
    use graphql_query::ast::*;
    use graphql_remote::selection::*;

    bench.iter(|| {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, QUERY).unwrap();
        let selection_set = apply_fragments_in_document(&ctx, document, None).unwrap();
        selection_set.selections.len()
    });
}

fn graphql_load_introspection(bench: &mut Bencher) {
    use graphql_remote::schema::*;

    bench.iter(|| {
        let introspection: IntrospectionQuery = serde_json::from_str(INTROSPECTION).unwrap();
        introspection.build_client_schema().unwrap();
    });
}

benchmark_group!(
    merge,
    graphql_merge_selection_set,
    graphql_apply_fragments,
    graphql_load_introspection
);

benchmark_main!(merge);

static QUERY: &str = include_str!("../fixture/merge_query.graphql");
static INTROSPECTION: &str = include_str!("../fixture/introspection_query.json");
