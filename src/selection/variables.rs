use graphql_query::ast::{Arguments, Field, SelectionSet, Value};

/// Returns every variable referenced by a list of arguments, including variables nested inside
/// list and object values.
///
/// A variable is listed once per reference, so a variable that is used twice shows up twice.
pub fn extract_variables<'a>(arguments: &Arguments<'a>) -> Vec<&'a str> {
    let mut variables = Vec::new();
    for argument in arguments.children.iter() {
        extract_from_value(&mut variables, &argument.value);
    }
    variables
}

fn extract_from_value<'a>(acc: &mut Vec<&'a str>, value: &Value<'a>) {
    match value {
        Value::Variable(variable) => acc.push(variable.name),
        Value::List(list) => {
            for child in list.children.iter() {
                extract_from_value(acc, child);
            }
        }
        Value::Object(object) => {
            for field in object.children.iter() {
                extract_from_value(acc, &field.value);
            }
        }
        _ => {}
    }
}

/// Returns the fields that are selected directly on a selection set, skipping fragments.
pub fn selected_fields<'a>(selection_set: &'a SelectionSet<'a>) -> Vec<&'a Field<'a>> {
    selection_set
        .selections
        .iter()
        .filter_map(|selection| selection.field())
        .collect()
}
