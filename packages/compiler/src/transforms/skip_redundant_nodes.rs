use crate::context::CompilerContext;
use crate::error::TransformResult;
use crate::ir::{Condition, InlineFragment, LinkedField, Selection};
use std::collections::HashMap;

/// Identifiers already fetched at some level, with the sub-map of each linked
/// field. Scalars and spreads map to an empty sub-map.
#[derive(Debug, Clone, Default)]
struct SeenMap(HashMap<String, SeenMap>);

/// Remove selections that are guaranteed to have been fetched already, by an
/// ancestor or an earlier sibling.
///
/// Fields are visited before fragments and conditions so that unconditional
/// fields win. Conditional branches get a copy of the seen map: what they
/// fetch is not guaranteed outside of them. Nodes left empty are removed.
pub fn skip_redundant_nodes(context: &CompilerContext) -> TransformResult<CompilerContext> {
    let mut documents = Vec::with_capacity(context.len());
    for document in context.documents() {
        let (selections, _) = transform_selections(document.selections(), SeenMap::default());
        if let Some(selections) = selections {
            let mut document = document.clone();
            *document.selections_mut() = selections;
            documents.push(document);
        }
    }
    Ok(context.with_documents(documents))
}

fn transform_selections(
    selections: &[Selection],
    mut seen: SeenMap,
) -> (Option<Vec<Selection>>, SeenMap) {
    let mut sorted: Vec<&Selection> = selections.iter().collect();
    sorted.sort_by_key(|selection| !selection.is_field());

    let mut next = Vec::with_capacity(sorted.len());
    for selection in sorted {
        let identifier = selection.identifier();
        match selection {
            Selection::ScalarField(_) | Selection::FragmentSpread(_) => {
                if !seen.0.contains_key(&identifier) {
                    next.push(selection.clone());
                    seen.0.insert(identifier, SeenMap::default());
                }
            }
            Selection::LinkedField(field) => {
                let child = seen.0.get(&identifier).cloned().unwrap_or_default();
                let (selections, child) = transform_selections(&field.selections, child);
                if let Some(selections) = selections {
                    next.push(Selection::LinkedField(LinkedField {
                        selections,
                        ..without_selections_field(field)
                    }));
                    seen.0.insert(identifier, child);
                }
            }
            Selection::InlineFragment(inline) => {
                // Fork: start from what is known here
                let child = seen.0.get(&identifier).cloned().unwrap_or_else(|| seen.clone());
                let (selections, child) = transform_selections(&inline.selections, child);
                if let Some(selections) = selections {
                    next.push(Selection::InlineFragment(InlineFragment {
                        type_condition: inline.type_condition,
                        directives: inline.directives.clone(),
                        selections,
                    }));
                    seen.0.insert(identifier, child);
                }
            }
            Selection::Condition(condition) => {
                let child = seen.0.get(&identifier).cloned().unwrap_or_else(|| seen.clone());
                let (selections, child) = transform_selections(&condition.selections, child);
                if let Some(selections) = selections {
                    next.push(Selection::Condition(Condition {
                        value: condition.value.clone(),
                        passing_value: condition.passing_value,
                        selections,
                    }));
                    seen.0.insert(identifier, child);
                }
            }
        }
    }

    let next = if next.is_empty() { None } else { Some(next) };
    (next, seen)
}

fn without_selections_field(field: &LinkedField) -> LinkedField {
    LinkedField {
        alias: field.alias.clone(),
        name: field.name.clone(),
        definition: field.definition,
        type_: field.type_.clone(),
        arguments: field.arguments.clone(),
        directives: field.directives.clone(),
        selections: Vec::new(),
    }
}
