use crate::context::CompilerContext;
use crate::error::{TransformError, TransformResult};
use crate::ir::{ExecutableDefinition, InlineFragment, Selection};

/// Replace every fragment spread with an inline fragment on the fragment's
/// type and drop all fragment definitions.
///
/// Spreads must no longer carry arguments, so this runs after
/// `apply_fragment_arguments`.
pub fn inline_fragments(context: &CompilerContext) -> TransformResult<CompilerContext> {
    let mut documents = Vec::new();
    for document in context.documents() {
        if document.is_fragment() {
            continue;
        }
        let mut document = document.clone();
        let mut stack = Vec::new();
        inline_selections(context, document.selections_mut(), &mut stack)?;
        documents.push(document);
    }
    Ok(context.with_documents(documents))
}

/// `stack` holds the fragments currently being inlined
fn inline_selections(
    context: &CompilerContext,
    selections: &mut [Selection],
    stack: &mut Vec<String>,
) -> TransformResult<()> {
    for selection in selections.iter_mut() {
        match selection {
            Selection::FragmentSpread(spread) => {
                if !spread.arguments.is_empty() {
                    return Err(TransformError::SpreadWithArguments {
                        fragment: spread.fragment.clone(),
                    });
                }
                let fragment = context.get_fragment(&spread.fragment).ok_or_else(|| {
                    TransformError::UnknownFragment {
                        name: spread.fragment.clone(),
                    }
                })?;
                if stack.contains(&fragment.name) {
                    return Err(TransformError::CircularFragment {
                        fragment: fragment.name.clone(),
                    });
                }

                let mut selections = fragment.selections.clone();
                stack.push(fragment.name.clone());
                inline_selections(context, &mut selections, stack)?;
                stack.pop();

                let inline = InlineFragment {
                    type_condition: fragment.type_condition,
                    directives: std::mem::take(&mut spread.directives),
                    selections,
                };
                *selection = Selection::InlineFragment(inline);
            }
            Selection::LinkedField(field) => {
                inline_selections(context, &mut field.selections, stack)?
            }
            Selection::InlineFragment(inline) => {
                inline_selections(context, &mut inline.selections, stack)?
            }
            Selection::Condition(condition) => {
                inline_selections(context, &mut condition.selections, stack)?
            }
            Selection::ScalarField(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_context;
    use crate::{build_ir, CompilerSchema};
    use relay_repl_parser::parse_document;
    use std::sync::Arc;

    const SDL: &str = r#"
        type Query { node(id: ID!): Node }
        interface Node { id: ID! }
        type User implements Node { id: ID! name: String best: User }
    "#;

    fn context(source: &str) -> CompilerContext {
        let schema = Arc::new(CompilerSchema::parse(SDL).expect("schema"));
        let document = parse_document(source).expect("parse");
        let mut context = CompilerContext::new(Arc::clone(&schema));
        context
            .add_all(build_ir(&schema, &document).expect("lower"))
            .expect("add");
        context
    }

    #[test]
    fn test_inlines_nested_spreads() {
        let ctx = context(
            r#"
            fragment Name on User { name }
            fragment Best on User { best { ...Name } }
            query Q($skip: Boolean!) { node(id: 1) { id ...Best @skip(if: $skip) } }
            "#,
        );
        let output = print_context(&inline_fragments(&ctx).expect("transform"));
        assert_eq!(
            output,
            "query Q(\n  $skip: Boolean!\n) {\n  node(id: 1) {\n    id\n    ... on User @skip(if: $skip) {\n      best {\n        ... on User {\n          name\n        }\n      }\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn test_rejects_spreads_with_arguments() {
        let ctx = context(
            r#"
            fragment Name on User @argumentDefinitions(x: {type: "Int"}) { name }
            query Q { node(id: 1) { ...Name @arguments(x: 1) } }
            "#,
        );
        assert_eq!(
            inline_fragments(&ctx).unwrap_err(),
            TransformError::SpreadWithArguments {
                fragment: "Name".to_string()
            }
        );
    }

    #[test]
    fn test_detects_cycles() {
        let ctx = context(
            "fragment A on User { best { ...A } } query Q { node(id: 1) { ...A } }",
        );
        assert!(matches!(
            inline_fragments(&ctx),
            Err(TransformError::CircularFragment { .. })
        ));
    }
}
