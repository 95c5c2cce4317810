use crate::context::CompilerContext;
use crate::error::{TransformError, TransformResult};
use crate::ir::{InlineFragment, Selection};
use crate::schema::{CompilerSchema, TypeId};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Also flatten inline fragments on interfaces and unions into their parent
    pub flatten_abstract_types: bool,
}

/// Flatten with abstract types enabled, as the registry runs it
pub fn flatten(context: &CompilerContext) -> TransformResult<CompilerContext> {
    flatten_with(
        context,
        FlattenOptions {
            flatten_abstract_types: true,
        },
    )
}

/// Merge inline fragments that add no type information into their parent and
/// merge selections that share an identifier
pub fn flatten_with(
    context: &CompilerContext,
    options: FlattenOptions,
) -> TransformResult<CompilerContext> {
    let flattener = Flattener {
        schema: context.schema(),
        options,
    };
    let mut documents = Vec::with_capacity(context.len());
    for document in context.documents() {
        let mut document = document.clone();
        let parent = document.type_();
        let selections = std::mem::take(document.selections_mut());
        *document.selections_mut() = flattener.flatten(selections, parent)?;
        documents.push(document);
    }
    Ok(context.with_documents(documents))
}

/// Selections keyed by identifier, in first-seen order
#[derive(Default)]
struct SelectionMap {
    index: HashMap<String, usize>,
    selections: Vec<Selection>,
}

struct Flattener<'a> {
    schema: &'a CompilerSchema,
    options: FlattenOptions,
}

impl Flattener<'_> {
    /// Flatten this level, then every child under its own parent type
    fn flatten(
        &self,
        selections: Vec<Selection>,
        parent: TypeId,
    ) -> TransformResult<Vec<Selection>> {
        let mut map = SelectionMap::default();
        self.flatten_into(&mut map, selections, parent)?;

        map.selections
            .into_iter()
            .map(|selection| -> TransformResult<Selection> {
                Ok(match selection {
                    Selection::LinkedField(mut field) => {
                        let selections = std::mem::take(&mut field.selections);
                        field.selections = self.flatten(selections, field.type_.inner())?;
                        Selection::LinkedField(field)
                    }
                    Selection::InlineFragment(mut inline) => {
                        let selections = std::mem::take(&mut inline.selections);
                        inline.selections = self.flatten(selections, inline.type_condition)?;
                        Selection::InlineFragment(inline)
                    }
                    Selection::Condition(mut condition) => {
                        let selections = std::mem::take(&mut condition.selections);
                        condition.selections = self.flatten(selections, parent)?;
                        Selection::Condition(condition)
                    }
                    other => other,
                })
            })
            .collect()
    }

    fn should_flatten(&self, inline: &InlineFragment, parent: TypeId) -> bool {
        inline.directives.is_empty()
            && (inline.type_condition == parent
                || (self.options.flatten_abstract_types
                    && self.schema.is_abstract(inline.type_condition)))
    }

    fn flatten_into(
        &self,
        map: &mut SelectionMap,
        selections: Vec<Selection>,
        parent: TypeId,
    ) -> TransformResult<()> {
        for selection in selections {
            match selection {
                Selection::InlineFragment(inline) if self.should_flatten(&inline, parent) => {
                    self.flatten_into(map, inline.selections, parent)?
                }
                other => self.insert(map, other, parent)?,
            }
        }
        Ok(())
    }

    fn insert(
        &self,
        map: &mut SelectionMap,
        selection: Selection,
        parent: TypeId,
    ) -> TransformResult<()> {
        let identifier = selection.identifier();
        let Some(&position) = map.index.get(&identifier) else {
            map.index.insert(identifier, map.selections.len());
            map.selections.push(selection);
            return Ok(());
        };

        let existing = &mut map.selections[position];
        match (existing, selection) {
            (Selection::ScalarField(existing), Selection::ScalarField(incoming)) => {
                if existing.name != incoming.name || existing.arguments != incoming.arguments {
                    return Err(conflict(existing.alias_or_name()));
                }
            }
            (Selection::LinkedField(existing), Selection::LinkedField(incoming)) => {
                if existing.name != incoming.name || existing.arguments != incoming.arguments {
                    return Err(conflict(existing.alias_or_name()));
                }
                let type_ = incoming.type_.inner();
                existing.selections = self.merge(
                    std::mem::take(&mut existing.selections),
                    incoming.selections,
                    type_,
                )?;
            }
            (Selection::InlineFragment(existing), Selection::InlineFragment(incoming)) => {
                let type_ = incoming.type_condition;
                existing.selections = self.merge(
                    std::mem::take(&mut existing.selections),
                    incoming.selections,
                    type_,
                )?;
            }
            (Selection::Condition(existing), Selection::Condition(incoming)) => {
                existing.selections = self.merge(
                    std::mem::take(&mut existing.selections),
                    incoming.selections,
                    parent,
                )?;
            }
            // Duplicate spreads collapse into the first one
            (Selection::FragmentSpread(_), Selection::FragmentSpread(_)) => {}
            (_, incoming) => {
                return Err(TransformError::Invariant {
                    transform: "flatten",
                    message: format!(
                        "Expected selections with identifier '{}' to be of the same kind",
                        incoming.identifier()
                    ),
                })
            }
        }
        Ok(())
    }

    fn merge(
        &self,
        a: Vec<Selection>,
        b: Vec<Selection>,
        parent: TypeId,
    ) -> TransformResult<Vec<Selection>> {
        let mut map = SelectionMap::default();
        self.flatten_into(&mut map, a, parent)?;
        self.flatten_into(&mut map, b, parent)?;
        Ok(map.selections)
    }
}

fn conflict(response_key: &str) -> TransformError {
    TransformError::ConflictingFields {
        response_key: response_key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_context;
    use crate::{build_ir, CompilerSchema};
    use relay_repl_parser::parse_document;
    use std::sync::Arc;

    const SDL: &str = r#"
        type Query { hero: Character search: [SearchResult] }
        interface Character { id: ID! name: String friends: [Character] }
        type Human implements Character { id: ID! name: String friends: [Character] height: Float }
        type Droid implements Character { id: ID! name: String friends: [Character] }
        union SearchResult = Human | Droid
        directive @track on INLINE_FRAGMENT
    "#;

    fn flattened(source: &str, flatten_abstract_types: bool) -> TransformResult<String> {
        let schema = Arc::new(CompilerSchema::parse(SDL).expect("schema"));
        let document = parse_document(source).expect("parse");
        let mut context = CompilerContext::new(Arc::clone(&schema));
        context
            .add_all(build_ir(&schema, &document).expect("lower"))
            .expect("add");
        let output = flatten_with(
            &context,
            FlattenOptions {
                flatten_abstract_types,
            },
        )?;
        Ok(print_context(&output))
    }

    #[test]
    fn test_merges_same_type_fragments_and_fields() {
        let output = flattened(
            "query Q { hero { id ... on Character { id name friends { id } } friends { name } } }",
            false,
        )
        .expect("flatten");
        assert_eq!(
            output,
            "query Q {\n  hero {\n    id\n    name\n    friends {\n      id\n      name\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn test_keeps_concrete_type_fragments() {
        let output = flattened(
            "query Q { hero { ... on Human { height } ... on Human { name } } }",
            true,
        )
        .expect("flatten");
        assert_eq!(
            output,
            "query Q {\n  hero {\n    ... on Human {\n      height\n      name\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn test_abstract_fragments_flatten_only_when_enabled() {
        let source = "query Q { search { ... on Character { name } } }";
        let kept = flattened(source, false).expect("flatten");
        assert!(kept.contains("... on Character"));

        let merged = flattened(source, true).expect("flatten");
        assert_eq!(merged, "query Q {\n  search {\n    name\n  }\n}\n");
    }

    #[test]
    fn test_merges_conditions_with_the_same_value() {
        let output = flattened(
            "query Q($c: Boolean!) { hero { ... on Character @include(if: $c) { id } ... on Character @include(if: $c) { name } } }",
            true,
        )
        .expect("flatten");
        assert_eq!(
            output,
            "query Q(\n  $c: Boolean!\n) {\n  hero {\n    id @include(if: $c)\n    name @include(if: $c)\n  }\n}\n"
        );
    }

    #[test]
    fn test_fragments_with_directives_are_kept() {
        let output = flattened("query Q { hero { id ... on Character @track { name } } }", true)
            .expect("flatten");
        assert!(output.contains("    ... on Character @track {\n      name\n    }\n"));
    }

    #[test]
    fn test_conflicting_fields_are_an_error() {
        let err = flattened("query Q { hero { x: id x: name } }", false).unwrap_err();
        assert_eq!(
            err,
            TransformError::ConflictingFields {
                response_key: "x".to_string()
            }
        );
    }
}
