use crate::transforms::{self, Transform, DEFAULT_TRANSFORMS, MANDATORY_TRANSFORMS};
use crate::{build_ir, print_context, CompilerContext, CompilerSchema, TransformError};
use relay_repl_parser::parse_document;
use std::sync::Arc;

const STAR_WARS: &str = include_str!("../../playground/src/defaults/star_wars.graphql");
const USER_PROFILE: &str = include_str!("../../playground/src/defaults/user_profile.graphql");

fn context(schema: &str, operation: &str) -> CompilerContext {
    let schema = Arc::new(CompilerSchema::parse(schema).expect("Failed to parse schema"));
    let document = parse_document(operation).expect("Failed to parse operation");
    let mut context = CompilerContext::new(Arc::clone(&schema));
    context
        .add_all(build_ir(&schema, &document).expect("Failed to lower"))
        .expect("Failed to add documents");
    context
}

fn compile(enabled: &[&Transform]) -> Result<String, TransformError> {
    let context = context(STAR_WARS, USER_PROFILE);
    let output = context.apply_transforms(MANDATORY_TRANSFORMS.iter().chain(enabled).copied())?;
    Ok(print_context(&output))
}

fn without(name: &str) -> Vec<&'static Transform> {
    DEFAULT_TRANSFORMS
        .iter()
        .copied()
        .filter(|transform| transform.name != name)
        .collect()
}

#[test]
fn test_default_pipeline_output() {
    let output = compile(DEFAULT_TRANSFORMS).expect("Failed to compile");

    println!("Printed:\n{}", output);

    assert_eq!(
        output,
        r#"query UserProfile {
  hero {
    id
    name
    appearsIn
    friends {
      id
      name
    }
  }
}
"#
    );
}

#[test]
fn test_without_inlining_keeps_applied_fragments() {
    let output = compile(&without("inline_fragments")).expect("Failed to compile");

    println!("Printed:\n{}", output);

    assert!(output.starts_with("query UserProfile {\n"));
    assert!(output.contains("...CharacterData_"));
    assert!(!output.contains("@arguments"));
    assert_eq!(output.matches("fragment CharacterData_").count(), 2);
    assert!(!output.contains("@include"));
}

#[test]
fn test_no_selectable_transforms_prints_source_shape() {
    let output = compile(&[]).expect("Failed to compile");

    assert!(output.contains("...CharacterData @arguments(includeAppearsIn: true)"));
    assert!(output.contains("...CharacterData @arguments(includeAppearsIn: false)"));
    assert!(output.contains(
        "fragment CharacterData on Character @argumentDefinitions(\n  includeAppearsIn: {type: \"Boolean\", defaultValue: false}\n) {"
    ));
    assert!(output.contains("appearsIn @include(if: $includeAppearsIn)"));
}

#[test]
fn test_inlining_without_applying_arguments_fails() {
    let err = compile(&without("apply_fragment_arguments")).unwrap_err();
    assert_eq!(
        err,
        TransformError::SpreadWithArguments {
            fragment: "CharacterData".to_string()
        }
    );
}

#[test]
fn test_output_is_deterministic() {
    let first = compile(DEFAULT_TRANSFORMS).expect("Failed to compile");
    let second = compile(DEFAULT_TRANSFORMS).expect("Failed to compile");
    assert_eq!(first, second);

    let first = compile(&without("inline_fragments")).expect("Failed to compile");
    let second = compile(&without("inline_fragments")).expect("Failed to compile");
    assert_eq!(first, second);
}

#[test]
fn test_default_pipeline_leaves_no_spreads() {
    let context = context(STAR_WARS, USER_PROFILE);
    let before = context.stats();
    assert_eq!(before.fragment_spreads, 2);

    let output = context
        .apply_transforms(MANDATORY_TRANSFORMS.iter().chain(DEFAULT_TRANSFORMS).copied())
        .expect("Failed to compile");
    let after = output.stats();
    assert_eq!(after.fragment_spreads, 0);
    assert_eq!(after.inline_fragments, 0);
    assert_eq!(after.conditions, 0);
    assert_eq!(output.len(), 1);
}

#[test]
fn test_transforms_do_not_mutate_their_input() {
    let context = context(STAR_WARS, USER_PROFILE);
    let before = print_context(&context);
    let _ = transforms::apply_fragment_arguments(&context).expect("Failed to apply");
    assert_eq!(print_context(&context), before);
}
