use relay_repl_schema::{build_schema, complete_at, lint_operation, TypeKind};

const STAR_WARS: &str = include_str!("../../playground/src/defaults/star_wars.graphql");
const USER_PROFILE: &str = include_str!("../../playground/src/defaults/user_profile.graphql");

#[test]
fn test_star_wars_schema_builds() {
    let schema = build_schema(STAR_WARS).expect("schema");

    assert_eq!(schema.query_type().name, "Query");
    assert_eq!(schema.mutation_type().map(|t| t.name.as_str()), Some("Mutation"));
    assert_eq!(
        schema.subscription_type().map(|t| t.name.as_str()),
        Some("Subscription")
    );

    let character = schema.get_type("Character").expect("Character");
    assert_eq!(character.kind, TypeKind::Interface);

    let possible: Vec<&str> = schema
        .possible_types("Character")
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(possible, vec!["Human", "Droid"]);

    let search: Vec<&str> = schema
        .possible_types("SearchResult")
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(search, vec!["Human", "Droid", "Starship"]);

    assert!(schema.types_overlap("Character", "SearchResult"));
    assert!(!schema.types_overlap("Character", "Starship"));
}

#[test]
fn test_default_operation_lints_clean() {
    let schema = build_schema(STAR_WARS).expect("schema");
    let diagnostics = lint_operation(&schema, USER_PROFILE);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
}

#[test]
fn test_completions_in_default_operation() {
    let schema = build_schema(STAR_WARS).expect("schema");
    let source = "query UserProfile {\n  hero {\n    friendsConnection {\n      page";
    let labels: Vec<String> = complete_at(&schema, source, source.len())
        .into_iter()
        .map(|c| c.label)
        .collect();
    assert_eq!(labels, vec!["pageInfo"]);
}
