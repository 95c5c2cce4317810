use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relay_repl_compiler::{
    build_ir, print_context, CompilerContext, CompilerSchema, DEFAULT_TRANSFORMS,
    MANDATORY_TRANSFORMS,
};
use relay_repl_parser::parse_document;
use std::sync::Arc;

const STAR_WARS: &str = include_str!("../../playground/src/defaults/star_wars.graphql");
const USER_PROFILE: &str = include_str!("../../playground/src/defaults/user_profile.graphql");

fn lowered() -> CompilerContext {
    let schema = Arc::new(CompilerSchema::parse(STAR_WARS).unwrap());
    let document = parse_document(USER_PROFILE).unwrap();
    let mut context = CompilerContext::new(Arc::clone(&schema));
    context.add_all(build_ir(&schema, &document).unwrap()).unwrap();
    context
}

fn bench_schema(c: &mut Criterion) {
    c.bench_function("schema_star_wars", |b| {
        b.iter(|| CompilerSchema::parse(black_box(STAR_WARS)))
    });
}

fn bench_lowering(c: &mut Criterion) {
    let schema = CompilerSchema::parse(STAR_WARS).unwrap();
    let document = parse_document(USER_PROFILE).unwrap();

    c.bench_function("build_ir_user_profile", |b| {
        b.iter(|| build_ir(black_box(&schema), black_box(&document)))
    });
}

fn bench_transforms(c: &mut Criterion) {
    let context = lowered();

    c.bench_function("default_transforms", |b| {
        b.iter(|| {
            black_box(&context)
                .apply_transforms(MANDATORY_TRANSFORMS.iter().chain(DEFAULT_TRANSFORMS).copied())
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    c.bench_function("full_pipeline", |b| {
        b.iter(|| {
            let context = lowered();
            let output = context
                .apply_transforms(MANDATORY_TRANSFORMS.iter().chain(DEFAULT_TRANSFORMS).copied())
                .unwrap();
            print_context(&output)
        })
    });
}

criterion_group!(
    benches,
    bench_schema,
    bench_lowering,
    bench_transforms,
    bench_full_pipeline
);
criterion_main!(benches);
