use crate::context::CompilerContext;
use crate::error::TransformResult;
use crate::ir::Directive;
use crate::schema::CompilerSchema;
use crate::visitor::VisitorMut;

/// Remove every directive the server schema does not declare, such as
/// `@connection` or `@relay`
pub fn filter_directives(context: &CompilerContext) -> TransformResult<CompilerContext> {
    let mut filter = FilterDirectives {
        schema: context.schema(),
    };
    let documents = context
        .documents()
        .iter()
        .cloned()
        .map(|mut document| {
            filter.visit_document_mut(&mut document);
            document
        })
        .collect();
    Ok(context.with_documents(documents))
}

struct FilterDirectives<'a> {
    schema: &'a CompilerSchema,
}

impl VisitorMut for FilterDirectives<'_> {
    fn visit_directives_mut(&mut self, directives: &mut Vec<Directive>) {
        directives.retain(|directive| self.schema.is_server_directive(&directive.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_context;
    use crate::{build_ir, CompilerSchema};
    use relay_repl_parser::parse_document;
    use std::sync::Arc;

    #[test]
    fn test_strips_client_directives_only() {
        let schema = Arc::new(
            CompilerSchema::parse(
                "directive @live on QUERY | FIELD
                 type Query { feed(first: Int): [Story] }
                 type Story { id: ID! title: String }",
            )
            .expect("schema"),
        );
        let document = parse_document(
            r#"
            fragment Story on Story @relay(mask: false) { id title @live }
            query Feed @live { feed(first: 10) @connection(key: "Feed_feed") { ...Story @relay(mask: false) } }
            "#,
        )
        .expect("parse");
        let mut context = CompilerContext::new(Arc::clone(&schema));
        context
            .add_all(build_ir(&schema, &document).expect("lower"))
            .expect("add");

        let filtered = filter_directives(&context).expect("transform");
        let output = print_context(&filtered);
        assert!(!output.contains("@relay"));
        assert!(!output.contains("@connection"));
        assert!(output.contains("query Feed @live {"));
        assert!(output.contains("title @live"));

        // The input context is left untouched
        assert!(print_context(&context).contains("@connection(key: \"Feed_feed\")"));
    }
}
