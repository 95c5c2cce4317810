pub mod ast;
pub mod error;
pub mod parser;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use parser::{parse_document, parse_schema, parse_type, Parser, MAX_DEPTH};
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let tokens = tokenize("query Hero").expect("tokenize");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_ast_serializes_with_tags() {
        let doc = parse_document("{ hero { id } }").expect("parse");
        let json = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(json["definitions"][0]["definition"], "Operation");
        assert_eq!(json["definitions"][0]["kind"], "query");
        assert_eq!(
            json["definitions"][0]["selection_set"]["items"][0]["kind"],
            "Field"
        );
    }
}
