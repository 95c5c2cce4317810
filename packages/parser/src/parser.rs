use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{block_string_value, tokenize, unescape_string, Token};

const TYPE_SYSTEM_KEYWORDS: &[&str] = &[
    "schema",
    "scalar",
    "type",
    "interface",
    "union",
    "enum",
    "input",
    "directive",
    "extend",
];

/// Deepest nesting of selection sets, list/object values and list types
pub const MAX_DEPTH: usize = 128;

/// Recursive-descent parser for GraphQL documents
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, Span)>,
    pos: usize,
    source_len: usize,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            source_len: source.len(),
            depth: 0,
        })
    }

    /// Parse an executable document (operations and fragments)
    pub fn parse_document(&mut self) -> ParseResult<Document> {
        let mut definitions = Vec::new();

        if self.is_at_end() {
            return Err(self.error_expected("an operation or fragment definition"));
        }

        while !self.is_at_end() {
            match self.peek_owned() {
                Some((Token::LBrace, _)) => {
                    definitions.push(ExecutableDefinition::Operation(self.parse_operation()?));
                }
                Some((Token::Name("query" | "mutation" | "subscription"), _)) => {
                    definitions.push(ExecutableDefinition::Operation(self.parse_operation()?));
                }
                Some((Token::Name("fragment"), _)) => {
                    definitions.push(ExecutableDefinition::Fragment(self.parse_fragment()?));
                }
                Some((Token::Name(keyword), span)) if TYPE_SYSTEM_KEYWORDS.contains(&keyword) => {
                    return Err(ParseError::invalid_syntax_span(
                        span,
                        format!(
                            "'{}' definitions are not allowed in an operation document",
                            keyword
                        ),
                    ));
                }
                _ => {
                    return Err(self.error_expected(
                        "'query', 'mutation', 'subscription', or 'fragment'",
                    ));
                }
            }
        }

        Ok(Document {
            definitions,
            span: Span::new(0, self.source_len),
        })
    }

    /// Parse a type system document (SDL)
    pub fn parse_schema_document(&mut self) -> ParseResult<SchemaDocument> {
        let mut definitions = Vec::new();

        if self.is_at_end() {
            return Err(self.error_expected("a type system definition"));
        }

        while !self.is_at_end() {
            definitions.push(self.parse_type_system_definition()?);
        }

        Ok(SchemaDocument {
            definitions,
            span: Span::new(0, self.source_len),
        })
    }

    /// Parse a standalone type reference such as `[String!]!`, requiring end of input afterwards
    pub fn parse_standalone_type(&mut self) -> ParseResult<Type> {
        let ty = self.parse_type()?;
        if !self.is_at_end() {
            return Err(self.error_expected("end of input"));
        }
        Ok(ty)
    }

    // ------------------------------------------------------------------
    // Executable definitions
    // ------------------------------------------------------------------

    fn parse_operation(&mut self) -> ParseResult<OperationDefinition> {
        let start = self.peek_span().start;

        // Query shorthand: `{ ... }`
        if self.check(&Token::LBrace) {
            let selection_set = self.parse_selection_set()?;
            return Ok(OperationDefinition {
                kind: OperationKind::Query,
                name: None,
                variable_definitions: Vec::new(),
                directives: Vec::new(),
                span: Span::new(start, selection_set.span.end),
                selection_set,
            });
        }

        let keyword_span = self.peek_span();
        let keyword = self.expect_name()?;
        let kind = OperationKind::from_keyword(&keyword).ok_or_else(|| {
            ParseError::unexpected_token_span(
                keyword_span,
                "'query', 'mutation', or 'subscription'",
                format!("name '{}'", keyword),
            )
        })?;

        let name = if matches!(self.peek(), Some((Token::Name(_), _))) {
            Some(self.expect_name()?)
        } else {
            None
        };

        let variable_definitions = if self.check(&Token::LParen) {
            self.parse_variable_definitions()?
        } else {
            Vec::new()
        };

        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;

        Ok(OperationDefinition {
            kind,
            name,
            variable_definitions,
            directives,
            selection_set,
            span: Span::new(start, self.current_span().end),
        })
    }

    fn parse_variable_definitions(&mut self) -> ParseResult<Vec<VariableDefinition>> {
        self.expect(&Token::LParen)?;
        let mut definitions = Vec::new();

        loop {
            let start = self.peek_span().start;
            self.expect(&Token::Dollar)?;
            let name = self.expect_name()?;
            self.expect(&Token::Colon)?;
            let type_ = self.parse_type()?;
            let default_value = if self.match_token(&Token::Equals) {
                Some(self.parse_value(true)?)
            } else {
                None
            };
            let directives = self.parse_directives(true)?;

            definitions.push(VariableDefinition {
                name,
                type_,
                default_value,
                directives,
                span: Span::new(start, self.current_span().end),
            });

            if self.match_token(&Token::RParen) {
                break;
            }
        }

        Ok(definitions)
    }

    fn parse_fragment(&mut self) -> ParseResult<FragmentDefinition> {
        let start = self.peek_span().start;
        self.expect_keyword("fragment")?;

        let name_span = self.peek_span();
        let name = self.expect_name()?;
        if name == "on" {
            return Err(ParseError::invalid_syntax_span(
                name_span,
                "a fragment cannot be named 'on'",
            ));
        }

        self.expect_keyword("on")?;
        let type_condition = self.expect_name()?;
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;

        Ok(FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: Span::new(start, self.current_span().end),
        })
    }

    fn parse_selection_set(&mut self) -> ParseResult<SelectionSet> {
        self.nested(|parser| {
            let start = parser.peek_span().start;
            parser.expect(&Token::LBrace)?;

            let mut items = Vec::new();
            loop {
                items.push(parser.parse_selection()?);
                if parser.match_token(&Token::RBrace) {
                    break;
                }
            }

            Ok(SelectionSet {
                items,
                span: Span::new(start, parser.current_span().end),
            })
        })
    }

    fn parse_selection(&mut self) -> ParseResult<Selection> {
        if self.check(&Token::Spread) {
            return self.parse_fragment_selection();
        }
        Ok(Selection::Field(self.parse_field()?))
    }

    fn parse_fragment_selection(&mut self) -> ParseResult<Selection> {
        let start = self.peek_span().start;
        self.expect(&Token::Spread)?;

        match self.peek_owned() {
            Some((Token::Name("on"), _)) => {
                self.advance();
                let type_condition = Some(self.expect_name()?);
                self.finish_inline_fragment(start, type_condition)
            }
            Some((Token::Name(_), _)) => {
                let fragment_name = self.expect_name()?;
                let directives = self.parse_directives(false)?;
                Ok(Selection::FragmentSpread(FragmentSpread {
                    fragment_name,
                    directives,
                    span: Span::new(start, self.current_span().end),
                }))
            }
            _ => self.finish_inline_fragment(start, None),
        }
    }

    fn finish_inline_fragment(
        &mut self,
        start: usize,
        type_condition: Option<String>,
    ) -> ParseResult<Selection> {
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;
        Ok(Selection::InlineFragment(InlineFragment {
            type_condition,
            directives,
            selection_set,
            span: Span::new(start, self.current_span().end),
        }))
    }

    fn parse_field(&mut self) -> ParseResult<Field> {
        let start = self.peek_span().start;
        let first = self.expect_name()?;

        let (alias, name) = if self.match_token(&Token::Colon) {
            (Some(first), self.expect_name()?)
        } else {
            (None, first)
        };

        let arguments = self.parse_arguments(false)?;
        let directives = self.parse_directives(false)?;
        let selection_set = if self.check(&Token::LBrace) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };

        Ok(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: Span::new(start, self.current_span().end),
        })
    }

    fn parse_arguments(&mut self, is_const: bool) -> ParseResult<Vec<Argument>> {
        if !self.match_token(&Token::LParen) {
            return Ok(Vec::new());
        }

        let mut arguments = Vec::new();
        loop {
            let start = self.peek_span().start;
            let name = self.expect_name()?;
            self.expect(&Token::Colon)?;
            let value = self.parse_value(is_const)?;
            arguments.push(Argument {
                name,
                value,
                span: Span::new(start, self.current_span().end),
            });

            if self.match_token(&Token::RParen) {
                break;
            }
        }

        Ok(arguments)
    }

    fn parse_directives(&mut self, is_const: bool) -> ParseResult<Vec<Directive>> {
        let mut directives = Vec::new();
        while self.check(&Token::At) {
            let start = self.peek_span().start;
            self.advance();
            let name = self.expect_name()?;
            let arguments = self.parse_arguments(is_const)?;
            directives.push(Directive {
                name,
                arguments,
                span: Span::new(start, self.current_span().end),
            });
        }
        Ok(directives)
    }

    fn parse_value(&mut self, is_const: bool) -> ParseResult<Value> {
        let Some((token, span)) = self.peek_owned() else {
            return Err(self.error_expected("a value"));
        };

        match token {
            Token::Dollar => {
                if is_const {
                    return Err(ParseError::invalid_syntax_span(
                        span,
                        "variables are not allowed in constant values",
                    ));
                }
                self.advance();
                Ok(Value::Variable(self.expect_name()?))
            }
            Token::Int(n) => {
                self.advance();
                Ok(Value::Int(n.to_string()))
            }
            Token::Float(n) => {
                self.advance();
                Ok(Value::Float(n.to_string()))
            }
            Token::String(raw) => {
                self.advance();
                unescape_string(raw)
                    .map(Value::String)
                    .map_err(|message| ParseError::invalid_syntax_span(span, message))
            }
            Token::BlockString(raw) => {
                self.advance();
                Ok(Value::String(block_string_value(raw)))
            }
            Token::Name(name) => {
                self.advance();
                Ok(match name {
                    "true" => Value::Boolean(true),
                    "false" => Value::Boolean(false),
                    "null" => Value::Null,
                    other => Value::Enum(other.to_string()),
                })
            }
            Token::LBracket => self.nested(|parser| {
                parser.advance();
                let mut items = Vec::new();
                while !parser.match_token(&Token::RBracket) {
                    if parser.is_at_end() {
                        return Err(parser.error_expected("']'"));
                    }
                    items.push(parser.parse_value(is_const)?);
                }
                Ok(Value::List(items))
            }),
            Token::LBrace => self.nested(|parser| {
                parser.advance();
                let mut fields = Vec::new();
                while !parser.match_token(&Token::RBrace) {
                    if parser.is_at_end() {
                        return Err(parser.error_expected("'}'"));
                    }
                    let name = parser.expect_name()?;
                    parser.expect(&Token::Colon)?;
                    fields.push((name, parser.parse_value(is_const)?));
                }
                Ok(Value::Object(fields))
            }),
            other => Err(ParseError::unexpected_token_span(
                span,
                "a value",
                other.to_string(),
            )),
        }
    }

    fn parse_type(&mut self) -> ParseResult<Type> {
        let inner = if self.check(&Token::LBracket) {
            self.nested(|parser| {
                parser.advance();
                let item = parser.parse_type()?;
                parser.expect(&Token::RBracket)?;
                Ok(Type::List(Box::new(item)))
            })?
        } else {
            Type::Named(self.expect_name()?)
        };

        if self.match_token(&Token::Bang) {
            Ok(Type::NonNull(Box::new(inner)))
        } else {
            Ok(inner)
        }
    }

    // ------------------------------------------------------------------
    // Type system definitions
    // ------------------------------------------------------------------

    fn parse_type_system_definition(&mut self) -> ParseResult<TypeSystemDefinition> {
        let start = self.peek_span().start;
        let description = self.parse_description()?;

        let Some((token, span)) = self.peek_owned() else {
            return Err(self.error_expected("a type system definition"));
        };

        let keyword = match token {
            Token::Name(keyword) => keyword,
            Token::LBrace => {
                return Err(ParseError::invalid_syntax_span(
                    span,
                    "operations are not allowed in a schema document",
                ));
            }
            other => {
                return Err(ParseError::unexpected_token_span(
                    span,
                    "a type system definition",
                    other.to_string(),
                ));
            }
        };

        match keyword {
            "schema" => Ok(TypeSystemDefinition::Schema(
                self.parse_schema_definition(start, description)?,
            )),
            "directive" => Ok(TypeSystemDefinition::Directive(
                self.parse_directive_definition(start, description)?,
            )),
            "extend" => {
                if description.is_some() {
                    return Err(ParseError::invalid_syntax_span(
                        span,
                        "type extensions cannot have a description",
                    ));
                }
                self.advance();
                let extension = self.parse_type_definition(start, None)?;
                Ok(TypeSystemDefinition::TypeExtension(extension))
            }
            "scalar" | "type" | "interface" | "union" | "enum" | "input" => Ok(
                TypeSystemDefinition::Type(self.parse_type_definition(start, description)?),
            ),
            "query" | "mutation" | "subscription" | "fragment" => {
                Err(ParseError::invalid_syntax_span(
                    span,
                    format!("'{}' definitions are not allowed in a schema document", keyword),
                ))
            }
            other => Err(ParseError::unexpected_token_span(
                span,
                "a type system definition",
                format!("name '{}'", other),
            )),
        }
    }

    fn parse_description(&mut self) -> ParseResult<Option<String>> {
        match self.peek_owned() {
            Some((Token::String(raw), span)) => {
                self.advance();
                unescape_string(raw)
                    .map(Some)
                    .map_err(|message| ParseError::invalid_syntax_span(span, message))
            }
            Some((Token::BlockString(raw), _)) => {
                self.advance();
                Ok(Some(block_string_value(raw)))
            }
            _ => Ok(None),
        }
    }

    fn parse_schema_definition(
        &mut self,
        start: usize,
        description: Option<String>,
    ) -> ParseResult<SchemaDefinition> {
        self.expect_keyword("schema")?;
        let directives = self.parse_directives(true)?;
        self.expect(&Token::LBrace)?;

        let mut operation_types = Vec::new();
        loop {
            let op_start = self.peek_span().start;
            let keyword_span = self.peek_span();
            let keyword = self.expect_name()?;
            let kind = OperationKind::from_keyword(&keyword).ok_or_else(|| {
                ParseError::unexpected_token_span(
                    keyword_span,
                    "'query', 'mutation', or 'subscription'",
                    format!("name '{}'", keyword),
                )
            })?;
            self.expect(&Token::Colon)?;
            let type_name = self.expect_name()?;
            operation_types.push(RootOperationType {
                kind,
                type_name,
                span: Span::new(op_start, self.current_span().end),
            });

            if self.match_token(&Token::RBrace) {
                break;
            }
        }

        Ok(SchemaDefinition {
            description,
            directives,
            operation_types,
            span: Span::new(start, self.current_span().end),
        })
    }

    fn parse_type_definition(
        &mut self,
        start: usize,
        description: Option<String>,
    ) -> ParseResult<TypeDefinition> {
        let keyword_span = self.peek_span();
        let keyword = self.expect_name()?;
        let name = self.expect_name()?;

        let (kind, directives) = match keyword.as_str() {
            "scalar" => (TypeDefinitionKind::Scalar, self.parse_directives(true)?),
            "type" | "interface" => {
                let interfaces = self.parse_implements_interfaces()?;
                let directives = self.parse_directives(true)?;
                let fields = self.parse_fields_definition()?;
                let kind = if keyword == "type" {
                    TypeDefinitionKind::Object { interfaces, fields }
                } else {
                    TypeDefinitionKind::Interface { interfaces, fields }
                };
                (kind, directives)
            }
            "union" => {
                let directives = self.parse_directives(true)?;
                let members = self.parse_union_members()?;
                (TypeDefinitionKind::Union { members }, directives)
            }
            "enum" => {
                let directives = self.parse_directives(true)?;
                let values = self.parse_enum_values()?;
                (TypeDefinitionKind::Enum { values }, directives)
            }
            "input" => {
                let directives = self.parse_directives(true)?;
                let fields = if self.check(&Token::LBrace) {
                    self.parse_input_values(&Token::LBrace, &Token::RBrace)?
                } else {
                    Vec::new()
                };
                (TypeDefinitionKind::InputObject { fields }, directives)
            }
            other => {
                return Err(ParseError::unexpected_token_span(
                    keyword_span,
                    "'scalar', 'type', 'interface', 'union', 'enum', or 'input'",
                    format!("name '{}'", other),
                ));
            }
        };

        Ok(TypeDefinition {
            description,
            name,
            kind,
            directives,
            span: Span::new(start, self.current_span().end),
        })
    }

    fn parse_implements_interfaces(&mut self) -> ParseResult<Vec<String>> {
        if !self.check_keyword("implements") {
            return Ok(Vec::new());
        }
        self.advance();

        // Leading '&' is allowed
        self.match_token(&Token::Amp);
        let mut interfaces = vec![self.expect_name()?];
        while self.match_token(&Token::Amp) {
            interfaces.push(self.expect_name()?);
        }
        Ok(interfaces)
    }

    fn parse_fields_definition(&mut self) -> ParseResult<Vec<FieldDefinition>> {
        if !self.match_token(&Token::LBrace) {
            return Ok(Vec::new());
        }

        let mut fields = Vec::new();
        loop {
            let start = self.peek_span().start;
            let description = self.parse_description()?;
            let name = self.expect_name()?;
            let arguments = if self.check(&Token::LParen) {
                self.parse_input_values(&Token::LParen, &Token::RParen)?
            } else {
                Vec::new()
            };
            self.expect(&Token::Colon)?;
            let type_ = self.parse_type()?;
            let directives = self.parse_directives(true)?;

            fields.push(FieldDefinition {
                description,
                name,
                arguments,
                type_,
                directives,
                span: Span::new(start, self.current_span().end),
            });

            if self.match_token(&Token::RBrace) {
                break;
            }
        }
        Ok(fields)
    }

    /// Input values between `open` and `close`: field arguments or input object fields
    fn parse_input_values(
        &mut self,
        open: &Token<'static>,
        close: &Token<'static>,
    ) -> ParseResult<Vec<InputValueDefinition>> {
        self.expect(open)?;

        let mut values = Vec::new();
        loop {
            let start = self.peek_span().start;
            let description = self.parse_description()?;
            let name = self.expect_name()?;
            self.expect(&Token::Colon)?;
            let type_ = self.parse_type()?;
            let default_value = if self.match_token(&Token::Equals) {
                Some(self.parse_value(true)?)
            } else {
                None
            };
            let directives = self.parse_directives(true)?;

            values.push(InputValueDefinition {
                description,
                name,
                type_,
                default_value,
                directives,
                span: Span::new(start, self.current_span().end),
            });

            if self.match_token(close) {
                break;
            }
        }
        Ok(values)
    }

    fn parse_union_members(&mut self) -> ParseResult<Vec<String>> {
        if !self.match_token(&Token::Equals) {
            return Ok(Vec::new());
        }

        self.match_token(&Token::Pipe);
        let mut members = vec![self.expect_name()?];
        while self.match_token(&Token::Pipe) {
            members.push(self.expect_name()?);
        }
        Ok(members)
    }

    fn parse_enum_values(&mut self) -> ParseResult<Vec<EnumValueDefinition>> {
        if !self.match_token(&Token::LBrace) {
            return Ok(Vec::new());
        }

        let mut values = Vec::new();
        loop {
            let start = self.peek_span().start;
            let description = self.parse_description()?;
            let name_span = self.peek_span();
            let name = self.expect_name()?;
            if matches!(name.as_str(), "true" | "false" | "null") {
                return Err(ParseError::invalid_syntax_span(
                    name_span,
                    format!("'{}' is reserved and cannot be an enum value", name),
                ));
            }
            let directives = self.parse_directives(true)?;

            values.push(EnumValueDefinition {
                description,
                name,
                directives,
                span: Span::new(start, self.current_span().end),
            });

            if self.match_token(&Token::RBrace) {
                break;
            }
        }
        Ok(values)
    }

    fn parse_directive_definition(
        &mut self,
        start: usize,
        description: Option<String>,
    ) -> ParseResult<DirectiveDefinition> {
        self.expect_keyword("directive")?;
        self.expect(&Token::At)?;
        let name = self.expect_name()?;
        let arguments = if self.check(&Token::LParen) {
            self.parse_input_values(&Token::LParen, &Token::RParen)?
        } else {
            Vec::new()
        };

        let repeatable = if self.check_keyword("repeatable") {
            self.advance();
            true
        } else {
            false
        };

        self.expect_keyword("on")?;
        self.match_token(&Token::Pipe);
        let mut locations = vec![self.expect_name()?];
        while self.match_token(&Token::Pipe) {
            locations.push(self.expect_name()?);
        }

        Ok(DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: Span::new(start, self.current_span().end),
        })
    }

    // Helper methods

    fn peek(&self) -> Option<&(Token<'src>, Span)> {
        self.tokens.get(self.pos)
    }

    /// Copy of the next token; tokens only borrow the source, not the parser
    fn peek_owned(&self) -> Option<(Token<'src>, Span)> {
        self.peek().cloned()
    }

    fn advance(&mut self) -> Option<&(Token<'src>, Span)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: &Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(token)
        } else {
            false
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some((Token::Name(name), _)) if *name == keyword)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> ParseResult<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_expected(&token.to_string()))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_expected(&format!("'{}'", keyword)))
        }
    }

    fn expect_name(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::Name(s), _)) => {
                let val = s.to_string();
                self.advance();
                Ok(val)
            }
            _ => Err(self.error_expected("a name")),
        }
    }

    /// Build the error for a missing `expected` at the current position
    /// Run `parse` one nesting level deeper, failing past `MAX_DEPTH`
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::too_deep(self.peek_span(), MAX_DEPTH));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn error_expected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some((token, span)) => {
                ParseError::unexpected_token_span(*span, expected, token.to_string())
            }
            None => ParseError::unexpected_eof(self.source_len, expected),
        }
    }

    /// Get the span of the current token (the one we just consumed)
    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, span)| *span)
            .unwrap_or_default()
    }

    /// Get the span of the next token (the one we're about to consume)
    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| *span)
            .unwrap_or_else(|| Span::new(self.source_len, self.source_len))
    }
}

/// Parse an executable document (operations and fragments)
pub fn parse_document(source: &str) -> ParseResult<Document> {
    Parser::new(source)?.parse_document()
}

/// Parse a schema (SDL) document
pub fn parse_schema(source: &str) -> ParseResult<SchemaDocument> {
    Parser::new(source)?.parse_schema_document()
}

/// Parse a type reference such as `[Episode!]!`
pub fn parse_type(source: &str) -> ParseResult<Type> {
    Parser::new(source)?.parse_standalone_type()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_query() {
        let doc = parse_document(
            "query Hero($episode: Episode = JEDI) { hero(episode: $episode) { name } }",
        )
        .expect("parse");

        let op = doc.operations().next().expect("operation");
        assert_eq!(op.kind, OperationKind::Query);
        assert_eq!(op.name.as_deref(), Some("Hero"));
        assert_eq!(op.variable_definitions.len(), 1);
        assert_eq!(
            op.variable_definitions[0].default_value,
            Some(Value::Enum("JEDI".to_string()))
        );

        let Selection::Field(hero) = &op.selection_set.items[0] else {
            panic!("expected field");
        };
        assert_eq!(hero.name, "hero");
        assert_eq!(hero.arguments[0].value, Value::Variable("episode".to_string()));
        assert!(hero.selection_set.is_some());
    }

    #[test]
    fn test_parse_query_shorthand() {
        let doc = parse_document("{ hero { id } }").expect("parse");
        let op = doc.operations().next().expect("operation");
        assert_eq!(op.kind, OperationKind::Query);
        assert!(op.name.is_none());
    }

    #[test]
    fn test_parse_fragment_with_relay_arguments() {
        let source = r#"
            fragment CharacterData on Character
              @argumentDefinitions(includeAppearsIn: { type: "Boolean", defaultValue: false }) {
              id
              appearsIn @include(if: $includeAppearsIn)
            }
        "#;
        let doc = parse_document(source).expect("parse");
        let fragment = doc.fragments().next().expect("fragment");
        assert_eq!(fragment.name, "CharacterData");
        assert_eq!(fragment.type_condition, "Character");

        let defs = &fragment.directives[0];
        assert_eq!(defs.name, "argumentDefinitions");
        let Value::Object(fields) = &defs.arguments[0].value else {
            panic!("expected object value");
        };
        assert_eq!(fields[0], ("type".to_string(), Value::String("Boolean".to_string())));
        assert_eq!(fields[1], ("defaultValue".to_string(), Value::Boolean(false)));
    }

    #[test]
    fn test_parse_spreads_and_inline_fragments() {
        let source = r#"
            query Q {
              search(text: "x") {
                ... on Human { name }
                ... @include(if: true) { __typename }
                ...DroidFields @arguments(verbose: true)
              }
            }
        "#;
        let doc = parse_document(source).expect("parse");
        let op = doc.operations().next().expect("operation");
        let Selection::Field(search) = &op.selection_set.items[0] else {
            panic!("expected field");
        };
        let items = &search.selection_set.as_ref().expect("selections").items;

        assert!(matches!(
            &items[0],
            Selection::InlineFragment(InlineFragment {
                type_condition: Some(t),
                ..
            }) if t == "Human"
        ));
        assert!(matches!(
            &items[1],
            Selection::InlineFragment(InlineFragment { type_condition: None, .. })
        ));
        assert!(matches!(
            &items[2],
            Selection::FragmentSpread(FragmentSpread { fragment_name, .. })
                if fragment_name == "DroidFields"
        ));
    }

    #[test]
    fn test_parse_alias() {
        let doc = parse_document("{ luke: human(id: \"1000\") { name } }").expect("parse");
        let op = doc.operations().next().expect("operation");
        let Selection::Field(field) = &op.selection_set.items[0] else {
            panic!("expected field");
        };
        assert_eq!(field.alias.as_deref(), Some("luke"));
        assert_eq!(field.response_key(), "luke");
    }

    #[test]
    fn test_empty_selection_set_is_error() {
        assert!(parse_document("query Q { }").is_err());
    }

    #[test]
    fn test_empty_document_is_error() {
        assert!(matches!(
            parse_document("   # nothing here"),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_variable_in_const_position_rejected() {
        let result = parse_document("query Q($a: Int = $b) { hero { id } }");
        assert!(matches!(result, Err(ParseError::InvalidSyntax { .. })));
    }

    #[test]
    fn test_type_definitions_rejected_in_operation_document() {
        let result = parse_document("type Query { a: Int }");
        assert!(matches!(result, Err(ParseError::InvalidSyntax { .. })));
    }

    #[test]
    fn test_unterminated_selection_reports_eof() {
        match parse_document("query Q { hero { id }") {
            Err(ParseError::UnexpectedEof { pos, .. }) => assert_eq!(pos, 21),
            other => panic!("expected eof error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_schema_types() {
        let source = r#"
            schema { query: Root }
            "The root"
            type Root implements Node & Entity @deprecated {
              "Fetch a node"
              node(id: ID!, first: Int = 10): Node
              list: [[Float!]!]
            }
            interface Node { id: ID! }
            interface Entity { id: ID! }
            union SearchResult = | Human | Droid
            enum Episode { NEWHOPE EMPIRE JEDI }
            input ReviewInput { stars: Int! commentary: String = "none" }
            scalar DateTime
            directive @cached(ttl: Int) repeatable on FIELD_DEFINITION | OBJECT
            extend type Root { extra: String }
        "#;
        let doc = parse_schema(source).expect("parse");
        assert_eq!(doc.definitions.len(), 10);

        let TypeSystemDefinition::Type(root) = &doc.definitions[1] else {
            panic!("expected type definition");
        };
        assert_eq!(root.description.as_deref(), Some("The root"));
        let TypeDefinitionKind::Object { interfaces, fields } = &root.kind else {
            panic!("expected object type");
        };
        assert_eq!(interfaces, &vec!["Node".to_string(), "Entity".to_string()]);
        assert_eq!(fields[0].description.as_deref(), Some("Fetch a node"));
        assert_eq!(fields[0].arguments.len(), 2);
        assert_eq!(fields[1].type_.to_string(), "[[Float!]!]");

        let TypeSystemDefinition::Directive(directive) = &doc.definitions[8] else {
            panic!("expected directive definition");
        };
        assert!(directive.repeatable);
        assert_eq!(directive.locations, vec!["FIELD_DEFINITION", "OBJECT"]);

        assert!(matches!(doc.definitions[9], TypeSystemDefinition::TypeExtension(_)));
    }

    #[test]
    fn test_operations_rejected_in_schema_document() {
        assert!(matches!(
            parse_schema("query Q { a }"),
            Err(ParseError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn test_parse_type_reference() {
        assert_eq!(parse_type("[String!]!").expect("type").to_string(), "[String!]!");
        assert_eq!(parse_type("Boolean").expect("type"), Type::Named("Boolean".to_string()));
        assert!(parse_type("[String").is_err());
        assert!(parse_type("String Int").is_err());
    }
}
