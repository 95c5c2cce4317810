use crate::ir::*;

/// Visitor pattern for traversing IR immutably
///
/// Default implementations walk the entire tree.
/// Override specific visit_* methods to act on nodes.
pub(crate) trait Visitor: Sized {
    fn visit_document(&mut self, document: &ExecutableDefinition) {
        walk_document(self, document);
    }

    fn visit_selection(&mut self, selection: &Selection) {
        walk_selection(self, selection);
    }

    fn visit_directive(&mut self, directive: &Directive) {
        walk_directive(self, directive);
    }

    fn visit_argument(&mut self, argument: &Argument) {
        self.visit_value(&argument.value);
    }

    fn visit_value(&mut self, _value: &Value) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor for rewriting IR in place
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, document: &mut ExecutableDefinition) {
        walk_document_mut(self, document);
    }

    fn visit_selection_mut(&mut self, selection: &mut Selection) {
        walk_selection_mut(self, selection);
    }

    fn visit_directives_mut(&mut self, _directives: &mut Vec<Directive>) {
        // Leaf node, no children to walk
    }
}

// Default walk implementations for immutable visitor

pub(crate) fn walk_document<V: Visitor>(visitor: &mut V, document: &ExecutableDefinition) {
    for directive in document.directives() {
        visitor.visit_directive(directive);
    }
    for selection in document.selections() {
        visitor.visit_selection(selection);
    }
}

pub(crate) fn walk_selection<V: Visitor>(visitor: &mut V, selection: &Selection) {
    match selection {
        Selection::ScalarField(field) => {
            for argument in &field.arguments {
                visitor.visit_argument(argument);
            }
            for directive in &field.directives {
                visitor.visit_directive(directive);
            }
        }
        Selection::LinkedField(field) => {
            for argument in &field.arguments {
                visitor.visit_argument(argument);
            }
            for directive in &field.directives {
                visitor.visit_directive(directive);
            }
            for child in &field.selections {
                visitor.visit_selection(child);
            }
        }
        Selection::InlineFragment(inline) => {
            for directive in &inline.directives {
                visitor.visit_directive(directive);
            }
            for child in &inline.selections {
                visitor.visit_selection(child);
            }
        }
        Selection::FragmentSpread(spread) => {
            for argument in &spread.arguments {
                visitor.visit_argument(argument);
            }
            for directive in &spread.directives {
                visitor.visit_directive(directive);
            }
        }
        Selection::Condition(condition) => {
            for child in &condition.selections {
                visitor.visit_selection(child);
            }
        }
    }
}

pub(crate) fn walk_directive<V: Visitor>(visitor: &mut V, directive: &Directive) {
    for argument in &directive.arguments {
        visitor.visit_argument(argument);
    }
}

// Default walk implementations for mutable visitor

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, document: &mut ExecutableDefinition) {
    let (directives, selections) = match document {
        ExecutableDefinition::Operation(op) => (&mut op.directives, &mut op.selections),
        ExecutableDefinition::Fragment(fragment) => {
            (&mut fragment.directives, &mut fragment.selections)
        }
    };
    visitor.visit_directives_mut(directives);
    for selection in selections {
        visitor.visit_selection_mut(selection);
    }
}

pub fn walk_selection_mut<V: VisitorMut>(visitor: &mut V, selection: &mut Selection) {
    match selection {
        Selection::ScalarField(field) => {
            visitor.visit_directives_mut(&mut field.directives);
        }
        Selection::LinkedField(field) => {
            visitor.visit_directives_mut(&mut field.directives);
            for child in &mut field.selections {
                visitor.visit_selection_mut(child);
            }
        }
        Selection::InlineFragment(inline) => {
            visitor.visit_directives_mut(&mut inline.directives);
            for child in &mut inline.selections {
                visitor.visit_selection_mut(child);
            }
        }
        Selection::FragmentSpread(spread) => {
            visitor.visit_directives_mut(&mut spread.directives);
        }
        Selection::Condition(condition) => {
            for child in &mut condition.selections {
                visitor.visit_selection_mut(child);
            }
        }
    }
}

/// Node counts over a set of documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub scalar_fields: usize,
    pub linked_fields: usize,
    pub inline_fragments: usize,
    pub fragment_spreads: usize,
    pub conditions: usize,
    pub directives: usize,
    pub variables: usize,
}

impl DocumentStats {
    pub fn collect<'a>(documents: impl IntoIterator<Item = &'a ExecutableDefinition>) -> Self {
        let mut stats = Self::default();
        for document in documents {
            stats.visit_document(document);
        }
        stats
    }
}

impl Visitor for DocumentStats {
    fn visit_selection(&mut self, selection: &Selection) {
        match selection {
            Selection::ScalarField(_) => self.scalar_fields += 1,
            Selection::LinkedField(_) => self.linked_fields += 1,
            Selection::InlineFragment(_) => self.inline_fragments += 1,
            Selection::FragmentSpread(_) => self.fragment_spreads += 1,
            Selection::Condition(condition) => {
                if matches!(condition.value, ConditionValue::Variable(_)) {
                    self.variables += 1;
                }
                self.conditions += 1;
            }
        }
        walk_selection(self, selection);
    }

    fn visit_directive(&mut self, directive: &Directive) {
        self.directives += 1;
        walk_directive(self, directive);
    }

    fn visit_value(&mut self, value: &Value) {
        match value {
            Value::Variable(_) => self.variables += 1,
            Value::List(items) => items.iter().for_each(|item| self.visit_value(item)),
            Value::Object(fields) => fields.iter().for_each(|(_, v)| self.visit_value(v)),
            Value::Constant(_) => {}
        }
    }
}
