//! Document transforms. Each one is a pure function from one context to the next.

mod apply_fragment_arguments;
mod filter_directives;
mod flatten;
mod inline_fragments;
mod skip_redundant_nodes;

pub use apply_fragment_arguments::apply_fragment_arguments;
pub use filter_directives::filter_directives;
pub use flatten::{flatten, flatten_with, FlattenOptions};
pub use inline_fragments::inline_fragments;
pub use skip_redundant_nodes::skip_redundant_nodes;

use crate::context::CompilerContext;
use crate::error::TransformResult;
use std::fmt;

pub type TransformFn = fn(&CompilerContext) -> TransformResult<CompilerContext>;

/// A named entry of the transform registry
#[derive(Clone, Copy)]
pub struct Transform {
    /// Stable identifier used by configuration and the CLI
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub transform: TransformFn,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform").field("name", &self.name).finish()
    }
}

pub static FILTER_DIRECTIVES: Transform = Transform {
    name: "filter_directives",
    title: "FilterDirectivesTransform",
    description: "Strips directives the server schema does not declare",
    transform: filter_directives,
};

pub static APPLY_FRAGMENT_ARGUMENTS: Transform = Transform {
    name: "apply_fragment_arguments",
    title: "RelayApplyFragmentArgumentTransform",
    description: "Specializes each spread fragment for the arguments it is passed",
    transform: apply_fragment_arguments,
};

pub static INLINE_FRAGMENTS: Transform = Transform {
    name: "inline_fragments",
    title: "InlineFragmentsTransform",
    description: "Replaces fragment spreads with inline fragments and drops fragments",
    transform: inline_fragments,
};

pub static FLATTEN: Transform = Transform {
    name: "flatten",
    title: "FlattenTransform",
    description: "Merges redundant inline fragments and duplicate fields",
    transform: flatten,
};

pub static SKIP_REDUNDANT_NODES: Transform = Transform {
    name: "skip_redundant_nodes",
    title: "SkipRedundantNodesTransform",
    description: "Removes selections already fetched by an ancestor or sibling",
    transform: skip_redundant_nodes,
};

/// Always applied before any selectable transform
pub static MANDATORY_TRANSFORMS: &[&Transform] = &[&FILTER_DIRECTIVES];

/// Selectable transforms in their fixed order
pub static DEFAULT_TRANSFORMS: &[&Transform] = &[
    &APPLY_FRAGMENT_ARGUMENTS,
    &INLINE_FRAGMENTS,
    &FLATTEN,
    &SKIP_REDUNDANT_NODES,
];

/// Look up a selectable transform by name
pub fn find_transform(name: &str) -> Option<&'static Transform> {
    DEFAULT_TRANSFORMS
        .iter()
        .copied()
        .find(|transform| transform.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_lookup() {
        let names: Vec<_> = DEFAULT_TRANSFORMS.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "apply_fragment_arguments",
                "inline_fragments",
                "flatten",
                "skip_redundant_nodes"
            ]
        );
        assert_eq!(
            find_transform("flatten").map(|t| t.title),
            Some("FlattenTransform")
        );
        assert!(find_transform("filter_directives").is_none());
        assert!(find_transform("print").is_none());
    }
}
