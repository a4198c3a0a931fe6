pub mod text_diff;
pub mod delta;
pub mod difference;
pub mod introspect;
pub mod equality;
pub mod filter;
pub mod path;
pub mod match_tracker;
mod collection;
pub mod engine;
#[cfg(feature = "documents")]
pub mod documents;

pub use text_diff::{
    diff_lines, diff_lines_with, diff_words, EditItem, LineDiffOptions, Segment, SegmentKind,
    TextDiffEngine, TextDifferences, WordDifferences,
};
pub use delta::{resolve_delta, Delta};
pub use difference::Difference;
pub use introspect::{DescriptorIntrospector, Introspector};
pub use equality::{DeclaredEquality, EqualityOutcome, EqualityPolicy};
pub use filter::{FilterMode, MemberFilter};
pub use path::{PropertyPath, Selector};
pub use engine::{diff, diff_with, DiffExt, DiffProvider};
#[cfg(feature = "documents")]
pub use documents::{load_document, parse_document, DocumentFormat};

pub use graphdiff_common::{
    diffable_struct, ComparisonOptions, DiffIgnore, DiffOptions, Diffable, GraphDiffError,
    ObjectRef, Result, TypeDescriptor, TypeInfo, Value,
};
