//! Word and character diffs between two translations.
//!
//! # Examples
//!
//! ```
//! use versio::diff::{DiffMode, annotate};
//!
//! let (a, b) = annotate("a b c d e", "a B c e f", DiffMode::Word);
//! assert_eq!(a, r#"a <span class="diff diff-sub">b</span> c <span class="diff diff-del">d</span> e"#);
//! assert_eq!(b, r#"a <span class="diff diff-sub">B</span> c e <span class="diff diff-ins">f</span>"#);
//! ```

pub mod annotate;
pub mod matcher;

pub use annotate::{
    DiffMode, DiffRow, annotate, annotate_streams, annotate_with_similarity, strip_markers,
};
pub use matcher::{OpTag, Opcode, SequenceMatcher};
