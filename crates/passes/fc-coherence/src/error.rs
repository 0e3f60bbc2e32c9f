//! Coherence errors.

use fc_span::FileSpan;
use miette::Diagnostic;
use thiserror::Error;

/// An impl set that would make trait dispatch ambiguous or non-local.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum CoherenceError {
    /// Two impls of the same trait apply to a common type
    #[error("conflicting implementations of `{trait_name}`: `{first}` and `{second}`")]
    #[diagnostic(
        code(coherence::overlapping_impls),
        help("both impls apply to `{witness}`")
    )]
    OverlappingImpls {
        /// Trait name
        trait_name: String,
        /// Self type of the earlier impl
        first: String,
        /// Self type of the later impl
        second: String,
        /// A type both impls apply to
        witness: String,
        /// Source span of the later impl
        span: Option<FileSpan>,
    },

    /// Neither the trait nor the self type is defined locally
    #[error("impl of foreign trait `{trait_name}` for foreign type `{self_ty}`")]
    #[diagnostic(
        code(coherence::orphan_impl),
        help("define the trait or the type in this crate")
    )]
    OrphanImpl {
        /// Trait name
        trait_name: String,
        /// Self type
        self_ty: String,
        /// Source span of the impl
        span: Option<FileSpan>,
    },
}
