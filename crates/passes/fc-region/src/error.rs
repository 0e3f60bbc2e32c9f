//! Region inference errors.

use fc_mir::{LoanId, Location};
use fc_span::FileSpan;
use miette::Diagnostic;
use thiserror::Error;

/// Errors found while building or checking the subset graph.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum RegionError {
    /// Two types that must be related have different shapes.
    ///
    /// This is a type error in the input; obligations at this site cannot
    /// be generated, so the analysis stops.
    #[error("mismatched types: expected `{expected}`, found `{found}`")]
    #[diagnostic(code(region::incompatible_types))]
    IncompatibleTypes {
        /// The supertype side
        expected: String,
        /// The subtype side
        found: String,
        /// Where the obligation arises
        location: Location,
        /// Source span of the statement
        span: Option<FileSpan>,
    },

    /// A loan created in the body flows into a universal origin.
    ///
    /// Universal origins outlive the body, so a local borrow may not be
    /// stored in one.
    #[error("loan {loan} escapes into universal origin `'{origin}`")]
    #[diagnostic(
        code(region::loan_escapes),
        help("the borrowed value does not live as long as `'{origin}`")
    )]
    LoanEscapes {
        /// The escaping loan
        loan: LoanId,
        /// Name of the universal origin
        origin: String,
        /// First point where the loan is observed in the origin
        location: Location,
        /// Source span of that point
        span: Option<FileSpan>,
    },

    /// One universal origin flows into another without a declared bound.
    #[error("`'{sub}` flows into `'{sup}`, but `'{sub}: '{sup}` is not declared")]
    #[diagnostic(
        code(region::universal_subset),
        help("add the bound `'{sub}: '{sup}` to the signature")
    )]
    UniversalSubset {
        /// Universal origin that flows
        sub: String,
        /// Universal origin it flows into
        sup: String,
        /// First point where the flow is observed
        location: Location,
        /// Source span of that point
        span: Option<FileSpan>,
    },
}

impl RegionError {
    /// Location the error is reported at.
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Self::IncompatibleTypes { location, .. }
            | Self::LoanEscapes { location, .. }
            | Self::UniversalSubset { location, .. } => *location,
        }
    }

    /// Source span, if the frontend supplied one.
    #[must_use]
    pub fn span(&self) -> Option<FileSpan> {
        match self {
            Self::IncompatibleTypes { span, .. }
            | Self::LoanEscapes { span, .. }
            | Self::UniversalSubset { span, .. } => *span,
        }
    }
}
