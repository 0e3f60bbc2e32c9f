//! Borrow checking error types.

use fc_mir::{AccessKind, BorrowKind, Loan, Location, MirError};
use fc_region::RegionError;
use fc_span::FileSpan;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for borrow checking operations.
///
/// Borrow checking can produce multiple errors, so we collect them all.
pub type BorrowResult<T> = Result<T, Vec<BorrowError>>;

/// Errors that can occur during borrow checking.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum BorrowError {
    /// Attempting to write to a borrowed place.
    ///
    /// While a loan of a place is live, the place (and anything overlapping
    /// it) cannot be assigned.
    #[error("cannot assign to `{place}` because it is borrowed")]
    #[diagnostic(code(borrowck::write_while_borrowed))]
    WriteWhileBorrowed {
        /// The place being written to
        place: String,
        /// The active loan preventing the write
        loan: Loan,
        /// Location of the write
        location: Location,
        /// Source span of the write
        span: Option<FileSpan>,
    },

    /// Attempting to move a borrowed value.
    #[error("cannot move out of `{place}` because it is borrowed")]
    #[diagnostic(code(borrowck::move_while_borrowed))]
    MoveWhileBorrowed {
        /// The place being moved
        place: String,
        /// The active loan preventing the move
        loan: Loan,
        /// Location of the move
        location: Location,
        /// Source span of the move
        span: Option<FileSpan>,
    },

    /// Reading a place while a mutable loan of it is live.
    #[error("cannot use `{place}` because it is mutably borrowed")]
    #[diagnostic(code(borrowck::read_while_mutably_borrowed))]
    ReadWhileMutablyBorrowed {
        /// The place being read
        place: String,
        /// The mutable loan
        loan: Loan,
        /// Location of the read
        location: Location,
        /// Source span of the read
        span: Option<FileSpan>,
    },

    /// Conflicting borrows of the same place.
    ///
    /// This occurs when trying to create a mutable borrow while any borrow
    /// is live, or any borrow while a mutable borrow is live.
    #[error("cannot borrow `{place}` as {kind} because it is also borrowed as {}", .loan.kind)]
    #[diagnostic(code(borrowck::conflicting_borrow))]
    ConflictingBorrow {
        /// The place being borrowed
        place: String,
        /// Kind of the new borrow
        kind: BorrowKind,
        /// The existing loan it conflicts with
        loan: Loan,
        /// Location of the new borrow
        location: Location,
        /// Source span of the new borrow
        span: Option<FileSpan>,
    },

    /// A local's storage ends while a loan of it is still live.
    #[error("`{place}` does not live long enough")]
    #[diagnostic(
        code(borrowck::dropped_while_borrowed),
        help("the borrow is still used after the storage of `{place}` ends")
    )]
    DroppedWhileBorrowed {
        /// The dying local
        place: String,
        /// The loan that outlives it
        loan: Loan,
        /// Location of the storage death
        location: Location,
        /// Source span of the storage death
        span: Option<FileSpan>,
    },

    /// A constraint between origins that cannot be satisfied.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Region(#[from] RegionError),

    /// The body is malformed; nothing was checked.
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidBody(#[from] MirError),
}

impl BorrowError {
    /// Builds the conflict error for an access of `kind` to `place`.
    pub(crate) fn conflict(
        kind: AccessKind,
        place: String,
        loan: Loan,
        location: Location,
        span: Option<FileSpan>,
    ) -> Self {
        match kind {
            AccessKind::Write => Self::WriteWhileBorrowed {
                place,
                loan,
                location,
                span,
            },
            AccessKind::Move => Self::MoveWhileBorrowed {
                place,
                loan,
                location,
                span,
            },
            AccessKind::Read => Self::ReadWhileMutablyBorrowed {
                place,
                loan,
                location,
                span,
            },
            AccessKind::Borrow(kind) => Self::ConflictingBorrow {
                place,
                kind,
                loan,
                location,
                span,
            },
            AccessKind::StorageDead => Self::DroppedWhileBorrowed {
                place,
                loan,
                location,
                span,
            },
        }
    }

    /// Returns the location this error is reported at, if it has one.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::WriteWhileBorrowed { location, .. }
            | Self::MoveWhileBorrowed { location, .. }
            | Self::ReadWhileMutablyBorrowed { location, .. }
            | Self::ConflictingBorrow { location, .. }
            | Self::DroppedWhileBorrowed { location, .. } => Some(*location),
            Self::Region(error) => Some(error.location()),
            Self::InvalidBody(_) => None,
        }
    }

    /// Returns the loan involved in a conflict.
    #[must_use]
    pub fn loan(&self) -> Option<&Loan> {
        match self {
            Self::WriteWhileBorrowed { loan, .. }
            | Self::MoveWhileBorrowed { loan, .. }
            | Self::ReadWhileMutablyBorrowed { loan, .. }
            | Self::ConflictingBorrow { loan, .. }
            | Self::DroppedWhileBorrowed { loan, .. } => Some(loan),
            Self::Region(_) | Self::InvalidBody(_) => None,
        }
    }

    /// Returns the primary source location for this error.
    #[must_use]
    pub fn span(&self) -> Option<FileSpan> {
        match self {
            Self::WriteWhileBorrowed { span, .. }
            | Self::MoveWhileBorrowed { span, .. }
            | Self::ReadWhileMutablyBorrowed { span, .. }
            | Self::ConflictingBorrow { span, .. }
            | Self::DroppedWhileBorrowed { span, .. } => *span,
            Self::Region(error) => error.span(),
            Self::InvalidBody(_) => None,
        }
    }

    /// Short name of the access that caused a conflict.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::WriteWhileBorrowed { .. } => "write",
            Self::MoveWhileBorrowed { .. } => "move",
            Self::ReadWhileMutablyBorrowed { .. } => "read",
            Self::ConflictingBorrow { .. } => "borrow",
            Self::DroppedWhileBorrowed { .. } => "storage death",
            Self::Region(_) => "region",
            Self::InvalidBody(_) => "invalid body",
        }
    }

    /// Returns a detailed message explaining the error.
    #[must_use]
    pub fn detailed_message(&self) -> String {
        match self.loan() {
            Some(loan) => format!(
                "{self}: {} borrow {} created at {} is used later",
                loan.kind, loan.id, loan.location
            ),
            None => self.to_string(),
        }
    }
}
