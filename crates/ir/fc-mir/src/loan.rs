//! Loans: the borrows an origin may contain.

use std::fmt;

use fc_index::{IndexVec, newtype_index};
use fc_span::FileSpan;
use rustc_hash::FxHashMap;

use crate::{AccessKind, Body, Location, OriginId, Place, Rvalue, StatementKind};

newtype_index! {
    /// A loan, numbered in block order then statement order.
    pub struct LoanId;
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// The kind of borrow a loan records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BorrowKind {
    /// Shared borrow (`&place`)
    Shared,
    /// Mutable borrow (`&mut place`)
    Mutable,
}

impl BorrowKind {
    /// Returns `true` for `&mut` borrows.
    #[must_use]
    pub fn is_mutable(self) -> bool {
        self == Self::Mutable
    }

    /// Returns `true` for `&` borrows.
    #[must_use]
    pub fn is_shared(self) -> bool {
        self == Self::Shared
    }

    /// Whether an access of the given kind to an overlapping place
    /// invalidates a live loan of this kind.
    ///
    /// Shared loans tolerate reads and further shared borrows; mutable loans
    /// tolerate nothing.
    #[must_use]
    pub fn conflicts_with(self, access: AccessKind) -> bool {
        match self {
            Self::Mutable => true,
            Self::Shared => match access {
                AccessKind::Read | AccessKind::Borrow(Self::Shared) => false,
                AccessKind::Write
                | AccessKind::Move
                | AccessKind::Borrow(Self::Mutable)
                | AccessKind::StorageDead => true,
            },
        }
    }
}

impl fmt::Display for BorrowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Mutable => write!(f, "mutable"),
        }
    }
}

/// A borrow of a place, created by a `&'r place` or `&'r mut place` rvalue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    /// Loan identity
    pub id: LoanId,
    /// Shared or mutable
    pub kind: BorrowKind,
    /// The borrowed place
    pub place: Place,
    /// Origin written on the borrow expression
    pub origin: OriginId,
    /// Where the borrow happens
    pub location: Location,
    /// Source span of the borrow, if known
    pub span: Option<FileSpan>,
}

/// Every loan of a body.
#[derive(Debug, Clone, Default)]
pub struct LoanTable {
    loans: IndexVec<LoanId, Loan>,
    by_location: FxHashMap<Location, LoanId>,
}

impl LoanTable {
    /// Collects one loan per borrow rvalue, in block order then statement
    /// order.
    #[must_use]
    pub fn collect(body: &Body) -> Self {
        let mut table = Self::default();
        for (block, data) in body.basic_blocks.iter_enumerated() {
            for (statement_index, statement) in data.statements.iter().enumerate() {
                let StatementKind::Assign(_, Rvalue::Ref { origin, kind, place }) = &statement.kind
                else {
                    continue;
                };
                let location = Location {
                    block,
                    statement_index,
                };
                let id = table.loans.next_index();
                table.loans.push(Loan {
                    id,
                    kind: *kind,
                    place: place.clone(),
                    origin: *origin,
                    location,
                    span: statement.span,
                });
                table.by_location.insert(location, id);
            }
        }
        table
    }

    /// The loan with the given id.
    #[must_use]
    pub fn get(&self, id: LoanId) -> &Loan {
        &self.loans[id]
    }

    /// The loan created at `location`, if the statement there is a borrow.
    #[must_use]
    pub fn loan_at(&self, location: Location) -> Option<LoanId> {
        self.by_location.get(&location).copied()
    }

    /// All loans in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Loan> + '_ {
        self.loans.iter()
    }

    /// Number of loans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loans.len()
    }

    /// Returns `true` if the body borrows nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyBuilder, Ty};
    use fc_index::Idx;

    #[test]
    fn test_shared_loans_allow_reads_and_shared_borrows() {
        let shared = BorrowKind::Shared;
        assert!(!shared.conflicts_with(AccessKind::Read));
        assert!(!shared.conflicts_with(AccessKind::Borrow(BorrowKind::Shared)));
        assert!(shared.conflicts_with(AccessKind::Write));
        assert!(shared.conflicts_with(AccessKind::Move));
        assert!(shared.conflicts_with(AccessKind::Borrow(BorrowKind::Mutable)));
        assert!(shared.conflicts_with(AccessKind::StorageDead));
    }

    #[test]
    fn test_mutable_loans_conflict_with_everything() {
        let kinds = [
            AccessKind::Read,
            AccessKind::Write,
            AccessKind::Move,
            AccessKind::Borrow(BorrowKind::Shared),
            AccessKind::Borrow(BorrowKind::Mutable),
            AccessKind::StorageDead,
        ];
        assert!(kinds.into_iter().all(|kind| BorrowKind::Mutable.conflicts_with(kind)));
    }

    #[test]
    fn test_collect_numbers_loans_in_cfg_order() {
        let mut b = BodyBuilder::new("f");
        let r0 = b.origin("0");
        let r1 = b.origin("1");
        let x = b.local("x", Ty::Int);
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        let q = b.local("q", Ty::mut_ref(r1, Ty::Int));
        let bb0 = b.block();
        let bb1 = b.block();
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.goto(bb0, bb1);
        b.borrow(bb1, q, r1, BorrowKind::Mutable, x);
        b.ret(bb1);
        let body = b.finish().unwrap();

        let loans = LoanTable::collect(&body);
        assert_eq!(loans.len(), 2);
        let l0 = loans.get(LoanId::new(0));
        assert_eq!(l0.kind, BorrowKind::Shared);
        assert_eq!(l0.origin, r0);
        assert_eq!(l0.location, Location::new(bb0, 0));
        let l1 = loans.get(LoanId::new(1));
        assert_eq!(l1.kind, BorrowKind::Mutable);
        assert_eq!(loans.loan_at(Location::new(bb1, 0)), Some(LoanId::new(1)));
        assert_eq!(loans.loan_at(Location::new(bb0, 1)), None);
    }
}
