//! Flow-sensitive borrow checker.
//!
//! This crate checks a [`Body`](fc_mir::Body) for accesses that invalidate
//! loans which are still in use. Whether a loan is "in use" comes from
//! origin inference: a loan matters at a point only while it is contained
//! in an origin of some live variable, and it stops mattering for good once
//! the borrowed place is overwritten.
//!
//! # Architecture
//!
//! - [`BorrowChecker`]: runs the pipeline and compares accesses with loans
//! - [`ActiveLoans`]: forward dataflow of the loans still observable
//! - [`BorrowckFacts`]: everything derived for a body, for inspection
//! - [`BorrowError`]: conflicts, region errors and malformed input
//!
//! # Conflicts
//!
//! Shared loans forbid writes, moves, mutable borrows and storage death of
//! overlapping places. Mutable loans forbid every access, including reads
//! (reported only when [`BorrowckConfig::check_reads`] is set).
//!
//! # Examples
//!
//! ```rust
//! use fc_borrowck::BorrowChecker;
//! use fc_mir::{BodyBuilder, BorrowKind, Place, Ty};
//!
//! let mut b = BodyBuilder::new("example");
//! let r = b.origin("0");
//! let x = b.local("x", Ty::Int);
//! let p = b.local("p", Ty::shared_ref(r, Ty::Int));
//! let y = b.local("y", Ty::Int);
//! let bb0 = b.block();
//! b.borrow(bb0, p, r, BorrowKind::Shared, x);
//! b.assign_const(bb0, x, 1);
//! b.copy(bb0, y, Place::from_local(p).deref());
//! b.ret(bb0);
//! let body = b.finish().unwrap();
//!
//! let errors = BorrowChecker::check(&body).unwrap_err();
//! assert_eq!(errors[0].to_string(), "cannot assign to `x` because it is borrowed");
//! ```

mod active;
mod checker;
mod config;
mod error;

pub use active::ActiveLoans;
pub use checker::{BorrowChecker, BorrowckFacts};
pub use config::BorrowckConfig;
pub use error::{BorrowError, BorrowResult};

#[cfg(test)]
mod tests {
    use super::*;
    use fc_mir::{
        BasicBlock, Body, BodyBuilder, BorrowKind, LocalId, Location, OriginId, Place, Ty,
    };

    struct Simple {
        b: BodyBuilder,
        r0: OriginId,
        r1: OriginId,
        x: LocalId,
        y: LocalId,
        bb0: BasicBlock,
    }

    fn simple() -> Simple {
        let mut b = BodyBuilder::new("f");
        let r0 = b.origin("0");
        let r1 = b.origin("1");
        let x = b.local("x", Ty::Int);
        let y = b.local("y", Ty::Int);
        let bb0 = b.block();
        Simple {
            b,
            r0,
            r1,
            x,
            y,
            bb0,
        }
    }

    fn finish(mut b: BodyBuilder, bb0: BasicBlock) -> Body {
        b.ret(bb0);
        b.finish().unwrap()
    }

    #[test]
    fn test_write_after_last_use_is_accepted() {
        let Simple { mut b, r0, x, y, bb0, .. } = simple();
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        b.assign_const(bb0, x, 0);
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.copy(bb0, y, Place::from_local(p).deref());
        b.assign_const(bb0, x, 1);
        let body = finish(b, bb0);
        assert_eq!(BorrowChecker::check(&body), Ok(()));
    }

    #[test]
    fn test_write_before_use_is_rejected() {
        let Simple { mut b, r0, x, y, bb0, .. } = simple();
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        b.assign_const(bb0, x, 0);
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.assign_const(bb0, x, 1);
        b.copy(bb0, y, Place::from_local(p).deref());
        let body = finish(b, bb0);

        let errors = BorrowChecker::check(&body).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location(), Some(Location::new(bb0, 2)));
        assert_eq!(errors[0].reason(), "write");
        assert!(matches!(&errors[0], BorrowError::WriteWhileBorrowed { place, .. } if place == "x"));
    }

    #[test]
    fn test_read_under_mutable_loan_depends_on_config() {
        let Simple { mut b, r0, x, y, bb0, .. } = simple();
        let p = b.local("p", Ty::mut_ref(r0, Ty::Int));
        b.assign_const(bb0, x, 0);
        b.borrow(bb0, p, r0, BorrowKind::Mutable, x);
        b.copy(bb0, y, x);
        b.assign_const(bb0, Place::from_local(p).deref(), 1);
        let body = finish(b, bb0);

        let errors = BorrowChecker::check(&body).unwrap_err();
        assert!(matches!(errors[..], [BorrowError::ReadWhileMutablyBorrowed { .. }]));

        let config = BorrowckConfig {
            check_reads: false,
            ..BorrowckConfig::default()
        };
        assert_eq!(BorrowChecker::check_with_config(&body, &config), Ok(()));
    }

    #[test]
    fn test_shared_borrow_under_mutable_loan_conflicts() {
        let Simple { mut b, r0, r1, x, y, bb0 } = simple();
        let p = b.local("p", Ty::mut_ref(r0, Ty::Int));
        let q = b.local("q", Ty::shared_ref(r1, Ty::Int));
        b.borrow(bb0, p, r0, BorrowKind::Mutable, x);
        b.borrow(bb0, q, r1, BorrowKind::Shared, x);
        b.copy(bb0, y, Place::from_local(p).deref());
        let body = finish(b, bb0);

        let errors = BorrowChecker::check(&body).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            BorrowError::ConflictingBorrow { kind: BorrowKind::Shared, loan, .. }
                if loan.kind == BorrowKind::Mutable
        ));
    }

    #[test]
    fn test_storage_dead_while_borrowed() {
        let Simple { mut b, r0, x, y, bb0, .. } = simple();
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.storage_dead(bb0, x);
        b.copy(bb0, y, Place::from_local(p).deref());
        let body = finish(b, bb0);

        let errors = BorrowChecker::check(&body).unwrap_err();
        assert!(matches!(errors[..], [BorrowError::DroppedWhileBorrowed { .. }]));
        assert_eq!(
            errors[0].to_string(),
            "`x` does not live long enough"
        );
    }

    #[test]
    fn test_move_while_borrowed() {
        let Simple { mut b, r0, x, y, bb0, .. } = simple();
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        let z = b.local("z", Ty::Int);
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.assign(
            bb0,
            z,
            fc_mir::Rvalue::Use(fc_mir::Operand::Move(Place::from_local(x))),
        );
        b.copy(bb0, y, Place::from_local(p).deref());
        let body = finish(b, bb0);

        let errors = BorrowChecker::check(&body).unwrap_err();
        assert!(matches!(errors[..], [BorrowError::MoveWhileBorrowed { .. }]));
        assert_eq!(errors[0].loan().map(|loan| loan.location), Some(Location::new(bb0, 0)));
    }

    #[test]
    fn test_errors_are_sorted_and_capped() {
        let Simple { mut b, r0, r1, x, y, bb0 } = simple();
        let z = b.local("z", Ty::Int);
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        let q = b.local("q", Ty::shared_ref(r1, Ty::Int));
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.borrow(bb0, q, r1, BorrowKind::Shared, z);
        b.assign_const(bb0, z, 1);
        b.assign_const(bb0, x, 2);
        b.copy(bb0, y, Place::from_local(p).deref());
        b.copy(bb0, y, Place::from_local(q).deref());
        let body = finish(b, bb0);

        let errors = BorrowChecker::check(&body).unwrap_err();
        let found: Vec<_> = errors
            .iter()
            .map(|error| (error.location(), error.loan().map(|loan| loan.place.local)))
            .collect();
        assert_eq!(
            found,
            vec![
                (Some(Location::new(bb0, 2)), Some(z)),
                (Some(Location::new(bb0, 3)), Some(x)),
            ]
        );

        let config = BorrowckConfig {
            max_errors: Some(1),
            ..BorrowckConfig::default()
        };
        let capped = BorrowChecker::check_with_config(&body, &config).unwrap_err();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0], errors[0]);
    }

    #[test]
    fn test_reassignment_kills_the_loan() {
        let Simple { mut b, r0, x, y, bb0, .. } = simple();
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.assign_const(bb0, x, 1);
        b.assign_const(bb0, x, 2);
        b.copy(bb0, y, Place::from_local(p).deref());
        let body = finish(b, bb0);

        let errors = BorrowChecker::check(&body).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location(), Some(Location::new(bb0, 1)));
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let Simple { mut b, r0, x, y, bb0, .. } = simple();
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.assign_const(bb0, x, 1);
        b.copy(bb0, y, Place::from_local(p).deref());
        let body = finish(b, bb0);

        let config = BorrowckConfig::default();
        let first = BorrowChecker::analyze(&body, &config).unwrap();
        let second = BorrowChecker::analyze(&body, &config).unwrap();
        assert_eq!(first.errors, second.errors);
        assert!(first.active.passes() <= first.loans.len() * first.points.len() + 1);
    }
}
