//! What each statement and terminator does to places.

use crate::{
    BorrowKind, Body, LocalId, Location, Operand, Place, Rvalue, StatementKind, TerminatorKind,
};

/// How a place is accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessKind {
    /// The value is copied or inspected
    Read,
    /// The place is assigned
    Write,
    /// The value is moved out
    Move,
    /// The place is borrowed
    Borrow(BorrowKind),
    /// The local's storage ends
    StorageDead,
}

impl AccessKind {
    /// Short verb phrase for diagnostics.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Move => "move",
            Self::Borrow(BorrowKind::Shared) => "shared borrow",
            Self::Borrow(BorrowKind::Mutable) => "mutable borrow",
            Self::StorageDead => "storage death",
        }
    }
}

/// A single access to a place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    /// The accessed place
    pub place: Place,
    /// What happens to it
    pub kind: AccessKind,
}

impl Access {
    fn new(place: Place, kind: AccessKind) -> Self {
        Self { place, kind }
    }

    /// Whether the accessed value, or the reference it goes through, must
    /// still be valid when the access happens.
    #[must_use]
    pub fn relies_on_place(&self) -> bool {
        match self.kind {
            AccessKind::Read | AccessKind::Move => true,
            AccessKind::Write | AccessKind::Borrow(_) => self.place.has_deref(),
            AccessKind::StorageDead => false,
        }
    }

    fn of_operand(operand: &Operand) -> Option<Self> {
        match operand {
            Operand::Copy(place) => Some(Self::new(place.clone(), AccessKind::Read)),
            Operand::Move(place) => Some(Self::new(place.clone(), AccessKind::Move)),
            Operand::Const(_) => None,
        }
    }
}

impl Body {
    /// Accesses performed by the statement or terminator at `location`, in
    /// evaluation order: operands first, then the write to the destination.
    ///
    /// `return` reads the return local.
    #[must_use]
    pub fn accesses_at(&self, location: Location) -> Vec<Access> {
        let Some(data) = self.basic_blocks.get(location.block) else {
            return Vec::new();
        };
        if let Some(statement) = data.statements.get(location.statement_index) {
            return match &statement.kind {
                StatementKind::Assign(dest, rvalue) => {
                    let mut accesses = rvalue_accesses(rvalue);
                    accesses.push(Access::new(dest.clone(), AccessKind::Write));
                    accesses
                }
                StatementKind::StorageDead(local) => {
                    vec![Access::new(Place::from_local(*local), AccessKind::StorageDead)]
                }
                StatementKind::Nop => Vec::new(),
            };
        }
        match &data.terminator.kind {
            TerminatorKind::SwitchInt { discr, .. } => {
                Access::of_operand(discr).into_iter().collect()
            }
            TerminatorKind::Call {
                args, destination, ..
            } => {
                let mut accesses: Vec<_> = args.iter().filter_map(Access::of_operand).collect();
                accesses.push(Access::new(destination.clone(), AccessKind::Write));
                accesses
            }
            TerminatorKind::Return => self
                .return_local
                .map(|local| Access::new(Place::from_local(local), AccessKind::Read))
                .into_iter()
                .collect(),
            TerminatorKind::Goto { .. } | TerminatorKind::Unreachable => Vec::new(),
        }
    }

    /// Places the statement or terminator at `location` still relies on once
    /// its access at `index` happens: operands evaluated after it and a
    /// destination written through a reference. A call relies on every
    /// argument while any of them is evaluated, since the callee receives
    /// them together.
    #[must_use]
    pub fn pending_uses(&self, location: Location, index: usize) -> Vec<Place> {
        let accesses = self.accesses_at(location);
        let in_call_arguments = index + 1 < accesses.len()
            && self.statement_at(location).is_none()
            && self.basic_blocks.get(location.block).is_some_and(|data| {
                matches!(data.terminator.kind, TerminatorKind::Call { .. })
            });
        let first = if in_call_arguments { 0 } else { index + 1 };
        accesses
            .into_iter()
            .skip(first)
            .filter(Access::relies_on_place)
            .map(|access| access.place)
            .collect()
    }

    /// The place wholly overwritten at `location`: the destination of an
    /// assignment or call when it is a bare local.
    #[must_use]
    pub fn overwritten_local(&self, location: Location) -> Option<LocalId> {
        let data = self.basic_blocks.get(location.block)?;
        let dest = match data.statements.get(location.statement_index) {
            Some(statement) => match &statement.kind {
                StatementKind::Assign(dest, _) => dest,
                _ => return None,
            },
            None => match &data.terminator.kind {
                TerminatorKind::Call { destination, .. } => destination,
                _ => return None,
            },
        };
        dest.is_local().then_some(dest.local)
    }
}

fn rvalue_accesses(rvalue: &Rvalue) -> Vec<Access> {
    match rvalue {
        Rvalue::Use(operand) => Access::of_operand(operand).into_iter().collect(),
        Rvalue::Ref { kind, place, .. } => {
            vec![Access::new(place.clone(), AccessKind::Borrow(*kind))]
        }
        Rvalue::BinaryOp { left, right, .. } => [left, right]
            .into_iter()
            .filter_map(Access::of_operand)
            .collect(),
        Rvalue::Aggregate(operands) => operands.iter().filter_map(Access::of_operand).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinOp, BodyBuilder, Constant, Ty};

    #[test]
    fn test_operands_precede_destination_write() {
        let mut b = BodyBuilder::new("f");
        let r = b.origin("r");
        let x = b.local("x", Ty::Int);
        let y = b.local("y", Ty::Int);
        let p = b.local("p", Ty::shared_ref(r, Ty::Int));
        let bb0 = b.block();
        b.assign(
            bb0,
            x,
            Rvalue::BinaryOp {
                op: BinOp::Add,
                left: Operand::Copy(x.into()),
                right: Operand::Move(y.into()),
            },
        );
        b.borrow(bb0, p, r, BorrowKind::Shared, x);
        b.assign(bb0, y, Rvalue::Use(Operand::Const(Constant::Int(3))));
        b.ret(bb0);
        let body = b.finish().unwrap();

        let kinds: Vec<_> = body
            .accesses_at(Location::new(bb0, 0))
            .into_iter()
            .map(|access| (access.place.local, access.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![(x, AccessKind::Read), (y, AccessKind::Move), (x, AccessKind::Write)]
        );
        let borrow = body.accesses_at(Location::new(bb0, 1));
        assert_eq!(borrow[0].kind, AccessKind::Borrow(BorrowKind::Shared));
        assert_eq!(body.accesses_at(Location::new(bb0, 2)).len(), 1);
        assert_eq!(body.overwritten_local(Location::new(bb0, 2)), Some(y));
    }

    #[test]
    fn test_pending_uses_follow_evaluation_order() {
        let mut b = BodyBuilder::new("f");
        let r = b.origin("r");
        let x = b.local("x", Ty::Int);
        let p = b.local("p", Ty::mut_ref(r, Ty::Int));
        let done = b.local("done", Ty::Unit);
        let bb0 = b.block();
        let bb1 = b.block();
        b.borrow(bb0, p, r, BorrowKind::Mutable, x);
        b.copy(bb0, Place::from_local(p).deref(), x);
        let sig = crate::FnSig {
            inputs: vec![Ty::mut_ref(r, Ty::Int), Ty::Int],
            output: Ty::Unit,
        };
        let args = vec![Operand::Move(p.into()), Operand::Copy(x.into())];
        b.call(bb0, "g", sig, args, done, Some(bb1));
        b.ret(bb1);
        let body = b.finish().unwrap();

        let deref_write = Location::new(bb0, 1);
        assert_eq!(body.pending_uses(deref_write, 0), vec![Place::from_local(p).deref()]);
        assert!(body.pending_uses(deref_write, 1).is_empty());

        let call = Location::new(bb0, 2);
        let arguments = vec![Place::from_local(p), Place::from_local(x)];
        assert_eq!(body.pending_uses(call, 0), arguments);
        assert_eq!(body.pending_uses(call, 1), arguments);
        assert!(body.pending_uses(call, 2).is_empty());
        assert!(body.pending_uses(Location::new(bb0, 0), 0).is_empty());
    }

    #[test]
    fn test_return_reads_return_local() {
        let mut b = BodyBuilder::new("f");
        let ret = b.return_local("ret", Ty::Int);
        let bb0 = b.block();
        b.ret(bb0);
        let body = b.finish().unwrap();
        let accesses = body.accesses_at(Location::new(bb0, 0));
        assert_eq!(accesses, vec![Access::new(Place::from_local(ret), AccessKind::Read)]);
    }
}
