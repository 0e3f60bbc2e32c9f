//! Control-flow graph input for the borrow checker.
//!
//! A [`Body`] is a function lowered by some frontend into basic blocks of
//! statements ending in a terminator. Every reference type and every borrow
//! carries an explicit origin, so the analysis never has to invent region
//! variables: the frontend declares them up front on the body.
//!
//! The crate also provides the pieces of the model the passes share:
//!
//! - [`Place`] and its overlap rules
//! - [`Loan`] and the [`LoanTable`] collected from borrow rvalues
//! - [`Location`] / [`PointIndex`] numbering through [`PointTable`]
//! - [`Access`] facts describing what each statement reads and writes
//! - [`BodyBuilder`] for constructing bodies, and a MIR-style pretty printer

mod access;
mod builder;
mod error;
mod loan;
mod place;
mod point;
mod pretty;
mod ty;

pub use access::{Access, AccessKind};
pub use builder::BodyBuilder;
pub use error::{MirError, MirResult};
pub use loan::{BorrowKind, Loan, LoanId, LoanTable};
pub use place::{Place, Projection};
pub use point::{Location, PointIndex, PointTable};
pub use ty::{FieldDef, Mutability, OriginDecl, OriginId, OriginKind, Ty, Variance};

use std::fmt;

use fc_index::{Idx, IndexVec, newtype_index};
use fc_intern::{Interner, Symbol};
use fc_span::FileSpan;

newtype_index! {
    /// A local variable of a body.
    pub struct LocalId;
}

newtype_index! {
    /// A basic block of a body.
    pub struct BasicBlock;
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// The block control enters first.
pub const START_BLOCK: BasicBlock = BasicBlock::from_u32(0);

/// A function body in control-flow-graph form.
#[derive(Debug, Clone)]
pub struct Body {
    /// Function name
    pub name: Symbol,
    /// Interner resolving every symbol in the body
    pub interner: Interner,
    /// Local variable declarations
    pub locals: IndexVec<LocalId, LocalDecl>,
    /// Origin declarations
    pub origins: IndexVec<OriginId, OriginDecl>,
    /// Declared `(sub, sup)` relations between universal origins: the loans
    /// of `sub` are known to be a subset of those of `sup` (`'sub: 'sup`)
    pub known_subsets: Vec<(OriginId, OriginId)>,
    /// Basic blocks; [`START_BLOCK`] is the entry
    pub basic_blocks: IndexVec<BasicBlock, BasicBlockData>,
    /// Local holding the return value, read by `return`
    pub return_local: Option<LocalId>,
}

/// Local variable declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    /// Variable name
    pub name: Symbol,
    /// Declared type, with explicit origins
    pub ty: Ty,
}

/// Basic block in the control-flow graph
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlockData {
    /// Statements executed in order
    pub statements: Vec<Statement>,
    /// How control leaves the block
    pub terminator: Terminator,
}

/// A statement with its optional source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// What the statement does
    pub kind: StatementKind,
    /// Source location, if the frontend supplied one
    pub span: Option<FileSpan>,
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `place = rvalue`
    Assign(Place, Rvalue),
    /// The local's storage ends; any outstanding loan of it is invalidated
    StorageDead(LocalId),
    /// Does nothing
    Nop,
}

/// Right-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
pub enum Rvalue {
    /// Copy or move an operand
    Use(Operand),
    /// `&'origin place` or `&'origin mut place`; creates a loan
    Ref {
        /// Origin written on the borrow expression
        origin: OriginId,
        /// Shared or mutable borrow
        kind: BorrowKind,
        /// Borrowed place
        place: Place,
    },
    /// Arithmetic or comparison on scalars
    BinaryOp {
        /// Operator
        op: BinOp,
        /// Left operand
        left: Operand,
        /// Right operand
        right: Operand,
    },
    /// Builds a struct from its fields, in declaration order
    Aggregate(Vec<Operand>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `==`
    Eq,
    /// `<`
    Lt,
}

/// Operand of an rvalue or terminator
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Read the place, leaving it usable
    Copy(Place),
    /// Read the place and move out of it
    Move(Place),
    /// A constant, which carries no origins
    Const(Constant),
}

impl Operand {
    /// The place read by this operand, if any.
    #[must_use]
    pub fn place(&self) -> Option<&Place> {
        match self {
            Self::Copy(place) | Self::Move(place) => Some(place),
            Self::Const(_) => None,
        }
    }
}

/// Constant values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    /// Integer literal
    Int(i64),
    /// Boolean literal
    Bool(bool),
    /// `()`
    Unit,
}

/// Signature of a callee, already instantiated with origins of this body.
///
/// Each call site should use its own fresh existential origins so that two
/// calls of the same function do not share constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnSig {
    /// Parameter types
    pub inputs: Vec<Ty>,
    /// Return type
    pub output: Ty,
}

/// Block terminator with its optional source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminator {
    /// How control leaves the block
    pub kind: TerminatorKind,
    /// Source location, if the frontend supplied one
    pub span: Option<FileSpan>,
}

/// Terminator kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TerminatorKind {
    /// Unconditional jump
    Goto {
        /// Destination block
        target: BasicBlock,
    },
    /// Branch on a value to one of several blocks
    SwitchInt {
        /// Value switched on
        discr: Operand,
        /// Possible destinations
        targets: Vec<BasicBlock>,
    },
    /// Call a function and continue at `target`
    Call {
        /// Callee name, for diagnostics
        callee: Symbol,
        /// Instantiated callee signature
        signature: FnSig,
        /// Arguments
        args: Vec<Operand>,
        /// Where the return value is written
        destination: Place,
        /// Continuation; `None` for diverging calls
        target: Option<BasicBlock>,
    },
    /// Return from the function, reading the return local
    Return,
    /// Control never reaches this point
    Unreachable,
}

impl TerminatorKind {
    /// Successor blocks in order.
    #[must_use]
    pub fn successors(&self) -> Vec<BasicBlock> {
        match self {
            Self::Goto { target } => vec![*target],
            Self::SwitchInt { targets, .. } => targets.clone(),
            Self::Call { target, .. } => target.iter().copied().collect(),
            Self::Return | Self::Unreachable => Vec::new(),
        }
    }
}

impl Body {
    /// Declaration of `local`.
    #[must_use]
    pub fn local_decl(&self, local: LocalId) -> &LocalDecl {
        &self.locals[local]
    }

    /// Name of `local` as written by the frontend.
    #[must_use]
    pub fn local_name(&self, local: LocalId) -> &str {
        self.interner.resolve(&self.locals[local].name)
    }

    /// Name of `origin` as written by the frontend, without the quote.
    #[must_use]
    pub fn origin_name(&self, origin: OriginId) -> &str {
        self.interner.resolve(&self.origins[origin].name)
    }

    /// Returns `true` if `origin` is universal.
    #[must_use]
    pub fn is_universal(&self, origin: OriginId) -> bool {
        self.origins[origin].is_universal()
    }

    /// Universal origins in declaration order.
    pub fn universal_origins(&self) -> impl Iterator<Item = OriginId> + '_ {
        self.origins
            .iter_enumerated()
            .filter(|(_, decl)| decl.is_universal())
            .map(|(origin, _)| origin)
    }

    /// Function name.
    #[must_use]
    pub fn fn_name(&self) -> &str {
        self.interner.resolve(&self.name)
    }

    /// The statement at `location`, or `None` for a terminator location.
    #[must_use]
    pub fn statement_at(&self, location: Location) -> Option<&Statement> {
        self.basic_blocks
            .get(location.block)?
            .statements
            .get(location.statement_index)
    }

    /// Source span of the statement or terminator at `location`.
    #[must_use]
    pub fn span_at(&self, location: Location) -> Option<FileSpan> {
        let block = self.basic_blocks.get(location.block)?;
        match block.statements.get(location.statement_index) {
            Some(statement) => statement.span,
            None => block.terminator.span,
        }
    }

    /// Successor blocks of `block`.
    #[must_use]
    pub fn successors(&self, block: BasicBlock) -> Vec<BasicBlock> {
        self.basic_blocks[block].terminator.kind.successors()
    }

    /// Predecessors of every block.
    #[must_use]
    pub fn predecessors(&self) -> IndexVec<BasicBlock, Vec<BasicBlock>> {
        let mut preds = IndexVec::from_elem_n(Vec::new(), self.basic_blocks.len());
        for block in self.basic_blocks.indices() {
            for succ in self.successors(block) {
                if !preds[succ].contains(&block) {
                    preds[succ].push(block);
                }
            }
        }
        preds
    }

    /// Blocks in reverse postorder from [`START_BLOCK`], followed by any
    /// unreachable blocks in index order.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<BasicBlock> {
        let n = self.basic_blocks.len();
        let mut visited = vec![false; n];
        let mut postorder = Vec::with_capacity(n);
        if n > 0 {
            let mut stack = vec![(START_BLOCK, 0usize)];
            visited[START_BLOCK.index()] = true;
            while let Some((block, next)) = stack.pop() {
                let succs = self.successors(block);
                if let Some(&succ) = succs.get(next) {
                    stack.push((block, next + 1));
                    if !visited[succ.index()] {
                        visited[succ.index()] = true;
                        stack.push((succ, 0));
                    }
                } else {
                    postorder.push(block);
                }
            }
        }
        postorder.reverse();
        postorder.extend(self.basic_blocks.indices().filter(|bb| !visited[bb.index()]));
        postorder
    }

    /// Type of a place, following fields and dereferences.
    ///
    /// # Errors
    ///
    /// Returns an error if a projection does not apply to the type it is
    /// applied to.
    pub fn place_ty(&self, place: &Place) -> MirResult<&Ty> {
        let decl = self.locals.get(place.local).ok_or(MirError::UnknownLocal {
            local: place.local.as_u32(),
        })?;
        let mut ty = &decl.ty;
        for (depth, proj) in place.projection.iter().enumerate() {
            let prefix = Place {
                local: place.local,
                projection: place.projection[..depth].to_vec(),
            };
            ty = match proj {
                Projection::Deref => ty.referent().ok_or_else(|| MirError::DerefOfNonReference {
                    place: self.describe_place(&prefix),
                })?,
                Projection::Field(name) => ty.field(*name).ok_or_else(|| MirError::NoSuchField {
                    place: self.describe_place(&prefix),
                    field: self.interner.resolve(name).to_string(),
                })?,
            };
        }
        Ok(ty)
    }

    /// Type of an operand; constants have no type the analysis cares about.
    ///
    /// # Errors
    ///
    /// Returns an error if the operand's place is ill-formed.
    pub fn operand_ty(&self, operand: &Operand) -> MirResult<Option<&Ty>> {
        operand.place().map(|place| self.place_ty(place)).transpose()
    }

    /// Checks that the body is well formed: blocks and locals referenced
    /// exist, every place projection applies to its type, and origins
    /// mentioned in types are declared.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> MirResult<()> {
        if self.basic_blocks.is_empty() {
            return Err(MirError::EmptyBody {
                name: self.fn_name().to_string(),
            });
        }
        for decl in self.locals.iter() {
            self.check_ty_origins(&decl.ty)?;
        }
        for &(sub, sup) in &self.known_subsets {
            for origin in [sub, sup] {
                if self.origins.get(origin).is_none() {
                    return Err(MirError::UnknownOrigin {
                        origin: origin.as_u32(),
                    });
                }
            }
        }
        if let Some(local) = self.return_local {
            self.check_local(local)?;
        }
        for (block, data) in self.basic_blocks.iter_enumerated() {
            for statement in &data.statements {
                self.validate_statement(&statement.kind)?;
            }
            self.validate_terminator(block, &data.terminator.kind)?;
        }
        Ok(())
    }

    fn validate_statement(&self, kind: &StatementKind) -> MirResult<()> {
        match kind {
            StatementKind::Assign(place, rvalue) => {
                self.place_ty(place)?;
                match rvalue {
                    Rvalue::Use(operand) => self.operand_ty(operand).map(drop),
                    Rvalue::Ref { origin, place, .. } => {
                        if self.origins.get(*origin).is_none() {
                            return Err(MirError::UnknownOrigin {
                                origin: origin.as_u32(),
                            });
                        }
                        self.place_ty(place).map(drop)
                    }
                    Rvalue::BinaryOp { left, right, .. } => {
                        self.operand_ty(left)?;
                        self.operand_ty(right).map(drop)
                    }
                    Rvalue::Aggregate(operands) => {
                        let expected = match self.place_ty(place)? {
                            Ty::Struct { fields, .. } => fields.len(),
                            _ => 0,
                        };
                        if expected != operands.len() {
                            return Err(MirError::AggregateArity {
                                place: self.describe_place(place),
                                expected,
                                found: operands.len(),
                            });
                        }
                        operands
                            .iter()
                            .try_for_each(|operand| self.operand_ty(operand).map(drop))
                    }
                }
            }
            StatementKind::StorageDead(local) => self.check_local(*local),
            StatementKind::Nop => Ok(()),
        }
    }

    fn validate_terminator(&self, from: BasicBlock, kind: &TerminatorKind) -> MirResult<()> {
        for target in kind.successors() {
            if self.basic_blocks.get(target).is_none() {
                return Err(MirError::UnknownBlock {
                    block: target.as_u32(),
                    from: from.as_u32(),
                });
            }
        }
        match kind {
            TerminatorKind::SwitchInt { discr, .. } => self.operand_ty(discr).map(drop),
            TerminatorKind::Call {
                callee,
                signature,
                args,
                destination,
                ..
            } => {
                if signature.inputs.len() != args.len() {
                    return Err(MirError::ArityMismatch {
                        callee: self.interner.resolve(callee).to_string(),
                        expected: signature.inputs.len(),
                        found: args.len(),
                    });
                }
                for ty in signature.inputs.iter().chain([&signature.output]) {
                    self.check_ty_origins(ty)?;
                }
                for arg in args {
                    self.operand_ty(arg)?;
                }
                self.place_ty(destination).map(drop)
            }
            TerminatorKind::Goto { .. } | TerminatorKind::Return | TerminatorKind::Unreachable => {
                Ok(())
            }
        }
    }

    fn check_local(&self, local: LocalId) -> MirResult<()> {
        match self.locals.get(local) {
            Some(_) => Ok(()),
            None => Err(MirError::UnknownLocal {
                local: local.as_u32(),
            }),
        }
    }

    fn check_ty_origins(&self, ty: &Ty) -> MirResult<()> {
        let mut missing = None;
        ty.walk_origins(&mut |origin| {
            if missing.is_none() && self.origins.get(origin).is_none() {
                missing = Some(origin);
            }
        });
        match missing {
            Some(origin) => Err(MirError::UnknownOrigin {
                origin: origin.as_u32(),
            }),
            None => Ok(()),
        }
    }
}
