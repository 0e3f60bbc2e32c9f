//! Incremental construction of [`Body`] values.

use fc_index::{Idx, IndexVec};
use fc_intern::{Interner, Symbol};
use fc_span::FileSpan;

use crate::{
    BasicBlock, BasicBlockData, Body, BorrowKind, Constant, FieldDef, FnSig, LocalDecl, LocalId,
    MirError, MirResult, Operand, OriginDecl, OriginId, OriginKind, Place, Rvalue, Statement,
    StatementKind, Terminator, TerminatorKind, Ty,
};

#[derive(Debug, Default)]
struct PartialBlock {
    statements: Vec<Statement>,
    terminator: Option<Terminator>,
}

/// Builds a [`Body`] block by block.
///
/// Statements are appended to the block passed in, so blocks can be filled
/// in any order. The span set with [`set_span`](Self::set_span) is attached
/// to everything pushed afterwards.
#[derive(Debug)]
pub struct BodyBuilder {
    name: Symbol,
    interner: Interner,
    locals: IndexVec<LocalId, LocalDecl>,
    origins: IndexVec<OriginId, OriginDecl>,
    known_subsets: Vec<(OriginId, OriginId)>,
    blocks: IndexVec<BasicBlock, PartialBlock>,
    return_local: Option<LocalId>,
    span: Option<FileSpan>,
}

impl BodyBuilder {
    /// Starts a body with a fresh interner.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_interner(name, Interner::new())
    }

    /// Starts a body sharing an existing interner.
    #[must_use]
    pub fn with_interner(name: &str, interner: Interner) -> Self {
        Self {
            name: interner.intern(name),
            interner,
            locals: IndexVec::new(),
            origins: IndexVec::new(),
            known_subsets: Vec::new(),
            blocks: IndexVec::new(),
            return_local: None,
            span: None,
        }
    }

    /// The interner names are stored in.
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Interns `name`.
    pub fn intern(&self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Declares an existential origin.
    pub fn origin(&mut self, name: &str) -> OriginId {
        self.declare_origin(name, OriginKind::Existential)
    }

    /// Declares a universal origin.
    pub fn universal_origin(&mut self, name: &str) -> OriginId {
        self.declare_origin(name, OriginKind::Universal)
    }

    fn declare_origin(&mut self, name: &str, kind: OriginKind) -> OriginId {
        let name = self.interner.intern(name);
        self.origins.push(OriginDecl { name, kind })
    }

    /// Declares `'sub: 'sup`: every loan in `sub` may also be in `sup`.
    pub fn known_subset(&mut self, sub: OriginId, sup: OriginId) {
        self.known_subsets.push((sub, sup));
    }

    /// Declares a local.
    pub fn local(&mut self, name: &str, ty: Ty) -> LocalId {
        let name = self.interner.intern(name);
        self.locals.push(LocalDecl { name, ty })
    }

    /// Declares the local read by `return`.
    pub fn return_local(&mut self, name: &str, ty: Ty) -> LocalId {
        let local = self.local(name, ty);
        self.return_local = Some(local);
        local
    }

    /// Creates an empty, unterminated block.
    pub fn block(&mut self) -> BasicBlock {
        self.blocks.push(PartialBlock::default())
    }

    /// Sets the span attached to subsequently pushed statements and
    /// terminators.
    pub fn set_span(&mut self, span: Option<FileSpan>) {
        self.span = span;
    }

    /// Appends a statement to `block`.
    pub fn push(&mut self, block: BasicBlock, kind: StatementKind) {
        let span = self.span;
        self.blocks[block].statements.push(Statement { kind, span });
    }

    /// `place = rvalue`
    pub fn assign(&mut self, block: BasicBlock, place: impl Into<Place>, rvalue: Rvalue) {
        self.push(block, StatementKind::Assign(place.into(), rvalue));
    }

    /// `place = const value`
    pub fn assign_const(&mut self, block: BasicBlock, place: impl Into<Place>, value: i64) {
        self.assign(block, place, Rvalue::Use(Operand::Const(Constant::Int(value))));
    }

    /// `dest = copy src`
    pub fn copy(&mut self, block: BasicBlock, dest: impl Into<Place>, src: impl Into<Place>) {
        self.assign(block, dest, Rvalue::Use(Operand::Copy(src.into())));
    }

    /// `dest = &'origin place` or `dest = &'origin mut place`
    pub fn borrow(
        &mut self,
        block: BasicBlock,
        dest: impl Into<Place>,
        origin: OriginId,
        kind: BorrowKind,
        place: impl Into<Place>,
    ) {
        let rvalue = Rvalue::Ref {
            origin,
            kind,
            place: place.into(),
        };
        self.assign(block, dest, rvalue);
    }

    /// `StorageDead(local)`
    pub fn storage_dead(&mut self, block: BasicBlock, local: LocalId) {
        self.push(block, StatementKind::StorageDead(local));
    }

    /// Ends `block` with the given terminator, replacing any earlier one.
    pub fn terminate(&mut self, block: BasicBlock, kind: TerminatorKind) {
        let span = self.span;
        self.blocks[block].terminator = Some(Terminator { kind, span });
    }

    /// `goto -> target`
    pub fn goto(&mut self, block: BasicBlock, target: BasicBlock) {
        self.terminate(block, TerminatorKind::Goto { target });
    }

    /// `switchInt(discr) -> [targets]`
    pub fn switch(&mut self, block: BasicBlock, discr: Operand, targets: Vec<BasicBlock>) {
        self.terminate(block, TerminatorKind::SwitchInt { discr, targets });
    }

    /// `destination = callee(args) -> target`
    pub fn call(
        &mut self,
        block: BasicBlock,
        callee: &str,
        signature: FnSig,
        args: Vec<Operand>,
        destination: impl Into<Place>,
        target: Option<BasicBlock>,
    ) {
        let callee = self.interner.intern(callee);
        self.terminate(
            block,
            TerminatorKind::Call {
                callee,
                signature,
                args,
                destination: destination.into(),
                target,
            },
        );
    }

    /// `return`
    pub fn ret(&mut self, block: BasicBlock) {
        self.terminate(block, TerminatorKind::Return);
    }

    /// `unreachable`
    pub fn unreachable(&mut self, block: BasicBlock) {
        self.terminate(block, TerminatorKind::Unreachable);
    }

    /// `place.name`
    #[must_use]
    pub fn field(&self, place: impl Into<Place>, name: &str) -> Place {
        place.into().field(self.interner.intern(name))
    }

    /// A struct type with the given fields.
    #[must_use]
    pub fn struct_ty(&self, name: &str, fields: &[(&str, Ty)]) -> Ty {
        Ty::Struct {
            name: self.interner.intern(name),
            fields: fields
                .iter()
                .map(|(field, ty)| FieldDef {
                    name: self.interner.intern(field),
                    ty: ty.clone(),
                })
                .collect(),
        }
    }

    /// An opaque container type `name<args>`.
    #[must_use]
    pub fn adt_ty(&self, name: &str, args: Vec<Ty>) -> Ty {
        Ty::Adt {
            name: self.interner.intern(name),
            args,
        }
    }

    /// Finishes the body and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if a block was left unterminated or the body is not
    /// well formed (see [`Body::validate`]).
    pub fn finish(self) -> MirResult<Body> {
        let mut basic_blocks = IndexVec::with_capacity(self.blocks.len());
        for (block, partial) in self.blocks.into_iter_enumerated() {
            let terminator = partial.terminator.ok_or(MirError::UnterminatedBlock {
                block: block.index() as u32,
            })?;
            basic_blocks.push(BasicBlockData {
                statements: partial.statements,
                terminator,
            });
        }
        let body = Body {
            name: self.name,
            interner: self.interner,
            locals: self.locals,
            origins: self.origins,
            known_subsets: self.known_subsets,
            basic_blocks,
            return_local: self.return_local,
        };
        body.validate()?;
        Ok(body)
    }
}
