//! Types with explicit origins.

use std::fmt;

use fc_index::newtype_index;
use fc_intern::Symbol;

newtype_index! {
    /// An origin declared on a [`Body`](crate::Body).
    ///
    /// Origins are sets of loans; the same origin is read at every program
    /// point, giving the `(origin, point)` nodes of the subset graph.
    pub struct OriginId;
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'?{}", self.0)
    }
}

/// How an origin is quantified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginKind {
    /// Inferred inside the body.
    Existential,
    /// Bound by the signature ("for all"); the body may only assume the
    /// declared known subsets about it.
    Universal,
}

/// Declaration of an origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginDecl {
    /// Name as written by the frontend, without the leading quote
    pub name: Symbol,
    /// Quantification
    pub kind: OriginKind,
}

impl OriginDecl {
    /// Returns `true` for universal origins.
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.kind == OriginKind::Universal
    }
}

/// Mutability of a reference or borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Shared (`&`)
    Not,
    /// Unique (`&mut`)
    Mut,
}

/// Variance of a position inside a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    /// Subtyping flows through unchanged
    Covariant,
    /// Both sides must be equal
    Invariant,
}

impl Variance {
    /// Composes the variance of a context with the variance of a position in it.
    #[must_use]
    pub fn xform(self, inner: Self) -> Self {
        match self {
            Self::Covariant => inner,
            Self::Invariant => Self::Invariant,
        }
    }
}

/// A named struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    /// Field name
    pub name: Symbol,
    /// Field type
    pub ty: Ty,
}

/// A type as seen by the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// `()`
    Unit,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `&'origin T` or `&'origin mut T`
    Ref {
        /// Origin of the reference
        origin: OriginId,
        /// Shared or mutable
        mutability: Mutability,
        /// Type of the referenced value
        referent: Box<Ty>,
    },
    /// An opaque generic container such as `Vec<T>`, covariant in its
    /// arguments and not projectable.
    Adt {
        /// Constructor name
        name: Symbol,
        /// Type arguments
        args: Vec<Ty>,
    },
    /// A struct with named fields, projectable with `.field`.
    Struct {
        /// Struct name
        name: Symbol,
        /// Fields in declaration order
        fields: Vec<FieldDef>,
    },
}

impl Ty {
    /// `&'origin referent`
    #[must_use]
    pub fn shared_ref(origin: OriginId, referent: Self) -> Self {
        Self::Ref {
            origin,
            mutability: Mutability::Not,
            referent: Box::new(referent),
        }
    }

    /// `&'origin mut referent`
    #[must_use]
    pub fn mut_ref(origin: OriginId, referent: Self) -> Self {
        Self::Ref {
            origin,
            mutability: Mutability::Mut,
            referent: Box::new(referent),
        }
    }

    /// Type of the field called `name`, for struct types.
    #[must_use]
    pub fn field(&self, name: Symbol) -> Option<&Self> {
        match self {
            Self::Struct { fields, .. } => fields
                .iter()
                .find(|field| field.name == name)
                .map(|field| &field.ty),
            _ => None,
        }
    }

    /// Position of the field called `name`, for struct types.
    #[must_use]
    pub fn field_index(&self, name: Symbol) -> Option<usize> {
        match self {
            Self::Struct { fields, .. } => fields.iter().position(|field| field.name == name),
            _ => None,
        }
    }

    /// Type of the referenced value, for reference types.
    #[must_use]
    pub fn referent(&self) -> Option<&Self> {
        match self {
            Self::Ref { referent, .. } => Some(referent),
            _ => None,
        }
    }

    /// Calls `f` on every origin in the type, outermost first.
    pub fn walk_origins(&self, f: &mut impl FnMut(OriginId)) {
        match self {
            Self::Unit | Self::Bool | Self::Int => {}
            Self::Ref {
                origin, referent, ..
            } => {
                f(*origin);
                referent.walk_origins(f);
            }
            Self::Adt { args, .. } => args.iter().for_each(|arg| arg.walk_origins(f)),
            Self::Struct { fields, .. } => {
                fields.iter().for_each(|field| field.ty.walk_origins(f));
            }
        }
    }

    /// Origins mentioned by the type, deduplicated, in first-seen order.
    #[must_use]
    pub fn origins(&self) -> Vec<OriginId> {
        let mut origins = Vec::new();
        self.walk_origins(&mut |origin| {
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        });
        origins
    }

    /// Returns `true` if the type mentions at least one origin.
    #[must_use]
    pub fn has_origins(&self) -> bool {
        let mut found = false;
        self.walk_origins(&mut |_| found = true);
        found
    }
}
