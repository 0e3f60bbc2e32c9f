//! Types as they appear in impl headers

use fc_intern::{Interner, Symbol};
use fc_mir::Mutability;

/// A type in an impl header, possibly mentioning the impl's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyPattern {
    /// The impl's `n`th type parameter
    Param(u32),
    /// A named type constructor applied to arguments
    Adt {
        /// Constructor name
        name: Symbol,
        /// Whether the constructor is defined in the current crate
        local: bool,
        /// Type arguments
        args: Vec<TyPattern>,
    },
    /// `&T` or `&mut T`
    Ref(Mutability, Box<TyPattern>),
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// `()`
    Unit,
}

impl TyPattern {
    /// A constructor with no arguments.
    #[must_use]
    pub fn adt(name: Symbol, local: bool) -> Self {
        Self::Adt {
            name,
            local,
            args: Vec::new(),
        }
    }

    /// `&inner`
    #[must_use]
    pub fn shared_ref(inner: Self) -> Self {
        Self::Ref(Mutability::Not, Box::new(inner))
    }

    /// `&mut inner`
    #[must_use]
    pub fn mut_ref(inner: Self) -> Self {
        Self::Ref(Mutability::Mut, Box::new(inner))
    }

    /// The outermost constructor, looking through references.
    #[must_use]
    pub fn head(&self) -> &Self {
        match self {
            Self::Ref(_, inner) => inner.head(),
            other => other,
        }
    }

    /// Returns `true` if the head constructor is defined locally.
    #[must_use]
    pub fn has_local_head(&self) -> bool {
        matches!(self.head(), Self::Adt { local: true, .. })
    }

    /// Returns `true` if the type mentions no parameters.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        match self {
            Self::Param(_) => false,
            Self::Adt { args, .. } => args.iter().all(Self::is_ground),
            Self::Ref(_, inner) => inner.is_ground(),
            Self::Int | Self::Bool | Self::Unit => true,
        }
    }

    /// Returns `true` if parameter `param` occurs in the type.
    #[must_use]
    pub fn mentions(&self, param: u32) -> bool {
        match self {
            Self::Param(p) => *p == param,
            Self::Adt { args, .. } => args.iter().any(|arg| arg.mentions(param)),
            Self::Ref(_, inner) => inner.mentions(param),
            Self::Int | Self::Bool | Self::Unit => false,
        }
    }

    /// Shifts every parameter index up by `offset`.
    #[must_use]
    pub fn shift_params(&self, offset: u32) -> Self {
        match self {
            Self::Param(p) => Self::Param(p + offset),
            Self::Adt { name, local, args } => Self::Adt {
                name: *name,
                local: *local,
                args: args.iter().map(|arg| arg.shift_params(offset)).collect(),
            },
            Self::Ref(mutability, inner) => Self::Ref(*mutability, Box::new(inner.shift_params(offset))),
            Self::Int | Self::Bool | Self::Unit => self.clone(),
        }
    }

    /// Renders the type with `T0`, `T1`, ... for parameters.
    #[must_use]
    pub fn display(&self, interner: &Interner) -> String {
        match self {
            Self::Param(p) => format!("T{p}"),
            Self::Adt { name, args, .. } if args.is_empty() => interner.resolve(name).to_string(),
            Self::Adt { name, args, .. } => {
                let args: Vec<_> = args.iter().map(|arg| arg.display(interner)).collect();
                format!("{}<{}>", interner.resolve(name), args.join(", "))
            }
            Self::Ref(Mutability::Not, inner) => format!("&{}", inner.display(interner)),
            Self::Ref(Mutability::Mut, inner) => format!("&mut {}", inner.display(interner)),
            Self::Int => "int".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Unit => "()".to_string(),
        }
    }
}
