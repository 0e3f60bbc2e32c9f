//! Unification and one-way matching of impl header types

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ty::TyPattern;

/// Unification error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnificationError {
    /// Types cannot be unified
    #[error("type mismatch: cannot unify {expected:?} with {found:?}")]
    Mismatch {
        /// Expected type
        expected: TyPattern,
        /// Found type
        found: TyPattern,
    },

    /// Occurs check failed (infinite type)
    #[error("occurs check failed: T{var} occurs in {ty:?}")]
    OccursCheck {
        /// Type parameter
        var: u32,
        /// Type containing the parameter
        ty: TyPattern,
    },
}

/// Two-way unifier over impl parameters.
///
/// Parameters of both sides are unification variables, so callers must
/// rename the two headers apart first.
#[derive(Debug, Default)]
pub struct Unifier {
    bindings: FxHashMap<u32, TyPattern>,
}

impl Unifier {
    /// Create a new unifier
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows bindings at the root of `ty`.
    fn shallow_resolve(&self, ty: &TyPattern) -> TyPattern {
        let mut ty = ty.clone();
        while let TyPattern::Param(p) = ty {
            match self.bindings.get(&p) {
                Some(bound) => ty = bound.clone(),
                None => break,
            }
        }
        ty
    }

    /// Applies every binding to `ty`.
    #[must_use]
    pub fn resolve(&self, ty: &TyPattern) -> TyPattern {
        match self.shallow_resolve(ty) {
            TyPattern::Adt { name, local, args } => TyPattern::Adt {
                name,
                local,
                args: args.iter().map(|arg| self.resolve(arg)).collect(),
            },
            TyPattern::Ref(mutability, inner) => {
                TyPattern::Ref(mutability, Box::new(self.resolve(&inner)))
            }
            other => other,
        }
    }

    /// Unify two types
    ///
    /// # Errors
    ///
    /// Returns `UnificationError` if types cannot be unified
    pub fn unify(&mut self, left: &TyPattern, right: &TyPattern) -> Result<(), UnificationError> {
        let left = self.shallow_resolve(left);
        let right = self.shallow_resolve(right);
        if left == right {
            return Ok(());
        }
        match (&left, &right) {
            (TyPattern::Param(var), _) => self.bind(*var, &right),
            (_, TyPattern::Param(var)) => self.bind(*var, &left),
            (
                TyPattern::Adt {
                    name: left_name,
                    args: left_args,
                    ..
                },
                TyPattern::Adt {
                    name: right_name,
                    args: right_args,
                    ..
                },
            ) if left_name == right_name && left_args.len() == right_args.len() => {
                for (left_arg, right_arg) in left_args.iter().zip(right_args) {
                    self.unify(left_arg, right_arg)?;
                }
                Ok(())
            }
            (TyPattern::Ref(left_mut, left_inner), TyPattern::Ref(right_mut, right_inner))
                if left_mut == right_mut =>
            {
                self.unify(left_inner, right_inner)
            }
            _ => Err(UnificationError::Mismatch {
                expected: left,
                found: right,
            }),
        }
    }

    fn bind(&mut self, var: u32, ty: &TyPattern) -> Result<(), UnificationError> {
        let resolved = self.resolve(ty);
        if resolved.mentions(var) {
            return Err(UnificationError::OccursCheck { var, ty: resolved });
        }
        self.bindings.insert(var, resolved);
        Ok(())
    }
}

/// One-way matching: finds parameter values that make `pattern` equal to
/// `ty`, treating any parameters in `ty` as rigid.
#[must_use]
pub fn match_ty(pattern: &TyPattern, ty: &TyPattern) -> Option<FxHashMap<u32, TyPattern>> {
    let mut bindings = FxHashMap::default();
    match_into(pattern, ty, &mut bindings).then_some(bindings)
}

fn match_into(pattern: &TyPattern, ty: &TyPattern, bindings: &mut FxHashMap<u32, TyPattern>) -> bool {
    match (pattern, ty) {
        (TyPattern::Param(p), _) => match bindings.get(p) {
            Some(bound) => bound == ty,
            None => {
                bindings.insert(*p, ty.clone());
                true
            }
        },
        (
            TyPattern::Adt {
                name: pattern_name,
                args: pattern_args,
                ..
            },
            TyPattern::Adt { name, args, .. },
        ) => {
            pattern_name == name
                && pattern_args.len() == args.len()
                && pattern_args
                    .iter()
                    .zip(args)
                    .all(|(pattern_arg, arg)| match_into(pattern_arg, arg, bindings))
        }
        (TyPattern::Ref(pattern_mut, pattern_inner), TyPattern::Ref(mutability, inner)) => {
            pattern_mut == mutability && match_into(pattern_inner, inner, bindings)
        }
        (TyPattern::Int, TyPattern::Int)
        | (TyPattern::Bool, TyPattern::Bool)
        | (TyPattern::Unit, TyPattern::Unit) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_intern::Interner;

    #[test]
    fn test_unify_binds_params_on_both_sides() {
        let interner = Interner::new();
        let vec = interner.intern("Vec");
        let left = TyPattern::Adt {
            name: vec,
            local: false,
            args: vec![TyPattern::Param(0)],
        };
        let right = TyPattern::Adt {
            name: vec,
            local: false,
            args: vec![TyPattern::shared_ref(TyPattern::Param(1))],
        };
        let mut unifier = Unifier::new();
        unifier.unify(&left, &right).unwrap();
        assert_eq!(
            unifier.resolve(&TyPattern::Param(0)),
            TyPattern::shared_ref(TyPattern::Param(1))
        );
    }

    #[test]
    fn test_occurs_check_rejects_infinite_types() {
        let interner = Interner::new();
        let boxed = TyPattern::Adt {
            name: interner.intern("Box"),
            local: false,
            args: vec![TyPattern::Param(0)],
        };
        let mut unifier = Unifier::new();
        let err = unifier.unify(&TyPattern::Param(0), &boxed).unwrap_err();
        assert!(matches!(err, UnificationError::OccursCheck { var: 0, .. }));
    }

    #[test]
    fn test_match_is_one_way_and_consistent() {
        let interner = Interner::new();
        let pair = interner.intern("Pair");
        let pattern = TyPattern::Adt {
            name: pair,
            local: true,
            args: vec![TyPattern::Param(0), TyPattern::Param(0)],
        };
        let same = TyPattern::Adt {
            name: pair,
            local: true,
            args: vec![TyPattern::Int, TyPattern::Int],
        };
        let mixed = TyPattern::Adt {
            name: pair,
            local: true,
            args: vec![TyPattern::Int, TyPattern::Bool],
        };
        assert_eq!(match_ty(&pattern, &same).unwrap()[&0], TyPattern::Int);
        assert!(match_ty(&pattern, &mixed).is_none());
        assert!(match_ty(&TyPattern::Int, &TyPattern::Param(0)).is_none());
    }
}
