//! Trait-impl coherence and dispatch.
//!
//! Dispatch is decided when impls are declared rather than when they are
//! used: the coherence check guarantees that at most one impl of a trait
//! applies to any type, so [`ImplTable::lookup`] is a single one-way match
//! with no backtracking.
//!
//! Two rules are enforced:
//!
//! - **Orphan rule**: an impl must be for a local trait, or for a type whose
//!   head constructor (looking through references) is local.
//! - **Overlap**: no two impls of the same trait may have self types that
//!   unify once their parameters are renamed apart.

mod error;
mod ty;
mod unify;

pub use error::CoherenceError;
pub use ty::TyPattern;
pub use unify::{UnificationError, Unifier, match_ty};

use fc_intern::{Interner, Symbol};
use fc_span::FileSpan;
use la_arena::{Arena, Idx};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

/// Identifier of an impl in an [`ImplTable`].
pub type ImplId = Idx<ImplDef>;

/// Header of `impl<T0, .., Tn> Trait for SelfTy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplDef {
    /// Implemented trait
    pub trait_name: Symbol,
    /// Whether the trait is defined in the current crate
    pub trait_local: bool,
    /// Number of type parameters; the self type uses `Param(0..n)`
    pub generics: u32,
    /// Self type
    pub self_ty: TyPattern,
    /// Source span of the header
    pub span: Option<FileSpan>,
}

/// The coherent set of impls, indexed by trait.
#[derive(Debug)]
pub struct ImplTable {
    impls: Arena<ImplDef>,
    by_trait: FxHashMap<Symbol, Vec<ImplId>>,
}

impl ImplTable {
    /// Checks the orphan rule and pairwise overlap, then builds the table.
    ///
    /// # Errors
    ///
    /// Returns every orphan impl and every overlapping pair.
    #[instrument(level = "debug", skip_all, fields(impls = impls.len()))]
    pub fn build(interner: &Interner, impls: Vec<ImplDef>) -> Result<Self, Vec<CoherenceError>> {
        let mut arena = Arena::new();
        let mut by_trait: FxHashMap<Symbol, Vec<ImplId>> = FxHashMap::default();
        let mut errors = Vec::new();

        for def in impls {
            if !def.trait_local && !def.self_ty.has_local_head() {
                errors.push(CoherenceError::OrphanImpl {
                    trait_name: interner.resolve(&def.trait_name).to_string(),
                    self_ty: def.self_ty.display(interner),
                    span: def.span,
                });
            }
            let trait_name = def.trait_name;
            let id = arena.alloc(def);
            by_trait.entry(trait_name).or_default().push(id);
        }

        for ids in by_trait.values() {
            for (i, &first) in ids.iter().enumerate() {
                for &second in &ids[i + 1..] {
                    if let Some(witness) = overlap(&arena[first], &arena[second]) {
                        let def = &arena[second];
                        errors.push(CoherenceError::OverlappingImpls {
                            trait_name: interner.resolve(&def.trait_name).to_string(),
                            first: arena[first].self_ty.display(interner),
                            second: def.self_ty.display(interner),
                            witness: witness.display(interner),
                            span: def.span,
                        });
                    }
                }
            }
        }

        debug!(traits = by_trait.len(), errors = errors.len(), "checked coherence");
        if errors.is_empty() {
            Ok(Self {
                impls: arena,
                by_trait,
            })
        } else {
            Err(errors)
        }
    }

    /// The impl with the given id.
    #[must_use]
    pub fn get(&self, id: ImplId) -> &ImplDef {
        &self.impls[id]
    }

    /// Finds the impl of `trait_name` for `ty`, with the values of its
    /// parameters.
    #[must_use]
    pub fn lookup(
        &self,
        trait_name: Symbol,
        ty: &TyPattern,
    ) -> Option<(ImplId, FxHashMap<u32, TyPattern>)> {
        self.by_trait.get(&trait_name)?.iter().find_map(|&id| {
            match_ty(&self.impls[id].self_ty, ty).map(|bindings| (id, bindings))
        })
    }

    /// Number of impls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.impls.len()
    }

    /// Returns `true` if there are no impls.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.impls.is_empty()
    }
}

/// A type both impls apply to, if their self types unify.
fn overlap(first: &ImplDef, second: &ImplDef) -> Option<TyPattern> {
    let renamed = second.self_ty.shift_params(first.generics);
    let mut unifier = Unifier::new();
    unifier.unify(&first.self_ty, &renamed).ok()?;
    Some(unifier.resolve(&first.self_ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        interner: Interner,
        display: Symbol,
        vec: Symbol,
        point: Symbol,
    }

    fn fixture() -> Fixture {
        let interner = Interner::new();
        Fixture {
            display: interner.intern("Display"),
            vec: interner.intern("Vec"),
            point: interner.intern("Point"),
            interner,
        }
    }

    fn impl_def(trait_name: Symbol, trait_local: bool, generics: u32, self_ty: TyPattern) -> ImplDef {
        ImplDef {
            trait_name,
            trait_local,
            generics,
            self_ty,
            span: None,
        }
    }

    #[test]
    fn test_blanket_and_concrete_impls_overlap() {
        let f = fixture();
        let vec_of = |arg| TyPattern::Adt {
            name: f.vec,
            local: false,
            args: vec![arg],
        };
        let impls = vec![
            impl_def(f.display, true, 1, vec_of(TyPattern::Param(0))),
            impl_def(f.display, true, 0, vec_of(TyPattern::Int)),
        ];
        let errors = ImplTable::build(&f.interner, impls).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CoherenceError::OverlappingImpls { witness, .. } if witness == "Vec<int>"
        ));
    }

    #[test]
    fn test_orphan_impl_is_rejected() {
        let f = fixture();
        let impls = vec![impl_def(
            f.display,
            false,
            0,
            TyPattern::shared_ref(TyPattern::adt(f.vec, false)),
        )];
        let errors = ImplTable::build(&f.interner, impls).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "impl of foreign trait `Display` for foreign type `&Vec`"
        );
    }

    #[test]
    fn test_foreign_trait_for_local_type_through_reference_is_allowed() {
        let f = fixture();
        let impls = vec![impl_def(
            f.display,
            false,
            0,
            TyPattern::mut_ref(TyPattern::adt(f.point, true)),
        )];
        assert!(ImplTable::build(&f.interner, impls).is_ok());
    }

    #[test]
    fn test_lookup_finds_the_unique_impl() {
        let f = fixture();
        let vec_of = |arg| TyPattern::Adt {
            name: f.vec,
            local: false,
            args: vec![arg],
        };
        let impls = vec![
            impl_def(f.display, true, 1, vec_of(TyPattern::shared_ref(TyPattern::Param(0)))),
            impl_def(f.display, true, 0, vec_of(TyPattern::Int)),
            impl_def(f.display, true, 0, TyPattern::adt(f.point, true)),
        ];
        let table = ImplTable::build(&f.interner, impls).unwrap();
        assert_eq!(table.len(), 3);

        let (id, bindings) = table
            .lookup(f.display, &vec_of(TyPattern::shared_ref(TyPattern::Bool)))
            .unwrap();
        assert_eq!(table.get(id).generics, 1);
        assert_eq!(bindings[&0], TyPattern::Bool);

        let (id, _) = table.lookup(f.display, &vec_of(TyPattern::Int)).unwrap();
        assert_eq!(table.get(id).generics, 0);
        assert!(table.lookup(f.display, &vec_of(TyPattern::Bool)).is_none());
        assert!(table.lookup(f.vec, &TyPattern::Int).is_none());
    }
}
