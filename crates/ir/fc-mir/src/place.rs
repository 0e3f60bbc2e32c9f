//! Places: a local followed by field and deref projections.

use fc_intern::Symbol;

use crate::LocalId;

/// One step of a place path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    /// `*place`
    Deref,
    /// `place.field`
    Field(Symbol),
}

/// A memory location described by a local and a projection path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Place {
    /// Base local variable
    pub local: LocalId,
    /// Projections applied to the local, innermost first
    pub projection: Vec<Projection>,
}

impl Place {
    /// Creates a place naming a whole local.
    #[must_use]
    pub fn from_local(local: LocalId) -> Self {
        Self {
            local,
            projection: Vec::new(),
        }
    }

    /// `self.name`
    #[must_use]
    pub fn field(mut self, name: Symbol) -> Self {
        self.projection.push(Projection::Field(name));
        self
    }

    /// `*self`
    #[must_use]
    pub fn deref(mut self) -> Self {
        self.projection.push(Projection::Deref);
        self
    }

    /// Returns `true` if the place is a bare local.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.projection.is_empty()
    }

    /// Returns `true` if the path goes through a dereference.
    #[must_use]
    pub fn has_deref(&self) -> bool {
        self.projection.contains(&Projection::Deref)
    }

    /// Returns `true` if `self` is `other` or an ancestor of it
    /// (`a` is a prefix of `a`, `a.b` and `*a`).
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.local == other.local && other.projection.starts_with(&self.projection)
    }

    /// Returns `true` if the two places may denote overlapping memory.
    ///
    /// Places on different locals never overlap; on the same local they
    /// overlap unless they select different fields at the same depth.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.local != other.local {
            return false;
        }
        for (left, right) in self.projection.iter().zip(&other.projection) {
            match (left, right) {
                (Projection::Field(a), Projection::Field(b)) if a != b => return false,
                (Projection::Field(_), Projection::Field(_))
                | (Projection::Deref, Projection::Deref) => {}
                // Mixed projections at one depth only arise from ill-typed
                // input; treat them as aliasing.
                _ => return true,
            }
        }
        true
    }

    /// Returns `true` if the two places can never overlap.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        !self.overlaps(other)
    }

    /// The longest prefix that does not go through a dereference.
    ///
    /// Reading `(*p).f` uses the value of `p`; this is the place whose
    /// liveness the read establishes.
    #[must_use]
    pub fn liveness_prefix(&self) -> Self {
        let end = self
            .projection
            .iter()
            .position(|proj| *proj == Projection::Deref)
            .unwrap_or(self.projection.len());
        Self {
            local: self.local,
            projection: self.projection[..end].to_vec(),
        }
    }

    /// Prefixes that are dereferenced along the path, outermost first.
    ///
    /// For `*(*p).f` this yields `p` then `(*p).f`.
    pub fn deref_bases(&self) -> impl Iterator<Item = Self> + '_ {
        self.projection
            .iter()
            .enumerate()
            .filter(|(_, proj)| **proj == Projection::Deref)
            .map(|(i, _)| Self {
                local: self.local,
                projection: self.projection[..i].to_vec(),
            })
    }
}

impl From<LocalId> for Place {
    fn from(local: LocalId) -> Self {
        Self::from_local(local)
    }
}
