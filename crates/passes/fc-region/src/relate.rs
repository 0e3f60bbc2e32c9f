//! Reduction of subtyping between types to origin obligations.

use std::fmt;

use fc_mir::{Body, Location, LocalId, Mutability, OriginId, PointIndex, Ty, Variance};

use crate::{RegionConfig, RegionError};

/// An origin read at a program point: a node of the subset graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OriginAt {
    /// The origin
    pub origin: OriginId,
    /// The point it is read at
    pub point: PointIndex,
}

impl OriginAt {
    /// Creates the pair.
    #[must_use]
    pub const fn new(origin: OriginId, point: PointIndex) -> Self {
        Self { origin, point }
    }
}

/// Whether an obligation is an inclusion or an equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// `sub ⊆ sup`
    Subset,
    /// `sub = sup`
    Equal,
}

/// What produced an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CauseKind {
    /// A live variable carried across a CFG step
    Flow(LocalId),
    /// The rvalue of an assignment flowing into its destination
    Assignment,
    /// A call argument flowing into the callee's parameter
    CallArgument(usize),
    /// A call's return value flowing into its destination
    CallReturn,
    /// A reference dereferenced by a reborrow outliving the new borrow
    Reborrow,
}

/// Provenance of an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cause {
    /// Point the obligation arises at
    pub location: Location,
    /// Reason
    pub kind: CauseKind,
}

/// A constraint between two subset-graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Obligation {
    /// Smaller side
    pub sub: OriginAt,
    /// Larger side
    pub sup: OriginAt,
    /// Inclusion or equality
    pub kind: ConstraintKind,
    /// Provenance
    pub cause: Cause,
}

impl fmt::Display for Obligation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.kind {
            ConstraintKind::Subset => "⊆",
            ConstraintKind::Equal => "=",
        };
        write!(
            f,
            "{}@{} {op} {}@{}",
            self.sub.origin,
            self.sub.point.as_u32(),
            self.sup.origin,
            self.sup.point.as_u32()
        )
    }
}

/// Relates a type read at one point to a type read at another, pushing the
/// resulting obligations.
pub(crate) struct TypeRelating<'a> {
    body: &'a Body,
    config: &'a RegionConfig,
    sub_point: PointIndex,
    sup_point: PointIndex,
    cause: Cause,
    out: &'a mut Vec<Obligation>,
}

impl<'a> TypeRelating<'a> {
    pub(crate) fn new(
        body: &'a Body,
        config: &'a RegionConfig,
        sub_point: PointIndex,
        sup_point: PointIndex,
        cause: Cause,
        out: &'a mut Vec<Obligation>,
    ) -> Self {
        Self {
            body,
            config,
            sub_point,
            sup_point,
            cause,
            out,
        }
    }

    /// Requires `sub@sub_point <: sup@sup_point`.
    pub(crate) fn subtype(&mut self, sub: &Ty, sup: &Ty) -> Result<(), RegionError> {
        self.relate(sub, sup, Variance::Covariant)
    }

    /// Requires `sub@sub_point ⊆ sup@sup_point` for two bare origins.
    pub(crate) fn outlives(&mut self, sub: OriginId, sup: OriginId) {
        self.push(sub, sup, ConstraintKind::Subset);
    }

    fn push(&mut self, sub: OriginId, sup: OriginId, kind: ConstraintKind) {
        self.out.push(Obligation {
            sub: OriginAt::new(sub, self.sub_point),
            sup: OriginAt::new(sup, self.sup_point),
            kind,
            cause: self.cause,
        });
    }

    fn relate(&mut self, sub: &Ty, sup: &Ty, variance: Variance) -> Result<(), RegionError> {
        match (sub, sup) {
            (Ty::Unit, Ty::Unit) | (Ty::Bool, Ty::Bool) | (Ty::Int, Ty::Int) => Ok(()),
            (
                Ty::Ref {
                    origin: sub_origin,
                    mutability: sub_mut,
                    referent: sub_referent,
                },
                Ty::Ref {
                    origin: sup_origin,
                    mutability: sup_mut,
                    referent: sup_referent,
                },
            ) if sub_mut == sup_mut => {
                let equal = variance == Variance::Invariant
                    || (*sub_mut == Mutability::Mut && self.config.invariant_mut_origins);
                let kind = if equal {
                    ConstraintKind::Equal
                } else {
                    ConstraintKind::Subset
                };
                self.push(*sub_origin, *sup_origin, kind);
                let referent_variance = match sub_mut {
                    Mutability::Not => Variance::Covariant,
                    Mutability::Mut => Variance::Invariant,
                };
                self.relate(sub_referent, sup_referent, variance.xform(referent_variance))
            }
            (
                Ty::Adt {
                    name: sub_name,
                    args: sub_args,
                },
                Ty::Adt {
                    name: sup_name,
                    args: sup_args,
                },
            ) if sub_name == sup_name && sub_args.len() == sup_args.len() => sub_args
                .iter()
                .zip(sup_args)
                .try_for_each(|(a, b)| self.relate(a, b, variance)),
            (
                Ty::Struct {
                    name: sub_name,
                    fields: sub_fields,
                },
                Ty::Struct {
                    name: sup_name,
                    fields: sup_fields,
                },
            ) if sub_name == sup_name
                && sub_fields.len() == sup_fields.len()
                && sub_fields.iter().zip(sup_fields).all(|(a, b)| a.name == b.name) =>
            {
                sub_fields
                    .iter()
                    .zip(sup_fields)
                    .try_for_each(|(a, b)| self.relate(&a.ty, &b.ty, variance))
            }
            _ => Err(RegionError::IncompatibleTypes {
                expected: self.body.describe_ty(sup),
                found: self.body.describe_ty(sub),
                location: self.cause.location,
                span: self.body.span_at(self.cause.location),
            }),
        }
    }
}
