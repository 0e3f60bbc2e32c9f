//! Flow-sensitive environments and the obligations between them.
//!
//! The environment at a point maps every live variable to its declared
//! type, with origins read at that point. Crossing a CFG step `A -> B`
//! requires `Env[A]` to be a subenvironment of `Env[B]`, adjusted for what
//! the step itself does: assignments and calls add their own flows, and a
//! variable wholly overwritten at `A` does not carry its old value to `B`.

use fc_liveness::Liveness;
use fc_mir::{
    Body, Location, LocalId, Mutability, Operand, Place, PointIndex, PointTable, Rvalue,
    StatementKind, TerminatorKind, Ty,
};
use tracing::{debug, instrument};

use crate::relate::{Cause, CauseKind, Obligation, TypeRelating};
use crate::{RegionConfig, RegionError};

/// The environment at one point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment<'body> {
    /// Point the environment describes
    pub point: PointIndex,
    /// Live variables with their types, in local order
    pub vars: Vec<(LocalId, &'body Ty)>,
}

impl Environment<'_> {
    /// Type of `local`, if it is in the environment.
    #[must_use]
    pub fn get(&self, local: LocalId) -> Option<&Ty> {
        self.vars
            .iter()
            .find(|(var, _)| *var == local)
            .map(|(_, ty)| *ty)
    }
}

/// Per-point environments of a body.
#[derive(Debug, Clone, Copy)]
pub struct Environments<'a> {
    body: &'a Body,
    points: &'a PointTable,
    liveness: &'a Liveness,
}

impl<'a> Environments<'a> {
    /// Views the body's environments through its liveness.
    #[must_use]
    pub fn new(body: &'a Body, points: &'a PointTable, liveness: &'a Liveness) -> Self {
        Self {
            body,
            points,
            liveness,
        }
    }

    /// The environment at `point`.
    #[must_use]
    pub fn env_at(&self, point: PointIndex) -> Environment<'a> {
        let vars = self
            .liveness
            .live_locals(point)
            .iter()
            .map(|local| (local, &self.body.local_decl(local).ty))
            .collect();
        Environment { point, vars }
    }

    /// Generates the subset obligations of every CFG step.
    ///
    /// # Errors
    ///
    /// Returns every site where two related types have different shapes.
    #[instrument(level = "debug", skip_all, fields(body = %self.body.fn_name()))]
    pub fn obligations(&self, config: &RegionConfig) -> Result<Vec<Obligation>, Vec<RegionError>> {
        let mut out = Vec::new();
        let mut errors = Vec::new();
        for point in self.points.points() {
            if let Err(error) = self.obligations_at(point, config, &mut out) {
                errors.push(error);
            }
        }
        debug!(obligations = out.len(), errors = errors.len(), "generated obligations");
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }

    fn obligations_at(
        &self,
        a: PointIndex,
        config: &RegionConfig,
        out: &mut Vec<Obligation>,
    ) -> Result<(), RegionError> {
        let location = self.points.location(a);
        let overwritten = self.body.overwritten_local(location);

        for &b in self.points.successors(a) {
            for local in self.liveness.live_locals(b) {
                if Some(local) == overwritten || !self.liveness.is_live(local, a) {
                    continue;
                }
                let ty = &self.body.local_decl(local).ty;
                if ty.has_origins() {
                    let cause = Cause {
                        location,
                        kind: CauseKind::Flow(local),
                    };
                    TypeRelating::new(self.body, config, a, b, cause, out).subtype(ty, ty)?;
                }
            }
        }

        match self.body.statement_at(location) {
            Some(statement) => {
                if let StatementKind::Assign(dest, rvalue) = &statement.kind {
                    for &b in self.points.successors(a) {
                        self.assignment(location, a, b, dest, rvalue, config, out)?;
                    }
                }
                Ok(())
            }
            None => self.terminator(location, a, config, out),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn assignment(
        &self,
        location: Location,
        a: PointIndex,
        b: PointIndex,
        dest: &Place,
        rvalue: &Rvalue,
        config: &RegionConfig,
        out: &mut Vec<Obligation>,
    ) -> Result<(), RegionError> {
        let cause = Cause {
            location,
            kind: CauseKind::Assignment,
        };
        let dest_ty = self.place_ty(dest, location)?;
        match rvalue {
            Rvalue::Use(operand) => {
                if let Some(ty) = self.operand_ty(operand, location)? {
                    TypeRelating::new(self.body, config, a, b, cause, out).subtype(ty, dest_ty)?;
                }
            }
            Rvalue::Ref {
                origin,
                kind,
                place,
            } => {
                let mutability = if kind.is_mutable() {
                    Mutability::Mut
                } else {
                    Mutability::Not
                };
                let referent = self.place_ty(place, location)?.clone();
                let ref_ty = Ty::Ref {
                    origin: *origin,
                    mutability,
                    referent: Box::new(referent),
                };
                TypeRelating::new(self.body, config, a, b, cause, out).subtype(&ref_ty, dest_ty)?;

                let reborrow = Cause {
                    location,
                    kind: CauseKind::Reborrow,
                };
                for base in place.deref_bases() {
                    if let Ty::Ref {
                        origin: base_origin,
                        ..
                    } = self.place_ty(&base, location)?
                    {
                        TypeRelating::new(self.body, config, a, a, reborrow, out)
                            .outlives(*base_origin, *origin);
                    }
                }
            }
            Rvalue::BinaryOp { .. } => {}
            Rvalue::Aggregate(operands) => {
                if let Ty::Struct { fields, .. } = dest_ty {
                    for (operand, field) in operands.iter().zip(fields) {
                        if let Some(ty) = self.operand_ty(operand, location)? {
                            TypeRelating::new(self.body, config, a, b, cause, out)
                                .subtype(ty, &field.ty)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn terminator(
        &self,
        location: Location,
        a: PointIndex,
        config: &RegionConfig,
        out: &mut Vec<Obligation>,
    ) -> Result<(), RegionError> {
        let TerminatorKind::Call {
            signature,
            args,
            destination,
            ..
        } = &self.body.basic_blocks[location.block].terminator.kind
        else {
            return Ok(());
        };
        for (index, (arg, formal)) in args.iter().zip(&signature.inputs).enumerate() {
            if let Some(ty) = self.operand_ty(arg, location)? {
                let cause = Cause {
                    location,
                    kind: CauseKind::CallArgument(index),
                };
                TypeRelating::new(self.body, config, a, a, cause, out).subtype(ty, formal)?;
            }
        }
        let dest_ty = self.place_ty(destination, location)?;
        let cause = Cause {
            location,
            kind: CauseKind::CallReturn,
        };
        for &b in self.points.successors(a) {
            TypeRelating::new(self.body, config, a, b, cause, out)
                .subtype(&signature.output, dest_ty)?;
        }
        Ok(())
    }

    fn place_ty(&self, place: &Place, location: Location) -> Result<&'a Ty, RegionError> {
        self.body
            .place_ty(place)
            .map_err(|error| self.malformed(location, error.to_string()))
    }

    fn operand_ty(&self, operand: &Operand, location: Location) -> Result<Option<&'a Ty>, RegionError> {
        self.body
            .operand_ty(operand)
            .map_err(|error| self.malformed(location, error.to_string()))
    }

    fn malformed(&self, location: Location, message: String) -> RegionError {
        RegionError::IncompatibleTypes {
            expected: "a well-formed place".to_string(),
            found: message,
            location,
            span: self.body.span_at(location),
        }
    }
}
