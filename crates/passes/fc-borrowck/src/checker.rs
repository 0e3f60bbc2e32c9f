//! Main borrow checking implementation.

use fc_index::BitSet;
use fc_liveness::Liveness;
use fc_mir::{AccessKind, Body, LoanId, LoanTable, Location, Place, PointIndex, PointTable};
use fc_region::RegionInference;
use rustc_hash::FxHashSet;
use tracing::{debug, instrument, trace};

use crate::active::ActiveLoans;
use crate::error::{BorrowError, BorrowResult};
use crate::BorrowckConfig;

/// Everything the analysis derived for a body.
#[derive(Debug, Clone)]
pub struct BorrowckFacts {
    /// Program point numbering
    pub points: PointTable,
    /// Place and local liveness
    pub liveness: Liveness,
    /// Loans created by the body
    pub loans: LoanTable,
    /// Solved subset graph
    pub regions: RegionInference,
    /// Active loans per point
    pub active: ActiveLoans,
    /// Conflicts and universal-origin errors, sorted by location then loan
    pub errors: Vec<BorrowError>,
}

/// Main borrow checker.
///
/// Runs liveness, region inference and the active-loan dataflow over a
/// body, then compares the loans still in use at every access against the
/// accessed place.
pub struct BorrowChecker<'body> {
    /// The body being checked
    body: &'body Body,

    /// Settings
    config: &'body BorrowckConfig,

    /// Accumulated errors
    errors: Vec<BorrowError>,

    /// `(location, loan, access)` triples already reported
    reported: FxHashSet<(Location, LoanId, AccessKind)>,
}

impl<'body> BorrowChecker<'body> {
    /// Creates a new borrow checker for the given body.
    #[must_use]
    pub fn new(body: &'body Body, config: &'body BorrowckConfig) -> Self {
        Self {
            body,
            config,
            errors: Vec::new(),
            reported: FxHashSet::default(),
        }
    }

    /// Runs borrow checking on a body with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns all borrow checking errors found in the body. If no errors
    /// are found, returns `Ok(())`.
    pub fn check(body: &'body Body) -> BorrowResult<()> {
        BorrowChecker::check_with_config(body, &BorrowckConfig::default())
    }

    /// Runs borrow checking with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns all borrow checking errors found in the body.
    pub fn check_with_config(body: &'body Body, config: &'body BorrowckConfig) -> BorrowResult<()> {
        let facts = Self::analyze(body, config)?;
        if facts.errors.is_empty() {
            Ok(())
        } else {
            Err(facts.errors)
        }
    }

    /// Runs every pass and returns the derived facts, including the
    /// non-fatal errors found.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed or contains type errors
    /// that prevent region inference.
    #[instrument(level = "debug", skip_all, fields(body = %body.fn_name()))]
    pub fn analyze(body: &'body Body, config: &'body BorrowckConfig) -> BorrowResult<BorrowckFacts> {
        body.validate().map_err(|error| vec![BorrowError::from(error)])?;
        let points = PointTable::new(body);
        let liveness = Liveness::compute(body, &points);
        let loans = LoanTable::collect(body);
        let regions = RegionInference::compute(body, &points, &liveness, &loans, &config.region)
            .map_err(|errors| errors.into_iter().map(BorrowError::from).collect::<Vec<_>>())?;
        let active = ActiveLoans::compute(body, &points, &liveness, &loans, &regions);

        let mut checker = Self::new(body, config);
        checker.check_accesses(&points, &loans, &regions, &active);
        checker
            .errors
            .extend(regions.universal_errors().iter().cloned().map(BorrowError::from));
        let errors = checker.finish();

        Ok(BorrowckFacts {
            points,
            liveness,
            loans,
            regions,
            active,
            errors,
        })
    }

    /// Checks every access at every point against the loans that are active
    /// on entry and still in use once the access happens.
    fn check_accesses(
        &mut self,
        points: &PointTable,
        loans: &LoanTable,
        regions: &RegionInference,
        active: &ActiveLoans,
    ) {
        for point in points.points() {
            let on_entry = active.active_on_entry(point);
            if on_entry.is_empty() {
                continue;
            }
            let location = points.location(point);
            let mut live_after = BitSet::new_empty(loans.len());
            for &succ in points.successors(point) {
                live_after.union(active.live_loans(succ));
            }

            for (index, access) in self.body.accesses_at(location).into_iter().enumerate() {
                if access.kind == AccessKind::Read && !self.config.check_reads {
                    continue;
                }
                let mut candidates = live_after.clone();
                for place in self.body.pending_uses(location, index) {
                    self.add_loans_held(&place, point, regions, &mut candidates);
                }
                candidates.intersect(on_entry);

                for loan_id in &candidates {
                    let loan = loans.get(loan_id);
                    if !loan.place.overlaps(&access.place) || !loan.kind.conflicts_with(access.kind) {
                        continue;
                    }
                    if !self.reported.insert((location, loan_id, access.kind)) {
                        continue;
                    }
                    trace!(%location, loan = %loan_id, kind = access.kind.describe(), "conflict");
                    self.errors.push(BorrowError::conflict(
                        access.kind,
                        self.body.describe_place(&access.place),
                        loan.clone(),
                        location,
                        self.body.span_at(location),
                    ));
                }
            }
        }
    }

    /// Adds the loans held in the origins `place` relies on at `point`: the
    /// whole local when the place goes through a reference, otherwise the
    /// value's own type.
    fn add_loans_held(
        &self,
        place: &Place,
        point: PointIndex,
        regions: &RegionInference,
        held: &mut BitSet<LoanId>,
    ) {
        let ty = if place.has_deref() {
            Some(&self.body.local_decl(place.local).ty)
        } else {
            self.body.place_ty(place).ok()
        };
        if let Some(ty) = ty {
            ty.walk_origins(&mut |origin| {
                held.union(regions.loans_in(origin, point));
            });
        }
    }

    /// Sorts errors by location then loan and applies the error cap.
    fn finish(mut self) -> Vec<BorrowError> {
        self.errors
            .sort_by_key(|error| (error.location(), error.loan().map(|loan| loan.id)));
        if let Some(max) = self.config.max_errors {
            self.errors.truncate(max);
        }
        debug!(errors = self.errors.len(), "borrow check finished");
        self.errors
    }
}
