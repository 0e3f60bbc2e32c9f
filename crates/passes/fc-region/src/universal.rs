//! Checks that nothing flows into a universal origin that the signature
//! does not allow.

use fc_index::{BitSet, IndexMap};
use fc_mir::{Body, Loan, LoanTable, OriginId, PointTable, Ty};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::RegionError;
use crate::reachability::LoanReachability;
use crate::relate::OriginAt;

/// Transitive closure of the declared known subsets between universal
/// origins, reflexive.
fn known_subsets(body: &Body) -> IndexMap<OriginId, BitSet<OriginId>> {
    let n = body.origins.len();
    let universals: Vec<OriginId> = body.universal_origins().collect();
    let mut known: IndexMap<OriginId, BitSet<OriginId>> = universals
        .iter()
        .map(|&origin| {
            let mut set = BitSet::new_empty(n);
            set.insert(origin);
            (origin, set)
        })
        .collect();
    for &(sub, sup) in &body.known_subsets {
        if let Some(set) = known.get_mut(sub) {
            set.insert(sup);
        }
    }
    let mut changed = true;
    while changed {
        changed = false;
        for &origin in &universals {
            let reachable: Vec<OriginId> = known[origin].iter().collect();
            for via in reachable {
                let Some(via_set) = known.get(via).cloned() else {
                    continue;
                };
                if let Some(set) = known.get_mut(origin) {
                    changed |= set.union(&via_set);
                }
            }
        }
    }
    known
}

/// `'sub: 'sup` holds by declaration.
fn declared_outlives(
    known: &IndexMap<OriginId, BitSet<OriginId>>,
    sub: OriginId,
    sup: OriginId,
) -> bool {
    known.get(sub).is_some_and(|set| set.contains(sup))
}

/// Whether `loan` borrows data behind a reference whose referent is known to
/// outlive `universal`. Such a loan reborrows caller-owned storage; loans of
/// locals that reference carries reach `universal` on their own.
fn reborrows_outliving_data(
    body: &Body,
    points: &PointTable,
    reach: &LoanReachability,
    known: &IndexMap<OriginId, BitSet<OriginId>>,
    loan: &Loan,
    universal: OriginId,
) -> bool {
    let Some(base) = loan.place.deref_bases().last() else {
        return false;
    };
    let Ok(Ty::Ref { origin, .. }) = body.place_ty(&base) else {
        return false;
    };
    let marks = reach.placeholders_in(OriginAt::new(*origin, points.point(loan.location)));
    !marks.is_empty() && marks.iter().all(|mark| declared_outlives(known, mark, universal))
}

/// Reports loans of local storage escaping into universal origins and
/// undeclared flows between universal origins, each at the first point it is
/// observed.
pub(crate) fn check_universals(
    body: &Body,
    points: &PointTable,
    loans: &LoanTable,
    reach: &LoanReachability,
) -> Vec<RegionError> {
    let known = known_subsets(body);
    let mut reported_loans = FxHashSet::default();
    let mut reported_pairs = FxHashSet::default();
    let mut errors = Vec::new();

    for universal in body.universal_origins() {
        for point in points.points() {
            let at = OriginAt::new(universal, point);
            let location = points.location(point);
            for loan in reach.loans_in(at) {
                if reported_loans.contains(&(universal, loan))
                    || reborrows_outliving_data(
                        body,
                        points,
                        reach,
                        &known,
                        loans.get(loan),
                        universal,
                    )
                {
                    continue;
                }
                reported_loans.insert((universal, loan));
                errors.push(RegionError::LoanEscapes {
                    loan,
                    origin: body.origin_name(universal).to_string(),
                    location,
                    span: body.span_at(location),
                });
            }
            for other in reach.placeholders_in(at) {
                if other == universal || declared_outlives(&known, other, universal) {
                    continue;
                }
                if reported_pairs.insert((other, universal)) {
                    errors.push(RegionError::UniversalSubset {
                        sub: body.origin_name(other).to_string(),
                        sup: body.origin_name(universal).to_string(),
                        location,
                        span: body.span_at(location),
                    });
                }
            }
        }
    }
    debug!(errors = errors.len(), "checked universal origins");
    errors
}
