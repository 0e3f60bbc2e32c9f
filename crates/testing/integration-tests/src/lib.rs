//! Shared programs and helpers for the end-to-end tests.
//!
//! Every program is built with [`BodyBuilder`](fc_mir::BodyBuilder) and
//! mirrors a worked example of the analysis. The expected outcome of each is
//! documented on its constructor and asserted in `tests/`.

pub mod programs;

use anyhow::{Result, anyhow};
use fc_borrowck::{BorrowChecker, BorrowError, BorrowckConfig, BorrowckFacts};
use fc_index::Idx;
use fc_mir::{BasicBlock, Body, LoanId, LocalId, Location, OriginId, PointIndex};

/// Runs the full pipeline, turning fatal errors into an [`anyhow::Error`].
///
/// # Errors
///
/// Returns an error if the body is malformed or ill-typed.
pub fn analyze(body: &Body, config: &BorrowckConfig) -> Result<BorrowckFacts> {
    BorrowChecker::analyze(body, config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow!("analysis of `{}` failed: {}", body.fn_name(), messages.join("; "))
    })
}

/// Errors reported for `body` under the default configuration.
#[must_use]
pub fn errors_of(body: &Body) -> Vec<BorrowError> {
    match BorrowChecker::check(body) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    }
}

/// Each error as a `(location, loan, reason)` triple.
#[must_use]
pub fn summarize(errors: &[BorrowError]) -> Vec<(Option<Location>, Option<String>, &'static str)> {
    errors
        .iter()
        .map(|error| (error.location(), error.loan().map(|loan| loan.id.to_string()), error.reason()))
        .collect()
}

/// Looks up a local by its source name.
///
/// # Panics
///
/// Panics if the body has no local with that name.
#[must_use]
pub fn local(body: &Body, name: &str) -> LocalId {
    body.locals
        .indices()
        .find(|&local| body.local_name(local) == name)
        .unwrap_or_else(|| panic!("no local `{name}` in `{}`", body.fn_name()))
}

/// Looks up an origin by its declared name.
///
/// # Panics
///
/// Panics if the body declares no origin with that name.
#[must_use]
pub fn origin(body: &Body, name: &str) -> OriginId {
    body.origins
        .indices()
        .find(|&origin| body.origin_name(origin) == name)
        .unwrap_or_else(|| panic!("no origin `{name}` in `{}`", body.fn_name()))
}

/// Loan id `Ln`.
#[must_use]
pub fn loan(n: usize) -> LoanId {
    LoanId::new(n)
}

/// Point index of `bbN[i]`.
#[must_use]
pub fn point(facts: &BorrowckFacts, block: usize, statement_index: usize) -> PointIndex {
    facts
        .points
        .point(Location::new(BasicBlock::new(block), statement_index))
}
