//! Per-body analysis reports.

use fc_borrowck::BorrowError;
use fc_span::FileSpan;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of checking one body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Name of the checked function
    pub body: String,
    /// Whether the body was accepted
    pub accepted: bool,
    /// One entry per error, in reporting order
    pub diagnostics: Vec<ReportEntry>,
}

/// A single reported error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Diagnostic code such as `borrowck::write_while_borrowed`
    pub code: Option<String>,
    /// Short access category, see [`BorrowError::reason`]
    pub reason: String,
    /// Primary message
    pub message: String,
    /// Program point, rendered as `bb1[2]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Loan involved, rendered as `L0`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan: Option<String>,
    /// Where the loan was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_location: Option<String>,
    /// Help text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Source span of the offending access
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<FileSpan>,
    /// Source span of the borrow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_span: Option<FileSpan>,
}

impl Report {
    /// Builds a report from the result of checking `body`.
    #[must_use]
    pub fn new(body: impl Into<String>, errors: &[BorrowError]) -> Self {
        Self {
            body: body.into(),
            accepted: errors.is_empty(),
            diagnostics: errors.iter().map(ReportEntry::from).collect(),
        }
    }

    /// Number of reported errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }
}

impl From<&BorrowError> for ReportEntry {
    fn from(error: &BorrowError) -> Self {
        let loan = error.loan();
        Self {
            code: error.code().map(|code| code.to_string()),
            reason: error.reason().to_string(),
            message: error.to_string(),
            location: error.location().map(|location| location.to_string()),
            loan: loan.map(|loan| loan.id.to_string()),
            loan_location: loan.map(|loan| loan.location.to_string()),
            help: error.help().map(|help| help.to_string()),
            span: error.span(),
            loan_span: loan.and_then(|loan| loan.span),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics.len() {
            0 => writeln!(f, "fn {}: ok", self.body)?,
            1 => writeln!(f, "fn {}: 1 error", self.body)?,
            n => writeln!(f, "fn {}: {n} errors", self.body)?,
        }
        for entry in &self.diagnostics {
            write!(f, "  error")?;
            if let Some(code) = &entry.code {
                write!(f, "[{code}]")?;
            }
            write!(f, ": {}", entry.message)?;
            if let Some(location) = &entry.location {
                write!(f, " at {location}")?;
            }
            if let (Some(loan), Some(created)) = (&entry.loan, &entry.loan_location) {
                write!(f, " (loan {loan} from {created})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
