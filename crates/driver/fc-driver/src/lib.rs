//! Driver for checking several bodies and reporting the results.
//!
//! The driver owns a [`Config`], runs the borrow checker on each body it is
//! given and turns the outcome into a [`Report`]. Reports print as text or
//! JSON depending on [`OutputFormat`], and can be rendered against source text
//! with [`Sources`] when the bodies carry spans.

mod config;
mod error;
mod render;
mod report;

pub use config::{Config, OutputConfig, OutputFormat};
pub use error::{DriverError, DriverResult};
pub use render::Sources;
pub use report::{Report, ReportEntry};

use fc_borrowck::BorrowChecker;
use fc_mir::Body;
use tracing::{debug, instrument};

/// Checks bodies with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Driver {
    config: Config,
}

impl Driver {
    /// Creates a driver with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks a single body.
    #[instrument(level = "debug", skip_all, fields(body = %body.fn_name()))]
    pub fn check(&self, body: &Body) -> Report {
        let report = match BorrowChecker::check_with_config(body, &self.config.analysis) {
            Ok(()) => Report::new(body.fn_name(), &[]),
            Err(errors) => Report::new(body.fn_name(), &errors),
        };
        debug!(errors = report.error_count(), "checked body");
        report
    }

    /// Checks every body independently, in order.
    pub fn check_all<'a>(&self, bodies: impl IntoIterator<Item = &'a Body>) -> Vec<Report> {
        bodies.into_iter().map(|body| self.check(body)).collect()
    }

    /// Formats reports in the configured output format.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Json`] if JSON serialization fails.
    pub fn emit(&self, reports: &[Report]) -> DriverResult<String> {
        match self.config.output.format {
            OutputFormat::Text => Ok(reports.iter().map(ToString::to_string).collect()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use fc_mir::{BodyBuilder, BorrowKind, Place, Ty};
    use fc_span::{FileId, FileSpan, Span};

    const SOURCE: &str = "let p = &x;\nx = 1;\nlet y = *p;\n";

    fn span(start: u32, end: u32) -> Option<FileSpan> {
        Some(FileSpan::new(FileId::new(0), Span::new(start, end)))
    }

    /// `p = &x; x = 1; y = *p;` with spans into [`SOURCE`].
    fn write_while_borrowed() -> Body {
        let mut b = BodyBuilder::new("bad");
        let r = b.origin("0");
        let x = b.local("x", Ty::Int);
        let p = b.local("p", Ty::shared_ref(r, Ty::Int));
        let y = b.local("y", Ty::Int);
        let bb0 = b.block();
        b.set_span(span(0, 11));
        b.borrow(bb0, p, r, BorrowKind::Shared, x);
        b.set_span(span(12, 18));
        b.assign_const(bb0, x, 1);
        b.set_span(span(19, 30));
        b.copy(bb0, y, Place::from_local(p).deref());
        b.set_span(None);
        b.ret(bb0);
        b.finish().unwrap()
    }

    fn accepted() -> Body {
        let mut b = BodyBuilder::new("good");
        let r = b.origin("0");
        let x = b.local("x", Ty::Int);
        let p = b.local("p", Ty::shared_ref(r, Ty::Int));
        let y = b.local("y", Ty::Int);
        let bb0 = b.block();
        b.borrow(bb0, p, r, BorrowKind::Shared, x);
        b.copy(bb0, y, Place::from_local(p).deref());
        b.assign_const(bb0, x, 1);
        b.ret(bb0);
        b.finish().unwrap()
    }

    #[test]
    fn test_text_output() {
        let driver = Driver::default();
        let reports = driver.check_all([&write_while_borrowed(), &accepted()]);
        assert!(!reports[0].accepted);
        assert!(reports[1].accepted);

        expect![[r#"
            fn bad: 1 error
              error[borrowck::write_while_borrowed]: cannot assign to `x` because it is borrowed at bb0[1] (loan L0 from bb0[0])
            fn good: ok
        "#]]
        .assert_eq(&driver.emit(&reports).unwrap());
    }

    #[test]
    fn test_json_output_round_trips() {
        let config = Config::from_toml_str("[output]\nformat = \"json\"").unwrap();
        let driver = Driver::new(config);
        let reports = vec![driver.check(&write_while_borrowed())];
        let json = driver.emit(&reports).unwrap();

        let parsed: Vec<Report> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, reports);
        let entry = &parsed[0].diagnostics[0];
        assert_eq!(entry.reason, "write");
        assert_eq!(entry.loan.as_deref(), Some("L0"));
        assert_eq!(entry.span, span(12, 18));
        assert_eq!(entry.loan_span, span(0, 11));
    }

    #[test]
    fn test_render_against_source() {
        let report = Driver::default().check(&write_while_borrowed());
        let mut sources = Sources::new();
        sources.add(FileId::new(0), "bad.fc", SOURCE);

        let rendered = sources.render(&report).unwrap();
        assert!(rendered.contains("error[borrowck::write_while_borrowed]"));
        assert!(rendered.contains("bad.fc:2:1"));
        assert!(rendered.contains("write occurs here"));
        assert!(rendered.contains("borrow L0 created here"));
    }

    #[test]
    fn test_render_without_source_falls_back_to_location() {
        let report = Driver::default().check(&write_while_borrowed());
        let diagnostic = Sources::new().diagnostic(&report.diagnostics[0]);
        assert!(diagnostic.labels.is_empty());
        assert_eq!(diagnostic.notes, vec!["at bb0[1]".to_string()]);
    }
}
