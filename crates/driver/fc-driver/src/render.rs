//! Source-level rendering of reports with `codespan-reporting`.

use crate::error::DriverResult;
use crate::report::{Report, ReportEntry};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use fc_span::{FileId, FileSpan};
use rustc_hash::FxHashMap;

/// Source texts that report spans point into.
pub struct Sources {
    files: SimpleFiles<String, String>,
    ids: FxHashMap<FileId, usize>,
}

impl Default for Sources {
    fn default() -> Self {
        Self::new()
    }
}

impl Sources {
    /// Creates an empty source map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: FxHashMap::default(),
        }
    }

    /// Registers the text of `file` under a display name.
    pub fn add(&mut self, file: FileId, name: impl Into<String>, source: impl Into<String>) {
        let id = self.files.add(name.into(), source.into());
        self.ids.insert(file, id);
    }

    fn label(&self, span: FileSpan) -> Option<(usize, std::ops::Range<usize>)> {
        self.ids.get(&span.file).map(|&id| (id, span.range()))
    }

    /// Converts a report entry into a rustc-style diagnostic.
    ///
    /// Spans whose file was never registered are left out, and the program
    /// point is added as a note instead.
    #[must_use]
    pub fn diagnostic(&self, entry: &ReportEntry) -> Diagnostic<usize> {
        let mut diagnostic = Diagnostic::error().with_message(&entry.message);
        if let Some(code) = &entry.code {
            diagnostic = diagnostic.with_code(code);
        }

        let mut labels = Vec::new();
        let primary = entry.span.and_then(|span| self.label(span));
        if let Some((file, range)) = primary.clone() {
            labels.push(
                Label::primary(file, range).with_message(format!("{} occurs here", entry.reason)),
            );
        }
        if let Some((file, range)) = entry.loan_span.and_then(|span| self.label(span)) {
            let message = match &entry.loan {
                Some(loan) => format!("borrow {loan} created here"),
                None => "borrow created here".to_string(),
            };
            labels.push(Label::secondary(file, range).with_message(message));
        }
        diagnostic = diagnostic.with_labels(labels);

        let mut notes = Vec::new();
        if let (None, Some(location)) = (&primary, &entry.location) {
            notes.push(format!("at {location}"));
        }
        if let Some(help) = &entry.help {
            notes.push(format!("help: {help}"));
        }
        diagnostic.with_notes(notes)
    }

    /// Renders every entry of `report` against the registered sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a span lies outside its file.
    pub fn render(&self, report: &Report) -> DriverResult<String> {
        let config = term::Config::default();
        let mut buffer = Vec::new();
        for entry in &report.diagnostics {
            let diagnostic = self.diagnostic(entry);
            #[allow(deprecated)]
            term::emit(&mut buffer, &config, &self.files, &diagnostic)?;
        }
        Ok(String::from_utf8(buffer)?)
    }
}
