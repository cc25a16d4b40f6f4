//! Structured, per-call diagnostics.
//!
//! Render calls receive a `&mut Diagnostics` and record every degraded
//! component here. Each entry is also forwarded to the `log` facade at `warn`
//! level so that a binary with a logger installed sees them as they happen.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A bound field was absent; a default was substituted.
    DataResolution,
    /// A calculated expression was rejected or non-finite; `"0"` was rendered.
    Expression,
    /// An image could not be loaded; a placeholder box was rendered.
    Asset,
    /// A component could not be rendered and was skipped.
    Render,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::DataResolution => "data-resolution",
            DiagnosticKind::Expression => "expression",
            DiagnosticKind::Asset => "asset",
            DiagnosticKind::Render => "render",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub page: usize,
    pub component_id: Option<String>,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    page: usize,
    component: Option<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page index attached to subsequent entries.
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Component id attached to subsequent entries until cleared.
    pub fn enter_component(&mut self, id: &str) {
        self.component = Some(id.to_string());
    }

    pub fn leave_component(&mut self) {
        self.component = None;
    }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        match &self.component {
            Some(id) => log::warn!("page {} component '{}': [{}] {}", self.page, id, kind, message),
            None => log::warn!("page {}: [{}] {}", self.page, kind, message),
        }
        self.entries.push(Diagnostic {
            page: self.page,
            component_id: self.component.clone(),
            kind,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Moves another sink's entries into this one, keeping their page tags.
    pub fn absorb(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_carry_page_and_component() {
        let mut diag = Diagnostics::new();
        diag.set_page(2);
        diag.enter_component("price");
        diag.warn(DiagnosticKind::Expression, "rejected");
        diag.leave_component();
        diag.warn(DiagnosticKind::Render, "skipped");

        let entries = diag.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].page, 2);
        assert_eq!(entries[0].component_id.as_deref(), Some("price"));
        assert_eq!(entries[1].component_id, None);
        assert_eq!(diag.count(DiagnosticKind::Render), 1);
    }

    #[test]
    fn test_absorb_keeps_order() {
        let mut first = Diagnostics::new();
        first.warn(DiagnosticKind::Asset, "a");
        let mut second = Diagnostics::new();
        second.set_page(1);
        second.warn(DiagnosticKind::Asset, "b");

        first.absorb(second);
        let pages: Vec<usize> = first.entries().iter().map(|d| d.page).collect();
        assert_eq!(pages, vec![0, 1]);
    }
}
