//! Start/complete logging around multi-step operations
//!
//! - `{name}_BEGIN` on creation
//! - `{name}_COMPLETE` on `complete()`
//! - `{name}_FAILED` on `fail()`
//! - `{name}_INCOMPLETE` if dropped without either (e.g. early `?` return)

use std::time::Instant;

use super::logger::{Logger, Severity};

/// Scope that logs the lifecycle of one operation
pub struct ObservationScope<'a> {
    name: &'a str,
    finished: bool,
    fields: Vec<(&'a str, String)>,
    started: Instant,
}

impl<'a> ObservationScope<'a> {
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Scope whose fields are repeated on every event it logs
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);
        Self {
            name,
            finished: false,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started: Instant::now(),
        }
    }

    fn base_fields(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    /// Logs `{name}_COMPLETE` with elapsed time and extra fields
    pub fn complete_with_fields(mut self, extra_fields: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.started.elapsed().as_micros().to_string();
        let mut all = self.base_fields();
        all.push(("elapsed_us", elapsed.as_str()));
        all.extend(extra_fields.iter().copied());
        Logger::info(&format!("{}_COMPLETE", self.name), &all);
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Logs `{name}_FAILED` at the given severity
    pub fn fail(mut self, severity: Severity, reason: &str) {
        self.finished = true;
        let mut all = self.base_fields();
        all.push(("reason", reason));
        Logger::log(severity, &format!("{}_FAILED", self.name), &all);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::with_fields("TEST", &[("entity", "E")]);
        assert!(!scope.is_finished());
        scope.complete_with_fields(&[("removed", "3")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::new("TEST");
        scope.fail(Severity::Error, "commit failed");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }
}
