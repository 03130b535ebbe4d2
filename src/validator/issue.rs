use serde::Serialize;
use std::fmt;

/// A single diagnostic produced while checking a value or a document.
///
/// `location` is a JSON-path-like pointer (`$.address.zip`, `$[2]`) for value
/// checks, or a document location (`/messages -> get`) for load-time checks.
/// `kind` names the violated facet (`type`, `required`, `pattern`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Write a block of issues to stderr, one per line.
pub fn print_issues(issues: &[ValidationIssue]) {
    eprintln!("\n{} issue(s) found:\n", issues.len());
    for issue in issues {
        eprintln!("{issue}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_location_and_message() {
        let issue = ValidationIssue::new("$.id", "type", "expected integer, got string");
        assert_eq!(issue.to_string(), "[type] $.id: expected integer, got string");
    }
}
