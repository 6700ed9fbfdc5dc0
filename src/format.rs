//! Human-oriented renderings of a [`ValidationError`]

use crate::error::ValidationError;
use crate::issues::PathSegment;
use indexmap::IndexMap;
use serde::Serialize;

/// Render a path as `user.items[0].name`
pub fn format_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push_str(&format!("[{}]", index));
            }
        }
    }
    out
}

/// Multi-line, human-readable report grouped by path
pub fn prettify(error: &ValidationError) -> String {
    let mut groups: IndexMap<String, Vec<&str>> = IndexMap::new();
    for issue in &error.issues {
        groups
            .entry(format_path(&issue.path))
            .or_default()
            .push(&issue.message);
    }

    let mut lines = Vec::new();
    for (path, messages) in groups {
        for message in messages {
            lines.push(format!("✖ {}", message));
            if !path.is_empty() {
                lines.push(format!("  → at {}", path));
            }
        }
    }
    lines.join("\n")
}

/// Form-oriented view of an error
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedError {
    /// Messages of issues at the root
    pub form_errors: Vec<String>,
    /// Messages keyed by rendered path
    pub field_errors: IndexMap<String, Vec<String>>,
}

/// Split issues into root-level and per-field messages
pub fn flatten(error: &ValidationError) -> FlattenedError {
    let mut flat = FlattenedError::default();
    for issue in &error.issues {
        if issue.path.is_empty() {
            flat.form_errors.push(issue.message.clone());
        } else {
            flat.field_errors
                .entry(format_path(&issue.path))
                .or_default()
                .push(issue.message.clone());
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::{finalize, IssueCode, RawIssue};
    use crate::validators::validation::ParseContext;

    fn error() -> ValidationError {
        let ctx = ParseContext::new();
        ValidationError::new(vec![
            finalize(
                RawIssue::custom("bad name").with_path(vec!["name".into()]),
                &ctx,
            ),
            finalize(RawIssue::custom("bad form"), &ctx),
            finalize(
                RawIssue::new(IssueCode::Custom)
                    .with_message("bad tag")
                    .with_path(vec!["tags".into(), 1usize.into()]),
                &ctx,
            ),
            finalize(
                RawIssue::custom("still bad name").with_path(vec!["name".into()]),
                &ctx,
            ),
        ])
    }

    #[test]
    fn test_format_path() {
        let path = vec![
            PathSegment::from("user"),
            PathSegment::from(0usize),
            PathSegment::from("name"),
        ];
        assert_eq!(format_path(&path), "user[0].name");
        assert_eq!(format_path(&[]), "");
    }

    #[test]
    fn test_prettify_groups_by_path() {
        let text = prettify(&error());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "✖ bad name");
        assert_eq!(lines[1], "  → at name");
        assert_eq!(lines[2], "✖ still bad name");
        assert_eq!(lines[4], "✖ bad form");
        assert!(text.contains("  → at tags[1]"));
    }

    #[test]
    fn test_flatten() {
        let flat = flatten(&error());
        assert_eq!(flat.form_errors, vec!["bad form".to_string()]);
        assert_eq!(flat.field_errors["name"].len(), 2);
        assert_eq!(flat.field_errors["tags[1]"], vec!["bad tag".to_string()]);
    }
}
