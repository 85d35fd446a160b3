use std::sync::LazyLock;

use regex::Regex;

/// One `target.field :: expression` assignment, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Destination column: the trailing segment of the left-hand identifier.
    pub field: String,
    /// The right-hand side, trimmed but otherwise exactly as written.
    pub expression: String,
}

// (?s) because an expression may span lines
static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(\w+(?:\.\w+)*)\s*::\s*(.+)$").expect("assignment pattern compiles")
});

/// Splits [source] into statements, silently dropping whitespace-only
/// fragments and skipping (with a warning) fragments that do not have the
/// `identifier :: expression` shape. One bad line never blocks the batch.
///
/// Statements are separated by `;` only. Some legacy inputs also accepted a
/// top-level comma, but a comma cannot be told apart from an argument
/// separator once calls nest, so that variant is not supported.
pub fn split_statements(source: &str) -> Vec<Statement> {
    source
        .split(';')
        .map(unwrap_quotes)
        .filter(|fragment| !fragment.is_empty())
        .filter_map(|fragment| match ASSIGNMENT.captures(fragment) {
            Some(caps) => {
                let target = &caps[1];
                let field = target.rsplit('.').next().unwrap_or(target);
                Some(Statement {
                    field: field.to_string(),
                    expression: caps[2].trim().to_string(),
                })
            }
            None => {
                log::warn!("skipping malformed statement: {fragment}");
                None
            }
        })
        .collect()
}

/// Some sources quote whole statements; unwrap one pair of double quotes
/// when the fragment both starts and ends with one. Fragments that merely
/// end with a quoted literal are left alone.
fn unwrap_quotes(fragment: &str) -> &str {
    let trimmed = fragment.trim();
    match trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
    {
        Some(inner) => inner.trim(),
        None => trimmed,
    }
}
