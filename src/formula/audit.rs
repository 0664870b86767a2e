//! Static formula checks
//!
//! Nothing here touches the network; problems are collected, not fatal.

use super::Formula;
use std::collections::HashSet;
use std::fmt;

/// Longest description accepted by the audit
pub const MAX_DESC_LEN: usize = 80;

/// One finding from [`audit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// What the problem is attached to (`desc`, `url`, a resource name, ...)
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

fn problem(subject: &str, message: impl Into<String>) -> Problem {
    Problem {
        subject: subject.to_string(),
        message: message.into(),
    }
}

/// Audit a formula and return every problem found.
pub fn audit(formula: &Formula) -> Vec<Problem> {
    let mut problems = Vec::new();

    audit_desc(&formula.desc, &mut problems);

    if formula.homepage.is_empty() {
        problems.push(problem("homepage", "missing homepage"));
    } else if !formula.homepage.starts_with("https://") {
        problems.push(problem("homepage", "homepage should use https"));
    }
    if formula.license.is_empty() {
        problems.push(problem("license", "missing license"));
    }

    if !formula.url.starts_with("https://") {
        problems.push(problem("url", "source url should use https"));
    }

    let mut seen = HashSet::new();
    for resource in &formula.resources {
        if !resource.url.starts_with("https://") {
            problems.push(problem(&resource.name, "resource url should use https"));
        }
        if !seen.insert(resource.name.to_ascii_lowercase()) {
            problems.push(problem(&resource.name, "resource declared more than once"));
        }
        if resource.name.eq_ignore_ascii_case(&formula.name) {
            problems.push(problem(&resource.name, "resource shadows the formula itself"));
        }
    }

    problems
}

fn audit_desc(desc: &str, problems: &mut Vec<Problem>) {
    if desc.is_empty() {
        problems.push(problem("desc", "missing description"));
        return;
    }
    let first_word = desc.split_whitespace().next().unwrap_or("");
    if ["a", "an", "the"]
        .iter()
        .any(|article| first_word.eq_ignore_ascii_case(article))
    {
        problems.push(problem("desc", "description should not start with an article"));
    }
    if desc.ends_with('.') {
        problems.push(problem("desc", "description should not end with a period"));
    }
    if desc.chars().count() > MAX_DESC_LEN {
        problems.push(problem(
            "desc",
            format!("description is longer than {} characters", MAX_DESC_LEN),
        ));
    }
}
