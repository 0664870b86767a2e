//! Version ordering
//!
//! Semver when both sides parse, otherwise component by component with
//! numeric runs compared as numbers (`1.9.0` < `1.10.0`, `3.0.0a9` < `3.0.0a10`).

use std::cmp::Ordering;

/// Compare two version strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    if let (Ok(va), Ok(vb)) = (
        semver::Version::parse(a.trim_start_matches('v')),
        semver::Version::parse(b.trim_start_matches('v')),
    ) {
        return va.cmp(&vb).then_with(|| a.cmp(b));
    }

    let (ca, cb) = (components(a), components(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Part::Num(x), Part::Num(y)) => x.cmp(y),
            (Part::Num(_), Part::Text(_)) => Ordering::Greater,
            (Part::Text(_), Part::Num(_)) => Ordering::Less,
            (Part::Text(x), Part::Text(y)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

#[derive(Debug, PartialEq, Eq)]
enum Part<'a> {
    Num(u64),
    Text(&'a str),
}

/// Split into alternating digit and letter runs, dropping separators
fn components(version: &str) -> Vec<Part<'_>> {
    let version = version.trim_start_matches('v');
    let mut parts = Vec::new();
    let mut start = None;
    let mut digits = false;

    for (i, c) in version.char_indices() {
        let is_digit = c.is_ascii_digit();
        let is_alpha = c.is_ascii_alphabetic();
        if let Some(s) = start
            && (!(is_digit || is_alpha) || is_digit != digits)
        {
            parts.push(part(&version[s..i], digits));
            start = None;
        }
        if start.is_none() && (is_digit || is_alpha) {
            start = Some(i);
            digits = is_digit;
        }
    }
    if let Some(s) = start {
        parts.push(part(&version[s..], digits));
    }
    parts
}

fn part(run: &str, digits: bool) -> Part<'_> {
    match run.parse() {
        Ok(n) if digits => Part::Num(n),
        _ => Part::Text(run),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semver_ordering() {
        assert_eq!(compare("1.9.0", "1.10.0"), Ordering::Less);
        assert_eq!(compare("1.11.0", "1.11.0"), Ordering::Equal);
        assert_eq!(compare("v2.0.0", "1.99.99"), Ordering::Greater);
    }

    #[test]
    fn test_non_semver_ordering() {
        assert_eq!(compare("1.9", "1.10"), Ordering::Less);
        assert_eq!(compare("3.0.0a9", "3.0.0a10"), Ordering::Less);
        assert_eq!(compare("2024.2.2", "2024.10.1"), Ordering::Less);
        assert_eq!(compare("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare("1.10.0_1", "1.9.0_2"), Ordering::Greater);
    }

    #[test]
    fn test_components() {
        assert_eq!(
            components("3.0.0a9"),
            vec![Part::Num(3), Part::Num(0), Part::Num(0), Part::Text("a"), Part::Num(9)]
        );
    }
}
