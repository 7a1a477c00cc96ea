//! Shared utility functions
//!
//! Name matching helpers used by configuration parsing and scope checks.

// ============================================================================
// Typo suggestions for tag names
// ============================================================================

/// Levenshtein edit distance, compared case-insensitively.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest candidate within `threshold` edits, if any.
pub fn find_similar_name<'a>(name: &str, candidates: &[&'a str], threshold: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (edit_distance(name, c), c))
        .filter(|(d, _)| *d <= threshold)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c)
}

/// Format a "did you mean" suggestion hint for an unknown name.
pub fn format_suggestion_hint(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean `{name}`?)"),
        None => String::new(),
    }
}

// ============================================================================
// Qualified names
// ============================================================================

/// Whether the dotted name `qualified` lies under the package prefix `prefix`.
///
/// Matching respects segment boundaries: `a.b` covers `a.b` and `a.b.C`
/// but not `a.bc`. A prefix written with a trailing dot (`a.b.`) only
/// covers names strictly below it.
pub fn is_under_prefix(prefix: &str, qualified: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    if let Some(stem) = prefix.strip_suffix('.') {
        return qualified.len() > prefix.len() && qualified.starts_with(stem) && qualified[stem.len()..].starts_with('.');
    }
    match qualified.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('$'),
        None => false,
    }
}
