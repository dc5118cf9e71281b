//! Text normalization applied before embedding.

/// Canonicalize whitespace and stray punctuation left by PDF extraction.
///
/// Collapses whitespace runs to one space, removes `". ,"`, folds `".."` and
/// `". ."` into `"."`, and trims. Rewrites repeat until nothing changes, so
/// the result is a fixed point: `normalize(&normalize(s)) == normalize(s)`.
///
/// # Example
/// ```
/// use nucrag_retrieval::normalize::normalize;
///
/// assert_eq!(normalize("  Reactor   trip..\n signal "), "Reactor trip. signal");
/// ```
pub fn normalize(text: &str) -> String {
    let mut current = collapse_whitespace(text);

    loop {
        let next = collapse_whitespace(
            &current
                .replace(". ,", "")
                .replace("..", ".")
                .replace(". .", "."),
        );
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Collapse every whitespace run (newlines included) to a single space and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
