//! Candidate title extraction from OCR text.

/// Split recognized text into candidate book titles.
///
/// Each line is trimmed; lines whose trimmed length is not strictly greater
/// than `min_chars` characters are dropped (spine fragments, page numbers,
/// publisher marks). Order is preserved and duplicates are kept.
pub fn extract_titles(text: &str, min_chars: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > min_chars)
        .map(str::to_string)
        .collect()
}
