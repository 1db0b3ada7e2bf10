/// Default number of lines in a snippet when no match is found.
pub const DEFAULT_SNIPPET_LINES: usize = 6;

/// Maximum number of characters in a snippet before truncation.
pub const DEFAULT_SNIPPET_MAX_CHARS: usize = 400;

/// Extract a snippet around the first occurrence of `query` in `text`.
///
/// Returns `(snippet_text, start_line_number)` where start_line_number is
/// 1-indexed. If `query` is not found, returns the first few lines.
/// Returns `None` if the text is empty.
pub fn extract_snippet(text: &str, query: &str) -> Option<(String, usize)> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return None;
    }

    let query_lower = query.to_lowercase();
    let match_idx = (!query_lower.is_empty())
        .then(|| {
            lines
                .iter()
                .position(|line| line.to_lowercase().contains(&query_lower))
        })
        .flatten();

    let (start, end) = if let Some(idx) = match_idx {
        (idx.saturating_sub(2), (idx + 3).min(lines.len()))
    } else {
        (0, DEFAULT_SNIPPET_LINES.min(lines.len()))
    };

    let mut snippet = lines[start..end].join("\n");
    if snippet.chars().count() > DEFAULT_SNIPPET_MAX_CHARS {
        snippet = snippet.chars().take(DEFAULT_SNIPPET_MAX_CHARS).collect();
        snippet.push_str("...");
    }

    Some((snippet, start + 1))
}

/// Wrap every case-insensitive occurrence of `terms` in `text` with
/// `open`/`close` markers.
///
/// Longer terms win where matches overlap, so a highlighted phrase is not
/// split by one of its own words.
pub fn mark_terms(
    text: &str,
    terms: &[String],
    open: &str,
    close: &str,
) -> String {
    let (lower, offsets) = lowercase_with_offsets(text);

    let mut sorted: Vec<&str> = terms
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();
    sorted.sort_by_key(|t| std::cmp::Reverse(t.len()));

    let mut covered = vec![false; text.len()];
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for term in sorted {
        for (lower_start, _) in lower.match_indices(term) {
            let start = offsets[lower_start];
            let end = offsets[lower_start + term.len()];
            if start >= end || covered[start..end].iter().any(|c| *c) {
                continue;
            }
            covered[start..end].iter_mut().for_each(|c| *c = true);
            spans.push((start, end));
        }
    }
    spans.sort_unstable();

    let mut out = String::with_capacity(text.len() + spans.len() * 4);
    let mut cursor = 0;
    for (start, end) in spans {
        out.push_str(&text[cursor..start]);
        out.push_str(open);
        out.push_str(&text[start..end]);
        out.push_str(close);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Lowercase `text`, keeping for every byte of the result the offset of
/// the original char it came from. The table has one extra entry for the
/// end of the string.
///
/// Lowercasing can change a char's encoded width (`ẞ` is 3 bytes, `ß` is
/// 2), so offsets into the lowered string are not offsets into `text`.
fn lowercase_with_offsets(text: &str) -> (String, Vec<usize>) {
    let mut lower = String::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for (offset, c) in text.char_indices() {
        let before = lower.len();
        lower.extend(c.to_lowercase());
        offsets.extend(std::iter::repeat_n(offset, lower.len() - before));
    }
    offsets.push(text.len());
    (lower, offsets)
}
