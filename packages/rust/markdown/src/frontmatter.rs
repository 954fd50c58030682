//! Leading `---` metadata block removal.

/// Delimiter line that opens and closes a frontmatter block.
pub const DELIMITER: &str = "---";

/// Remove a leading frontmatter block.
///
/// The block must start on the very first line with a line that is exactly
/// `---` (trailing whitespace and `\r` tolerated) and end at the next such
/// line. Both delimiters, everything between them and any blank lines that
/// follow are removed. Text without an opening delimiter, or with a block
/// that is never closed, is returned unchanged.
///
/// Stacked leading blocks are all removed, which makes the transform
/// idempotent.
pub fn strip_frontmatter(text: &str) -> String {
    let mut rest = text;
    let mut stripped = false;
    while let Some(after) = strip_block(rest) {
        rest = after.trim_start_matches(['\r', '\n']);
        stripped = true;
    }
    if stripped {
        rest.to_string()
    } else {
        text.to_string()
    }
}

/// Whether `text` opens with a closed frontmatter block.
pub fn has_frontmatter(text: &str) -> bool {
    strip_block(text).is_some()
}

fn strip_block(text: &str) -> Option<&str> {
    let (first, mut remainder) = split_line(text);
    if !is_delimiter(first) || remainder.is_empty() {
        return None;
    }

    while !remainder.is_empty() {
        let (line, next) = split_line(remainder);
        if is_delimiter(line) {
            return Some(next);
        }
        remainder = next;
    }
    None
}

fn split_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => (text, ""),
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}
