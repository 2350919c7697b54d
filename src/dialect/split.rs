//! Statement splitting and extension detection over raw SQL text
//!
//! These scanners understand just enough SQL lexing to avoid looking inside
//! quoted strings, quoted identifiers and comments.

/// Skip a quoted region starting at `start` (the opening quote).
/// Returns the offset just past the closing quote, or the input length.
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote != b'`' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// If a comment starts at `i`, return the offset just past it
fn skip_comment(bytes: &[u8], i: usize) -> Option<usize> {
    match (bytes.get(i), bytes.get(i + 1)) {
        (Some(b'-'), Some(b'-')) => {
            let end = bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| i + p);
            Some(end)
        }
        (Some(b'/'), Some(b'*')) => {
            let end = bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |p| i + 2 + p + 2);
            Some(end)
        }
        _ => None,
    }
}

/// Split a program into pieces, each ending with a top-level `;`.
///
/// The pieces joined back together equal `program`. The last piece holds
/// whatever follows the final `;` and is omitted when that is empty.
pub fn split_statements(program: &str) -> Vec<&str> {
    let bytes = program.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = skip_comment(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'\'' | b'"' | b'`' => i = skip_quoted(bytes, i),
            b';' => {
                pieces.push(&program[start..=i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < program.len() {
        pieces.push(&program[start..]);
    }
    pieces
}

/// Length of the whitespace and comments at the start of `sql`
pub fn leading_trivia_len(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut i = 0;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match skip_comment(bytes, i) {
            Some(end) => i = end,
            None => return i,
        }
    }
}

/// Word characters of unquoted SQL. Non-ASCII letters count, non-ASCII
/// spaces such as U+3000 separate words.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || (!c.is_ascii() && !c.is_whitespace())
}

/// Byte length of the word at the start of `s`
fn word_len(s: &str) -> usize {
    s.char_indices()
        .find(|&(_, c)| !is_word_char(c))
        .map_or(s.len(), |(i, _)| i)
}

/// Find where the extended part of a statement begins.
///
/// That is the first `TO` word, or `SHOW TRAIN` word pair, outside
/// parentheses, quotes and comments. A word glued to a preceding `.` is a
/// qualified name part and never matches.
pub fn find_extension_start(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = skip_comment(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'\'' | b'"' | b'`' => i = skip_quoted(bytes, i),
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            _ => {
                let Some(c) = sql[i..].chars().next() else {
                    break;
                };
                if !is_word_char(c) {
                    i += c.len_utf8();
                    continue;
                }

                let start = i;
                i += word_len(&sql[start..]);
                let glued = start > 0 && bytes[start - 1] == b'.';
                if depth > 0 || glued {
                    continue;
                }

                let word = &sql[start..i];
                if word.eq_ignore_ascii_case("TO") {
                    return Some(start);
                }
                if word.eq_ignore_ascii_case("SHOW") && next_word(sql, i).eq_ignore_ascii_case("TRAIN") {
                    return Some(start);
                }
            }
        }
    }
    None
}

/// The word following offset `from`, skipping whitespace and comments
fn next_word(sql: &str, from: usize) -> &str {
    let start = from + leading_trivia_len(&sql[from..]);
    &sql[start..start + word_len(&sql[start..])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_semicolons_do_not_split() {
        let program = r#"SELECT ';' FROM t; SELECT "a;b";"#;
        assert_eq!(
            split_statements(program),
            vec![r#"SELECT ';' FROM t;"#, r#" SELECT "a;b";"#]
        );
    }

    #[test]
    fn commented_semicolons_do_not_split() {
        let program = "SELECT 1 -- a;b\n; /* ; */ SELECT 2";
        let pieces = split_statements(program);
        assert_eq!(pieces, vec!["SELECT 1 -- a;b\n;", " /* ; */ SELECT 2"]);
        assert_eq!(pieces.concat(), program);
    }

    #[test]
    fn leading_trivia() {
        assert_eq!(leading_trivia_len("  -- c\n /* d */ SELECT"), 16);
        assert_eq!(leading_trivia_len("SELECT"), 0);
    }

    #[test]
    fn extension_start_ignores_nested_and_qualified_words() {
        assert_eq!(find_extension_start("SELECT (SELECT 1 to) FROM t.to"), None);
        assert_eq!(find_extension_start("SELECT 'to' FROM t TO TRAIN"), Some(19));
        assert_eq!(find_extension_start("select 1; SHOW  TRAIN m"), Some(10));
        assert_eq!(find_extension_start("SHOW TABLES"), None);
    }

    #[test]
    fn extension_start_after_unicode_space() {
        assert_eq!(find_extension_start("SELECT * FROM t\u{3000}TO TRAIN m"), Some(18));
        assert_eq!(find_extension_start("SELECT * FROM tö TO TRAIN m"), Some(18));
        assert_eq!(find_extension_start("SELECT * FROM téTO"), None);
    }
}
