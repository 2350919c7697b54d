//! Comment and quotation scanning over raw SQL text
//!
//! Both functions work on byte offsets. Quotes are ASCII so every returned
//! index is a char boundary.

use crate::error::{Error, Result};

/// Whether the quote at `idx` is preceded by an odd number of backslashes
fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    bytes[..idx].iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 1
}

/// Find matched `"…"` and `'…'` pairs.
///
/// Returns the offsets of the opening and closing quotes as two parallel
/// vectors. A quote preceded by an odd number of backslashes does not
/// delimit. An opening quote without a closing one is an error.
pub fn find_matched_quotes(sql: &str) -> Result<(Vec<usize>, Vec<usize>)> {
    let bytes = sql.as_bytes();
    let mut lefts = Vec::new();
    let mut rights = Vec::new();

    let mut offset = 0;
    while let Some(rel) = sql[offset..].find(|c: char| c == '"' || c == '\'') {
        let left = offset + rel;
        let target = bytes[left];
        let mut cursor = left + 1;
        loop {
            let Some(rel) = bytes[cursor..].iter().position(|&b| b == target) else {
                return Err(Error::UnmatchedQuote { offset: left });
            };
            let right = cursor + rel;
            cursor = right + 1;
            if !is_escaped(bytes, right) {
                lefts.push(left);
                rights.push(right);
                break;
            }
        }
        offset = cursor;
    }

    Ok((lefts, rights))
}

/// Closing quote of the quoted region containing `idx`, if any
fn enclosing_quote_end(lefts: &[usize], rights: &[usize], idx: usize) -> Option<usize> {
    lefts
        .iter()
        .zip(rights)
        .find(|(l, r)| idx >= **l && idx <= **r)
        .map(|(_, r)| *r)
}

fn remove_block_comments(sql: &str) -> Result<String> {
    let (lefts, rights) = find_matched_quotes(sql)?;
    let mut out = String::with_capacity(sql.len());
    let mut offset = 0;

    while let Some(rel) = sql[offset..].find("/*") {
        let start = offset + rel;
        if let Some(quote_end) = enclosing_quote_end(&lefts, &rights, start) {
            out.push_str(&sql[offset..=quote_end]);
            offset = quote_end + 1;
            continue;
        }

        out.push_str(&sql[offset..start]);
        let body = start + 2;
        let Some(rel) = sql[body..].find("*/") else {
            return Err(Error::UnmatchedBlockComment { offset: start });
        };
        out.push(' ');
        offset = body + rel + 2;
    }
    out.push_str(&sql[offset..]);

    Ok(out)
}

fn remove_line_comments(sql: &str) -> Result<String> {
    let (lefts, rights) = find_matched_quotes(sql)?;
    let mut out = String::with_capacity(sql.len());
    let mut offset = 0;

    while let Some(rel) = sql[offset..].find("--") {
        let start = offset + rel;
        if let Some(quote_end) = enclosing_quote_end(&lefts, &rights, start) {
            out.push_str(&sql[offset..=quote_end]);
            offset = quote_end + 1;
            continue;
        }

        out.push_str(&sql[offset..start]);
        match sql[start + 2..].find('\n') {
            // the newline itself is kept
            Some(rel) => offset = start + 2 + rel,
            None => return Ok(out),
        }
    }
    out.push_str(&sql[offset..]);

    Ok(out)
}

/// Remove `/*…*/` comments, then `--` comments, outside quoted strings.
///
/// Each block comment becomes a single space so that the tokens around it
/// stay separated. A line comment is removed up to, not including, its
/// newline.
pub fn strip_comments(sql: &str) -> Result<String> {
    let sql = remove_block_comments(sql)?;
    remove_line_comments(&sql)
}
