use std::cmp::Ordering;

use super::error::StorageError;

/// Maximum length of an object key.
const MAX_KEY_LEN: usize = 512;

/// Normalize a user-supplied name into a safe key segment.
///
/// 1. Every run of whitespace becomes a single `_`.
/// 2. Diacritics are transliterated, case-insensitively, to a lowercase
///    ASCII letter:
///
///    | input                   | output |
///    |-------------------------|--------|
///    | å ä à á â ã             | `a`    |
///    | ö ø ò ó ô õ             | `o`    |
///    | é è ê ë                 | `e`    |
///    | ü ù ú û                 | `u`    |
///    | í ì î ï                 | `i`    |
///    | ç                       | `c`    |
///    | ñ                       | `n`    |
///
/// 3. Everything outside `[A-Za-z0-9_.-]` is dropped.
///
/// Plain ASCII letters keep their case.
pub fn sanitize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;

    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        let c = transliterate(c).unwrap_or(c);
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            out.push(c);
        }
    }

    out
}

fn transliterate(c: char) -> Option<char> {
    let mapped = match c.to_lowercase().next()? {
        'å' | 'ä' | 'à' | 'á' | 'â' | 'ã' => 'a',
        'ö' | 'ø' | 'ò' | 'ó' | 'ô' | 'õ' => 'o',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'ü' | 'ù' | 'ú' | 'û' => 'u',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ç' => 'c',
        'ñ' => 'n',
        _ => return None,
    };
    Some(mapped)
}

/// Numeric-aware string ordering: `page-2` sorts before `page-10`.
///
/// Digit runs compare by value, text runs compare case-insensitively, and a
/// digit run sorts before a text run. Full ties fall back to byte order so
/// the ordering is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_chunks = chunks(a);
    let b_chunks = chunks(b);

    for (x, y) in a_chunks.iter().zip(b_chunks.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
            (Chunk::Text(x), Chunk::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a_chunks
        .len()
        .cmp(&b_chunks.len())
        .then_with(|| a.cmp(b))
}

enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut current_is_digit: Option<bool> = None;

    for (idx, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match current_is_digit {
            Some(prev) if prev != is_digit => {
                out.push(make_chunk(&s[start..idx], prev));
                start = idx;
            }
            _ => {}
        }
        current_is_digit = Some(is_digit);
    }

    if let Some(is_digit) = current_is_digit {
        out.push(make_chunk(&s[start..], is_digit));
    }
    out
}

fn make_chunk(s: &str, is_digit: bool) -> Chunk<'_> {
    if is_digit {
        Chunk::Digits(s)
    } else {
        Chunk::Text(s)
    }
}

fn cmp_digits(x: &str, y: &str) -> Ordering {
    let x_trimmed = x.trim_start_matches('0');
    let y_trimmed = y.trim_start_matches('0');
    x_trimmed
        .len()
        .cmp(&y_trimmed.len())
        .then_with(|| x_trimmed.cmp(y_trimmed))
}

/// Validates an object key (`segment/segment/name`).
pub fn validate_object_key(key: &str) -> Result<&str, StorageError> {
    let invalid = |msg: &str| Err(StorageError::InvalidKey(format!("{msg}: {key:?}")));

    if key.is_empty() {
        return invalid("key cannot be empty");
    }

    if key.len() > MAX_KEY_LEN {
        return invalid("key exceeds maximum length of 512 characters");
    }

    if key.starts_with('/') || key.ends_with('/') {
        return invalid("key must not start or end with '/'");
    }

    for segment in key.split('/') {
        if segment.is_empty() {
            return invalid("key must not contain empty segments");
        }
        if segment == "." || segment == ".." {
            return invalid("key must not contain '.' or '..' segments");
        }
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return invalid("key contains invalid characters (allowed: a-zA-Z0-9, /, -, _, .)");
    }

    Ok(key)
}
