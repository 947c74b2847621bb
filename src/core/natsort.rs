//! Natural filename ordering
//!
//! Orders strings the way a human expects: embedded digit runs compare by
//! numeric value instead of character code, and text runs compare
//! case-insensitively. This ordering decides the reading sequence of comic
//! pages, where `page10` must follow `page2`.
//!
//! Digit runs are compared without parsing them into integers, so
//! arbitrarily long numbers cannot overflow: leading zeros are stripped,
//! then lengths are compared, then the digits lexicographically.

use std::cmp::Ordering;

/// A maximal run of digits or non-digits within a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// Split a string into maximal digit / non-digit runs
fn runs(s: &str) -> impl Iterator<Item = Run<'_>> {
    let bytes = s.as_bytes();
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= bytes.len() {
            return None;
        }
        let is_digit = bytes[start].is_ascii_digit();
        let mut end = start + 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() == is_digit {
            end += 1;
        }
        // Runs split on ASCII digit boundaries, so slicing stays on char
        // boundaries for multi-byte text as well.
        let run = &s[start..end];
        start = end;
        Some(if is_digit { Run::Digits(run) } else { Run::Text(run) })
    })
}

/// Compare two digit runs by numeric value without integer parsing
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    match a.len().cmp(&b.len()) {
        Ordering::Equal => a.cmp(b),
        other => other,
    }
}

/// Compare two text runs case-insensitively
fn compare_text_runs(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    if folded != Ordering::Equal {
        return folded;
    }
    // Tie-break equal-under-fold runs by raw bytes so the order stays total
    // and antisymmetric ("A" vs "a" must not compare equal both ways).
    a.cmp(b)
}

/// Compare two strings in natural order
///
/// The order is total: runs are compared pairwise, a digit run sorts before
/// a text run, and when one run list is a strict prefix of the other the
/// shorter string sorts first.
pub fn natural_compare(a: &str, b: &str) -> Ordering {
    let mut left = runs(a);
    let mut right = runs(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l, r) {
                    (Run::Digits(x), Run::Digits(y)) => compare_digit_runs(x, y),
                    (Run::Text(x), Run::Text(y)) => compare_text_runs(x, y),
                    (Run::Digits(_), Run::Text(_)) => Ordering::Less,
                    (Run::Text(_), Run::Digits(_)) => Ordering::Greater,
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Sort a slice of strings in natural order
pub fn natural_sort<S: AsRef<str>>(items: &mut [S]) {
    items.sort_by(|a, b| natural_compare(a.as_ref(), b.as_ref()));
}
