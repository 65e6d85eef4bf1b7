//! Display helpers and input masks.
//!
//! The masks turn whatever digits a visitor typed into the shape the form
//! schemas expect (`11987654321` becomes `(11) 98765-4321`). Non-digit
//! characters are dropped and over-long input is cut.

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Split at a char index, clamped to the string length.
fn split_chars(s: &str, at: usize) -> (&str, &str) {
    let byte = s.char_indices().nth(at).map_or(s.len(), |(i, _)| i);
    s.split_at(byte)
}

/// Mask a phone number as `(DD) DDDD-DDDD` or `(DD) DDDDD-DDDD`.
///
/// ```
/// use scoder_core::format::mask_phone;
///
/// assert_eq!(mask_phone("11987654321"), "(11) 98765-4321");
/// assert_eq!(mask_phone("1187654321"), "(11) 8765-4321");
/// ```
#[must_use]
pub fn mask_phone(value: &str) -> String {
    let d = digits(value);
    let (area, rest) = split_chars(&d, 2);
    match d.len() {
        0..=2 => d.clone(),
        3..=6 => format!("({area}) {rest}"),
        7..=10 => {
            let (head, tail) = split_chars(rest, 4);
            format!("({area}) {head}-{tail}")
        }
        _ => {
            let (head, tail) = split_chars(rest, 5);
            let (tail, _) = split_chars(tail, 4);
            format!("({area}) {head}-{tail}")
        }
    }
}

/// Mask a card number as up to four space-separated groups of four digits.
#[must_use]
pub fn mask_card_number(value: &str) -> String {
    let d = digits(value);
    let (d, _) = split_chars(&d, 16);
    d.as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Mask an expiry date as `MM/YY` once a third digit is typed.
#[must_use]
pub fn mask_expiry(value: &str) -> String {
    let d = digits(value);
    if d.len() < 3 {
        return d;
    }
    let (month, rest) = split_chars(&d, 2);
    let (year, _) = split_chars(rest, 2);
    format!("{month}/{year}")
}

/// Keep at most four digits.
#[must_use]
pub fn mask_cvv(value: &str) -> String {
    let d = digits(value);
    split_chars(&d, 4).0.to_string()
}

/// Normalize a ZIP code to `DDDDD-DDD`.
///
/// ```
/// use scoder_core::format::normalize_zip;
///
/// assert_eq!(normalize_zip("01234567"), "01234-567");
/// assert_eq!(normalize_zip("01234-567"), "01234-567");
/// ```
#[must_use]
pub fn normalize_zip(value: &str) -> String {
    let d = digits(value);
    let (d, _) = split_chars(&d, 8);
    if d.len() > 5 {
        let (head, tail) = split_chars(d, 5);
        format!("{head}-{tail}")
    } else {
        d.to_string()
    }
}

/// Cut text to `max_len` characters, appending `...` when cut.
#[must_use]
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let (head, _) = split_chars(text, max_len);
    format!("{}...", head.trim())
}

/// Uppercase the first letter of every whitespace-separated word.
#[must_use]
pub fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}
