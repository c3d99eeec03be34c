//! Case conversion for token names.
//!
//! Dotted token names (`color.brand.primary`) are split on separators and
//! camelCase boundaries, then rejoined in the target convention.

/// Split a name into lowercase words.
///
/// Separators are `.`, `-`, `_`, `/`, and whitespace. A lower-to-upper
/// boundary inside a segment also starts a new word, so `brandPrimary`
/// splits the same way as `brand-primary`.
fn words(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower_or_digit = false;

    for c in input.chars() {
        if matches!(c, '.' | '-' | '_' | '/') || c.is_whitespace() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower_or_digit = false;
        } else {
            if c.is_uppercase() && prev_lower_or_digit && !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
            prev_lower_or_digit = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Capitalize the first character of a word.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn to_kebab_case(input: &str) -> String {
    words(input).join("-")
}

pub fn to_snake_case(input: &str) -> String {
    words(input).join("_")
}

pub fn to_screaming_snake_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn to_camel_case(input: &str) -> String {
    let words = words(input);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

pub fn to_pascal_case(input: &str) -> String {
    words(input).iter().map(|w| capitalize(w)).collect()
}
