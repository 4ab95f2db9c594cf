//! Identifier case conversion and word-form normalization.
//!
//! Both inventories name the same things differently: a UI calls
//! `userProfile` what a server calls `user_profile`, and a URL segment
//! `users` refers to the model `User`. This module provides the conversions
//! that bring such names to one form.
//!
//! # Examples
//!
//! ```
//! use xc_ts_parser::naming::{singularize, to_pascal_case, to_snake_case};
//!
//! assert_eq!(to_snake_case("userProfile"), "user_profile");
//! assert_eq!(to_pascal_case("user-card"), "UserCard");
//! assert_eq!(singularize("categories"), "category");
//! ```

/// Irregular plural to singular forms.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("children", "child"),
    ("people", "person"),
    ("mice", "mouse"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
];

/// A recognizable identifier naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamingConvention {
    /// `user_profile`
    SnakeCase,
    /// `userProfile`
    CamelCase,
    /// `user-profile`
    KebabCase,
    /// `UserProfile`
    PascalCase,
    /// `USER_PROFILE`
    ScreamingSnakeCase,
}

impl NamingConvention {
    /// Returns the conventional lower-case label, e.g. `"snake_case"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SnakeCase => "snake_case",
            Self::CamelCase => "camelCase",
            Self::KebabCase => "kebab-case",
            Self::PascalCase => "PascalCase",
            Self::ScreamingSnakeCase => "SCREAMING_SNAKE_CASE",
        }
    }
}

/// Detects the convention an identifier follows.
///
/// Returns `None` for names that carry no signal, such as a single
/// lower-case word, which is valid in every convention.
///
/// # Examples
///
/// ```
/// use xc_ts_parser::naming::{NamingConvention, detect_convention};
///
/// assert_eq!(detect_convention("created_at"), Some(NamingConvention::SnakeCase));
/// assert_eq!(detect_convention("createdAt"), Some(NamingConvention::CamelCase));
/// assert_eq!(detect_convention("users"), None);
/// ```
#[must_use]
pub fn detect_convention(name: &str) -> Option<NamingConvention> {
    let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = name.chars().any(|c| c.is_ascii_lowercase());
    let has_underscore = name.trim_matches('_').contains('_');
    let has_hyphen = name.trim_matches('-').contains('-');

    match (has_underscore, has_hyphen) {
        (true, false) if !has_upper => Some(NamingConvention::SnakeCase),
        (true, false) if !has_lower => Some(NamingConvention::ScreamingSnakeCase),
        (false, true) if !has_upper => Some(NamingConvention::KebabCase),
        (false, false) if has_upper && has_lower => {
            if name.starts_with(|c: char| c.is_ascii_uppercase()) {
                Some(NamingConvention::PascalCase)
            } else {
                Some(NamingConvention::CamelCase)
            }
        }
        _ => None,
    }
}

/// Splits an identifier into its words.
///
/// Separators (`_`, `-`, `.`, `/`, whitespace) and case boundaries both split;
/// an acronym run stays one word (`"HTTPServer"` gives `["HTTP", "Server"]`).
#[must_use]
pub fn split_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    for part in name.split(|c: char| matches!(c, '_' | '-' | '.' | '/') || c.is_whitespace()) {
        if part.is_empty() {
            continue;
        }
        let chars: Vec<(usize, char)> = part.char_indices().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let (idx, c) = chars[i];
            let prev = chars[i - 1].1;
            let next_is_lower = chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_lowercase());
            let boundary = (c.is_ascii_uppercase() && (prev.is_ascii_lowercase() || prev.is_ascii_digit()))
                || (c.is_ascii_uppercase() && prev.is_ascii_uppercase() && next_is_lower);
            if boundary {
                words.push(&part[start..idx]);
                start = idx;
            }
        }
        words.push(&part[start..]);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(word.len());
            out.push(first.to_ascii_uppercase());
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
            out
        }
        None => String::new(),
    }
}

/// Converts an identifier to `snake_case`.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    join_lower(name, "_")
}

/// Converts an identifier to `kebab-case`.
#[must_use]
pub fn to_kebab_case(name: &str) -> String {
    join_lower(name, "-")
}

fn join_lower(name: &str, separator: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Converts an identifier to `camelCase`.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, word) in split_words(name).into_iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_ascii_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Converts an identifier or file stem to `PascalCase`.
///
/// Acronym runs are folded: `"HTTPServer"` becomes `"HttpServer"`.
#[must_use]
pub fn to_pascal_case(name: &str) -> String {
    split_words(name).into_iter().map(capitalize).collect()
}

/// Returns `true` if `name` looks like a `PascalCase` identifier.
#[must_use]
pub fn is_pascal_case(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.chars().any(|c| c.is_ascii_lowercase())
}

/// Reduces a plural noun to its singular form.
///
/// Irregular forms come from a fixed table; otherwise `-ies` becomes `-y`,
/// `-ves` becomes `-f`, and a trailing `-s` is dropped unless the word ends
/// in `ss`, `us` or `is`. A leading capital is preserved.
///
/// # Examples
///
/// ```
/// use xc_ts_parser::naming::singularize;
///
/// assert_eq!(singularize("People"), "Person");
/// assert_eq!(singularize("wolves"), "wolf");
/// assert_eq!(singularize("status"), "status");
/// ```
#[must_use]
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some((_, singular)) = IRREGULAR_PLURALS.iter().find(|(plural, _)| *plural == lower) {
        return match_leading_case(word, singular);
    }
    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if lower.len() > 3 && lower.ends_with("ves") {
        return format!("{}f", &word[..word.len() - 3]);
    }
    if lower.len() > 1
        && lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return word[..word.len() - 1].to_owned();
    }
    word.to_owned()
}

/// Forms the plural of a singular noun.
///
/// # Examples
///
/// ```
/// use xc_ts_parser::naming::pluralize;
///
/// assert_eq!(pluralize("user"), "users");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("child"), "children");
/// ```
#[must_use]
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some((plural, _)) = IRREGULAR_PLURALS.iter().find(|(_, singular)| *singular == lower) {
        return match_leading_case(word, plural);
    }
    let ends_consonant_y = lower.ends_with('y')
        && lower.len() > 1
        && !lower[..lower.len() - 1].ends_with(['a', 'e', 'i', 'o', 'u']);
    if ends_consonant_y {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if lower.ends_with(['s', 'x', 'z']) || lower.ends_with("ch") || lower.ends_with("sh") {
        return format!("{word}es");
    }
    format!("{word}s")
}

fn match_leading_case(original: &str, replacement: &str) -> String {
    if original.starts_with(|c: char| c.is_ascii_uppercase()) {
        capitalize(replacement)
    } else {
        replacement.to_owned()
    }
}

/// Derives a model name from a URL resource segment: `"user-profiles"`
/// becomes `"UserProfile"`.
#[must_use]
pub fn resource_to_model_name(resource: &str) -> String {
    to_pascal_case(&singularize(resource))
}
