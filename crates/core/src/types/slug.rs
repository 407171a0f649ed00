//! URL-safe slugs for tenant identifiers and usernames.

use thiserror::Error;

/// Errors that can occur when deriving a slug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    /// Nothing slug-worthy was left after normalization.
    #[error("'{0}' does not contain any letters or digits")]
    Empty(String),
}

/// Turn free text into a lowercase, hyphen-separated slug.
///
/// Accented Latin letters are folded to ASCII, `@` becomes `at`, and every
/// other run of non-alphanumeric characters collapses into a single `-`.
///
/// ```
/// use stylecore_core::slugify;
///
/// assert_eq!(slugify("Acme Salon").unwrap(), "acme-salon");
/// assert_eq!(slugify("  Beleza & Estética São João ").unwrap(), "beleza-estetica-sao-joao");
/// assert!(slugify("!!!").is_err());
/// ```
///
/// # Errors
///
/// Returns [`SlugError::Empty`] if the input has no letters or digits.
pub fn slugify(input: &str) -> Result<String, SlugError> {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        let folded = fold(c);
        if folded.is_empty() {
            pending_separator = true;
            continue;
        }
        // `@` reads as a word of its own.
        let spelled_out = c == '@';
        if (pending_separator || spelled_out) && !slug.is_empty() {
            slug.push('-');
        }
        pending_separator = spelled_out;
        slug.push_str(folded);
    }

    if slug.is_empty() {
        return Err(SlugError::Empty(input.to_owned()));
    }
    Ok(slug)
}

/// Map a character to its slug spelling; empty means "separator".
fn fold(c: char) -> &'static str {
    match c.to_lowercase().next().unwrap_or(c) {
        'a' | 'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'b' => "b",
        'c' | 'ç' => "c",
        'd' => "d",
        'e' | 'é' | 'è' | 'ê' | 'ë' => "e",
        'f' => "f",
        'g' => "g",
        'h' => "h",
        'i' | 'í' | 'ì' | 'î' | 'ï' => "i",
        'j' => "j",
        'k' => "k",
        'l' => "l",
        'm' => "m",
        'n' | 'ñ' => "n",
        'o' | 'ó' | 'ò' | 'ô' | 'õ' | 'ö' => "o",
        'p' => "p",
        'q' => "q",
        'r' => "r",
        's' => "s",
        't' => "t",
        'u' | 'ú' | 'ù' | 'û' | 'ü' => "u",
        'v' => "v",
        'w' => "w",
        'x' => "x",
        'y' | 'ý' | 'ÿ' => "y",
        'z' => "z",
        'ß' => "ss",
        'æ' => "ae",
        'ø' => "o",
        '0' => "0",
        '1' => "1",
        '2' => "2",
        '3' => "3",
        '4' => "4",
        '5' => "5",
        '6' => "6",
        '7' => "7",
        '8' => "8",
        '9' => "9",
        '@' => "at",
        _ => "",
    }
}
