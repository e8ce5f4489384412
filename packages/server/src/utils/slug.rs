//! URL slug generation for place titles.
//!
//! A title is transliterated to Latin (`"Тестовое место"` becomes
//! `testovoe-mesto`, `"Café"` becomes `cafe`). Characters with no
//! transliteration are dropped without affecting the rest of the title.
//! Collisions are resolved by [`SlugCandidates`]: a trailing number is
//! incremented, otherwise a short random suffix is appended.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of the random disambiguation suffix.
const RANDOM_SUFFIX_LEN: usize = 6;

/// Produce the base slug for a title. May be empty.
pub fn slugify(title: &str) -> String {
    hyphenate(&transliterate(title))
}

/// Transliterate to Latin. Unmapped characters (private use, unassigned)
/// become nothing.
fn transliterate(title: &str) -> String {
    title
        .chars()
        .map(|c| deunicode::deunicode_char(c).unwrap_or(""))
        .collect()
}

/// Lower-case, keep ASCII alphanumerics, collapse everything else into single hyphens.
fn hyphenate(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if matches!(c, '\'' | '`' | '"') {
            // Apostrophes join words ("L'Hotel" -> "lhotel").
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Given a taken candidate, produce the next one to try.
///
/// `base<digits>` becomes `base<digits + 1>`; anything else gets `-<random>`
/// appended. An empty candidate becomes a bare random token.
pub fn next_candidate(taken: &str) -> String {
    let digits_start = taken
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);

    if let Some(start) = digits_start {
        let (base, digits) = taken.split_at(start);
        if let Some(next) = increment_digits(digits) {
            return format!("{base}{next}");
        }
    }

    if taken.is_empty() {
        random_suffix()
    } else {
        format!("{taken}-{}", random_suffix())
    }
}

/// Decimal increment on an arbitrary-length digit string, keeping zero padding
/// where it fits (`"009"` -> `"010"`).
fn increment_digits(digits: &str) -> Option<String> {
    let mut bytes = digits.as_bytes().to_vec();
    let mut i = bytes.len();
    loop {
        if i == 0 {
            bytes.insert(0, b'1');
            break;
        }
        i -= 1;
        if bytes[i] == b'9' {
            bytes[i] = b'0';
        } else {
            bytes[i] += 1;
            break;
        }
    }
    String::from_utf8(bytes).ok()
}

/// Infinite sequence of slug candidates for a title.
///
/// The first item is [`slugify`]'s output unless that is empty, in which case
/// the sequence starts directly with a random token.
pub struct SlugCandidates {
    next: Option<String>,
}

impl SlugCandidates {
    pub fn new(title: &str) -> Self {
        let base = slugify(title);
        let first = if base.is_empty() {
            next_candidate("")
        } else {
            base
        };
        Self { next: Some(first) }
    }
}

impl Iterator for SlugCandidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let current = self.next.take()?;
        self.next = Some(next_candidate(&current));
        Some(current)
    }
}

/// Return the first candidate for `title` that `exists` reports as free.
pub fn generate_slug(title: &str, mut exists: impl FnMut(&str) -> bool) -> String {
    let mut candidates = SlugCandidates::new(title);
    loop {
        // The sequence never ends; `next_candidate` always yields a value.
        let Some(candidate) = candidates.next() else {
            return random_suffix();
        };
        if !exists(&candidate) {
            return candidate;
        }
    }
}
