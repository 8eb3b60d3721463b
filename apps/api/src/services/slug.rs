//! URL slug generation
//!
//! Slugs are the canonical public handle for a loop. Generation is
//! lossy-but-stable: lowercase, accents folded to ASCII, everything else
//! reduced to single hyphens, capped at 60 characters. Collisions are
//! resolved with a numeric suffix against the database.

use crate::repositories::LoopRepository;

const MAX_SLUG_LEN: usize = 60;

/// Derive a URL-friendly slug from a title
///
/// Returns an empty string when the title has no usable characters; the
/// caller substitutes a default base in that case.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppress leading hyphens

    let mut push_char = |c: char, slug: &mut String, last_was_hyphen: &mut bool| {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            slug.push(lower);
            *last_was_hyphen = false;
        } else if (lower.is_whitespace() || lower == '-' || lower == '_') && !*last_was_hyphen {
            slug.push('-');
            *last_was_hyphen = true;
        }
    };

    for c in title.chars() {
        match fold_accent(c) {
            Some(folded) => {
                for fc in folded.chars() {
                    push_char(fc, &mut slug, &mut last_was_hyphen);
                }
            }
            None => push_char(c, &mut slug, &mut last_was_hyphen),
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_matches('-').to_string()
}

/// Fold common Latin accents to their ASCII base letters
fn fold_accent(c: char) -> Option<&'static str> {
    Some(match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'ø' | 'Ø' => "o",
        _ => return None,
    })
}

/// Generate a slug unique among existing loops, appending a numeric
/// suffix on collision
pub async fn unique_slug(repo: &LoopRepository, title: &str) -> Result<String, sqlx::Error> {
    let mut base = slugify(title);
    if base.is_empty() {
        base = "loop".to_string();
    }

    let mut slug = base.clone();
    let mut counter = 1;
    while repo.slug_exists(&slug).await? {
        slug = format!("{}-{}", base, counter);
        counter += 1;
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(slugify("Dusty Drum Break"), "dusty-drum-break");
    }

    #[test]
    fn test_special_characters_removed() {
        assert_eq!(slugify("Lo-Fi!! (v2) [140bpm]"), "lo-fi-v2-140bpm");
    }

    #[test]
    fn test_accents_folded() {
        assert_eq!(slugify("Café Début"), "cafe-debut");
        assert_eq!(slugify("Señor Groove"), "senor-groove");
    }

    #[test]
    fn test_collapses_separators() {
        assert_eq!(slugify("a   b---c___d"), "a-b-c-d");
    }

    #[test]
    fn test_trims_edge_hyphens() {
        assert_eq!(slugify("--hello--"), "hello");
        assert_eq!(slugify("  spaced  "), "spaced");
    }

    #[test]
    fn test_unusable_title_is_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("中文标题"), "");
    }

    #[test]
    fn test_length_cap() {
        let long = "a".repeat(200);
        assert!(slugify(&long).len() <= MAX_SLUG_LEN);
    }
}
