//! Slug normalization for container names and metadata keys

/// Fold the accented characters the storage naming rules know about
/// onto their ASCII counterpart. Separators become dashes.
fn fold(c: char) -> char {
    match c {
        'à' | 'á' | 'ä' | 'â' => 'a',
        'è' | 'é' | 'ë' | 'ê' => 'e',
        'ì' | 'í' | 'ï' | 'î' => 'i',
        'ò' | 'ó' | 'ö' | 'ô' => 'o',
        'ù' | 'ú' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        '·' | '/' | ',' | ':' | ';' => '-',
        other => other,
    }
}

/// Normalize a string into a lowercase, accent-stripped slug.
///
/// Only `[a-z0-9_-]` survive; runs of spaces and dashes collapse into a
/// single dash. The function is idempotent.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = false;

    for c in input.trim().to_lowercase().chars().map(fold) {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' {
            if !last_dash {
                slug.push('-');
            }
            last_dash = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            slug.push(c);
            last_dash = false;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_strips_accents() {
        assert_eq!(slugify("Photos d'Été"), "photos-dete");
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("Last-Update"), "last-update");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  a   b  "), "a-b");
        assert_eq!(slugify("a--b"), "a-b");
        assert_eq!(slugify("a - b"), "a-b");
        assert_eq!(slugify("a:b;c,d"), "a-b-c-d");
    }

    #[test]
    fn test_slugify_keeps_underscores() {
        assert_eq!(slugify("last_update"), "last_update");
    }

    #[test]
    fn test_slugify_drops_invalid_chars() {
        assert_eq!(slugify("hello!world?"), "helloworld");
        assert_eq!(slugify("€uro"), "uro");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        for input in ["Mon Conteneur", "Été/Hiver", "a__b--c", " x ", "ÀÉÎÕÜ", "tab\tsep"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input: {input:?}");
        }
    }
}
