//! Business categories

use serde::{Deserialize, Serialize};

/// Category of a business (restaurante, hotel, artesania, museo, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Stable lowercase key
    pub slug: String,
    /// Display name
    pub name: String,
}

/// Lowercase, ASCII-only slug: accents are folded and everything else that
/// is not alphanumeric becomes a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        let c = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        };
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify("Artesanía"), "artesania");
        assert_eq!(slugify("  Café & Piñatas! "), "cafe-pinatas");
        assert_eq!(slugify("---"), "");
    }
}
