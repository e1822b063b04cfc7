//! Stable dimension keys for neighbors.

/// EIC codes of the interconnections published under a fixed key.
static KNOWN_CODES: &[(&str, &str)] = &[
    ("10YAL-KESH-----5", "al"),
    ("10YMK-MEPSO----8", "mk"),
    ("10YCS-CG-TSO---S", "me"),
    ("10YCS-SERBIATSOV", "rs"),
];

/// Resolves the dataset key for a neighbor: a known EIC code wins, otherwise
/// the label is slugified.
pub fn neighbor_key(code: &str, label: &str) -> String {
    match known_key(code) {
        Some(key) => key.to_string(),
        None => slugify(label),
    }
}

pub fn known_key(code: &str) -> Option<&'static str> {
    let code = code.trim();
    KNOWN_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, key)| *key)
}

/// Lowercase ASCII slug: diacritics folded, every run of other characters
/// collapsed to a single `_`. Empty results become `unknown`.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_separator = false;

    for c in label.chars().flat_map(fold) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

fn fold(c: char) -> Vec<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'ç' | 'č' | 'ć' | 'Ç' | 'Č' | 'Ć' => "c",
        'đ' | 'Đ' => "dj",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "o",
        'š' | 'Š' => "s",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ž' | 'Ž' => "z",
        'ß' => "ss",
        _ => return vec![c],
    };
    folded.chars().collect()
}
