//! Part number canonicalization.
//!
//! Customer-entered part numbers arrive with inconsistent casing, stray
//! symbols from price lists, and OCR-style confusion between the letter `O`
//! and the digit `0`. Every lookup path (catalog search, cart add, bulk
//! reconciliation) funnels through these helpers so the same input always
//! lands on the same catalog row.

/// Canonicalizes a raw part number for storage and lookup.
///
/// Uppercases, strips the literal characters `*`, `@` and `+`, replaces the
/// letter `O` with the digit `0`, and trims surrounding whitespace. Pure and
/// infallible; empty input yields an empty string.
pub fn normalize(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '*' | '@' | '+'))
        .map(|c| if c == 'O' { '0' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Looser matching key: [`normalize`] plus hyphen stripping.
///
/// Used only when joining user input against the catalog. Never stored.
pub fn match_key(raw: &str) -> String {
    normalize(raw).replace('-', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_symbols_and_maps_o_to_zero() {
        assert_eq!(normalize("O1*2@3+O"), "012303");
        assert_eq!(normalize("AB*O12"), "AB012");
        assert_eq!(normalize("  ab-o1 "), "AB-01");
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(match_key(""), "");
    }

    #[test]
    fn match_key_also_drops_hyphens() {
        assert_eq!(match_key("ab-o1-2"), "AB012");
        assert_eq!(normalize("ab-o1-2"), "AB-01-2");
    }

    proptest! {
        // Running the normalizer over its own output must be a fixed point,
        // otherwise catalog lookups and cart merges could disagree.
        #[test]
        fn normalize_is_idempotent(s in ".{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once.clone());
            let key = match_key(&s);
            prop_assert_eq!(match_key(&key), key);
        }
    }
}
