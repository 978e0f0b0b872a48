use indexmap::IndexMap;

/// Trait key -> values, in declaration order.
pub type TraitMap = IndexMap<String, Vec<String>>;

const CATEGORY_KEY: &str = "category";

/// Flattens traits into the category strings a host filters on.
///
/// Blank keys and blank values are dropped. `Category` traits surface as the
/// bare value, every other trait as `key[value]`. Duplicates are kept.
pub fn derive_categories(traits: &TraitMap) -> Vec<String> {
    traits
        .iter()
        .map(|(key, values)| (key.trim(), values))
        .filter(|(key, _)| !key.is_empty())
        .flat_map(|(key, values)| {
            values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(move |value| {
                    if key.eq_ignore_ascii_case(CATEGORY_KEY) {
                        value.to_string()
                    } else {
                        format!("{key}[{value}]")
                    }
                })
        })
        .collect()
}
