//! Fuzzy matching for unknown attribute names

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Closest candidate to `input`, if any is within the suggestion distance
pub fn closest_match<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = strsim::levenshtein(input, candidate);
            (distance > 0 && distance <= MAX_SUGGESTION_DISTANCE).then_some((distance, candidate))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

/// "Did you mean" hint for an unknown attribute
///
/// Also catches camelCase wire names typed where the snake_case name is
/// expected (`targetRef` -> `target_ref`).
pub fn suggest_attribute<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    use convert_case::{Case, Casing};

    let snake = input.to_case(Case::Snake);
    if snake != input {
        if let Some(exact) = candidates.clone().into_iter().find(|c| *c == snake) {
            return Some(format!("did you mean '{}'?", exact));
        }
    }
    closest_match(input, candidates).map(|c| format!("did you mean '{}'?", c))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTRS: &[&str] = &["target_ref", "to", "from", "rules"];

    #[test]
    fn test_closest_match() {
        assert_eq!(closest_match("target_rf", ATTRS.iter().copied()), Some("target_ref"));
        assert_eq!(closest_match("rule", ATTRS.iter().copied()), Some("rules"));
        assert_eq!(closest_match("completely_off", ATTRS.iter().copied()), None);
    }

    #[test]
    fn test_exact_match_is_not_suggested() {
        assert_eq!(closest_match("to", ATTRS.iter().copied()), None);
    }

    #[test]
    fn test_suggest_camel_case() {
        let hint = suggest_attribute("targetRef", ATTRS.iter().copied()).unwrap();
        assert!(hint.contains("target_ref"));
    }
}
