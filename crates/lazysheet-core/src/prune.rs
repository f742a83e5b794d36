//! Removing empty entries from sequences, keeping the order of the rest.

/// Drop absent entries.
pub fn nulls<T, I>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    items.into_iter().flatten().collect()
}

/// Drop absent entries in place.
pub fn nulls_in_place<T>(items: &mut Vec<Option<T>>) {
    items.retain(Option::is_some);
}

/// Trim every string and drop the ones left blank.
pub fn whites<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating() -> Vec<Option<&'static str>> {
        vec![
            None,
            Some("A"),
            None,
            None,
            Some("B"),
            None,
            None,
            None,
            Some("C"),
            None,
        ]
    }

    #[test]
    fn test_nulls_keeps_order() {
        assert_eq!(nulls(alternating()), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_nulls_without_gaps() {
        let full = vec![Some("1"), Some("2"), Some("4")];
        assert_eq!(nulls(full), vec!["1", "2", "4"]);
        assert!(nulls(Vec::<Option<u8>>::new()).is_empty());
        assert!(nulls([None::<u8>, None]).is_empty());
    }

    #[test]
    fn test_nulls_in_place() {
        let mut items = alternating();
        nulls_in_place(&mut items);
        assert_eq!(items, vec![Some("A"), Some("B"), Some("C")]);
    }

    #[test]
    fn test_whites() {
        assert_eq!(whites(&["  a ", "", "   ", "b", "\tc\n"]), vec!["a", "b", "c"]);
        assert!(whites::<&str>(&[]).is_empty());
    }
}
