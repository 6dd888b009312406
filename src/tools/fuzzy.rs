//! Case-insensitive substring lookup used by the update/remove tools.

/// First item (in stored order) whose key contains `fragment`, ignoring case.
///
/// Ties are not disambiguated; when several items match, the first wins and
/// the ambiguity is logged.
pub fn find_match<'a, T, F>(items: &'a [T], fragment: &str, key: F) -> Option<(usize, &'a T)>
where
    F: Fn(&T) -> &str,
{
    let needle = fragment.to_lowercase();
    let mut matches = items
        .iter()
        .enumerate()
        .filter(|(_, item)| key(item).to_lowercase().contains(&needle));

    let first = matches.next()?;
    let others = matches.count();
    if others > 0 {
        tracing::warn!(
            fragment,
            candidates = others + 1,
            chosen = key(first.1),
            "ambiguous fuzzy match, using first in stored order"
        );
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_in_stored_order_wins() {
        let names = ["Morning Run", "Morning Pages"];
        let (index, name) = find_match(&names, "morning", |n| *n).unwrap();

        assert_eq!(index, 0);
        assert_eq!(*name, "Morning Run");
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        let names = ["Read 20 pages", "Gym"];
        assert_eq!(find_match(&names, "GYM", |n| *n).map(|m| m.0), Some(1));
        assert_eq!(find_match(&names, "20 PA", |n| *n).map(|m| m.0), Some(0));
    }

    #[test]
    fn no_match_returns_none() {
        let names = ["Read"];
        assert!(find_match(&names, "swim", |n| *n).is_none());
    }
}
