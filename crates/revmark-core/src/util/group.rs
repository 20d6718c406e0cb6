/// Splits `items` into maximal runs of consecutive elements sharing a key.
/// Non-adjacent elements with equal keys land in separate runs.
pub fn group_adjacent<T, K, F>(items: &[T], key_selector: F) -> Vec<(K, &[T])>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut result: Vec<(K, &[T])> = Vec::new();
    let mut start = 0usize;
    let mut current: Option<K> = None;

    for (i, item) in items.iter().enumerate() {
        let key = key_selector(item);
        match &current {
            Some(k) if *k == key => {}
            _ => {
                if let Some(k) = current.take() {
                    result.push((k, &items[start..i]));
                }
                start = i;
                current = Some(key);
            }
        }
    }

    if let Some(k) = current {
        result.push((k, &items[start..]));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_consecutive_equal_keys() {
        let items = [1, 1, 2, 2, 2, 1, 3, 3];
        let groups = group_adjacent(&items, |&x| x);

        let keys: Vec<_> = groups.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 2, 1, 3]);
        assert_eq!(groups[1].1, &[2, 2, 2]);
        assert_eq!(groups[2].1, &[1]);
    }

    #[test]
    fn groups_by_derived_key() {
        let items = ["aa", "ab", "ba", "bb", "ac"];
        let groups = group_adjacent(&items, |s| s.chars().next());

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], (Some('a'), &["aa", "ab"][..]));
        assert_eq!(groups[2], (Some('a'), &["ac"][..]));
    }

    #[test]
    fn empty_input_has_no_groups() {
        let items: [u8; 0] = [];
        assert!(group_adjacent(&items, |&x| x).is_empty());
    }
}
