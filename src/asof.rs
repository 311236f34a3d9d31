//! Backward as-of matching
//!
//! Each probe is matched to the last key that is less than or equal to it.
//! Keys must be sorted ascending; lookups are binary searches.

/// Index of the last key `<= probe`, or `None` if the probe precedes every key
pub fn asof_index<T: PartialOrd>(keys: &[T], probe: &T) -> Option<usize> {
    let upper = keys.partition_point(|key| key <= probe);
    upper.checked_sub(1)
}

/// Match every probe against the sorted keys
pub fn merge_asof_backward<T: PartialOrd>(keys: &[T], probes: &[T]) -> Vec<Option<usize>> {
    probes.iter().map(|probe| asof_index(keys, probe)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exact_and_between_matches() {
        let keys = [0, 10, 20];
        assert_eq!(asof_index(&keys, &0), Some(0));
        assert_eq!(asof_index(&keys, &9), Some(0));
        assert_eq!(asof_index(&keys, &10), Some(1));
        assert_eq!(asof_index(&keys, &25), Some(2));
    }

    #[test]
    fn test_probe_before_first_key() {
        assert_eq!(asof_index(&[5, 6], &4), None);
        assert_eq!(asof_index::<i32>(&[], &4), None);
    }

    #[test]
    fn test_duplicate_keys_resolve_to_last() {
        assert_eq!(asof_index(&[1, 3, 3, 3, 7], &3), Some(3));
    }

    #[test]
    fn test_merge_many() {
        let keys = [1.0, 2.0, 4.0];
        let probes = [0.5, 1.0, 1.5, 3.9, 4.0, 100.0];
        assert_eq!(
            merge_asof_backward(&keys, &probes),
            vec![None, Some(0), Some(0), Some(1), Some(2), Some(2)]
        );
    }
}
