use std::collections::HashSet;

/// Followers gained and lost between two listings. Both lists keep the order in which
/// the ids appear in their source listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Every changed id, removed first.
    pub fn changed_ids(&self) -> Vec<String> {
        self.removed.iter().chain(&self.added).cloned().collect()
    }
}

pub fn dedup_preserving_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Set difference of two follower listings. A cold start (empty `previous`) reports
/// nothing.
pub fn diff(previous: &[String], current: &[String]) -> ChangeSet {
    if previous.is_empty() {
        return ChangeSet::default();
    }
    let before: HashSet<&str> = previous.iter().map(String::as_str).collect();
    let after: HashSet<&str> = current.iter().map(String::as_str).collect();

    let removed = dedup_preserving_order(previous)
        .into_iter()
        .filter(|id| !after.contains(id.as_str()))
        .collect();
    let added = dedup_preserving_order(current)
        .into_iter()
        .filter(|id| !before.contains(id.as_str()))
        .collect();
    ChangeSet { added, removed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn set(ids: &[String]) -> HashSet<String> {
        ids.iter().cloned().collect()
    }

    #[test]
    fn cold_start_reports_nothing() {
        assert!(diff(&[], &v(&["1", "2"])).is_empty());
    }

    #[test]
    fn abc_to_bcd() {
        let change = diff(&v(&["A", "B", "C"]), &v(&["B", "C", "D"]));
        assert_eq!(change.added, v(&["D"]));
        assert_eq!(change.removed, v(&["A"]));
    }

    #[test]
    fn same_listing_is_empty() {
        let s = v(&["1", "2", "3"]);
        assert!(diff(&s, &s).is_empty());
    }

    #[test]
    fn duplicates_do_not_leak_into_the_result() {
        let change = diff(&v(&["1", "1", "2"]), &v(&["3", "3", "2"]));
        assert_eq!(change.added, v(&["3"]));
        assert_eq!(change.removed, v(&["1"]));
    }

    #[test]
    fn disjoint_and_equal_to_symmetric_difference() {
        let cases = [
            (v(&["1", "2", "3", "4"]), v(&["3", "4", "5", "6"])),
            (v(&["1"]), v(&[])),
            (v(&["9", "8"]), v(&["7", "8", "9", "10"])),
        ];
        for (prev, cur) in cases {
            let change = diff(&prev, &cur);
            let added = set(&change.added);
            let removed = set(&change.removed);
            assert!(added.is_disjoint(&removed));

            let sym: HashSet<String> = set(&prev).symmetric_difference(&set(&cur)).cloned().collect();
            let union: HashSet<String> = added.union(&removed).cloned().collect();
            assert_eq!(sym, union);
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_preserving_order(&v(&["b", "a", "b", "c", "a"])), v(&["b", "a", "c"]));
    }
}
