use std::collections::HashMap;

use crate::vision::StateKey;

/// Sparse state → per-action values. Rows appear on first lookup, zeroed,
/// and are never evicted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueTable {
    actions: usize,
    rows: HashMap<StateKey, Vec<f32>>,
}

impl ValueTable {
    pub fn new(actions: usize) -> Self {
        Self {
            actions,
            rows: HashMap::new(),
        }
    }

    /// Number of values in every row.
    pub fn actions(&self) -> usize {
        self.actions
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &StateKey) -> Option<&[f32]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    ///row for `key`, inserted as zeros if unseen
    pub fn row(&mut self, key: StateKey) -> &mut [f32] {
        let actions = self.actions;
        self.rows.entry(key).or_insert_with(|| vec![0.0; actions])
    }

    /// Overwrites a whole row. Returns false (and changes nothing) when the
    /// width does not match.
    pub fn insert(&mut self, key: StateKey, values: Vec<f32>) -> bool {
        if values.len() != self.actions {
            return false;
        }
        self.rows.insert(key, values);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &[f32])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Rows ordered by key, for stable output.
    pub fn sorted(&self) -> Vec<(&StateKey, &[f32])> {
        let mut rows: Vec<_> = self.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }
}

/// Index of the largest value; ties go to the lowest index.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for i in 1..values.len() {
        if values[i] > values[best] {
            best = i;
        }
    }
    best
}

pub fn max_value(values: &[f32]) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::Sight;

    fn key(s: Sight) -> StateKey {
        StateKey([s, Sight::WallFar, Sight::WallFar, Sight::WallFar])
    }

    #[test]
    fn rows_are_lazy_and_zeroed() {
        let mut table = ValueTable::new(4);
        assert!(table.get(&key(Sight::Beneficial)).is_none());
        assert_eq!(table.row(key(Sight::Beneficial)), &[0.0; 4]);
        assert_eq!(table.len(), 1);
        table.row(key(Sight::Beneficial))[2] = 1.5;
        assert_eq!(table.get(&key(Sight::Beneficial)), Some(&[0.0, 0.0, 1.5, 0.0][..]));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn insert_checks_width() {
        let mut table = ValueTable::new(3);
        assert!(!table.insert(key(Sight::Harmful), vec![1.0; 4]));
        assert!(table.insert(key(Sight::Harmful), vec![1.0; 3]));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.0, 0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[-5.0, -1.0, -3.0]), 1);
        assert_eq!(max_value(&[-5.0, -1.0, -3.0]), -1.0);
    }

    #[test]
    fn sorted_is_ordered() {
        let mut table = ValueTable::new(3);
        table.row(key(Sight::Harmful));
        table.row(key(Sight::WallNear));
        table.row(key(Sight::Beneficial));
        let keys: Vec<_> = table.sorted().into_iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![key(Sight::WallNear), key(Sight::Beneficial), key(Sight::Harmful)]);
    }
}
