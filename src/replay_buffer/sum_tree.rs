//! Sum tree over per-slot priorities.
//!
//! Leaves hold priorities, every inner node holds the sum of its children, so
//! both updating a slot and locating the slot that owns a given prefix of the
//! total mass are `O(log n)`.

#[derive(Clone, Debug)]
pub struct SumTree {
    capacity: usize,
    tree: Vec<f64>,
}

impl SumTree {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        SumTree {
            capacity,
            tree: vec![0.0; 2 * capacity - 1],
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of all priorities.
    pub fn total(&self) -> f64 {
        self.tree[0]
    }

    /// Priority stored at slot `ix`.
    pub fn get(&self, ix: usize) -> f64 {
        self.tree[ix + self.capacity - 1]
    }

    /// Set the priority of slot `ix` and propagate the change to the root.
    pub fn set(&mut self, ix: usize, p: f64) {
        debug_assert!(ix < self.capacity);
        let mut node = ix + self.capacity - 1;
        let change = p - self.tree[node];
        self.tree[node] = p;
        while node != 0 {
            node = (node - 1) / 2;
            self.tree[node] += change;
        }
    }

    /// Slot whose cumulative priority range contains `mass`.
    pub fn find(&self, mass: f64) -> usize {
        let mut node = 0;
        let mut mass = mass;
        loop {
            let left = 2 * node + 1;
            let right = left + 1;
            if left >= self.tree.len() {
                break;
            }
            if mass <= self.tree[left] || self.tree[right] == 0.0 {
                node = left;
            } else {
                mass -= self.tree[left];
                node = right;
            }
        }
        node + 1 - self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::SumTree;

    #[test]
    fn test_sum_tree_odd() {
        let data = [0.5, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let mut sum_tree = SumTree::new(8);
        for (ix, &p) in data.iter().enumerate() {
            sum_tree.set(ix, p);
        }

        assert!((sum_tree.total() - 9.3).abs() < 1e-9);
        assert_eq!(sum_tree.find(0.0), 0);
        assert_eq!(sum_tree.find(0.4), 0);
        assert_eq!(sum_tree.find(0.5), 0);
        assert_eq!(sum_tree.find(0.6), 1);
        assert_eq!(sum_tree.find(1.2), 2);
        assert_eq!(sum_tree.find(1.6), 3);
        assert_eq!(sum_tree.find(2.0), 4);
        assert_eq!(sum_tree.find(2.8), 4);
        assert_eq!(sum_tree.find(9.3), 6);
    }

    #[test]
    fn test_update_propagates() {
        let mut sum_tree = SumTree::new(4);
        sum_tree.set(2, 1.0);
        sum_tree.set(2, 3.0);
        sum_tree.set(0, 1.0);
        assert!((sum_tree.total() - 4.0).abs() < 1e-12);
        assert_eq!(sum_tree.get(2), 3.0);
        assert_eq!(sum_tree.find(1.5), 2);
    }

    #[test]
    fn test_single_slot() {
        let mut sum_tree = SumTree::new(1);
        sum_tree.set(0, 2.0);
        assert_eq!(sum_tree.find(1.0), 0);
        assert_eq!(sum_tree.total(), 2.0);
    }
}
