//! Component K: union-find grouper. Grounded on the original pipeline's
//! `group/unionfind.py::UnionFind`, but per REDESIGN FLAGS (§9) `find` is an
//! iterative two-pass walk instead of the python version's recursive path
//! compression, to avoid deep call chains on large inputs.

use std::collections::BTreeMap;

pub struct UnionFind {
    parent: BTreeMap<String, String>,
    rank: BTreeMap<String, u32>,
}

impl UnionFind {
    #[must_use]
    pub fn new() -> Self {
        Self { parent: BTreeMap::new(), rank: BTreeMap::new() }
    }

    /// Ensure `item` exists as its own singleton set if not already present.
    pub fn add(&mut self, item: &str) {
        self.parent.entry(item.to_string()).or_insert_with(|| item.to_string());
        self.rank.entry(item.to_string()).or_insert(0);
    }

    /// Ensure every item in `items` exists in the structure.
    pub fn add_all<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) {
        for item in items {
            self.add(item);
        }
    }

    /// Canonical representative for `item`, with iterative path compression:
    /// first pass walks to the root, second pass repoints every visited node
    /// directly to it.
    pub fn find(&mut self, item: &str) -> String {
        self.add(item);

        let mut root = item.to_string();
        while self.parent[&root] != root {
            root = self.parent[&root].clone();
        }

        let mut current = item.to_string();
        while current != root {
            let next = self.parent[&current].clone();
            self.parent.insert(current, root.clone());
            current = next;
        }

        root
    }

    /// Merge the sets containing `a` and `b`, by rank.
    pub fn union(&mut self, a: &str, b: &str) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }

        let rank_a = self.rank[&root_a];
        let rank_b = self.rank[&root_b];
        if rank_a < rank_b {
            self.parent.insert(root_a, root_b);
        } else if rank_a > rank_b {
            self.parent.insert(root_b, root_a);
        } else {
            self.parent.insert(root_b, root_a.clone());
            *self.rank.get_mut(&root_a).expect("root always has a rank entry") += 1;
        }
    }

    /// Partition the full key set into a mapping of representative -> sorted
    /// members, every singleton included.
    #[must_use]
    pub fn groups(mut self) -> BTreeMap<String, Vec<String>> {
        let items: Vec<String> = self.parent.keys().cloned().collect();
        let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for item in items {
            let root = self.find(&item);
            buckets.entry(root).or_default().push(item);
        }
        for members in buckets.values_mut() {
            members.sort();
        }
        buckets
    }
}

impl Default for UnionFind {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_sites_survive_as_singletons() {
        let mut uf = UnionFind::new();
        uf.add_all(["a.com", "b.com", "c.com"]);
        let groups = uf.groups();
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn union_merges_transitively() {
        let mut uf = UnionFind::new();
        uf.add_all(["a", "b", "c", "d"]);
        uf.union("a", "b");
        uf.union("b", "c");
        let groups = uf.groups();
        assert_eq!(groups.len(), 2);
        let sizes: Vec<usize> = groups.values().map(Vec::len).collect();
        assert!(sizes.contains(&3));
        assert!(sizes.contains(&1));
    }

    #[test]
    fn groups_partition_the_key_set_exactly() {
        let mut uf = UnionFind::new();
        uf.add_all(["x", "y", "z"]);
        uf.union("x", "y");
        let groups = uf.groups();
        let mut all_members: Vec<String> = groups.values().flatten().cloned().collect();
        all_members.sort();
        assert_eq!(all_members, vec!["x".to_string(), "y".to_string(), "z".to_string()]);
    }

    #[test]
    fn union_is_order_invariant() {
        let mut uf1 = UnionFind::new();
        uf1.add_all(["a", "b", "c"]);
        uf1.union("a", "b");
        uf1.union("b", "c");

        let mut uf2 = UnionFind::new();
        uf2.add_all(["c", "b", "a"]);
        uf2.union("b", "c");
        uf2.union("a", "b");

        assert_eq!(uf1.groups().len(), uf2.groups().len());
    }

    #[test]
    fn repeated_union_of_same_pair_is_a_no_op() {
        let mut uf = UnionFind::new();
        uf.add_all(["a", "b"]);
        uf.union("a", "b");
        uf.union("a", "b");
        assert_eq!(uf.groups().len(), 1);
    }
}
