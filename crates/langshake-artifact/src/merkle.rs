//! Order-independent Merkle index over published modules
//!
//! Leaves are module checksums sorted ascending, so the root depends only on
//! the multiset of modules and never on discovery or write order. Each level
//! is reduced by hashing the concatenated hex strings of adjacent pairs; a
//! trailing odd node is paired with itself.

use crate::checksum::Checksum;
use serde::{Deserialize, Serialize};

/// A published artifact reference: Merkle leaf and index entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Path under which verifiers fetch the artifact
    pub public_path: String,
    /// Checksum of the artifact content
    pub checksum: Checksum,
}

impl Module {
    /// Create module reference
    #[inline]
    #[must_use]
    pub fn new(public_path: impl Into<String>, checksum: Checksum) -> Self {
        Self {
            public_path: public_path.into(),
            checksum,
        }
    }
}

/// Canonically ordered modules and their Merkle root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleIndex {
    modules: Vec<Module>,
    root: Option<Checksum>,
}

impl MerkleIndex {
    /// Build from modules in any order
    ///
    /// Modules are sorted by checksum (ties by public path) before the tree
    /// is reduced, and the published path list follows that same order.
    ///
    /// # Performance
    /// O(n log n) for the sort, O(n) hashes for the tree
    #[must_use]
    pub fn build(modules: impl IntoIterator<Item = Module>) -> Self {
        let mut modules: Vec<Module> = modules.into_iter().collect();
        modules.sort_by(|a, b| {
            a.checksum
                .cmp(&b.checksum)
                .then_with(|| a.public_path.cmp(&b.public_path))
        });
        let leaves: Vec<Checksum> = modules.iter().map(|m| m.checksum).collect();
        let root = merkle_root(&leaves);
        Self { modules, root }
    }

    /// Modules in canonical order
    #[inline]
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Public paths in canonical order
    #[must_use]
    pub fn ordered_paths(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.public_path.clone()).collect()
    }

    /// Root digest, `None` when there are no modules
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<Checksum> {
        self.root
    }

    /// Root as published: hex, or `""` for an empty index
    #[must_use]
    pub fn root_hex(&self) -> String {
        self.root.map(|r| r.to_string()).unwrap_or_default()
    }

    /// Number of leaves
    #[inline]
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.modules.len()
    }

    /// Check if index is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Reduce leaves, in the given order, to a single root
///
/// Callers wanting order independence must sort first; [`MerkleIndex::build`]
/// does.
#[must_use]
pub fn merkle_root(leaves: &[Checksum]) -> Option<Checksum> {
    let mut level: Vec<Checksum> = leaves.to_vec();
    if level.is_empty() {
        return None;
    }
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                combine(left, pair.get(1).unwrap_or(left))
            })
            .collect();
    }
    level.pop()
}

/// Parent node: SHA-256 of `left_hex ++ right_hex`
#[must_use]
pub fn combine(left: &Checksum, right: &Checksum) -> Checksum {
    let mut buf = String::with_capacity(128);
    buf.push_str(&left.to_hex());
    buf.push_str(&right.to_hex());
    Checksum::digest(buf.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn repeated(c: char) -> Checksum {
        c.to_string().repeat(64).parse().unwrap()
    }

    fn make_modules(n: usize) -> Vec<Module> {
        (0..n)
            .map(|i| {
                Module::new(
                    format!("langshake/page{i}.json"),
                    Checksum::digest(i.to_string().as_bytes()),
                )
            })
            .collect()
    }

    #[test]
    fn empty_index_has_empty_root() {
        let index = MerkleIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.root().is_none());
        assert_eq!(index.root_hex(), "");
        assert!(index.ordered_paths().is_empty());
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let index = MerkleIndex::build(vec![Module::new("langshake/a.json", repeated('a'))]);
        assert_eq!(index.root(), Some(repeated('a')));
    }

    #[test]
    fn two_leaves_hash_concatenated_hex() {
        let h1 = repeated('a');
        let h2 = repeated('b');
        let expected = Checksum::digest(format!("{}{}", "a".repeat(64), "b".repeat(64)).as_bytes());

        let forward = MerkleIndex::build(vec![
            Module::new("langshake/about.json", h1),
            Module::new("langshake/contact.json", h2),
        ]);
        let reverse = MerkleIndex::build(vec![
            Module::new("langshake/contact.json", h2),
            Module::new("langshake/about.json", h1),
        ]);

        assert_eq!(forward.root(), Some(expected));
        assert_eq!(reverse.root(), Some(expected));
        assert_eq!(
            reverse.ordered_paths(),
            vec!["langshake/about.json", "langshake/contact.json"]
        );
    }

    #[test]
    fn odd_leaf_is_paired_with_itself() {
        let (a, b, c) = (repeated('a'), repeated('b'), repeated('c'));
        let expected = combine(&combine(&a, &b), &combine(&c, &c));
        assert_eq!(merkle_root(&[a, b, c]), Some(expected));
    }

    #[test]
    fn paths_follow_checksum_order_not_path_order() {
        let index = MerkleIndex::build(vec![
            Module::new("a.json", repeated('f')),
            Module::new("z.json", repeated('1')),
        ]);
        assert_eq!(index.ordered_paths(), vec!["z.json", "a.json"]);
    }

    #[test]
    fn root_changes_with_leaves() {
        let four = MerkleIndex::build(make_modules(4));
        let eight = MerkleIndex::build(make_modules(8));
        assert_ne!(four.root(), eight.root());
        assert_eq!(eight.leaf_count(), 8);
    }

    #[test]
    fn module_serializes_camel_case() {
        let module = Module::new("langshake/a.json", repeated('a'));
        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["publicPath"], "langshake/a.json");
        assert_eq!(json["checksum"], "a".repeat(64));
    }

    proptest! {
        #[test]
        fn root_is_independent_of_input_order(
            (original, shuffled) in prop::collection::vec(any::<[u8; 32]>(), 0..24)
                .prop_flat_map(|leaves| {
                    let modules: Vec<Module> = leaves
                        .into_iter()
                        .enumerate()
                        .map(|(i, b)| Module::new(format!("m{i}.json"), Checksum::new(b)))
                        .collect();
                    (Just(modules.clone()), Just(modules).prop_shuffle())
                })
        ) {
            let a = MerkleIndex::build(original);
            let b = MerkleIndex::build(shuffled);
            prop_assert_eq!(a.root(), b.root());
            prop_assert_eq!(a.ordered_paths(), b.ordered_paths());
        }
    }
}
