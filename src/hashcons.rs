//! Per-height canonical deduplication tables.
//!
//! Grounded in `nicbytes-hashlife`'s single `HashMap<[Rc<Node>; 4], Rc<Node>>`
//! cache and in `cainydev-life.rs`'s per-level `FxHashMap` cache, adapted to
//! the single-threaded `Rc` design this crate uses (see `SPEC_FULL.md` §5).

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::bigint::UBig;
use crate::node::{population, CellHandle, Children, Macrocell};

/// A lookup key derived from the *identity* of four child handles, not
/// their contents: children are already canonical, so pointer identity is
/// sufficient (and is what invariant 1 requires).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct ChildKey([usize; 4]);

impl ChildKey {
    fn new(children: &[CellHandle; 4]) -> Self {
        let mut addrs = [0usize; 4];
        for (slot, child) in addrs.iter_mut().zip(children.iter()) {
            *slot = child.as_ref().map_or(0, |rc| Rc::as_ptr(rc) as usize);
        }
        ChildKey(addrs)
    }
}

/// The owner of every per-height canonicalization table, plus the one
/// canonical live leaf.
pub struct HashCons {
    tables: Vec<FxHashMap<ChildKey, Rc<Macrocell>>>,
    on_leaf: Rc<Macrocell>,
}

impl HashCons {
    pub fn new() -> Self {
        let on_leaf = Rc::new(Macrocell {
            height: 0,
            children: Children::Leaf,
            population: UBig::ONE,
            result: Default::default(),
            refcount: Cell::new(0),
        });
        HashCons { tables: Vec::new(), on_leaf }
    }

    /// The one canonical live leaf, shared globally within this universe.
    pub fn on_leaf(&self) -> CellHandle {
        Some(Rc::clone(&self.on_leaf))
    }

    /// The canonical absent ("all dead") subtree, valid at any height.
    pub fn empty(&self) -> CellHandle {
        None
    }

    fn table_index(height: u16) -> usize {
        debug_assert!(height >= 1, "only height >= 1 nodes are tabulated");
        (height - 1) as usize
    }

    fn table(&mut self, height: u16) -> &mut FxHashMap<ChildKey, Rc<Macrocell>> {
        let idx = Self::table_index(height);
        if self.tables.len() <= idx {
            self.tables.resize_with(idx + 1, FxHashMap::default);
        }
        &mut self.tables[idx]
    }

    /// Number of distinct macrocells currently canonicalized at `height`.
    pub fn table_len(&self, height: u16) -> usize {
        let idx = Self::table_index(height);
        self.tables.get(idx).map_or(0, |t| t.len())
    }

    /// Returns the unique canonical node with the given children, creating
    /// it if necessary. Children must already be canonical. If all four
    /// children are absent, returns the absent sentinel (empty elision).
    ///
    /// This call alone does **not** change any refcount: it is used both by
    /// the Mutator (building the live tree, where the caller separately
    /// calls [`HashCons::retain`]/[`HashCons::release`] to keep the live
    /// reference count accurate) and by the Evolver (computing `result`
    /// values, which are deliberately weak-like and never retained: see
    /// `SPEC_FULL.md` §4.6).
    pub fn canonicalize(&mut self, height: u16, children: [CellHandle; 4]) -> CellHandle {
        if children.iter().all(Option::is_none) {
            return None;
        }

        let key = ChildKey::new(&children);
        if let Some(existing) = self.table(height).get(&key) {
            return Some(Rc::clone(existing));
        }

        let total_population = children
            .iter()
            .map(population)
            .fold(UBig::ZERO, |acc, p| acc + p);

        let node = Rc::new(Macrocell {
            height,
            children: Children::Branch(children),
            population: total_population,
            result: Default::default(),
            refcount: Cell::new(0),
        });
        self.table(height).insert(key, Rc::clone(&node));
        Some(node)
    }

    /// Marks `handle` as referenced by one more slot in the live tree.
    pub fn retain(&self, handle: &CellHandle) {
        if let Some(node) = handle {
            node.refcount.set(node.refcount.get() + 1);
        }
    }

    /// Marks `handle` as no longer referenced by one slot in the live tree.
    /// When its refcount reaches zero it is evicted from its height's
    /// table and the release cascades to its own children (it no longer
    /// holds a live reference to them either). The static `ON` leaf and the
    /// absent sentinel are never evicted.
    pub fn release(&mut self, handle: &CellHandle) {
        let node = match handle {
            None => return,
            Some(node) => node,
        };
        if Rc::ptr_eq(node, &self.on_leaf) {
            return;
        }

        let remaining = node.refcount.get().checked_sub(1).expect("refcount underflow");
        node.refcount.set(remaining);

        if remaining == 0 {
            if let Children::Branch(children) = &node.children {
                let key = ChildKey::new(children);
                self.table(node.height).remove(&key);
                let children = children.clone();
                for child in &children {
                    self.release(child);
                }
            }
        }
    }

    /// Invalidates every memoized `result` in every canonicalization table.
    /// Used when the rule changes: a node's RESULT depends on the rule it
    /// was computed under, and canonicalization never changes when the rule
    /// does, so stale caches would otherwise persist (`SPEC_FULL.md` §9,
    /// Open Question 1).
    pub(crate) fn flush_results(&self) {
        for table in &self.tables {
            for node in table.values() {
                node.invalidate_result();
            }
        }
    }
}

impl Default for HashCons {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{same_node, Quadrant};

    fn leaf_quad(hc: &HashCons, q: Quadrant) -> [CellHandle; 4] {
        let mut children = [None, None, None, None];
        children[q.index()] = hc.on_leaf();
        children
    }

    #[test]
    fn canonicalize_deduplicates_identical_children() {
        let mut hc = HashCons::new();
        let a = hc.canonicalize(1, leaf_quad(&hc, Quadrant::Nw));
        let b = hc.canonicalize(1, leaf_quad(&hc, Quadrant::Nw));
        assert!(same_node(&a, &b));
        assert_eq!(hc.table_len(1), 1);
    }

    #[test]
    fn all_absent_children_elide_to_empty() {
        let mut hc = HashCons::new();
        let node = hc.canonicalize(3, [None, None, None, None]);
        assert!(node.is_none());
    }

    #[test]
    fn release_to_zero_evicts_and_cascades() {
        let mut hc = HashCons::new();
        let leaf_nw = hc.canonicalize(1, leaf_quad(&hc, Quadrant::Nw));
        hc.retain(&leaf_nw);
        let mut children = [None, None, None, None];
        children[Quadrant::Nw.index()] = leaf_nw.clone();
        let parent = hc.canonicalize(2, children);
        hc.retain(&parent);
        assert_eq!(hc.table_len(1), 1);
        assert_eq!(hc.table_len(2), 1);

        hc.release(&parent);
        assert_eq!(hc.table_len(2), 0);
        // the cascade released the Nw leaf-node's one retained reference too
        if let Some(node) = &leaf_nw {
            assert_eq!(node.refcount(), 0);
        }
        assert_eq!(hc.table_len(1), 0);
    }

    #[test]
    fn on_leaf_is_never_evicted() {
        let mut hc = HashCons::new();
        let on = hc.on_leaf();
        hc.retain(&on);
        hc.release(&on);
        hc.release(&on); // would underflow if treated like a normal node
        assert!(hc.on_leaf().is_some());
    }
}
