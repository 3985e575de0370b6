//! The macrocell: an immutable, content-addressed quadtree node.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::bigint::UBig;

/// One of the four quadrants of a macrocell, in the usual compass layout
/// (`x` grows east, `y` grows south).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant::Nw, Quadrant::Ne, Quadrant::Sw, Quadrant::Se];

    /// Index into a `[T; 4]` children array, matching the bit order used by
    /// the 4x4 rule table (`NW -> 0, NE -> 1, SW -> 2, SE -> 3`).
    pub fn index(self) -> usize {
        match self {
            Quadrant::Nw => 0,
            Quadrant::Ne => 1,
            Quadrant::Sw => 2,
            Quadrant::Se => 3,
        }
    }

    /// The quadrant containing a point, given that the origin splits the
    /// box into four equal halves (`false` = north/west half, `true` =
    /// south/east half).
    pub fn of(east: bool, south: bool) -> Quadrant {
        match (south, east) {
            (false, false) => Quadrant::Nw,
            (false, true) => Quadrant::Ne,
            (true, false) => Quadrant::Sw,
            (true, true) => Quadrant::Se,
        }
    }

    /// Whether this quadrant is on the east half.
    pub fn is_east(self) -> bool {
        matches!(self, Quadrant::Ne | Quadrant::Se)
    }

    /// Whether this quadrant is on the south half.
    pub fn is_south(self) -> bool {
        matches!(self, Quadrant::Sw | Quadrant::Se)
    }

    /// The diagonally opposite quadrant, used when re-embedding a root
    /// centred inside a freshly expanded universe.
    pub fn opposite(self) -> Quadrant {
        match self {
            Quadrant::Nw => Quadrant::Se,
            Quadrant::Ne => Quadrant::Sw,
            Quadrant::Sw => Quadrant::Ne,
            Quadrant::Se => Quadrant::Nw,
        }
    }
}

/// A handle to a macrocell, or the absence of one. `None` is the canonical
/// "all dead" subtree at whatever height it is used: there is a single
/// absent value shared at every height, per the empty-elision invariant.
pub type CellHandle = Option<Rc<Macrocell>>;

/// The population of a (possibly absent) subtree.
pub fn population(handle: &CellHandle) -> UBig {
    match handle {
        None => UBig::ZERO,
        Some(node) => node.population,
    }
}

/// The children of a macrocell: either the singleton live leaf (height 0)
/// or four height-`h-1` handles (height `h >= 1`).
#[derive(Debug)]
pub enum Children {
    Leaf,
    Branch([CellHandle; 4]),
}

/// An immutable `2^height x 2^height` square of cells.
///
/// Nodes are always reached through a [`CellHandle`]; they are created and
/// deduplicated exclusively by [`crate::hashcons::HashCons`], which is the
/// only code allowed to construct one.
#[derive(Debug)]
pub struct Macrocell {
    pub height: u16,
    pub children: Children,
    pub population: UBig,
    /// The memoized `result(m, height)`, i.e. the concentric
    /// `2^(height-2)`-generations-ahead successor. `RefCell<None>` is
    /// "not yet computed"; `RefCell<Some(None))`, i.e. an inner `None`, is
    /// "computed, and it is the empty macrocell". Undefined (never read)
    /// for `height < 2`.
    pub(crate) result: RefCell<Option<CellHandle>>,
    /// Number of slots in the *live* universe tree (root pointer or a
    /// parent's child slot) currently referencing this node. Distinct from
    /// the node's `Rc` strong count, which also counts the weak-like
    /// references held by `result` caches; see `SPEC_FULL.md` §4.6/§5.
    pub(crate) refcount: Cell<u64>,
}

impl Macrocell {
    pub fn is_leaf(&self) -> bool {
        matches!(self.children, Children::Leaf)
    }

    pub fn child(&self, q: Quadrant) -> &CellHandle {
        match &self.children {
            Children::Branch(children) => &children[q.index()],
            Children::Leaf => panic!("height-0 leaves have no children"),
        }
    }

    pub fn children(&self) -> &[CellHandle; 4] {
        match &self.children {
            Children::Branch(children) => children,
            Children::Leaf => panic!("height-0 leaves have no children"),
        }
    }

    /// The cached result, if already computed. `Some(None)` means "computed
    /// and empty"; `None` means "not yet computed".
    pub(crate) fn cached_result(&self) -> Option<CellHandle> {
        self.result.borrow().clone()
    }

    pub(crate) fn set_cached_result(&self, result: CellHandle) {
        *self.result.borrow_mut() = Some(result);
    }

    /// Clears the memoized result, forcing the next `result()` call to
    /// recompute it. Used when the rule changes.
    pub(crate) fn invalidate_result(&self) {
        *self.result.borrow_mut() = None;
    }

    pub fn refcount(&self) -> u64 {
        self.refcount.get()
    }
}

/// Identity equality: two handles are "the same node" iff they point at the
/// same allocation. Canonicality (invariant 1) relies on identity, not
/// structural recursion, since children are already canonical.
pub fn same_node(a: &CellHandle, b: &CellHandle) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}
