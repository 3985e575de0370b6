/*!
A [HashLife](https://en.wikipedia.org/wiki/Hashlife) engine for two-state,
nine-neighbourhood cellular automata, such as Conway's Game of Life.

HashLife (Gosper, 1984) simulates such automata on an unbounded grid by
recursively decomposing space into a canonical, content-addressed quadtree
(a *macrocell* graph) and memoizing each node's future: a macrocell of side
`2^h` knows, once asked, its own concentric `2^(h-2)`-generations-ahead
successor. Patterns with spatial or temporal regularity (still lifes,
oscillators, and the vast empty vacuum surrounding most real patterns)
collapse to a handful of shared nodes, and growing, repetitive patterns
(an [R-pentomino](https://conwaylife.com/wiki/R-pentomino), an
[Acorn](https://conwaylife.com/wiki/Acorn)) can be advanced by millions of
generations in a fraction of the time a cell-by-cell simulator would need.

This crate is the HashLife *core*: the macrocell hashcons graph, the
RESULT-computation recursion, cell mutation with universe
expansion/containment, and window/instant exploration ("SHOW"). Rule
parsing and RLE pattern loading are included as thin, idiomatic wrappers
around that core (see [`rule`] and [`rle`]); 256-bit big-integer
arithmetic is supplied by the `ethnum` crate via the [`bigint`] module.

# Example

```
use hashlife::{Universe, Window};
use hashlife::bigint::{IBig, UBig};

let mut universe = Universe::new(); // rule B3/S23

// A blinker.
universe.cell_set(IBig::from(0i64), IBig::from(0i64));
universe.cell_set(IBig::from(1i64), IBig::from(0i64));
universe.cell_set(IBig::from(2i64), IBig::from(0i64));

struct CountCells(u64);
impl hashlife::ExploreCallbacks for CountCells {
    fn foreach(&mut self, _x: IBig, _y: IBig) {
        self.0 += 1;
    }
}

let mut counter = CountCells(0);
universe.explore(Window::everything(), UBig::ONE, &mut counter);
assert_eq!(counter.0, 3); // the blinker has rotated, but is still three cells
```
*/

pub mod bigint;
mod error;
mod evolver;
mod explorer;
mod hashcons;
mod mutator;
mod node;
mod rle;
mod rule;

pub use error::Error;
pub use explorer::{ExploreCallbacks, Window};
pub use node::Quadrant;
pub use rule::Rule;

use bigint::{IBig, UBig};
use hashcons::HashCons;
use node::CellHandle;

/// A HashLife universe: a canonical macrocell graph, its current root, and
/// the rule it evolves under. See the crate-level docs and `SPEC_FULL.md`
/// for the algorithm this implements.
pub struct Universe {
    hc: HashCons,
    root: CellHandle,
    height: u16,
    x0: IBig,
    y0: IBig,
    rule: Rule,
}

impl Universe {
    /// Creates a new, empty universe under Conway's Game of Life (`B3/S23`).
    pub fn new() -> Self {
        Universe { hc: HashCons::new(), root: None, height: 0, x0: IBig::ZERO, y0: IBig::ZERO, rule: Rule::life() }
    }

    /// Drops every cell and every cached node, but keeps the current rule.
    pub fn reinitialize(&mut self) {
        log::debug!("reinitializing universe");
        self.hc = HashCons::new();
        self.root = None;
        self.height = 0;
        self.x0 = IBig::ZERO;
        self.y0 = IBig::ZERO;
    }

    /// The current rule, as `(B, S)` neighbour-count lists.
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Replaces the rule with one built from explicit birth/survival
    /// neighbour-count lists, and flushes every memoized RESULT (per
    /// `SPEC_FULL.md` §9, Open Question 1: the source's failure to do this
    /// is a latent bug, resolved here by always flushing).
    pub fn set_rule(&mut self, b: &[u8], s: &[u8]) -> Result<(), Error> {
        self.install_rule(Rule::new(b, s));
        Ok(())
    }

    /// Replaces the rule by parsing a `Bddd/Sddd` rule string.
    pub fn set_rule_str(&mut self, rule: &str) -> Result<(), Error> {
        let parsed = Rule::from_str(rule)?;
        self.install_rule(parsed);
        Ok(())
    }

    fn install_rule(&mut self, rule: Rule) {
        log::debug!("rule changed to {}", rule.to_rule_string());
        self.rule = rule;
        self.hc.flush_results();
    }

    /// Sets the cell at `(x, y)` alive, expanding the universe if needed.
    pub fn cell_set(&mut self, x: IBig, y: IBig) {
        log::trace!("cell_set({x}, {y})");
        mutator::cell_set(&mut self.hc, &mut self.root, &mut self.height, &mut self.x0, &mut self.y0, x, y);
    }

    /// Sets the cell at `(x, y)` dead.
    pub fn cell_unset(&mut self, x: IBig, y: IBig) {
        log::trace!("cell_unset({x}, {y})");
        mutator::cell_unset(&mut self.hc, &mut self.root, &mut self.height, &mut self.x0, &mut self.y0, x, y);
    }

    /// Reports whether the cell at `(x, y)` is alive.
    pub fn cell_is_set(&self, x: IBig, y: IBig) -> bool {
        mutator::cell_is_set(&self.root, self.height, self.x0, self.y0, x, y)
    }

    /// The total live population of the universe.
    pub fn population(&self) -> UBig {
        node::population(&self.root)
    }

    /// The live population restricted to `window` (§4.5 "Populations").
    pub fn population_in_window(&self, window: Window) -> UBig {
        explorer::population_in_window(&self.root, self.height, self.x0, self.y0, window)
    }

    /// Parses `source` as an RLE pattern and seeds the universe with it,
    /// placing its north-west corner at `(x0, y0)`. Reinitializes the
    /// universe first (dropping any existing cells and cache), matching
    /// `universe_RLE_readfile` in `original_source/hgolbi.c`. If the header
    /// names a rule, that rule replaces the current one. Returns the
    /// number of cells set.
    pub fn load_rle(&mut self, source: &str, x0: IBig, y0: IBig, has_header: bool) -> Result<UBig, Error> {
        let parsed = rle::parse(source, x0, y0, has_header)?;
        self.reinitialize();
        if let Some(rule) = parsed.rule {
            self.install_rule(rule);
        }
        for (x, y) in &parsed.cells {
            self.cell_set(*x, *y);
        }
        Ok(UBig::from(parsed.cells.len() as u64))
    }

    /// Renders the live cells in `window` at `instant` as an RLE pattern
    /// (inverse of [`Universe::load_rle`]), with a
    /// `x = W, y = H, rule = Bddd/Sddd` header. `window` must be a finite,
    /// reasonably small rectangle; see [`rle::write`].
    pub fn write_rle(&mut self, window: Window, instant: UBig) -> Result<String, Error> {
        struct Collect(Vec<(IBig, IBig)>);
        impl ExploreCallbacks for Collect {
            fn foreach(&mut self, x: IBig, y: IBig) {
                self.0.push((x, y));
            }
        }
        let mut collector = Collect(Vec::new());
        self.explore(window, instant, &mut collector);
        rle::write(window, &self.rule, &collector.0)
    }

    /// Enumerates, in ascending `(y, x)` order, every live cell in `window`
    /// at `instant`, invoking `callbacks` and returning the count. See
    /// `SPEC_FULL.md` §4.5.
    pub fn explore(&mut self, window: Window, instant: UBig, callbacks: &mut dyn ExploreCallbacks) -> UBig {
        explorer::explore(&mut self.hc, &self.rule, &mut self.root, &mut self.height, &mut self.x0, &mut self.y0, window, instant, callbacks)
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}
