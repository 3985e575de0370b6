use hashlife::bigint::{IBig, UBig};
use hashlife::{ExploreCallbacks, Universe, Window};

#[derive(Default)]
struct Collector {
    cells: Vec<(IBig, IBig)>,
}

impl ExploreCallbacks for Collector {
    fn foreach(&mut self, x: IBig, y: IBig) {
        self.cells.push((x, y));
    }
}

fn explore_sorted(universe: &mut Universe, window: Window, instant: UBig) -> Vec<(IBig, IBig)> {
    let mut collector = Collector::default();
    universe.explore(window, instant, &mut collector);
    collector.cells.sort();
    collector.cells
}

fn ibig(v: i64) -> IBig {
    IBig::from(v)
}

#[test]
fn block_is_a_still_life() {
    let mut universe = Universe::new();
    for (x, y) in [(0i64, 0i64), (1, 0), (0, 1), (1, 1)] {
        universe.cell_set(ibig(x), ibig(y));
    }

    let start = explore_sorted(&mut universe, Window::everything(), UBig::ZERO);
    for t in [1u64, 2, 10, 100] {
        assert_eq!(explore_sorted(&mut universe, Window::everything(), UBig::from(t)), start);
    }
}

#[test]
fn glider_translates_by_one_one_every_four_generations() {
    let mut universe = Universe::new();
    for (x, y) in [(0i64, 0i64), (1, 0), (2, 0), (2, 1), (1, 2)] {
        universe.cell_set(ibig(x), ibig(y));
    }

    let start = explore_sorted(&mut universe, Window::everything(), UBig::ZERO);
    let after_four = explore_sorted(&mut universe, Window::everything(), UBig::from(4u64));

    let mut expected: Vec<(IBig, IBig)> = start.iter().map(|&(x, y)| (x + IBig::ONE, y + IBig::ONE)).collect();
    expected.sort();
    assert_eq!(after_four, expected);
}

#[test]
fn r_pentomino_reaches_population_116_at_generation_1103() {
    let mut universe = Universe::new();
    for (x, y) in [(1i64, 0i64), (2, 0), (0, 1), (1, 1), (1, 2)] {
        universe.cell_set(ibig(x), ibig(y));
    }

    let population = universe.explore(Window::everything(), UBig::from(1103u64), &mut Collector::default());
    assert_eq!(population, UBig::from(116u64));
}

#[test]
fn r_pentomino_has_shed_a_glider_by_generation_69() {
    let mut universe = Universe::new();
    for (x, y) in [(1i64, 0i64), (2, 0), (0, 1), (1, 1), (1, 2)] {
        universe.cell_set(ibig(x), ibig(y));
    }

    // By t=69 a glider has separated from the still-evolving central ash.
    // Rather than guess which of the four diagonal directions it escaped
    // in, compare the total population against a generous box around the
    // origin: if some live cells fall outside it, something has escaped.
    let total = universe.explore(Window::everything(), UBig::from(69u64), &mut Collector::default());
    let central_box = Window::new((ibig(-40), ibig(-40)), (ibig(40), ibig(40)));
    let inside = universe.explore(central_box, UBig::from(69u64), &mut Collector::default());
    assert!(inside < total, "expected at least one cell outside the central box, found {inside} of {total}");
}

#[test]
fn acorn_reaches_population_633_at_generation_5206() {
    let mut universe = Universe::new();
    let set = universe.load_rle("bo5b$3bo3b$2o2b3o!", IBig::ZERO, IBig::ZERO, false).unwrap();
    assert_eq!(set, UBig::from(7u64));

    let population = universe.explore(Window::everything(), UBig::from(5206u64), &mut Collector::default());
    assert_eq!(population, UBig::from(633u64));
}

#[test]
fn explore_window_containment_excludes_or_includes_a_remote_cell() {
    let mut universe = Universe::new();
    let far = IBig::from(1_000_000_000_000_000_000i64);
    universe.cell_set(far, far);

    let small_window = Window::new((IBig::ZERO, IBig::ZERO), (IBig::ONE, IBig::ONE));
    assert!(explore_sorted(&mut universe, small_window, UBig::ZERO).is_empty());

    let covering_window = Window::new((far - IBig::ONE, far - IBig::ONE), (far + IBig::ONE, far + IBig::ONE));
    assert_eq!(explore_sorted(&mut universe, covering_window, UBig::ZERO), vec![(far, far)]);
}
