use gridwalk_game::{
    FallbackPolicy, Grid, NullRenderer, Position, RunConfig, RunSession, RunStatus, TickOutcome,
    VisitedSet, select_move,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_grid(rng: &mut ChaCha8Rng) -> Grid {
    let rows = rng.gen_range(1..=8);
    let cols = rng.gen_range(1..=8);
    let data = (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen_range(-9..=20)).collect())
        .collect();
    Grid::from_rows(data).unwrap()
}

#[test]
fn random_runs_terminate_within_budget() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x0C0F_FEE5);
    for _ in 0..500 {
        let grid = random_grid(&mut rng);
        let column = rng.gen_range(0..grid.cols());
        let threshold = rng.gen_range(-15..=25);
        let fallback = if rng.gen_bool(0.5) {
            FallbackPolicy::ForceUp
        } else {
            FallbackPolicy::Halt
        };
        let config = RunConfig::new(column, threshold).with_fallback(fallback);
        let mut session = RunSession::new(grid, config).unwrap();
        let budget = session.tick_budget();

        let mut ticks = 0usize;
        while !session.is_finished() {
            let before = session.position();
            let outcome = session.tick();
            ticks += 1;
            assert!(ticks <= budget, "run exceeded tick budget {budget}");
            if let Some(step) = outcome.step() {
                assert!(step.to.row <= before.row, "marker never moves down");
                if step.to.row == before.row {
                    assert_eq!(step.to.col.abs_diff(before.col), 1);
                }
            }
        }
        assert!(matches!(
            session.status(),
            RunStatus::ReachedTop | RunStatus::Blocked
        ));
    }
}

#[test]
fn score_is_sum_of_entered_cells() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..200 {
        let grid = random_grid(&mut rng);
        let column = rng.gen_range(0..grid.cols());
        let mut session = RunSession::new(grid.clone(), RunConfig::new(column, 5)).unwrap();
        let summary = session.run_to_completion(&mut NullRenderer);

        let expected: i64 = summary
            .steps
            .iter()
            .map(|step| grid.value(step.to).unwrap())
            .sum();
        assert_eq!(summary.score, expected);
        assert_eq!(summary.ticks as usize, summary.steps.len());
    }
}

#[test]
fn selector_never_returns_visited_cells() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..300 {
        let grid = random_grid(&mut rng);
        let pos = Position::new(
            rng.gen_range(0..grid.rows()),
            rng.gen_range(0..grid.cols()),
        );
        let mut visited = VisitedSet::new();
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                if rng.gen_bool(0.4) {
                    visited.insert(Position::new(row, col));
                }
            }
        }
        let threshold = rng.gen_range(-10..=20);
        if let Some(next) = select_move(&grid, pos, &visited, threshold) {
            assert!(!visited.contains(&next));
            assert!(grid.contains(next));
            let dr = pos.row - next.row;
            assert!(dr <= 1);
        }
    }
}

#[test]
fn up_below_threshold_always_wins() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for _ in 0..300 {
        let grid = random_grid(&mut rng);
        if grid.rows() < 2 {
            continue;
        }
        let pos = Position::new(
            rng.gen_range(1..grid.rows()),
            rng.gen_range(0..grid.cols()),
        );
        let up = pos.up().unwrap();
        let threshold = grid.value(up).unwrap() + 1;
        let pick = select_move(&grid, pos, &VisitedSet::new(), threshold);
        assert_eq!(pick, Some(up));
    }
}

#[test]
fn example_bottom_row_walk() {
    // Bottom row [5, 2, 9] from the first column with a generous threshold
    // climbs straight up and scores exactly the entered cell.
    let grid = Grid::from_rows(vec![vec![3, 3, 3], vec![5, 2, 9]]).unwrap();
    let mut session = RunSession::new(grid, RunConfig::new(0, 100)).unwrap();
    let outcome = session.tick();
    let TickOutcome::Moved(step) = outcome else {
        panic!("expected a move, got {outcome:?}");
    };
    assert_eq!(step.to, Position::new(0, 0));
    assert_eq!(session.score(), 3);

    // With a threshold below every cell the sides compete against up.
    let grid = Grid::from_rows(vec![vec![3, 3, 3], vec![5, 2, 9]]).unwrap();
    let mut session = RunSession::new(grid, RunConfig::new(0, 0)).unwrap();
    let first = *session.tick().step().unwrap();
    assert_eq!(first.to, Position::new(1, 1));
    assert_eq!(session.score(), 2);
}

#[test]
fn reset_before_first_tick_of_next_run() {
    let grid = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]).unwrap();
    let mut session = RunSession::new(grid, RunConfig::new(2, 4)).unwrap();
    session.tick();
    session.tick();
    assert!(session.score() != 0);

    session.reset(0).unwrap();
    assert_eq!(session.score(), 0);
    assert_eq!(session.state().visited, VisitedSet::new());
    assert_eq!(session.position(), Position::new(2, 0));

    let step = *session.tick().step().unwrap();
    assert_eq!(step.score, step.value);
}
