use anyhow::{Result, anyhow};
use rand::Rng;

use super::TestScenario;
use crate::logic::grids::seeded_rng;
use crate::logic::{GridShape, GridSource, RunOutcome, RunPlan};
use gridwalk_game::{
    Direction, FallbackPolicy, Grid, NullRenderer, Position, RunSession, RunStatus, Step,
    VisitedSet,
};

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "Termination Sweep",
            random_plan().with_expectation(termination_expectation),
        ),
        TestScenario::new(
            "Halt Fallback Sweep",
            random_plan()
                .with_fallback(FallbackPolicy::Halt)
                .with_setup(preblock_cells)
                .with_expectation(termination_expectation)
                .with_expectation(halt_expectation),
        ),
        TestScenario::new(
            "Force-Up Fallback",
            random_plan()
                .with_setup(preblock_cells)
                .with_expectation(termination_expectation)
                .with_expectation(force_up_expectation),
        ),
        TestScenario::new(
            "Score Ledger",
            random_plan().with_expectation(score_ledger_expectation),
        ),
        TestScenario::new(
            "Vertical Bias",
            random_plan()
                .with_setup(preblock_cells)
                .with_expectation(vertical_bias_expectation),
        ),
        TestScenario::new(
            "Visited Exclusion",
            random_plan()
                .with_setup(preblock_cells)
                .with_expectation(visited_exclusion_expectation),
        ),
        TestScenario::new(
            "Reset Clears State",
            random_plan().with_expectation(reset_expectation),
        ),
    ]
}

pub fn find_catalog_scenario(name: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name == name)
}

fn random_plan() -> RunPlan {
    RunPlan::new(GridSource::Random(GridShape::default()))
}

/// Mark roughly a third of the grid as already visited before the first tick.
fn preblock_cells(session: &mut RunSession, seed: u64) {
    let mut rng = seeded_rng(seed.rotate_left(17));
    let (rows, cols) = (session.grid().rows(), session.grid().cols());
    let start = session.position();
    for row in 0..rows {
        for col in 0..cols {
            let pos = Position::new(row, col);
            if pos != start && rng.gen_bool(0.3) {
                session.state_mut().mark_visited(pos);
            }
        }
    }
}

/// Each step paired with the visited set as it stood before that step.
fn steps_with_visited(outcome: &RunOutcome) -> Vec<(Step, VisitedSet)> {
    let mut visited: VisitedSet = outcome.preblocked.iter().copied().collect();
    let mut pairs = Vec::with_capacity(outcome.summary.steps.len());
    for step in &outcome.summary.steps {
        pairs.push((*step, visited.clone()));
        visited.insert(step.to);
    }
    pairs
}

/// Straightforward restatement of the greedy rule used as an oracle.
fn reference_choice(
    grid: &Grid,
    from: Position,
    visited: &VisitedSet,
    threshold: i64,
) -> Option<Direction> {
    let eligible = |pos: Option<Position>| {
        pos.filter(|p| grid.contains(*p) && !visited.contains(p))
            .and_then(|p| grid.value(p))
    };
    let up = eligible(from.up());
    let left = eligible(from.left());
    let right = eligible(from.right());

    let mut best: Option<(Direction, i64)> = up.map(|value| (Direction::Up, value));
    let up_settles = matches!(best, Some((_, value)) if value < threshold);
    if !up_settles {
        for (direction, candidate) in [(Direction::Left, left), (Direction::Right, right)] {
            if let Some(value) = candidate {
                match best {
                    Some((_, current)) if value >= current => {}
                    _ => best = Some((direction, value)),
                }
            }
        }
    }
    best.map(|(direction, _)| direction)
}

fn termination_expectation(outcome: &RunOutcome) -> Result<()> {
    let summary = &outcome.summary;
    anyhow::ensure!(
        summary.status.is_finished(),
        "run still running after {} ticks",
        summary.ticks
    );
    anyhow::ensure!(
        summary.ticks as usize <= outcome.tick_budget,
        "run took {} ticks, budget {}",
        summary.ticks,
        outcome.tick_budget
    );
    for step in &summary.steps {
        anyhow::ensure!(
            step.to.row <= step.from.row,
            "tick {} moved down from {} to {}",
            step.tick,
            step.from,
            step.to
        );
    }
    if summary.status == RunStatus::ReachedTop {
        anyhow::ensure!(summary.position.row == 0, "reached top off row 0");
    }
    Ok(())
}

fn halt_expectation(outcome: &RunOutcome) -> Result<()> {
    if let Some(step) = outcome.summary.steps.iter().find(|step| step.forced) {
        return Err(anyhow!("halt policy forced a move at tick {}", step.tick));
    }
    Ok(())
}

fn force_up_expectation(outcome: &RunOutcome) -> Result<()> {
    anyhow::ensure!(
        outcome.summary.status == RunStatus::ReachedTop,
        "force-up runs always reach the top, ended {:?}",
        outcome.summary.status
    );
    for step in outcome.summary.steps.iter().filter(|step| step.forced) {
        anyhow::ensure!(
            step.direction == Direction::Up && step.to.row + 1 == step.from.row,
            "forced move at tick {} was not straight up",
            step.tick
        );
    }
    Ok(())
}

fn score_ledger_expectation(outcome: &RunOutcome) -> Result<()> {
    let mut running = 0i64;
    for step in &outcome.summary.steps {
        let value = outcome
            .grid
            .value(step.to)
            .ok_or_else(|| anyhow!("tick {} entered off-grid cell {}", step.tick, step.to))?;
        running += value;
        anyhow::ensure!(
            step.value == value && step.score == running,
            "tick {} recorded value {} score {}, expected {} and {}",
            step.tick,
            step.value,
            step.score,
            value,
            running
        );
    }
    anyhow::ensure!(
        outcome.summary.score == running,
        "final score {} but entered cells sum to {}",
        outcome.summary.score,
        running
    );
    Ok(())
}

fn vertical_bias_expectation(outcome: &RunOutcome) -> Result<()> {
    let threshold = outcome.config.vertical_threshold;
    for (step, visited) in steps_with_visited(outcome) {
        if step.forced {
            continue;
        }
        let expected = reference_choice(&outcome.grid, step.from, &visited, threshold);
        anyhow::ensure!(
            expected == Some(step.direction),
            "tick {} at {} moved {:?}, greedy rule picks {:?}",
            step.tick,
            step.from,
            step.direction,
            expected
        );
    }
    Ok(())
}

fn visited_exclusion_expectation(outcome: &RunOutcome) -> Result<()> {
    for (step, visited) in steps_with_visited(outcome) {
        anyhow::ensure!(
            step.forced || !visited.contains(&step.to),
            "tick {} re-entered visited cell {}",
            step.tick,
            step.to
        );
    }
    Ok(())
}

fn reset_expectation(outcome: &RunOutcome) -> Result<()> {
    let mut session = outcome.replay()?;
    for _ in 0..3 {
        session.tick();
    }
    let cols = outcome.grid.cols();
    let next_column = (outcome.config.start_column + 1) % cols;
    session.reset(next_column)?;

    anyhow::ensure!(session.score() == 0, "score survived reset");
    anyhow::ensure!(session.steps().is_empty(), "steps survived reset");
    anyhow::ensure!(
        session.state().visited.is_empty(),
        "visited set after reset was {:?}",
        session.state().visited
    );

    let after_reset = session.run_to_completion(&mut NullRenderer);
    let mut config = outcome.config.clone();
    config.start_column = next_column;
    let fresh = RunSession::new(outcome.grid.clone(), config)?.run_to_completion(&mut NullRenderer);
    anyhow::ensure!(
        after_reset == fresh,
        "run after reset diverged from a fresh run"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GameTester;

    #[test]
    fn catalog_scenarios_pass_across_seeds() {
        let tester = GameTester::try_new(false);
        for scenario in catalog_scenarios() {
            for seed in 0..40 {
                let outcome = tester.run_plan(&scenario.plan, seed).unwrap();
                for expectation in &scenario.plan.expectations {
                    expectation
                        .check(&outcome)
                        .unwrap_or_else(|err| panic!("{} seed {seed}: {err:#}", scenario.name));
                }
            }
        }
    }

    #[test]
    fn reference_choice_prefers_up_below_threshold() {
        let grid = Grid::from_rows(vec![vec![0, 4, 0], vec![-9, 9, -9]]).unwrap();
        let choice = reference_choice(&grid, Position::new(1, 1), &VisitedSet::new(), 5);
        assert_eq!(choice, Some(Direction::Up));
        let choice = reference_choice(&grid, Position::new(1, 1), &VisitedSet::new(), 4);
        assert_eq!(choice, Some(Direction::Left));
    }

    #[test]
    fn vertical_bias_flags_a_wrong_direction() {
        let tester = GameTester::try_new(false);
        let plan = RunPlan::new(GridSource::Inline(vec![vec![1, 1], vec![2, 2]]))
            .with_column(0)
            .with_threshold(10);
        let mut outcome = tester.run_plan(&plan, 0).unwrap();
        outcome.summary.steps[0].direction = Direction::Right;
        assert!(vertical_bias_expectation(&outcome).is_err());
    }

    #[test]
    fn preblocking_never_covers_the_start() {
        let grid = Grid::from_rows(vec![vec![0; 6]; 6]).unwrap();
        for seed in 0..20 {
            let mut session =
                RunSession::new(grid.clone(), gridwalk_game::RunConfig::new(3, 0)).unwrap();
            preblock_cells(&mut session, seed);
            assert_eq!(session.position(), Position::new(5, 3));
            assert_eq!(session.status(), RunStatus::Running);
        }
    }
}
