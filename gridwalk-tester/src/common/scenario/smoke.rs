use anyhow::Result;

use super::TestScenario;
use crate::logic::{GridSource, RunOutcome, RunPlan};
use gridwalk_game::RunStatus;

pub fn smoke_scenario() -> TestScenario {
    TestScenario::new(
        "Smoke Test",
        RunPlan::new(GridSource::Default)
            .with_threshold(gridwalk_game::constants::DEFAULT_VERTICAL_THRESHOLD)
            .with_expectation(smoke_expectation),
    )
}

fn smoke_expectation(outcome: &RunOutcome) -> Result<()> {
    let summary = &outcome.summary;
    anyhow::ensure!(
        summary.status == RunStatus::ReachedTop,
        "run on the default grid should reach the top row, ended {:?}",
        summary.status
    );
    anyhow::ensure!(
        summary.position.row == 0,
        "marker should finish on row 0, got {}",
        summary.position
    );
    anyhow::ensure!(
        summary.ticks as usize <= outcome.tick_budget,
        "run took {} ticks, budget {}",
        summary.ticks,
        outcome.tick_budget
    );
    Ok(())
}
