//! Drivers that invoke [`RunSession::tick_with`] on some cadence.
//!
//! The step function knows nothing about time; these helpers decide when it
//! runs. [`drive_to_completion`] ticks back to back, which is what tests and
//! batch simulations want. With the `async` feature, [`drive_on_interval`]
//! ticks on a tokio interval at the run's configured cadence.
use crate::constants::LOG_TARGET_RUN;
use crate::render::Renderer;
use crate::run::{RunSummary, TickOutcome};
use crate::session::RunSession;

/// Tick until the run leaves `Running` or the tick budget is spent.
pub fn drive_to_completion<R: Renderer + ?Sized>(
    session: &mut RunSession,
    renderer: &mut R,
) -> RunSummary {
    let budget = session.tick_budget();
    let mut spent = 0usize;
    while !session.is_finished() && spent < budget {
        if matches!(session.tick_with(renderer), TickOutcome::Idle) {
            break;
        }
        spent += 1;
    }
    if !session.is_finished() {
        log::warn!(
            target: LOG_TARGET_RUN,
            "tick budget of {budget} exhausted at {}",
            session.position()
        );
    }
    session.summary()
}

/// Tick once per `config.tick_interval` until the run finishes.
///
/// Ticks are awaited one after another so they never overlap. A run that is
/// already finished returns immediately.
#[cfg(feature = "async")]
pub async fn drive_on_interval<R: Renderer + ?Sized>(
    session: &mut RunSession,
    renderer: &mut R,
) -> RunSummary {
    use std::time::Duration;
    use tokio::time::{MissedTickBehavior, interval};

    let budget = session.tick_budget();
    let period = session.config().tick_interval.max(Duration::from_millis(1));
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick completes immediately; skip it so the first
    // move lands one period after start.
    timer.tick().await;

    let mut spent = 0usize;
    while !session.is_finished() && spent < budget {
        timer.tick().await;
        session.tick_with(renderer);
        spent += 1;
    }
    session.summary()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, Position};
    use crate::render::{NullRenderer, TraceRenderer};
    use crate::run::{FallbackPolicy, RunConfig, RunStatus};

    #[test]
    fn drive_to_completion_stops_on_blocked_run() {
        let grid = Grid::from_rows(vec![vec![1], vec![2], vec![3]]).unwrap();
        let config = RunConfig::new(0, 0).with_fallback(FallbackPolicy::Halt);
        let mut session = RunSession::new(grid, config).unwrap();
        session.state_mut().mark_visited(Position::new(1, 0));

        let mut trace = TraceRenderer::new();
        let summary = drive_to_completion(&mut session, &mut trace);
        assert_eq!(summary.status, RunStatus::Blocked);
        assert_eq!(summary.ticks, 0);
        assert_eq!(trace.finish, Some((RunStatus::Blocked, 0)));
    }

    #[test]
    fn drive_to_completion_on_finished_run_is_a_no_op() {
        let grid = Grid::from_rows(vec![vec![4, 2]]).unwrap();
        let mut session = RunSession::new(grid, RunConfig::new(1, 0)).unwrap();
        let summary = drive_to_completion(&mut session, &mut NullRenderer);
        assert_eq!(summary.status, RunStatus::ReachedTop);
        assert!(summary.steps.is_empty());
        assert_eq!(summary.score, 0);
    }

    #[cfg(feature = "async")]
    #[test]
    fn drive_on_interval_reaches_top() {
        use std::time::Duration;

        let grid = Grid::from_rows(vec![vec![1, 1], vec![2, 2], vec![3, 3]]).unwrap();
        let config = RunConfig::new(1, 10).with_tick_interval(Duration::from_millis(1));
        let mut session = RunSession::new(grid, config).unwrap();
        let mut trace = TraceRenderer::new();

        let summary = tokio_test::block_on(drive_on_interval(&mut session, &mut trace));
        assert_eq!(summary.status, RunStatus::ReachedTop);
        assert_eq!(summary.score, 3);
        assert_eq!(trace.steps.len(), 2);
    }
}
