pub mod game_tester;
pub mod grids;
pub mod reports;
pub mod tester;

pub use game_tester::{GameTester, GridSource, RunOutcome, RunPlan, TesterAssets};
pub use grids::GridShape;
pub use tester::*;
