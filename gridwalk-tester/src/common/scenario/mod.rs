pub mod catalog;
pub mod smoke;

use crate::logic::RunPlan;
use catalog::find_catalog_scenario;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: RunPlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, plan: RunPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke::smoke_scenario()),
        "termination-sweep" | "termination" => find_catalog_scenario("Termination Sweep"),
        "halt-fallback" | "halt" => find_catalog_scenario("Halt Fallback Sweep"),
        "force-up-fallback" | "force-up" => find_catalog_scenario("Force-Up Fallback"),
        "score-ledger" | "score" => find_catalog_scenario("Score Ledger"),
        "vertical-bias" | "bias" => find_catalog_scenario("Vertical Bias"),
        "visited-exclusion" | "visited" => find_catalog_scenario("Visited Exclusion"),
        "reset-clears-state" | "reset" => find_catalog_scenario("Reset Clears State"),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("termination-sweep", "Termination Sweep"),
        ("halt-fallback", "Halt Fallback Sweep"),
        ("force-up-fallback", "Force-Up Fallback"),
        ("score-ledger", "Score Ledger"),
        ("vertical-bias", "Vertical Bias"),
        ("visited-exclusion", "Visited Exclusion"),
        ("reset-clears-state", "Reset Clears State"),
    ]
}
