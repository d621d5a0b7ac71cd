//! Smoke scenarios
//!
//! Each scenario is a linear script of CLI invocations, git pushes and HTTP
//! checks. Any failed command or assertion ends the scenario immediately;
//! only the convergence checks poll.

mod databases;
mod deploy;
mod runner;

pub use runner::{run_scenario, run_with, RunOptions, ScenarioContext, ScenarioReport, StepLog};

/// The scenarios this runner knows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Database provision, scale and delete
    Databases,
    /// Full app deploy, config round trip, hot upgrade, scale to zero
    Deploy,
}

impl ScenarioKind {
    pub fn all() -> [ScenarioKind; 2] {
        [ScenarioKind::Databases, ScenarioKind::Deploy]
    }

    pub fn name(self) -> &'static str {
        match self {
            ScenarioKind::Databases => "databases",
            ScenarioKind::Deploy => "deploy",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ScenarioKind::Databases => {
                "Create, scale and delete a database on an existing idle app"
            }
            ScenarioKind::Deploy => {
                "Deploy the getting-started app, manage configs, hot upgrade, scale to zero"
            }
        }
    }

    /// Number of reported steps
    pub fn steps_total(self) -> usize {
        match self {
            ScenarioKind::Databases => databases::STEPS,
            ScenarioKind::Deploy => deploy::STEPS,
        }
    }
}
