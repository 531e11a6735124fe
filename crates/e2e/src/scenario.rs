//! Lifecycle scenario orchestration
//!
//! Sequences the session gate, the lifecycle driver, and the consistency
//! verifier into one all-or-nothing scenario: login → create (capture the
//! identifier) → backend read-back → update job title → delete → confirm
//! absence. Each step's success is a precondition for the next; the first
//! failure aborts the run, and the report names the step it died in.

use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use crate::api::{PimClient, StatusOutcome};
use crate::bridge::BridgeConfig;
use crate::driver::EmployeeDriver;
use crate::error::LifecycleResult;
use crate::locators::Locators;
use crate::session::{Session, SessionConfig};

/// Everything one scenario run needs.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub session: SessionConfig,
    pub bridge: BridgeConfig,
    pub locators: Locators,

    pub username: String,
    pub password: String,

    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            bridge: BridgeConfig::default(),
            locators: Locators::default(),
            username: "Admin".to_string(),
            password: "admin123".to_string(),
            first_name: "Manjeet".to_string(),
            last_name: "Singh".to_string(),
            job_title: "QA Engineer".to_string(),
        }
    }
}

/// Timing record for one completed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub duration_ms: u64,
}

impl StepReport {
    fn finished(name: &str, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Single pass/fail outcome of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub passed: bool,
    /// Identifier captured at creation, if the scenario got that far.
    pub employee_id: Option<String>,
    pub steps: Vec<StepReport>,
    pub failed_step: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Runs the employee lifecycle end to end.
pub struct LifecycleScenario {
    config: ScenarioConfig,
}

impl LifecycleScenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    /// Execute the scenario. Never panics; failures land in the report.
    pub async fn run(&self) -> ScenarioReport {
        let start = Instant::now();
        let mut steps = Vec::new();
        let mut employee_id = None;
        let mut current_step = String::new();

        let result = self
            .execute(&mut steps, &mut employee_id, &mut current_step)
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(duration_ms, "lifecycle scenario passed");
                ScenarioReport {
                    passed: true,
                    employee_id,
                    steps,
                    failed_step: None,
                    error: None,
                    duration_ms,
                }
            }
            Err(e) => {
                error!(step = %current_step, error = %e, "lifecycle scenario failed");
                ScenarioReport {
                    passed: false,
                    employee_id,
                    steps,
                    failed_step: Some(current_step),
                    error: Some(e.to_string()),
                    duration_ms,
                }
            }
        }
    }

    async fn execute(
        &self,
        steps: &mut Vec<StepReport>,
        employee_id_out: &mut Option<String>,
        current_step: &mut String,
    ) -> LifecycleResult<()> {
        let config = &self.config;

        *current_step = "login".to_string();
        let step_start = Instant::now();
        let mut session = Session::login(
            &config.session,
            &config.bridge,
            &config.locators,
            &config.username,
            &config.password,
        )
        .await?;
        let api = PimClient::from_session(&mut session).await?;
        steps.push(StepReport::finished("login", step_start));

        let mut driver = EmployeeDriver::new(&mut session, config.locators.clone());

        *current_step = "create employee".to_string();
        let step_start = Instant::now();
        let employee_id = driver
            .create_employee(&config.first_name, &config.last_name)
            .await?;
        *employee_id_out = Some(employee_id.clone());
        steps.push(StepReport::finished("create employee", step_start));

        // Sanity check: the captured identifier must already resolve
        // server-side before any further mutation.
        *current_step = "verify employee served".to_string();
        let step_start = Instant::now();
        api.expect_status(&employee_id, StatusOutcome::Ok).await?;
        steps.push(StepReport::finished("verify employee served", step_start));

        *current_step = "update job title".to_string();
        let step_start = Instant::now();
        driver.update_job_title(&employee_id, &config.job_title).await?;
        steps.push(StepReport::finished("update job title", step_start));

        *current_step = "delete employee".to_string();
        let step_start = Instant::now();
        driver.delete_employee(&employee_id).await?;
        steps.push(StepReport::finished("delete employee", step_start));

        *current_step = "confirm absence".to_string();
        let step_start = Instant::now();
        api.confirm_absence(&employee_id).await?;
        steps.push(StepReport::finished("confirm absence", step_start));

        *current_step = "close session".to_string();
        session.close().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_the_reference_scenario() {
        let config = ScenarioConfig::default();
        assert_eq!(config.username, "Admin");
        assert_eq!(config.password, "admin123");
        assert_eq!(config.first_name, "Manjeet");
        assert_eq!(config.last_name, "Singh");
        assert_eq!(config.job_title, "QA Engineer");
    }

    #[tokio::test]
    async fn invalid_credentials_fail_in_the_login_step() {
        let scenario = LifecycleScenario::new(ScenarioConfig {
            username: String::new(),
            ..Default::default()
        });
        let report = scenario.run().await;

        assert!(!report.passed);
        assert_eq!(report.failed_step.as_deref(), Some("login"));
        assert_eq!(
            report.error.as_deref(),
            Some("Username and password must be non-empty")
        );
        assert!(report.steps.is_empty());
        assert!(report.employee_id.is_none());
    }

    #[test]
    fn report_serializes_for_the_runner() {
        let report = ScenarioReport {
            passed: true,
            employee_id: Some("0421".into()),
            steps: vec![StepReport { name: "login".into(), duration_ms: 1200 }],
            failed_step: None,
            error: None,
            duration_ms: 1500,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["passed"], true);
        assert_eq!(json["employee_id"], "0421");
        assert_eq!(json["steps"][0]["name"], "login");
    }
}
