//! OrangeHRM Employee Lifecycle Verification
//!
//! This crate drives a full employee lifecycle (create → update → delete)
//! through the OrangeHRM UI and cross-checks the deletion through the
//! backend API:
//! - Spawns a Playwright bridge as a Node.js subprocess
//! - Drives the UI through page abstractions with explicit synchronization
//! - Confirms the deleted record is gone server-side via `GET /api/v2/pim/employees/{id}`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                LifecycleScenario (orchestrator)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session::login() ──────────────► authenticated Session     │
//! │  EmployeeDriver                                             │
//! │    ├── create_employee(first, last) -> employee id          │
//! │    ├── update_job_title(id, title)                          │
//! │    ├── update_field(id, label, value)                       │
//! │    └── delete_employee(id)                                  │
//! │  PimClient                                                  │
//! │    ├── employee_status(id) -> ok | not-found | other        │
//! │    └── confirm_absence(id)  (after delete, expects 404)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BrowserBridge (node subprocess running Playwright)         │
//! │    line-delimited JSON commands on stdin, replies on stdout │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation that causes a UI-visible transition performs an explicit
//! wait (bounded visibility wait, network-quiescence wait, or both) before
//! the next read or action. Nothing assumes immediate consistency.

pub mod api;
pub mod bridge;
pub mod driver;
pub mod error;
pub mod locators;
pub mod scenario;
pub mod session;

pub use api::{PimClient, StatusOutcome};
pub use bridge::{BridgeConfig, BrowserBridge};
pub use driver::EmployeeDriver;
pub use error::{LifecycleError, LifecycleResult};
pub use locators::Locators;
pub use scenario::{LifecycleScenario, ScenarioConfig, ScenarioReport};
pub use session::{Session, SessionConfig};
