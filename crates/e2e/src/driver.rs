//! Employee lifecycle driver
//!
//! Stateful façade over the session exposing create/update/delete on
//! employee records. Each operation is a multi-step protocol: UI frameworks
//! render asynchronously, so every step that causes a UI-visible transition
//! is followed by an explicit wait (bounded visibility wait, quiescence
//! wait, or both) before the next read or action.
//!
//! The driver owns the mapping from logical operation to locators and
//! timing; it borrows the session and never retains an identifier across
//! calls.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{LifecycleError, LifecycleResult};
use crate::locators::{self, Locators};
use crate::session::Session;

/// Bound on element-visibility waits and clicks.
const ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Creation is asynchronous server-side; the id field turning visible is the
/// proxy for "record persisted", so it gets a longer window.
const IDENTIFIER_TIMEOUT: Duration = Duration::from_secs(15);

/// Bound on the option list of an opened select rendering.
const OPTIONS_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on network-quiescence waits.
const QUIESCENCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives employee record operations through the UI.
pub struct EmployeeDriver<'a> {
    session: &'a mut Session,
    locators: Locators,
}

impl<'a> EmployeeDriver<'a> {
    pub fn new(session: &'a mut Session, locators: Locators) -> Self {
        Self { session, locators }
    }

    /// Create an employee and return the identifier the system assigned.
    ///
    /// The caller threads the identifier into subsequent calls; the driver
    /// never invents one.
    pub async fn create_employee(
        &mut self,
        first_name: &str,
        last_name: &str,
    ) -> LifecycleResult<String> {
        debug!(first_name, last_name, "creating employee");

        self.session.bridge().click(&self.locators.pim_menu, ACTION_TIMEOUT).await?;
        self.quiesce().await?;

        self.session.bridge().click(&self.locators.add_action, ACTION_TIMEOUT).await?;
        self.quiesce().await?;

        self.session.bridge().fill(&self.locators.first_name_input, first_name).await?;
        self.session.bridge().fill(&self.locators.last_name_input, last_name).await?;
        self.submit_form().await?;

        match self
            .session
            .bridge()
            .wait_selector(&self.locators.employee_id_input, IDENTIFIER_TIMEOUT)
            .await
        {
            Ok(()) => {}
            Err(LifecycleError::Bridge(reason)) | Err(LifecycleError::Timeout(reason)) => {
                debug!(%reason, "employee id field never became visible");
                return Err(LifecycleError::IdentifierNotAssigned);
            }
            Err(e) => return Err(e),
        }

        let raw = self
            .session
            .bridge()
            .input_value(&self.locators.employee_id_input)
            .await?;
        let employee_id = nonblank_identifier(&raw)?;

        info!(%employee_id, "employee created");
        Ok(employee_id)
    }

    /// Set the job title of an existing employee and verify the change is
    /// visible after submit.
    pub async fn update_job_title(
        &mut self,
        employee_id: &str,
        job_title: &str,
    ) -> LifecycleResult<()> {
        debug!(employee_id, job_title, "updating job title");
        self.try_update_job_title(employee_id, job_title)
            .await
            .map_err(|e| verification_failure("Job Title", job_title, e))?;
        info!(employee_id, job_title, "job title updated");
        Ok(())
    }

    async fn try_update_job_title(
        &mut self,
        employee_id: &str,
        job_title: &str,
    ) -> LifecycleResult<()> {
        self.locate_by_id(employee_id).await?;
        self.open_first_edit().await?;

        self.session.bridge().click(&self.locators.job_tab, ACTION_TIMEOUT).await?;
        self.quiesce().await?;

        self.session
            .bridge()
            .wait_selector(&self.locators.job_title_select, ACTION_TIMEOUT)
            .await?;
        self.session.bridge().click(&self.locators.job_title_select, ACTION_TIMEOUT).await?;
        // The option list renders asynchronously once the select opens.
        self.session
            .bridge()
            .wait_selector(&self.locators.select_options, OPTIONS_TIMEOUT)
            .await?;
        self.session
            .bridge()
            .click(&locators::exact_text(job_title), ACTION_TIMEOUT)
            .await?;

        self.submit_form().await?;

        // Post-condition, not just an execution step: the chosen title must
        // be visible in the resulting view.
        self.session
            .bridge()
            .wait_selector(&locators::exact_text(job_title), ACTION_TIMEOUT)
            .await
    }

    /// Replace the value of a simple text field identified by its label and
    /// verify the change survived the submit.
    pub async fn update_field(
        &mut self,
        employee_id: &str,
        field_label: &str,
        new_value: &str,
    ) -> LifecycleResult<()> {
        debug!(employee_id, field_label, new_value, "updating field");
        self.try_update_field(employee_id, field_label, new_value)
            .await
            .map_err(|e| verification_failure(field_label, new_value, e))?;
        info!(employee_id, field_label, "field updated");
        Ok(())
    }

    async fn try_update_field(
        &mut self,
        employee_id: &str,
        field_label: &str,
        new_value: &str,
    ) -> LifecycleResult<()> {
        self.locate_by_id(employee_id).await?;
        self.open_first_edit().await?;

        let input = locators::labeled_input(field_label);
        self.session.bridge().fill(&input, new_value).await?;
        self.submit_form().await?;

        // Read-back: the same input must hold the new value once the submit
        // settles.
        self.session.bridge().wait_selector(&input, ACTION_TIMEOUT).await?;
        let observed = self.session.bridge().input_value(&input).await?;
        if observed != new_value {
            return Err(LifecycleError::UpdateVerificationFailed {
                field: field_label.to_string(),
                value: new_value.to_string(),
            });
        }
        Ok(())
    }

    /// Delete an employee record through the confirmation prompt.
    pub async fn delete_employee(&mut self, employee_id: &str) -> LifecycleResult<()> {
        debug!(employee_id, "deleting employee");
        self.locate_by_id(employee_id).await?;

        self.session
            .bridge()
            .wait_selector(&self.locators.delete_action, ACTION_TIMEOUT)
            .await?;
        self.session.bridge().click(&self.locators.delete_action, ACTION_TIMEOUT).await?;

        match self
            .session
            .bridge()
            .wait_selector(&self.locators.confirm_delete, ACTION_TIMEOUT)
            .await
        {
            Ok(()) => {}
            Err(LifecycleError::Bridge(_)) | Err(LifecycleError::Timeout(_)) => {
                return Err(LifecycleError::DeleteConfirmationTimeout);
            }
            Err(e) => return Err(e),
        }
        self.session.bridge().click(&self.locators.confirm_delete, ACTION_TIMEOUT).await?;

        match self.quiesce().await {
            Ok(()) => {}
            Err(LifecycleError::Bridge(_)) | Err(LifecycleError::Timeout(_)) => {
                return Err(LifecycleError::DeleteConfirmationTimeout);
            }
            Err(e) => return Err(e),
        }

        info!(employee_id, "employee deleted");
        Ok(())
    }

    /// Navigate to the employee list and search by identifier (exact match).
    ///
    /// Identifier search is expected to yield exactly one row; a multi-match
    /// is flagged, and the first row is acted on.
    async fn locate_by_id(&mut self, employee_id: &str) -> LifecycleResult<()> {
        self.session
            .bridge()
            .click(&self.locators.employee_list_menu, ACTION_TIMEOUT)
            .await?;
        self.quiesce().await?;

        self.session
            .bridge()
            .wait_selector(&self.locators.search_input, ACTION_TIMEOUT)
            .await?;
        self.session.bridge().fill(&self.locators.search_input, employee_id).await?;
        self.session.bridge().click(&self.locators.search_submit, ACTION_TIMEOUT).await?;
        self.quiesce().await?;

        let rows = self.session.bridge().count(&self.locators.result_row).await?;
        if rows > 1 {
            warn!(employee_id, rows, "identifier search returned more than one row; acting on the first");
        }
        Ok(())
    }

    async fn open_first_edit(&mut self) -> LifecycleResult<()> {
        self.session
            .bridge()
            .wait_selector(&self.locators.edit_action, ACTION_TIMEOUT)
            .await?;
        self.session.bridge().click(&self.locators.edit_action, ACTION_TIMEOUT).await?;
        self.quiesce().await
    }

    async fn submit_form(&mut self) -> LifecycleResult<()> {
        self.session.bridge().click(&self.locators.form_submit, ACTION_TIMEOUT).await?;
        self.quiesce().await
    }

    async fn quiesce(&mut self) -> LifecycleResult<()> {
        self.session.bridge().wait_network_idle(QUIESCENCE_TIMEOUT).await
    }
}

/// A blank identifier value after the wait window means creation silently
/// failed; it must never surface as an empty identifier.
fn nonblank_identifier(raw: &str) -> LifecycleResult<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(LifecycleError::IdentifierNotAssigned);
    }
    Ok(id.to_string())
}

/// Any missing element, timeout, or absent post-submit confirmation during
/// an update is reported as a verification failure carrying the attempted
/// value; infrastructure errors pass through untouched.
fn verification_failure(field: &str, value: &str, error: LifecycleError) -> LifecycleError {
    match error {
        LifecycleError::Bridge(reason) | LifecycleError::Timeout(reason) => {
            debug!(field, value, %reason, "update verification failed");
            LifecycleError::UpdateVerificationFailed {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        other => other,
    }
}
