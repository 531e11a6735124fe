//! Authenticated browser session
//!
//! The session gate: nothing in the employee area is reachable before
//! `Session::login` has navigated to the entry URL, submitted credentials,
//! and observed the post-login dashboard. The returned `Session` owns the
//! bridge process, so dropping it tears the browser down on every exit path;
//! `close()` shuts it down gracefully.

use std::time::Duration;

use tracing::info;

use crate::bridge::{BridgeConfig, BrowserBridge};
use crate::error::{LifecycleError, LifecycleResult};
use crate::locators::Locators;

/// Configuration for the authentication gate.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Application entry point.
    pub base_url: String,

    /// URL glob that marks a completed login.
    pub dashboard_pattern: String,

    /// Bound on the post-submit navigation wait.
    pub login_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opensource-demo.orangehrmlive.com".to_string(),
            dashboard_pattern: "**/dashboard**".to_string(),
            login_timeout: Duration::from_secs(10),
        }
    }
}

const ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// An authenticated interactive context bound to one browser surface.
pub struct Session {
    bridge: BrowserBridge,
    base_url: String,
    username: String,
}

impl Session {
    /// Authenticate and return a session positioned at the dashboard.
    ///
    /// Fatal on failure; retries belong to the caller's layer, not here.
    pub async fn login(
        config: &SessionConfig,
        bridge_config: &BridgeConfig,
        locators: &Locators,
        username: &str,
        password: &str,
    ) -> LifecycleResult<Self> {
        if username.is_empty() || password.is_empty() {
            return Err(LifecycleError::InvalidCredentials);
        }

        let mut bridge = BrowserBridge::spawn(bridge_config).await?;

        bridge.goto(&config.base_url).await?;
        bridge.fill(&locators.username_input, username).await?;
        bridge.fill(&locators.password_input, password).await?;
        bridge.click(&locators.login_submit, ACTION_TIMEOUT).await?;

        match bridge.wait_url(&config.dashboard_pattern, config.login_timeout).await {
            Ok(()) => {}
            Err(LifecycleError::Bridge(_)) | Err(LifecycleError::Timeout(_)) => {
                return Err(LifecycleError::AuthenticationTimeout {
                    timeout_ms: config.login_timeout.as_millis() as u64,
                });
            }
            Err(e) => return Err(e),
        }

        info!(username, "logged in");

        Ok(Self {
            bridge,
            base_url: config.base_url.clone(),
            username: username.to_string(),
        })
    }

    pub fn bridge(&mut self) -> &mut BrowserBridge {
        &mut self.bridge
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Current navigated location of the session's page.
    pub async fn current_url(&mut self) -> LifecycleResult<String> {
        self.bridge.current_url().await
    }

    /// Graceful teardown of the browser surface.
    pub async fn close(self) -> LifecycleResult<()> {
        self.bridge.close().await
    }
}
