//! Playwright bridge process
//!
//! Spawns `node` running a generated script that holds one browser, one
//! context, and one page for the lifetime of a session. Commands are sent as
//! line-delimited JSON on stdin and answered on stdout; every request
//! carries an id and the matching reply echoes it, so round-trips stay
//! correlated even when the bridge emits non-protocol noise between replies.
//!
//! The child is spawned with `kill_on_drop`, so the browser dies with the
//! session on every exit path. `close()` additionally offers a graceful
//! shutdown: a `close` command, then SIGTERM, then kill.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{LifecycleError, LifecycleResult};

/// Commands understood by the bridge script.
///
/// `timeout_ms` fields bound the wait inside the browser; the Rust side adds
/// its own guard window on top so a wedged bridge cannot hang the scenario.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BridgeCommand {
    Goto { url: String },
    Fill { selector: String, value: String },
    Click { selector: String, timeout_ms: u64 },
    WaitSelector { selector: String, timeout_ms: u64 },
    WaitUrl { pattern: String, timeout_ms: u64 },
    WaitNetworkIdle { timeout_ms: u64 },
    InputValue { selector: String },
    Count { selector: String },
    CurrentUrl,
    Cookies,
    Close,
}

impl BridgeCommand {
    /// Browser-side wait bound carried by this command, if any.
    fn browser_timeout_ms(&self) -> u64 {
        match self {
            BridgeCommand::Click { timeout_ms, .. }
            | BridgeCommand::WaitSelector { timeout_ms, .. }
            | BridgeCommand::WaitUrl { timeout_ms, .. }
            | BridgeCommand::WaitNetworkIdle { timeout_ms } => *timeout_ms,
            _ => 0,
        }
    }

    /// Short label for logs and timeout reports.
    fn label(&self) -> String {
        match self {
            BridgeCommand::Goto { url } => format!("goto:{}", url),
            BridgeCommand::Fill { selector, .. } => format!("fill:{}", selector),
            BridgeCommand::Click { selector, .. } => format!("click:{}", selector),
            BridgeCommand::WaitSelector { selector, .. } => format!("wait:{}", selector),
            BridgeCommand::WaitUrl { pattern, .. } => format!("wait_url:{}", pattern),
            BridgeCommand::WaitNetworkIdle { .. } => "wait_network_idle".to_string(),
            BridgeCommand::InputValue { selector } => format!("input_value:{}", selector),
            BridgeCommand::Count { selector } => format!("count:{}", selector),
            BridgeCommand::CurrentUrl => "current_url".to_string(),
            BridgeCommand::Cookies => "cookies".to_string(),
            BridgeCommand::Close => "close".to_string(),
        }
    }
}

#[derive(Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a BridgeCommand,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// A cookie exported from the browser context.
///
/// Playwright reports more fields (domain, path, expiry); only the pair
/// needed to replay the session over plain HTTP is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Configuration for the bridge process.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Timeout for the bridge to launch the browser and report ready.
    pub startup_timeout: Duration,

    /// Guard window added on top of a command's own browser-side timeout
    /// before the round-trip is abandoned.
    pub command_guard: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            startup_timeout: Duration::from_secs(30),
            command_guard: Duration::from_secs(60),
        }
    }
}

/// Handle to a running bridge process.
pub struct BrowserBridge {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    command_guard: Duration,
    // Keeps the generated script on disk for the child's lifetime.
    _script_dir: tempfile::TempDir,
}

impl BrowserBridge {
    /// Check whether node can resolve the playwright package.
    pub async fn available() -> bool {
        Command::new("node")
            .args(["-e", "require.resolve('playwright')"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Spawn the bridge and wait until the browser page is ready.
    pub async fn spawn(config: &BridgeConfig) -> LifecycleResult<Self> {
        if !Self::available().await {
            return Err(LifecycleError::BridgeNotFound);
        }

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, build_bridge_script(config))?;

        debug!(script = %script_path.display(), "spawning playwright bridge");

        let mut child = Command::new("node")
            .arg(&script_path)
            // The script lives in a temp dir; resolve playwright from the
            // invoking directory's node_modules.
            .env("NODE_PATH", "node_modules")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LifecycleError::BridgeStartup(format!("failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LifecycleError::BridgeStartup("bridge stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LifecycleError::BridgeStartup("bridge stdout unavailable".into()))?;

        let mut bridge = Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            next_id: 0,
            command_guard: config.command_guard,
            _script_dir: script_dir,
        };

        bridge.wait_ready(config.startup_timeout).await?;
        debug!("playwright bridge ready");
        Ok(bridge)
    }

    /// The script announces readiness with an id-0 reply once the page exists.
    async fn wait_ready(&mut self, startup_timeout: Duration) -> LifecycleResult<()> {
        let ready = timeout(startup_timeout, async {
            loop {
                let Some(line) = self.lines.next_line().await? else {
                    return Err(LifecycleError::BridgeStartup(
                        "bridge exited before becoming ready".into(),
                    ));
                };
                match serde_json::from_str::<BridgeResponse>(line.trim()) {
                    Ok(response) if response.id == 0 && response.ok => return Ok(()),
                    Ok(response) => {
                        return Err(LifecycleError::BridgeStartup(
                            response.error.unwrap_or_else(|| "browser launch failed".into()),
                        ))
                    }
                    Err(_) => debug!(%line, "non-protocol bridge output"),
                }
            }
        })
        .await;

        match ready {
            Ok(result) => result,
            Err(_) => Err(LifecycleError::BridgeStartup(format!(
                "browser not ready within {} s",
                startup_timeout.as_secs()
            ))),
        }
    }

    async fn round_trip(&mut self, command: &BridgeCommand) -> LifecycleResult<Option<Value>> {
        self.next_id += 1;
        let id = self.next_id;
        let label = command.label();
        let mut line = serde_json::to_string(&BridgeRequest { id, command })?;
        line.push('\n');

        debug!(command = %label, id, "bridge command");

        let guard = self.command_guard + Duration::from_millis(command.browser_timeout_ms());
        let reply = timeout(guard, async {
            self.stdin.write_all(line.as_bytes()).await?;
            self.stdin.flush().await?;

            loop {
                let Some(line) = self.lines.next_line().await? else {
                    return Err(LifecycleError::Bridge("bridge closed its stdout".into()));
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let response: BridgeResponse = match serde_json::from_str(line) {
                    Ok(response) => response,
                    Err(_) => {
                        debug!(%line, "non-protocol bridge output");
                        continue;
                    }
                };
                if response.id != id {
                    warn!(got = response.id, expected = id, "stale bridge reply dropped");
                    continue;
                }
                return if response.ok {
                    Ok(response.value)
                } else {
                    Err(LifecycleError::Bridge(
                        response.error.unwrap_or_else(|| "unknown bridge error".into()),
                    ))
                };
            }
        })
        .await;

        match reply {
            Ok(result) => result,
            Err(_) => Err(LifecycleError::Timeout(label)),
        }
    }

    pub async fn goto(&mut self, url: &str) -> LifecycleResult<()> {
        self.round_trip(&BridgeCommand::Goto { url: url.into() }).await?;
        Ok(())
    }

    pub async fn fill(&mut self, selector: &str, value: &str) -> LifecycleResult<()> {
        self.round_trip(&BridgeCommand::Fill {
            selector: selector.into(),
            value: value.into(),
        })
        .await?;
        Ok(())
    }

    /// Click the first element matching `selector`.
    pub async fn click(&mut self, selector: &str, wait: Duration) -> LifecycleResult<()> {
        self.round_trip(&BridgeCommand::Click {
            selector: selector.into(),
            timeout_ms: wait.as_millis() as u64,
        })
        .await?;
        Ok(())
    }

    /// Block until the first element matching `selector` is visible.
    pub async fn wait_selector(&mut self, selector: &str, wait: Duration) -> LifecycleResult<()> {
        self.round_trip(&BridgeCommand::WaitSelector {
            selector: selector.into(),
            timeout_ms: wait.as_millis() as u64,
        })
        .await?;
        Ok(())
    }

    /// Block until the page URL matches a glob pattern such as `**/dashboard**`.
    pub async fn wait_url(&mut self, pattern: &str, wait: Duration) -> LifecycleResult<()> {
        self.round_trip(&BridgeCommand::WaitUrl {
            pattern: pattern.into(),
            timeout_ms: wait.as_millis() as u64,
        })
        .await?;
        Ok(())
    }

    /// Block until pending network activity in the current view settles.
    pub async fn wait_network_idle(&mut self, wait: Duration) -> LifecycleResult<()> {
        self.round_trip(&BridgeCommand::WaitNetworkIdle {
            timeout_ms: wait.as_millis() as u64,
        })
        .await?;
        Ok(())
    }

    pub async fn input_value(&mut self, selector: &str) -> LifecycleResult<String> {
        let value = self
            .round_trip(&BridgeCommand::InputValue { selector: selector.into() })
            .await?;
        value
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LifecycleError::Bridge("input_value returned no string".into()))
    }

    /// Number of elements currently matching `selector`.
    pub async fn count(&mut self, selector: &str) -> LifecycleResult<usize> {
        let value = self
            .round_trip(&BridgeCommand::Count { selector: selector.into() })
            .await?;
        value
            .as_ref()
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .ok_or_else(|| LifecycleError::Bridge("count returned no number".into()))
    }

    pub async fn current_url(&mut self) -> LifecycleResult<String> {
        let value = self.round_trip(&BridgeCommand::CurrentUrl).await?;
        value
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LifecycleError::Bridge("current_url returned no string".into()))
    }

    /// Export the browser context's cookies.
    pub async fn cookies(&mut self) -> LifecycleResult<Vec<Cookie>> {
        let value = self
            .round_trip(&BridgeCommand::Cookies)
            .await?
            .ok_or_else(|| LifecycleError::Bridge("cookies returned no value".into()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Graceful shutdown: close command, then SIGTERM, then kill.
    pub async fn close(mut self) -> LifecycleResult<()> {
        let _ = self.round_trip(&BridgeCommand::Close).await;

        if let Ok(Ok(status)) = timeout(Duration::from_secs(5), self.child.wait()).await {
            debug!(%status, "bridge exited");
            return Ok(());
        }

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }

        let _ = self.child.kill().await;
        Ok(())
    }
}

/// Render the Node.js bridge script for the given configuration.
fn build_bridge_script(config: &BridgeConfig) -> String {
    format!(
        r#"const {{ chromium }} = require('playwright');
const readline = require('readline');

(async () => {{
  const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

  let browser;
  try {{
    browser = await chromium.launch({{ headless: {headless} }});
  }} catch (e) {{
    reply({{ id: 0, ok: false, error: 'launch failed: ' + e.message }});
    process.exit(1);
  }}
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  reply({{ id: 0, ok: true, value: 'ready' }});

  const rl = readline.createInterface({{ input: process.stdin }});
  for await (const line of rl) {{
    if (!line.trim()) continue;
    let req;
    try {{
      req = JSON.parse(line);
    }} catch (e) {{
      reply({{ id: 0, ok: false, error: 'malformed request: ' + e.message }});
      continue;
    }}
    try {{
      let value = null;
      switch (req.cmd) {{
        case 'goto':
          await page.goto(req.url);
          break;
        case 'fill':
          await page.locator(req.selector).first().fill(req.value);
          break;
        case 'click':
          await page.locator(req.selector).first().click({{ timeout: req.timeout_ms }});
          break;
        case 'wait_selector':
          await page.locator(req.selector).first().waitFor({{ state: 'visible', timeout: req.timeout_ms }});
          break;
        case 'wait_url':
          await page.waitForURL(req.pattern, {{ timeout: req.timeout_ms }});
          break;
        case 'wait_network_idle':
          await page.waitForLoadState('networkidle', {{ timeout: req.timeout_ms }});
          break;
        case 'input_value':
          value = await page.locator(req.selector).first().inputValue();
          break;
        case 'count':
          value = await page.locator(req.selector).count();
          break;
        case 'current_url':
          value = page.url();
          break;
        case 'cookies':
          value = await context.cookies();
          break;
        case 'close':
          reply({{ id: req.id, ok: true, value: null }});
          await browser.close();
          process.exit(0);
        default:
          throw new Error('unknown command: ' + req.cmd);
      }}
      reply({{ id: req.id, ok: true, value }});
    }} catch (e) {{
      reply({{ id: req.id, ok: false, error: e.message }});
    }}
  }}

  await browser.close();
}})();
"#,
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_envelope_carries_id_and_tag() {
        let command = BridgeCommand::Goto { url: "https://example.com".into() };
        let encoded = serde_json::to_value(BridgeRequest { id: 7, command: &command }).unwrap();
        assert_eq!(
            encoded,
            json!({ "id": 7, "cmd": "goto", "url": "https://example.com" })
        );
    }

    #[test]
    fn wait_commands_carry_timeouts_on_the_wire() {
        let command = BridgeCommand::WaitSelector {
            selector: ".oxd-table-card".into(),
            timeout_ms: 15_000,
        };
        let encoded = serde_json::to_value(BridgeRequest { id: 1, command: &command }).unwrap();
        assert_eq!(
            encoded,
            json!({ "id": 1, "cmd": "wait_selector", "selector": ".oxd-table-card", "timeout_ms": 15_000 })
        );
        assert_eq!(command.browser_timeout_ms(), 15_000);
    }

    #[test]
    fn instant_commands_have_no_browser_timeout() {
        assert_eq!(BridgeCommand::Cookies.browser_timeout_ms(), 0);
        assert_eq!(
            BridgeCommand::InputValue { selector: "input".into() }.browser_timeout_ms(),
            0
        );
    }

    #[test]
    fn response_parses_success_and_failure() {
        let ok: BridgeResponse =
            serde_json::from_str(r#"{"id":3,"ok":true,"value":"0421"}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.id, 3);
        assert_eq!(ok.value, Some(json!("0421")));

        let err: BridgeResponse =
            serde_json::from_str(r#"{"id":4,"ok":false,"error":"Timeout 10000ms exceeded"}"#)
                .unwrap();
        assert!(!err.ok);
        assert_eq!(err.error.as_deref(), Some("Timeout 10000ms exceeded"));
    }

    #[test]
    fn cookie_ignores_extra_playwright_fields() {
        let cookies: Vec<Cookie> = serde_json::from_value(json!([
            { "name": "orangehrm", "value": "abc123", "domain": ".example.com", "path": "/", "httpOnly": true }
        ]))
        .unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "orangehrm");
        assert_eq!(cookies[0].value, "abc123");
    }

    #[test]
    fn script_reflects_configuration() {
        let script = build_bridge_script(&BridgeConfig {
            headless: false,
            viewport_width: 1920,
            viewport_height: 1080,
            ..Default::default()
        });
        assert!(script.contains("headless: false"));
        assert!(script.contains("width: 1920"));
        assert!(script.contains("height: 1080"));
    }

    #[test]
    fn script_handles_every_command() {
        let script = build_bridge_script(&BridgeConfig::default());
        for case in [
            "goto",
            "fill",
            "click",
            "wait_selector",
            "wait_url",
            "wait_network_idle",
            "input_value",
            "count",
            "current_url",
            "cookies",
            "close",
        ] {
            assert!(script.contains(&format!("case '{}':", case)), "missing case {}", case);
        }
    }
}
