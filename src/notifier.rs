use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

/// Host notification capability. Both calls are best-effort and never fail.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn permission(&self) -> Permission;

    async fn request_permission(&self) -> Permission;

    async fn notify(&self, title: &str, body: &str);
}

/// Sends notifications through an external program such as `notify-send`.
pub struct DesktopNotifier {
    program: String,
    permission: Mutex<Permission>,
}

impl DesktopNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            permission: Mutex::new(Permission::Default),
        }
    }

    fn set_permission(&self, permission: Permission) {
        *self
            .permission
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = permission;
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        *self
            .permission
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn request_permission(&self) -> Permission {
        let version_check = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        let permission = match version_check {
            Ok(status) if status.success() => Permission::Granted,
            Ok(status) => {
                warn!(program = %self.program, %status, "notification program refused version check");
                Permission::Denied
            }
            Err(err) => {
                warn!(program = %self.program, error = %err, "notification program unavailable");
                Permission::Denied
            }
        };

        info!(program = %self.program, ?permission, "notification permission resolved");
        self.set_permission(permission);
        permission
    }

    async fn notify(&self, title: &str, body: &str) {
        let result = Command::new(&self.program)
            .arg(title)
            .arg(body)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(program = %self.program, %status, "notification command failed"),
            Err(err) => warn!(program = %self.program, error = %err, "failed to run notification command"),
        }
    }
}

/// Writes notifications to the log instead of the desktop.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}

#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    async fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    async fn notify(&self, _title: &str, _body: &str) {}
}
