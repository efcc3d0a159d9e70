use anyhow::{Context, anyhow};
use mupibox_core::types::ControlAction;
use mupibox_engine::traits::ControlActions;
use std::process::Stdio;

use crate::settings::CommandTable;

// Keep diagnostics short enough for the change summary.
const MAX_STDERR_CHARS: usize = 300;

/// Runs control actions as local processes.
///
/// Children are killed when the future is dropped, so a runner timeout
/// never leaves a script running in the background.
#[derive(Debug, Clone)]
pub struct ShellControlActions {
    commands: CommandTable,
}

impl ShellControlActions {
    pub fn new(commands: CommandTable) -> Self {
        Self { commands }
    }
}

#[async_trait::async_trait]
impl ControlActions for ShellControlActions {
    async fn run(&self, action: ControlAction) -> anyhow::Result<()> {
        let argv = self.commands.get(action);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("no command configured for {action}"))?;

        log::info!("{action}: running {}", argv.join(" "));
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawn {program}"))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
        if stderr.is_empty() {
            Err(anyhow!("{program} exited with {}", output.status))
        } else {
            Err(anyhow!("{program} exited with {}: {stderr}", output.status))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn table(argv: &[&str]) -> CommandTable {
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        CommandTable {
            enable_hat: argv.clone(),
            disable_hat: argv.clone(),
            settings_sync: argv.clone(),
            kiosk_restart: argv.clone(),
            player_service_restart: argv.clone(),
            hat_service_restart: argv,
        }
    }

    #[tokio::test]
    async fn zero_exit_is_success() {
        let actions = ShellControlActions::new(table(&["true"]));
        actions.run(ControlAction::EnableHat).await.unwrap();
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let actions = ShellControlActions::new(table(&["sh", "-c", "echo boom >&2; exit 3"]));
        let err = actions.run(ControlAction::HatServiceRestart).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("boom"), "{msg}");
        assert!(msg.contains('3'), "{msg}");
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let actions = ShellControlActions::new(table(&["/nonexistent/mupibox-script"]));
        let err = actions.run(ControlAction::SettingsSync).await.unwrap_err();
        assert!(format!("{err:#}").contains("spawn"));
    }

    #[tokio::test]
    async fn empty_command_is_an_error() {
        let actions = ShellControlActions::new(table(&[]));
        let err = actions.run(ControlAction::KioskRestart).await.unwrap_err();
        assert!(err.to_string().contains("kiosk-restart"));
    }
}
