pub mod config_store;
pub mod defaults;
pub mod settings;
pub mod shell;
pub mod telemetry;

use std::sync::Arc;

use mupibox_engine::runner::ChangeEffectRunner;
use mupibox_engine::workflow::ReconcileWorkflow;

use crate::config_store::ConfigStore;
use crate::settings::AdminSettings;
use crate::shell::ShellControlActions;

/// Wire the file-backed store and shell actions into a workflow.
pub fn build_workflow(settings: &AdminSettings) -> ReconcileWorkflow {
    let store = Arc::new(
        ConfigStore::at_path(&settings.config_path).with_staging_path(settings.staging_path()),
    );
    let actions = Arc::new(ShellControlActions::new(settings.commands.clone()));
    let runner = ChangeEffectRunner::new(store.clone(), actions)
        .with_action_timeout(settings.action_timeout());
    ReconcileWorkflow::new(store, runner)
}
