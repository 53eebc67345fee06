use tracing::debug;

use crate::hooks::{HookContext, HookResult, Plugin, WarningHooks, WarningMessage};
use crate::state::WarningRecord;

pub const PLUGIN_NAME: &str = "rich-warnings";

/// Records every warning the host reports.
pub struct WarningCapture;

impl WarningHooks for WarningCapture {
    fn on_warning_recorded(
        &mut self,
        ctx: &mut HookContext<'_>,
        warning: &WarningMessage,
    ) -> HookResult {
        let record = WarningRecord::from_message(warning);
        debug!("Warning {} from {}", &record.hash[..12], record.location());
        ctx.results.warnings.push(record);
        Ok(())
    }
}

impl Plugin for WarningCapture {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn warnings(&mut self) -> Option<&mut dyn WarningHooks> {
        Some(self)
    }
}
