// End-of-session output: interrupt banner, error and warning summaries,
// stats line

use crate::hooks::{HookContext, HookResult, Plugin, SessionHooks};
use crate::report::SummaryRenderer;
use crate::state::ExitStatus;

pub const PLUGIN_NAME: &str = "rich-summary";

pub struct SummaryPlugin {
    show_capture: bool,
}

impl SummaryPlugin {
    pub fn new(show_capture: bool) -> Self {
        Self { show_capture }
    }
}

impl SessionHooks for SummaryPlugin {
    fn on_interrupt(&mut self, ctx: &mut HookContext<'_>, message: &str) -> HookResult {
        let theme = ctx.console.theme();
        ctx.console.rule(message, '!', &theme.warning)?;
        Ok(())
    }

    fn on_session_finish(&mut self, ctx: &mut HookContext<'_>, _status: ExitStatus) -> HookResult {
        let renderer = SummaryRenderer::new(ctx.console, self.show_capture);
        renderer.summarize_errors(ctx.results)?;
        renderer.summarize_warnings(ctx.results, true)?;
        renderer.summarize_stats(ctx.results, ctx.results.elapsed(ctx.clock.now()))?;
        Ok(())
    }
}

impl Plugin for SummaryPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn session(&mut self) -> Option<&mut dyn SessionHooks> {
        Some(self)
    }
}
