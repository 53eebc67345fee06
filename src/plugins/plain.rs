// Unstyled reporter used when rich output is off: the final collection line
// and the stats line, nothing else

use tracing::warn;

use crate::hooks::{
    CollectedItem, CollectionHooks, ExceptionInfo, HookContext, HookResult, Plugin, ReportInfo,
    RunTestHooks, SessionHooks,
};
use crate::report::{build_stats_line, collection_line};
use crate::state::{CollectionRecord, ErrorInfo, ExitStatus};

pub const PLUGIN_NAME: &str = "plain";

#[derive(Default)]
pub struct PlainReporter;

impl PlainReporter {
    fn record<'r>(ctx: &'r mut HookContext<'_>) -> &'r mut CollectionRecord {
        let wall = ctx.clock.wall();
        ctx.results.collection.get_or_insert_with(|| {
            warn!("Collection event before collection start, starting a record now");
            CollectionRecord::new(String::new(), wall)
        })
    }
}

impl CollectionHooks for PlainReporter {
    fn on_collection_start(&mut self, ctx: &mut HookContext<'_>, session_id: &str) -> HookResult {
        ctx.results.collection = Some(CollectionRecord::new(session_id, ctx.clock.wall()));
        Ok(())
    }

    fn on_item_collected(&mut self, ctx: &mut HookContext<'_>, item: &CollectedItem) -> HookResult {
        Self::record(ctx).add_item(&item.node_id, &item.markers);
        Ok(())
    }

    fn on_items_deselected(&mut self, ctx: &mut HookContext<'_>, node_ids: &[String]) -> HookResult {
        Self::record(ctx).add_deselected(node_ids.len());
        Ok(())
    }

    fn on_collection_ignored(&mut self, ctx: &mut HookContext<'_>, _path: &str) -> HookResult {
        Self::record(ctx).add_ignored();
        Ok(())
    }

    fn on_collect_error(
        &mut self,
        ctx: &mut HookContext<'_>,
        exception: &ExceptionInfo,
        report: &ReportInfo,
    ) -> HookResult {
        let module = report.fspath().to_string();
        Self::record(ctx).add_error(
            &module,
            ErrorInfo::new(exception.clone(), report.clone(), Vec::new()),
        );
        Ok(())
    }

    fn on_collection_finish(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        let wall = ctx.clock.wall();
        let record = Self::record(ctx);
        record.finish(wall);
        let line = collection_line(&record.stats, true);
        ctx.console.write_line(&line)?;
        Ok(())
    }
}

impl RunTestHooks for PlainReporter {
    fn on_test_report(&mut self, ctx: &mut HookContext<'_>, report: &ReportInfo) -> HookResult {
        ctx.results.outcomes.add(report);
        Ok(())
    }
}

impl SessionHooks for PlainReporter {
    fn on_session_finish(&mut self, ctx: &mut HookContext<'_>, _status: ExitStatus) -> HookResult {
        let line = build_stats_line(ctx.results, ctx.results.elapsed(ctx.clock.now()));
        ctx.console.write_line(&line.text)?;
        Ok(())
    }
}

impl Plugin for PlainReporter {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn session(&mut self) -> Option<&mut dyn SessionHooks> {
        Some(self)
    }

    fn collection(&mut self) -> Option<&mut dyn CollectionHooks> {
        Some(self)
    }

    fn runtest(&mut self) -> Option<&mut dyn RunTestHooks> {
        Some(self)
    }
}
