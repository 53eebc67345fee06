// Collection statistics and the "collecting ..." progress line

use console::Style;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::hooks::{
    CollectedItem, CollectionHooks, ExceptionInfo, HookContext, HookResult, Plugin, ReportInfo,
    SessionHooks, SessionInfo,
};
use crate::report::{RedrawThrottle, TracebackRenderer, collection_line};
use crate::state::{CollectionRecord, ErrorInfo};

pub const PLUGIN_NAME: &str = "rich-collection";

/// Totals handed back when collection ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSummary {
    pub selected: usize,
    pub collected: usize,
    pub errors: usize,
}

impl From<&CollectionRecord> for CollectionSummary {
    fn from(record: &CollectionRecord) -> Self {
        Self {
            selected: record.selected(),
            collected: record.stats.collected,
            errors: record.stats.errors,
        }
    }
}

pub struct CollectionObserver {
    session_id: String,
    traceback: TracebackRenderer,
    throttle: RedrawThrottle,
    last_line: Option<String>,
    /// An in-progress line is on screen without its newline
    line_open: bool,
    summary: Option<CollectionSummary>,
}

impl CollectionObserver {
    pub fn new(settings: &Settings) -> Self {
        Self {
            session_id: String::new(),
            traceback: TracebackRenderer::from_settings(settings),
            throttle: RedrawThrottle::new(settings.redraw_interval()),
            last_line: None,
            line_open: false,
            summary: None,
        }
    }

    /// Set once collection has finished
    pub fn summary(&self) -> Option<CollectionSummary> {
        self.summary
    }

    fn ensure_record<'r>(&self, ctx: &'r mut HookContext<'_>) -> &'r mut CollectionRecord {
        let wall = ctx.clock.wall();
        ctx.results.collection.get_or_insert_with(|| {
            warn!("Collection event before collection start, starting a record now");
            CollectionRecord::new(self.session_id.clone(), wall)
        })
    }

    /// Redraw the progress line if it is due.
    pub fn render_progress(&mut self, ctx: &mut HookContext<'_>, force: bool) -> HookResult {
        let verbosity = ctx.config.verbosity;
        if verbosity < 0 && !force {
            return Ok(());
        }
        if !self
            .throttle
            .should_render(ctx.clock.now(), force, verbosity >= 2)
        {
            return Ok(());
        }
        let Some(record) = ctx.results.collection.as_ref() else {
            return Ok(());
        };

        let finished = record.is_finished();
        let line = collection_line(&record.stats, finished);
        let console = ctx.console;

        if self.last_line.as_deref() != Some(line.as_str()) {
            let text = if finished {
                let style = if record.stats.errors > 0 {
                    console.theme().error.clone()
                } else {
                    Style::new().bold()
                };
                console.paint(&style, &line)
            } else {
                line.clone()
            };
            console.rewrite_line(&text)?;
            self.last_line = Some(line);
            self.line_open = !finished && console.is_interactive();
        }
        if finished && console.is_interactive() {
            console.write_str("\n")?;
            self.line_open = false;
        }
        Ok(())
    }

    /// Terminate a pending progress line so later output starts on its own
    fn close_line(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        if self.line_open {
            ctx.console.write_str("\n")?;
            self.line_open = false;
        }
        Ok(())
    }

    /// Freeze the record and print the final line.
    pub fn finish(&mut self, ctx: &mut HookContext<'_>) -> Result<CollectionSummary, crate::error::HookError> {
        let wall = ctx.clock.wall();
        let record = self.ensure_record(ctx);
        record.finish(wall);
        let summary = CollectionSummary::from(&*record);
        self.render_progress(ctx, true)?;
        self.summary = Some(summary);
        debug!(
            "Collection finished: {} collected, {} selected, {} errors",
            summary.collected, summary.selected, summary.errors
        );
        Ok(summary)
    }
}

impl SessionHooks for CollectionObserver {
    fn on_configure(&mut self, _ctx: &mut HookContext<'_>, session: &SessionInfo) -> HookResult {
        self.session_id = session.session_id.clone();
        Ok(())
    }

    fn on_interrupt(&mut self, ctx: &mut HookContext<'_>, _message: &str) -> HookResult {
        self.close_line(ctx)
    }
}

impl CollectionHooks for CollectionObserver {
    fn on_collection_start(&mut self, ctx: &mut HookContext<'_>, session_id: &str) -> HookResult {
        if !session_id.is_empty() {
            self.session_id = session_id.to_string();
        }
        ctx.results.collection = Some(CollectionRecord::new(
            self.session_id.clone(),
            ctx.clock.wall(),
        ));
        self.throttle.reset();
        self.last_line = None;
        self.line_open = false;
        self.summary = None;
        Ok(())
    }

    fn on_item_collected(&mut self, ctx: &mut HookContext<'_>, item: &CollectedItem) -> HookResult {
        self.ensure_record(ctx).add_item(&item.node_id, &item.markers);
        self.render_progress(ctx, false)
    }

    fn on_items_deselected(&mut self, ctx: &mut HookContext<'_>, node_ids: &[String]) -> HookResult {
        self.ensure_record(ctx).add_deselected(node_ids.len());
        Ok(())
    }

    fn on_collection_ignored(&mut self, ctx: &mut HookContext<'_>, path: &str) -> HookResult {
        debug!("Ignored during collection: {}", path);
        self.ensure_record(ctx).add_ignored();
        Ok(())
    }

    fn on_collect_error(
        &mut self,
        ctx: &mut HookContext<'_>,
        exception: &ExceptionInfo,
        report: &ReportInfo,
    ) -> HookResult {
        let module = report.fspath().to_string();
        let title = format!("ERROR collecting {}", module);
        let panel =
            self.traceback
                .exception_panel(ctx.console, ctx.config.rootdir(), &title, exception)?;
        self.ensure_record(ctx).add_error(
            &module,
            ErrorInfo::new(exception.clone(), report.clone(), panel),
        );
        self.render_progress(ctx, false)
    }

    fn on_collection_finish(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        self.finish(ctx).map(|_| ())
    }
}

impl Plugin for CollectionObserver {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn session(&mut self) -> Option<&mut dyn SessionHooks> {
        Some(self)
    }

    fn collection(&mut self) -> Option<&mut dyn CollectionHooks> {
        Some(self)
    }
}
