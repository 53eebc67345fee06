// Tracer - owns the run state and drives the hook bus through the session
// phases

use tracing::{debug, info, warn};

use crate::error::HookError;
use crate::hooks::{
    CallInfo, CollectedItem, ExceptionInfo, HookBus, HookContext, HookResult, Plugin,
    PluginRegistry, ReportInfo, RunConfig, SessionInfo, WarningMessage,
};
use crate::plugins::{self, CollectionSummary, RunTestObserver};
use crate::report::print_header;
use crate::state::{ExitStatus, RunResults};
use crate::term::Console;
use crate::time::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    Collecting,
    Running,
    Finished,
}

pub struct Tracer {
    results: RunResults,
    config: RunConfig,
    console: Console,
    bus: HookBus,
    registry: PluginRegistry,
    clock: Box<dyn Clock>,
    rich: bool,
    rootdir_pinned: bool,
    stage: Stage,
}

impl Tracer {
    pub fn new(config: RunConfig, console: Console, clock: Box<dyn Clock>, rich: bool) -> Self {
        let mut results = RunResults::new(clock.wall(), clock.now());
        results.collect_only = config.collect_only;
        Self {
            results,
            config,
            console,
            bus: HookBus::new(),
            registry: PluginRegistry::new(),
            clock,
            rich,
            rootdir_pinned: false,
            stage: Stage::Created,
        }
    }

    /// Keep the configured root even when the session announces another
    pub fn pin_rootdir(mut self) -> Self {
        self.rootdir_pinned = true;
        self
    }

    pub fn results(&self) -> &RunResults {
        &self.results
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.bus.names()
    }

    /// Split borrows: the bus and registry on one side, the hook context on
    /// the other
    fn parts(&mut self) -> (&mut HookBus, &mut PluginRegistry, HookContext<'_>) {
        (
            &mut self.bus,
            &mut self.registry,
            HookContext {
                results: &mut self.results,
                console: &self.console,
                config: &self.config,
                clock: self.clock.as_ref(),
            },
        )
    }

    /// Add a listener. Plugins added after session start still see
    /// `on_configure`.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> HookResult {
        let (bus, registry, mut ctx) = self.parts();
        bus.register(plugin, registry, &mut ctx)
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.bus.unregister(name).is_some()
    }

    pub fn session_start(&mut self, session: SessionInfo) -> HookResult {
        if session.collect_only && !self.config.collect_only {
            self.config.collect_only = true;
            self.results.collect_only = true;
        }
        if !self.rootdir_pinned && !session.rootdir.is_empty() {
            self.config.rootdir = session.rootdir.clone().into();
        }
        info!("Session started in {}", self.config.rootdir.display());

        for plugin in plugins::session_plugins(&self.config, self.rich) {
            self.register(plugin)?;
        }
        self.registry.extend(session.plugins.iter().cloned());

        if self.rich {
            print_header(&self.console, &session, &self.registry)?;
        }
        let (bus, _, mut ctx) = self.parts();
        bus.configure(&mut ctx, session)
    }

    pub fn collection_start(&mut self, session_id: &str) -> HookResult {
        self.stage = Stage::Collecting;
        let (bus, _, mut ctx) = self.parts();
        bus.collection(&mut ctx, |h, ctx| h.on_collection_start(ctx, session_id))
    }

    pub fn item_collected(&mut self, item: &CollectedItem) -> HookResult {
        let (bus, _, mut ctx) = self.parts();
        bus.collection(&mut ctx, |h, ctx| h.on_item_collected(ctx, item))
    }

    pub fn items_deselected(&mut self, node_ids: &[String]) -> HookResult {
        let (bus, _, mut ctx) = self.parts();
        bus.collection(&mut ctx, |h, ctx| h.on_items_deselected(ctx, node_ids))
    }

    pub fn collection_ignored(&mut self, path: &str) -> HookResult {
        let (bus, _, mut ctx) = self.parts();
        bus.collection(&mut ctx, |h, ctx| h.on_collection_ignored(ctx, path))
    }

    pub fn collect_error(&mut self, exception: &ExceptionInfo, report: &ReportInfo) -> HookResult {
        let (bus, _, mut ctx) = self.parts();
        bus.collection(&mut ctx, |h, ctx| h.on_collect_error(ctx, exception, report))
    }

    /// End of collection: the collection observer leaves the bus and, unless
    /// only collecting, the execution observer joins.
    pub fn collection_finish(&mut self) -> Result<CollectionSummary, HookError> {
        {
            let (bus, _, mut ctx) = self.parts();
            bus.collection(&mut ctx, |h, ctx| h.on_collection_finish(ctx))?;
        }

        let summary = self
            .results
            .collection
            .as_ref()
            .map(CollectionSummary::from)
            .unwrap_or(CollectionSummary {
                selected: 0,
                collected: 0,
                errors: 0,
            });
        debug!("Collection summary: {:?}", summary);

        if self.rich {
            self.unregister(plugins::collection::PLUGIN_NAME);
            if !self.config.collect_only {
                self.register(Box::new(RunTestObserver::new(summary.selected)))?;
            }
        }
        self.stage = Stage::Running;
        Ok(summary)
    }

    pub fn test_report(&mut self, report: &ReportInfo) -> HookResult {
        if self.stage != Stage::Running {
            warn!("Test report for {} outside the execution phase", report.node_id);
        }
        let (bus, _, mut ctx) = self.parts();
        bus.runtest(&mut ctx, |h, ctx| h.on_test_report(ctx, report))
    }

    /// End of the execution phase. Called at most once.
    pub fn runtest_finish(&mut self) -> HookResult {
        if self.stage != Stage::Running {
            return Ok(());
        }
        self.stage = Stage::Finished;
        let (bus, _, mut ctx) = self.parts();
        bus.runtest(&mut ctx, |h, ctx| h.on_runtest_finish(ctx))
    }

    pub fn exception_interact(&mut self, call: &CallInfo, report: &ReportInfo) -> HookResult {
        let (bus, _, mut ctx) = self.parts();
        bus.errors(&mut ctx, |h, ctx| h.on_exception_interact(ctx, call, report))
    }

    pub fn warning_recorded(&mut self, warning: &WarningMessage) -> HookResult {
        let (bus, _, mut ctx) = self.parts();
        bus.warnings(&mut ctx, |h, ctx| h.on_warning_recorded(ctx, warning))
    }

    /// Crash inside the host. Returns whether a listener rendered it; when
    /// none did, a plain fallback is written instead.
    pub fn internal_error(&mut self, exception: &ExceptionInfo) -> Result<bool, HookError> {
        self.results.exit_status.get_or_insert(ExitStatus::InternalError);
        let handled = {
            let (bus, _, mut ctx) = self.parts();
            bus.internal_error(&mut ctx, exception)
        };
        if handled == Some(true) {
            return Ok(true);
        }

        let mut lines = vec![format!("INTERNALERROR> {}", exception.summary())];
        for frame in &exception.frames {
            lines.push(format!(
                "INTERNALERROR>   {}:{} in {}",
                frame.path, frame.lineno, frame.function
            ));
        }
        self.console.write_lines(&lines)?;
        Ok(false)
    }

    pub fn interrupted(&mut self, message: &str) -> HookResult {
        let message = if message.is_empty() {
            "KeyboardInterrupt"
        } else {
            message
        };
        self.results.interrupted = Some(message.to_string());
        let (bus, _, mut ctx) = self.parts();
        bus.session(&mut ctx, |h, ctx| h.on_interrupt(ctx, message))
    }

    /// Close the session: summaries render and the exit status is settled.
    /// A status sent by the host wins over the derived one.
    pub fn session_finish(&mut self, status: Option<ExitStatus>) -> Result<ExitStatus, HookError> {
        if let Some(status) = status {
            self.results.exit_status = Some(status);
        }
        self.runtest_finish()?;
        self.stage = Stage::Finished;

        let (wall, now) = (self.clock.wall(), self.clock.now());
        self.results.finish(wall, now);
        let status = self.results.resolve_exit_status();

        let (bus, _, mut ctx) = self.parts();
        bus.session(&mut ctx, |h, ctx| h.on_session_finish(ctx, status))?;
        info!("Session finished with exit code {}", status.code());
        Ok(status)
    }
}
