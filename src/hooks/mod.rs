// Hook bus - typed lifecycle callbacks
//
// Listeners implement `Plugin` and expose one capability per event family.
// Dispatch is synchronous and in registration order.

pub mod events;
pub mod registry;

pub use events::{
    CallInfo, CaptureSection, CollectedItem, ExceptionInfo, Frame, Marker, Outcome, Phase,
    ReportInfo, SessionInfo, WarningMessage,
};
pub use registry::PluginRegistry;

use std::path::Path;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::HookError;
use crate::state::{ExitStatus, RunResults};
use crate::term::Console;
use crate::time::Clock;

pub type HookResult = Result<(), HookError>;

/// Run-wide options every listener may read
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub settings: Settings,
    pub rootdir: std::path::PathBuf,
    /// -1 quiet, 0 normal, 1 verbose, 2 and up very verbose
    pub verbosity: i8,
    pub collect_only: bool,
}

impl RunConfig {
    pub fn new(settings: Settings, rootdir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            settings,
            rootdir: rootdir.into(),
            verbosity: 0,
            collect_only: false,
        }
    }

    pub fn rootdir(&self) -> &Path {
        &self.rootdir
    }
}

/// What a listener gets on every call
pub struct HookContext<'a> {
    pub results: &'a mut RunResults,
    pub console: &'a Console,
    pub config: &'a RunConfig,
    pub clock: &'a dyn Clock,
}

pub trait SessionHooks {
    /// Historic: replayed to plugins registered after the session started
    fn on_configure(&mut self, _ctx: &mut HookContext<'_>, _session: &SessionInfo) -> HookResult {
        Ok(())
    }

    fn on_interrupt(&mut self, _ctx: &mut HookContext<'_>, _message: &str) -> HookResult {
        Ok(())
    }

    fn on_session_finish(&mut self, _ctx: &mut HookContext<'_>, _status: ExitStatus) -> HookResult {
        Ok(())
    }
}

pub trait CollectionHooks {
    fn on_collection_start(&mut self, ctx: &mut HookContext<'_>, session_id: &str) -> HookResult;

    fn on_item_collected(&mut self, ctx: &mut HookContext<'_>, item: &CollectedItem) -> HookResult;

    fn on_items_deselected(
        &mut self,
        ctx: &mut HookContext<'_>,
        node_ids: &[String],
    ) -> HookResult;

    fn on_collection_ignored(&mut self, _ctx: &mut HookContext<'_>, _path: &str) -> HookResult {
        Ok(())
    }

    /// A module failed to import or collect
    fn on_collect_error(
        &mut self,
        ctx: &mut HookContext<'_>,
        exception: &ExceptionInfo,
        report: &ReportInfo,
    ) -> HookResult;

    fn on_collection_finish(&mut self, ctx: &mut HookContext<'_>) -> HookResult;
}

pub trait RunTestHooks {
    fn on_test_report(&mut self, ctx: &mut HookContext<'_>, report: &ReportInfo) -> HookResult;

    /// All items have run (or the run was cut short)
    fn on_runtest_finish(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }
}

pub trait ErrorHooks {
    /// First-result hook: `Some(handled)` stops dispatch
    fn on_internal_error(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _exception: &ExceptionInfo,
    ) -> Option<bool> {
        None
    }

    fn on_exception_interact(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _call: &CallInfo,
        _report: &ReportInfo,
    ) -> HookResult {
        Ok(())
    }
}

pub trait WarningHooks {
    fn on_warning_recorded(
        &mut self,
        ctx: &mut HookContext<'_>,
        warning: &WarningMessage,
    ) -> HookResult;
}

/// A listener with a unique name and a set of capabilities
pub trait Plugin {
    fn name(&self) -> &str;

    fn session(&mut self) -> Option<&mut dyn SessionHooks> {
        None
    }

    fn collection(&mut self) -> Option<&mut dyn CollectionHooks> {
        None
    }

    fn runtest(&mut self) -> Option<&mut dyn RunTestHooks> {
        None
    }

    fn errors(&mut self) -> Option<&mut dyn ErrorHooks> {
        None
    }

    fn warnings(&mut self) -> Option<&mut dyn WarningHooks> {
        None
    }
}

/// Ordered set of registered plugins
#[derive(Default)]
pub struct HookBus {
    plugins: Vec<Box<dyn Plugin>>,
    configured: Option<SessionInfo>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Register a plugin, recording its name and replaying `on_configure`
    /// when the session is already configured. Duplicate names are ignored.
    pub fn register(
        &mut self,
        mut plugin: Box<dyn Plugin>,
        registry: &mut PluginRegistry,
        ctx: &mut HookContext<'_>,
    ) -> HookResult {
        let name = plugin.name().to_string();
        if self.is_registered(&name) {
            warn!("Plugin {} is already registered", name);
            return Ok(());
        }
        registry.add(name.clone());
        if let Some(session) = &self.configured
            && let Some(hooks) = plugin.session()
        {
            debug!("Replaying configure for late plugin {}", name);
            hooks.on_configure(ctx, session)?;
        }
        debug!("Registered plugin {}", name);
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn Plugin>> {
        let idx = self.plugins.iter().position(|p| p.name() == name)?;
        debug!("Unregistered plugin {}", name);
        Some(self.plugins.remove(idx))
    }

    /// Announce the session to every plugin and remember it for late ones
    pub fn configure(&mut self, ctx: &mut HookContext<'_>, session: SessionInfo) -> HookResult {
        for plugin in &mut self.plugins {
            if let Some(hooks) = plugin.session() {
                hooks.on_configure(ctx, &session)?;
            }
        }
        self.configured = Some(session);
        Ok(())
    }

    pub fn session<F>(&mut self, ctx: &mut HookContext<'_>, mut f: F) -> HookResult
    where
        F: FnMut(&mut dyn SessionHooks, &mut HookContext<'_>) -> HookResult,
    {
        for plugin in &mut self.plugins {
            if let Some(hooks) = plugin.session() {
                f(hooks, ctx)?;
            }
        }
        Ok(())
    }

    pub fn collection<F>(&mut self, ctx: &mut HookContext<'_>, mut f: F) -> HookResult
    where
        F: FnMut(&mut dyn CollectionHooks, &mut HookContext<'_>) -> HookResult,
    {
        for plugin in &mut self.plugins {
            if let Some(hooks) = plugin.collection() {
                f(hooks, ctx)?;
            }
        }
        Ok(())
    }

    pub fn runtest<F>(&mut self, ctx: &mut HookContext<'_>, mut f: F) -> HookResult
    where
        F: FnMut(&mut dyn RunTestHooks, &mut HookContext<'_>) -> HookResult,
    {
        for plugin in &mut self.plugins {
            if let Some(hooks) = plugin.runtest() {
                f(hooks, ctx)?;
            }
        }
        Ok(())
    }

    pub fn errors<F>(&mut self, ctx: &mut HookContext<'_>, mut f: F) -> HookResult
    where
        F: FnMut(&mut dyn ErrorHooks, &mut HookContext<'_>) -> HookResult,
    {
        for plugin in &mut self.plugins {
            if let Some(hooks) = plugin.errors() {
                f(hooks, ctx)?;
            }
        }
        Ok(())
    }

    pub fn warnings<F>(&mut self, ctx: &mut HookContext<'_>, mut f: F) -> HookResult
    where
        F: FnMut(&mut dyn WarningHooks, &mut HookContext<'_>) -> HookResult,
    {
        for plugin in &mut self.plugins {
            if let Some(hooks) = plugin.warnings() {
                f(hooks, ctx)?;
            }
        }
        Ok(())
    }

    /// First-result dispatch: the first listener with an answer wins
    pub fn internal_error(
        &mut self,
        ctx: &mut HookContext<'_>,
        exception: &ExceptionInfo,
    ) -> Option<bool> {
        self.plugins.iter_mut().find_map(|plugin| {
            plugin
                .errors()
                .and_then(|hooks| hooks.on_internal_error(ctx, exception))
        })
    }
}
