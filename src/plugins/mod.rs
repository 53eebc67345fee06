// Built-in hook listeners

pub mod collection;
pub mod errors;
pub mod plain;
pub mod runtest;
pub mod summary;
pub mod warnings;

pub use collection::{CollectionObserver, CollectionSummary};
pub use errors::ErrorCapture;
pub use plain::PlainReporter;
pub use runtest::RunTestObserver;
pub use summary::SummaryPlugin;
pub use warnings::WarningCapture;

use crate::hooks::Plugin;
use crate::hooks::RunConfig;

/// Listeners registered at session start. Rich output gets the collection
/// observer, error capture, warning capture and the summary; plain output
/// gets the plain reporter and warning capture.
pub fn session_plugins(config: &RunConfig, rich: bool) -> Vec<Box<dyn Plugin>> {
    if rich {
        vec![
            Box::new(CollectionObserver::new(&config.settings)),
            Box::new(ErrorCapture::new(&config.settings)),
            Box::new(WarningCapture),
            Box::new(SummaryPlugin::new(config.settings.traceback.show_capture)),
        ]
    } else {
        vec![Box::new(PlainReporter), Box::new(WarningCapture)]
    }
}
