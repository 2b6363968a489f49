pub mod manager;
pub mod notifiers;
pub mod sources;
pub mod traits;

pub use manager::{Delivery, build_notifier, build_sources, build_watcher};
pub use traits::{NotifierPlugin, SourceAdapter};
