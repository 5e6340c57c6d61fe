pub mod cards;
pub mod config;
pub mod ledger;
pub mod lifecycle;
pub mod poller;
pub mod secret;
pub mod table;
pub mod tokio_tools;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ClientConfig;
pub use lifecycle::{LifecycleController, LifecycleError, LifecycleStatus};
pub use table::{Address, GamePhase, LocalIdentity, TableSnapshot};
pub use view::TableView;
