//! Tidings client core: live sync of chats and messages, authorized
//! mutations, media ingest, and notification fanout over the document store.

pub mod authz;
pub mod commands;
pub mod config;
pub mod fanout;
pub mod media;
pub mod overlay;
pub mod session;
pub mod state;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::MutationDispatcher;
pub use config::ClientConfig;
pub use overlay::{Overlay, OverlayState};
pub use session::Session;
pub use state::ChatClient;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is
/// harmless; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tidings_client=debug,tidings_store=info,warn"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting Tidings client core");
    }
}
