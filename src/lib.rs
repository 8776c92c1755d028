// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod encourage;
pub mod planet;
pub mod runtime;
pub mod snapshot;
pub mod store;
pub mod util;
pub mod voyage;
