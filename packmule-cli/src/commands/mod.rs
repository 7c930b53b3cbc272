//! CLI subcommand implementations.

mod deps;
mod fetch;
mod list;
mod prune;

pub use deps::deps;
pub use fetch::fetch;
pub use list::list;
pub use prune::prune;
