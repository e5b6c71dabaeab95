#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod generation;
pub mod graph;
pub mod interchange;
pub mod layout;
pub mod layout_dump;
pub mod relationship;

#[cfg(feature = "cli")]
pub use cli::run;
