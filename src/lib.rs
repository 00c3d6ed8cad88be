//! Headless core of the catalog administration console: list and edit
//! screens for categories, notifications and sliders over the remote
//! catalog API.

pub mod api;
pub mod auth;
pub mod codec;
pub mod config;
pub mod context;
pub mod edit;
pub mod error;
pub mod image;
pub mod lifecycle;
pub mod list;
pub mod model;
pub mod notify;
pub mod routes;

pub use context::ConsoleContext;
pub use edit::{EditPhase, ResourceEditController};
pub use error::ConsoleError;
pub use list::{ListRow, ResourceListController};
