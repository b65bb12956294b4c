pub mod aggregation;
pub mod db;
pub mod error;
pub mod http_server;
pub mod presenter;
pub mod render;
pub mod settings;
pub mod snapshot;

pub use error::{DashboardError, Result};
pub use presenter::{on_selection_changed, Presenter, RenderOutput};
pub use snapshot::DashboardSnapshot;
