//! Dashboard REST resources

pub mod dashboard;
pub mod resources;

pub use dashboard::Dashboard;
pub use resources::{records, ListParams, ResourceKind};
