pub mod api;
pub mod catalog;
pub mod cleanup;
pub mod config;
pub mod hub;
pub mod notification;

pub use catalog::ResourceCatalog;
pub use cleanup::{CleanupSimulator, CloudResource, DeletedResource, ProjectResources};
pub use config::{CleanupConfig, CloudPulseConfig, HubConfig, ServerConfig};
pub use hub::{HubEvent, NotificationHub};
pub use notification::{NotificationId, NotificationRecord, Severity};
