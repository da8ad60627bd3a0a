pub mod cli;
pub mod config;
pub mod model;
pub mod store;

pub use config::Config;
pub use store::{CampaignStore, StoreError};
