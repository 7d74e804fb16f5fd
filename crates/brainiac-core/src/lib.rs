pub mod config_manager;
pub mod error;
pub mod files;
pub mod model;
pub mod store;
pub mod text;

pub use config_manager::*;
pub use error::*;
pub use model::*;
pub use store::MetadataStore;
pub use text::{reading_time_minutes, slugify, word_count};
