pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, KitchenData, load_config, load_kitchen_data};
