pub mod catalog;
pub mod city;
pub mod config;
pub mod session;
pub mod web;

pub use catalog::{Catalog, CatalogError, ToolDefinition};
pub use city::{BuildOutcome, CityError, CitySnapshot, CityState, Tile, Totals};
pub use config::{CityConfig, ConfigLoader};
pub use session::{Session, View};
