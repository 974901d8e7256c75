pub mod events;
pub mod inventory;

pub use events::LiveEvent;
pub use inventory::{CatalogError, CatalogItem, CategoryDefinition, InventoryCatalog};
