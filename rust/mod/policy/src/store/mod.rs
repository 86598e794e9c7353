//! Store adapters: core rows in SQL, supplements in the document store.

pub mod supplement;
pub mod table;

pub use supplement::SupplementStore;
pub use table::PolicyTable;
