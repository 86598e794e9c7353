pub mod error;
pub mod redb;
pub mod traits;

pub use error::KVError;
pub use self::redb::RedbStore;
pub use traits::{KVStore, UpdateFn};
