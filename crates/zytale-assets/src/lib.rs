pub mod families;
pub mod indexed;
pub mod registry;
pub mod store;

pub use indexed::IndexedAssetMap;
pub use registry::{AssetRegistry, UpdatePayload};
pub use store::{AssetStore, StoreError};
