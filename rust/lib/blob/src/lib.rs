pub mod error;
pub mod file;
pub mod naming;
pub mod traits;

pub use error::BlobError;
pub use file::FileStore;
pub use naming::{is_valid_stored_name, stored_name};
pub use traits::BlobStore;
