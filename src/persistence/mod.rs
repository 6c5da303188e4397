// Engine persistence - JSON documents holding every pattern, the selection and global flags

pub mod manager;
pub mod serialization;
pub mod types;

pub use manager::{PersistenceError, load_from_file, load_from_str, save_to_file, save_to_string};
pub use serialization::{apply_document, engine_to_document};
pub use types::{DOCUMENT_VERSION, EngineDocument};
