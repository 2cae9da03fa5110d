//! Persistence for the master key and the encrypted credential collection

mod json_file;
mod key_file;
mod traits;

pub use json_file::JsonFileStorage;
pub use key_file::load_or_create_key;
pub use traits::CredentialStorage;
