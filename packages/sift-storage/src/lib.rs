pub mod profiles;
pub mod time_serde;

mod error;

pub use error::Error;
pub use profiles::{FileProfileStore, MemoryProfileStore, ProfileStore, SavedSearch};

pub type Result<T, E = Error> = std::result::Result<T, E>;
