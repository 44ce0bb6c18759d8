pub mod loader;

pub use loader::{IngestError, load_csv};
