pub use error::AppError;

/// Main architecture layers (dependency flow: CLI → Core → Storage)
pub mod cli; // Command-line interface
pub mod core; // Authentication, dictionaries, query protocol
pub mod db; // Concrete database managers (FIVEDB, Cytocon)
pub mod storage; // Configuration, credentials and cache persistence

/// Support modules (used across layers)
pub mod api; // Authenticated REST client
pub mod display; // Output formatting
pub mod error; // Error handling

pub type Result<T> = std::result::Result<T, AppError>;
