pub mod atomic_file;
pub mod config_service;
pub mod paths;
pub mod secret_service;
pub mod session_storage;

pub use config_service::ConfigService;
pub use paths::MotioPaths;
pub use secret_service::SecretServiceImpl;
pub use session_storage::FileSessionStorage;
