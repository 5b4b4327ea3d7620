pub mod folders;
pub mod logging;

pub use folders::{create_folder, create_folders};
pub use logging::{init_logging, load_logging_config};
