pub mod setup;

pub use setup::setup_file_logging;
