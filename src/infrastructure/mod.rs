pub mod directories;
pub mod logging;
pub mod settings;
pub mod shutdown;
