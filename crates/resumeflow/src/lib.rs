pub mod agent;
pub mod convert;
pub mod errors;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod template;
pub mod ui_stream;
