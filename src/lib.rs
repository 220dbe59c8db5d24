pub mod app;
pub mod layout;
pub mod library;
pub mod util;
pub mod viewport;
