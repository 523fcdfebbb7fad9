pub mod placeholder;
pub mod thumbnail_selector;
