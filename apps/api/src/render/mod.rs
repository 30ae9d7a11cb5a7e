pub mod document;
pub mod handlers;
pub mod layout;
pub mod pdf;
