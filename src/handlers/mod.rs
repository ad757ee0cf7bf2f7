pub mod error;
pub mod generate;
pub mod history;
pub mod session;
