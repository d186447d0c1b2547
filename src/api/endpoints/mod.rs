pub mod completion;
pub mod health;
pub mod label;
pub mod sessions;
