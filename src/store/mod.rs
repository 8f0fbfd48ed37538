pub mod file;

pub use file::TokenStore;
