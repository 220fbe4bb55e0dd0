pub mod bootstrap;
pub mod commands;
pub mod credentials;
pub mod doctor;
pub mod env;
pub mod error;
pub mod link;
pub mod paths;
pub mod store;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
