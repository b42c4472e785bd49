//! Account credentials kept out of logs.

pub mod credentials;

pub use credentials::{Credentials, SecretString};
