//! Authentication module
//!
//! Agora's RESTful API authenticates with HTTP Basic credentials built from
//! the customer id and secret, and additionally expects the app and customer
//! identifiers as headers on every call.

mod authenticator;

pub use authenticator::{AuthConfig, Authenticator, APP_ID_HEADER, CUSTOMER_ID_HEADER};
