pub mod http;
pub mod producer;
