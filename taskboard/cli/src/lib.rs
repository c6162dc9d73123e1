//! Terminal client for the taskboard service.

pub mod config;
pub mod http;
pub mod live;
pub mod view;
