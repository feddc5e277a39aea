pub mod config;
pub mod consts;
pub mod dialog;
pub mod fetch;
pub mod script;
pub mod server;
