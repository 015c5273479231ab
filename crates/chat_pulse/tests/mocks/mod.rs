#![allow(dead_code)]

pub mod chat_server;
pub mod datastore;
pub mod handler;
pub mod status_source;
