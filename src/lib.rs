// Pedantic: suppress noise for internal crate code.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod domain;
pub mod export;
pub mod github;
pub mod merge;
pub mod table;
pub mod types;
