#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod classifier;
pub mod cli;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod review;
pub(crate) mod schema;
pub mod storage;
pub(crate) mod util;
