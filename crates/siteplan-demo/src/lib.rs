#![forbid(unsafe_code)]

//! Command-line front end for the site planner.

pub mod app;
pub mod cli;
pub mod logging;
pub mod render;
