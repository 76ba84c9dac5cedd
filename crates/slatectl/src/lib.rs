//! slatectl - CLI for installing and rolling back tablet firmware.

pub mod cli;
pub mod commands;
pub mod interact;
