//! Command-line argument definitions and the handlers behind each
//! subcommand.

pub(crate) mod cli;
