//! Command handlers, one module per subcommand.
pub mod inspect;
pub mod merge;
