//! Command handlers -- one module per subcommand

pub mod scan;
pub mod version;
