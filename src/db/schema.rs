//! SQL issued by this crate. Dump contents are passed to the server verbatim.

/// Database the master reset connects to.
pub const MASTER_RESET_DATABASE: &str = "mysql";

/// Drops binary logs written while the server's system tables were created at install time.
pub const RESET_MASTER: &str = "RESET MASTER";

/// Backtick-quote an identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn create_database_if_missing(name: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote_identifier(name))
}

pub fn use_database(name: &str) -> String {
    format!("USE {}", quote_identifier(name))
}

/// Fed to the client ahead of the dump so statements without their own `USE` land in `name`.
pub fn import_preamble(name: &str) -> String {
    format!(
        "{};\n{};\n",
        create_database_if_missing(name),
        use_database(name)
    )
}
