//! Security module for exitcd
//!
//! Target path validation and shell quoting. Together they keep an untrusted
//! directory name from ever being interpreted as shell code.

pub mod path;
pub mod shell;

pub use path::{
    directory_exists, is_directory_accessible, validate_target_path, SecurityLevel,
    MAX_STRICT_PATH_LEN,
};
pub use shell::{escape_single_quotes, single_quote};
