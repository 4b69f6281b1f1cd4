//! Transition scripts: rendering and on-disk storage.

pub mod generate;
pub mod store;

pub use generate::{generate_script, TransitionScript, SCRIPT_INTERPRETER};
pub use store::{
    reap_stale_scripts, resolve_temp_dir, ReconcileReport, ScriptStore, TemporaryScriptFile,
    SCRIPT_MODE, SCRIPT_PREFIX, SCRIPT_SUFFIX,
};
