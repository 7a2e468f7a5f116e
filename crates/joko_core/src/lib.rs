//! The boring parts every jokoping binary needs: data directory, logging and json config files.

pub mod config;
pub mod init;
pub mod trace;

pub mod prelude {
    pub use crate::config::{load_or_create_json, save_json};
    pub use crate::init::{get_jokoping_dir, open_sub_dir};
    pub use crate::trace::{install_panic_hook, install_tracing};
    pub use cap_std::fs_utf8::Dir;
    pub use miette;
    pub use miette::{bail, Context, Diagnostic, IntoDiagnostic, Result};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use tracing::{debug, error, info, trace, warn};
}

/// a fresh, empty directory under the system temp dir
#[cfg(test)]
pub(crate) fn test_dir(name: &str) -> cap_std::fs_utf8::Dir {
    let path = std::env::temp_dir().join(format!("joko_core_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&path);
    std::fs::create_dir_all(&path).unwrap();
    let path = path.to_str().unwrap().to_owned();
    cap_std::fs_utf8::Dir::open_ambient_dir(path, cap_std::ambient_authority()).unwrap()
}
