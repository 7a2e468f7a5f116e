use cap_std::{ambient_authority, fs_utf8::camino::Utf8PathBuf, fs_utf8::Dir};
use miette::{Context, IntoDiagnostic, Result};

pub const DATA_DIR_ENV: &str = "JOKOPING_DATA_DIR";

/// Jokoping data directory.
/// We will read a path from env `JOKOPING_DATA_DIR` or create a folder at data_local_dir/jokoping, where data_local_dir is platform specific
/// Inside this directory, we store the settings, sprite table, sprite sheets and logs.
pub fn get_jokoping_dir() -> Result<Dir> {
    let authority = ambient_authority();
    let jdir = if let Ok(env_dir) = std::env::var(DATA_DIR_ENV) {
        let path = Utf8PathBuf::try_from(&env_dir)
            .into_diagnostic()
            .wrap_err(env_dir)
            .wrap_err("failed to parse JOKOPING_DATA_DIR")?;

        Dir::create_ambient_dir_all(&path, authority)
            .into_diagnostic()
            .wrap_err(path.clone())
            .wrap_err("failed to create jokoping directory")?;
        Dir::open_ambient_dir(&path, authority)
            .into_diagnostic()
            .wrap_err(path)
            .wrap_err("failed to open jokoping data dir")?
    } else {
        let dir = cap_directories::ProjectDirs::from("com.jokoping", "", "jokoping", authority)
            .ok_or(miette::miette!(
                "getting project dirs failed for some reason"
            ))?
            .data_local_dir()
            .into_diagnostic()
            .wrap_err("failed to get data local dir using capstd")?;
        Dir::from_cap_std(dir) // into utf-8 dir
    };
    Ok(jdir)
}

/// Opens (creating if needed) a sub directory of `parent`
pub fn open_sub_dir(parent: &Dir, name: &str) -> Result<Dir> {
    parent
        .create_dir_all(name)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to create {name} dir"))?;
    parent
        .open_dir(name)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to open {name} dir"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_dir;

    #[test]
    fn sub_dirs_are_created_once() {
        let dir = test_dir("sub_dirs");
        let sprites = open_sub_dir(&dir, "sprites").unwrap();
        sprites.write("ring.png", b"not really a png").unwrap();
        let again = open_sub_dir(&dir, "sprites").unwrap();
        assert!(again.exists("ring.png"));
    }
}
