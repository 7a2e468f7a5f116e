use cap_std::fs_utf8::Dir;
use miette::{Context, IntoDiagnostic, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

/// Reads `<name>.json` from `dir`. If it doesn't exist yet, the default value is written there and returned,
/// so that users have a file to edit.
/// A file that exists but can't be parsed is an error, we never overwrite a user's config.
pub fn load_or_create_json<T: Serialize + DeserializeOwned + Default>(dir: &Dir, name: &str) -> Result<T> {
    let file_name = format!("{name}.json");
    if !dir.exists(&file_name) {
        let value = T::default();
        save_json(dir, name, &value)?;
        info!(%file_name, "created default config file");
        return Ok(value);
    }
    let json = dir
        .read_to_string(&file_name)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {file_name}"))?;
    serde_json::from_str(&json)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to deserialize {file_name}"))
}

/// Writes `value` to `<name>.json` in `dir`, pretty printed
pub fn save_json<T: Serialize>(dir: &Dir, name: &str, value: &T) -> Result<()> {
    let file_name = format!("{name}.json");
    let json = serde_json::to_string_pretty(value)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to serialize {file_name}"))?;
    dir.write(&file_name, json.as_bytes())
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write {file_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_dir;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        scale: f32,
        key: String,
    }
    impl Default for Sample {
        fn default() -> Self {
            Self {
                scale: 1.0,
                key: "Tab".to_owned(),
            }
        }
    }

    #[test]
    fn missing_files_are_created_from_defaults() {
        let dir = test_dir("config_defaults");
        let sample: Sample = load_or_create_json(&dir, "sample").unwrap();
        assert_eq!(sample, Sample::default());
        assert!(dir.exists("sample.json"));
    }

    #[test]
    fn saved_values_are_loaded_back() {
        let dir = test_dir("config_saved");
        let edited = Sample {
            scale: 2.5,
            key: "F".to_owned(),
        };
        save_json(&dir, "sample", &edited).unwrap();
        let loaded: Sample = load_or_create_json(&dir, "sample").unwrap();
        assert_eq!(loaded, edited);
    }

    #[test]
    fn broken_files_are_left_alone() {
        let dir = test_dir("config_broken");
        dir.write("sample.json", b"{ not json").unwrap();
        assert!(load_or_create_json::<Sample>(&dir, "sample").is_err());
        assert_eq!(dir.read_to_string("sample.json").unwrap(), "{ not json");
    }
}
