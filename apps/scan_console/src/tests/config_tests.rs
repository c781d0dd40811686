use std::collections::HashMap;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");
    let settings = load_settings(&temp.path().join("absent.toml")).expect("load");
    assert_eq!(settings.output_dir, PathBuf::from("./scans"));
    assert_eq!(settings.file_naming, FileNaming::Fixed);
    assert_eq!(settings.role, None);
}

#[test]
fn reads_partial_toml_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join(DEFAULT_CONFIG_FILE);
    fs::write(
        &path,
        "output_dir = \"/data/meshes\"\nfile_naming = \"timestamped\"\nrole = \"scanner\"\npeer_hosts = [\"10.0.0.2\"]\n",
    )
    .expect("write");

    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.output_dir, PathBuf::from("/data/meshes"));
    assert_eq!(settings.file_naming, FileNaming::Timestamped);
    assert_eq!(settings.role, Some(DeviceRole::Scanner));
    assert_eq!(settings.peer_hosts, vec!["10.0.0.2".to_string()]);
    assert!(settings.v2_scanning);
}

#[test]
fn malformed_file_is_an_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join(DEFAULT_CONFIG_FILE);
    fs::write(&path, "role = 7").expect("write");
    assert!(load_settings(&path).is_err());
}

#[test]
fn environment_overrides_file_values() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env(&[
            ("SCAN_CONSOLE__ROLE", "Mirror"),
            ("SCAN_CONSOLE__PEER_HOSTS", "10.0.0.2, 10.0.0.5,"),
            ("SCAN_CONSOLE__V2_SCANNING", "false"),
            ("SCAN_CONSOLE__FILE_NAMING", "timestamped"),
        ]),
    )
    .expect("overrides");

    assert_eq!(settings.role, Some(DeviceRole::Mirror));
    assert_eq!(
        settings.peer_hosts,
        vec!["10.0.0.2".to_string(), "10.0.0.5".to_string()]
    );
    assert!(!settings.v2_scanning);
    assert_eq!(settings.file_naming, FileNaming::Timestamped);
}

#[test]
fn invalid_environment_values_are_rejected() {
    let mut settings = Settings::default();
    assert!(apply_env_overrides(&mut settings, env(&[("SCAN_CONSOLE__ROLE", "tripod")])).is_err());
    assert!(
        apply_env_overrides(&mut settings, env(&[("SCAN_CONSOLE__V2_SCANNING", "maybe")])).is_err()
    );
}
