//! Tests for configuration loading

use super::*;

mod parsing_tests {
    use super::*;

    #[test]
    fn test_load_config_from_toml() {
        let toml = r#"
[server]
name = "workbooks"

[read]
has_header = false
infer_schema_length = 25

[logging]
filter = "xlframe_mcp=debug"
"#;

        let settings = Settings::from_toml_str(toml).unwrap();

        assert_eq!(settings.server.name, "workbooks");
        assert!(!settings.read.has_header);
        assert_eq!(settings.read.infer_schema_length, 25);
        assert_eq!(settings.logging.filter, "xlframe_mcp=debug");
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.server.name, "xlframe");
        assert!(settings.read.has_header);
        assert_eq!(settings.read.infer_schema_length, 100);
        assert_eq!(settings.logging.filter, "info");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let toml = r#"
[read]
infer_schema_length = 0
"#;

        let settings = Settings::from_toml_str(toml).unwrap();

        assert!(settings.read.has_header);
        assert_eq!(settings.read.infer_schema_length, 0);
        assert_eq!(settings.server.name, "xlframe");
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let toml = r#"
[read]
has_header = "yes"
"#;

        assert!(Settings::from_toml_str(toml).is_err());
    }
}

mod loading_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nname = \"from-file\"").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.server.name, "from-file");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = Settings::load("/nonexistent/xlframe.toml").unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/xlframe.toml"));
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[read\nhas_header = ").unwrap();

        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nfilter = \"warn\"").unwrap();

        let settings = Settings::discover(Some(file.path())).unwrap();
        assert_eq!(settings.logging.filter, "warn");
    }
}
