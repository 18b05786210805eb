use anyhow::{Context, Result};
use membership::UserRecord;
use std::fs;
use std::path::Path;

/// Load the users exported by the membership registry.
pub fn load_input(path: &Path) -> Result<Vec<UserRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read input file {}", path.display()))?;
    membership::parse_users(&content)
        .with_context(|| format!("Invalid input file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_input() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"alice","membership":{{"collections":["col-A"],"networks":[]}},"administrator":{{"networks":["net-X"]}}}}]"#
        )
        .unwrap();

        let users = load_input(file.path()).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].membership["collections"], vec!["col-A".to_string()]);
    }

    #[test]
    fn test_load_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_input(&dir.path().join("users.json")).unwrap_err();
        assert!(err.to_string().contains("Could not read input file"));
    }

    #[test]
    fn test_load_input_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load_input(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid input file"));
    }
}
