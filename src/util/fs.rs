use std::path::Path;

use anyhow::{Context, Result, bail};

// Read the whole input file into memory as UTF-8. A missing path gets its
// own message instead of a raw io error.
pub fn read_input_text(path: &Path) -> Result<String> {
    if !path.exists() {
        bail!("Input file not found: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_names_the_path() {
        let err = read_input_text(Path::new("/no/such/file.txt")).unwrap_err();
        assert!(err.to_string().contains("/no/such/file.txt"));
    }

    #[test]
    fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "hello\n\nworld").unwrap();

        assert_eq!(read_input_text(&path).unwrap(), "hello\n\nworld");
    }
}
