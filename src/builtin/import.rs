use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RuntimeError;
use crate::object::Value;

/// Resolves the argument of `import(...)` to a path. Relative paths are
/// taken relative to the working directory.
pub fn script_path(argument: &Value) -> Result<PathBuf, RuntimeError> {
    match argument {
        Value::String(path) => Ok(PathBuf::from(path)),
        other => Err(RuntimeError::type_error(format!(
            "import expects a string path, got {}",
            other.type_name()
        ))),
    }
}

pub fn read_script(path: &Path) -> Result<String, RuntimeError> {
    fs::read_to_string(path).map_err(|source| RuntimeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_must_be_a_string() {
        assert_eq!(
            script_path(&Value::String("lib.gos".to_string())).unwrap(),
            PathBuf::from("lib.gos")
        );
        assert!(matches!(
            script_path(&Value::Integer(1)),
            Err(RuntimeError::Type(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_script(Path::new("does/not/exist.gos")).unwrap_err();
        assert!(matches!(err, RuntimeError::Io { .. }));
    }
}
