//! "Open containing folder" glue for the host OS shell.

use std::path::Path;
use std::process::Command;

use crate::error::{FindexError, Result};

/// Reveal `path` in the platform file manager, selecting the file where
/// the platform supports it.
///
/// # Errors
/// - `FindexError::ParentMissing` when the containing folder no longer
///   exists (the indexed entry may be stale).
/// - `FindexError::Io` / `FindexError::RevealFailed` when the shell
///   command cannot run or reports failure.
pub fn reveal_in_file_manager(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Err(FindexError::ParentMissing { path: path.display().to_string() });
    };
    if !parent.is_dir() {
        return Err(FindexError::ParentMissing { path: parent.display().to_string() });
    }

    let mut command = reveal_command(path, parent);
    let program = command.get_program().to_string_lossy().into_owned();
    let status = command.status()?;
    if !status.success() {
        return Err(FindexError::RevealFailed { command: program });
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn reveal_command(path: &Path, _parent: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg("-R").arg(path);
    command
}

#[cfg(target_os = "windows")]
fn reveal_command(path: &Path, _parent: &Path) -> Command {
    let mut command = Command::new("explorer");
    command.arg(format!("/select,{}", path.display()));
    command
}

#[cfg(all(unix, not(target_os = "macos")))]
fn reveal_command(_path: &Path, parent: &Path) -> Command {
    // No portable select-in-folder on Linux; open the parent directory.
    let mut command = Command::new("xdg-open");
    command.arg(parent);
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_missing_parent_rejected() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join("removed-dir").join("file.txt");

        let result = reveal_in_file_manager(&stale);
        assert!(matches!(result, Err(FindexError::ParentMissing { .. })));
    }

    #[test]
    fn test_rootless_path_rejected() {
        let result = reveal_in_file_manager(&PathBuf::from("/"));
        assert!(matches!(result, Err(FindexError::ParentMissing { .. })));
    }

    #[test]
    fn test_reveal_command_shape() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        let command = reveal_command(&file, dir.path());

        let program = command.get_program().to_string_lossy().into_owned();
        #[cfg(target_os = "macos")]
        assert_eq!(program, "open");
        #[cfg(target_os = "windows")]
        assert_eq!(program, "explorer");
        #[cfg(all(unix, not(target_os = "macos")))]
        assert_eq!(program, "xdg-open");
    }
}
