//! compile_commands.json parsing.
//!
//! Meson (through Ninja) writes a compile_commands.json file into the build
//! directory that contains the exact compilation command for each source file.

use crate::error::BuildError;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single compile command from compile_commands.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileCommand {
    /// The working directory for compilation.
    pub directory: PathBuf,

    /// The source file path, relative to `directory` unless absolute.
    pub file: PathBuf,

    /// The full compilation command (shell-quoted).
    #[serde(default)]
    pub command: Option<String>,

    /// The compilation arguments (array form).
    #[serde(default)]
    pub arguments: Option<Vec<String>>,

    /// Output file (optional, unused).
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Create a record from a shell-quoted command string.
    pub fn new(directory: impl Into<PathBuf>, file: impl Into<PathBuf>, command: &str) -> Self {
        Self {
            directory: directory.into(),
            file: file.into(),
            command: Some(command.to_string()),
            arguments: None,
            output: None,
        }
    }

    /// Get the compilation arguments as a vector.
    ///
    /// `arguments` wins over `command` when both are present. The command
    /// string is split with POSIX shell quoting rules.
    pub fn args(&self) -> crate::Result<Vec<String>> {
        if let Some(args) = &self.arguments {
            Ok(args.clone())
        } else if let Some(cmd) = &self.command {
            shlex::split(cmd).ok_or_else(|| BuildError::MalformedCommand {
                file: self.file.clone(),
                command: cmd.clone(),
            })
        } else {
            Err(BuildError::NoCommand {
                file: self.file.clone(),
            })
        }
    }

    /// Absolute, normalised path of the compiled file.
    pub fn source_path(&self) -> PathBuf {
        paths::absolutize(&self.directory, &self.file)
    }
}

/// Collection of compile commands (from compile_commands.json), in file order.
#[derive(Debug, Clone)]
pub struct CompileCommands {
    commands: Vec<CompileCommand>,
}

impl CompileCommands {
    /// Load compile commands from a JSON file.
    ///
    /// Relative `directory` values are resolved against the current directory.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let read_err = |source| BuildError::ReadDatabase {
            path: path.to_path_buf(),
            source,
        };
        let content = std::fs::read_to_string(path).map_err(read_err)?;
        let base = std::env::current_dir().map_err(read_err)?;
        Self::parse(&content, path, &base)
    }

    /// Parse compile commands from a JSON string, resolving relative
    /// `directory` values against the current directory.
    pub fn from_str(json: &str) -> crate::Result<Self> {
        let origin = Path::new("<string>");
        let base = std::env::current_dir().map_err(|source| BuildError::ReadDatabase {
            path: origin.to_path_buf(),
            source,
        })?;
        Self::parse(json, origin, &base)
    }

    /// Parse compile commands from a JSON string, resolving relative
    /// `directory` values against `base`.
    pub fn from_str_in(json: &str, base: &Path) -> crate::Result<Self> {
        Self::parse(json, Path::new("<string>"), base)
    }

    fn parse(json: &str, origin: &Path, base: &Path) -> crate::Result<Self> {
        let mut commands: Vec<CompileCommand> =
            serde_json::from_str(json).map_err(|source| BuildError::ParseDatabase {
                path: origin.to_path_buf(),
                source,
            })?;

        if let Some((index, cmd)) = commands
            .iter()
            .enumerate()
            .find(|(_, cmd)| cmd.command.is_none() && cmd.arguments.is_none())
        {
            return Err(BuildError::MissingCommand {
                index,
                file: cmd.file.clone(),
            });
        }

        for cmd in &mut commands {
            cmd.directory = paths::absolutize(base, &cmd.directory);
        }

        Ok(Self { commands })
    }

    /// Get all compile commands.
    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_commands() {
        let json = r#"[
            {
                "directory": "/home/user/project/build",
                "file": "../src/main.c",
                "command": "cc -I../include -DDEBUG=1 -o main.o -c ../src/main.c"
            },
            {
                "directory": "/home/user/project/build",
                "file": "/home/user/project/src/utils.c",
                "arguments": ["cc", "-I/usr/include", "-DNDEBUG", "-c", "utils.c"],
                "output": "utils.o"
            }
        ]"#;

        let cmds = CompileCommands::from_str(json).unwrap();
        assert_eq!(cmds.len(), 2);

        let cmd0 = &cmds.commands()[0];
        assert_eq!(
            cmd0.source_path(),
            PathBuf::from("/home/user/project/src/main.c")
        );
        assert_eq!(cmd0.args().unwrap().len(), 7);

        let cmd1 = &cmds.commands()[1];
        assert_eq!(cmd1.args().unwrap()[2], "-DNDEBUG");
    }

    #[test]
    fn test_quoted_command_is_shell_split() {
        let cmd = CompileCommand::new("/p", "a.c", r#"gcc "-I/opt/my dir" '-DNAME="x y"' -c a.c"#);
        let args = cmd.args().unwrap();
        assert_eq!(args, vec!["gcc", "-I/opt/my dir", "-DNAME=\"x y\"", "-c", "a.c"]);
    }

    #[test]
    fn test_unbalanced_quotes_are_rejected() {
        let cmd = CompileCommand::new("/p", "a.c", "gcc \"-Iinc -c a.c");
        let err = cmd.args().unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_missing_command_is_rejected() {
        let json = r#"[
            {"directory": "/p", "file": "a.c", "command": "gcc -c a.c"},
            {"directory": "/p", "file": "b.c"}
        ]"#;

        match CompileCommands::from_str(json) {
            Err(BuildError::MissingCommand { index, file }) => {
                assert_eq!(index, 1);
                assert_eq!(file, PathBuf::from("b.c"));
            }
            other => panic!("expected MissingCommand, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let json = r#"[{"file": "a.c", "command": "gcc -c a.c"}]"#;
        let err = CompileCommands::from_str(json).unwrap_err();
        assert!(matches!(err, BuildError::ParseDatabase { .. }));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = CompileCommands::from_str("[{\"directory\": ").unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = CompileCommands::from_file(&dir.path().join("compile_commands.json"))
            .unwrap_err();
        assert!(matches!(err, BuildError::ReadDatabase { .. }));
    }

    #[test]
    fn test_record_without_command_has_no_args() {
        let cmd = CompileCommand {
            directory: PathBuf::from("/p"),
            file: PathBuf::from("lib/b.c"),
            command: None,
            arguments: None,
            output: None,
        };
        match cmd.args() {
            Err(err @ BuildError::NoCommand { .. }) => {
                assert!(err.is_data_format());
                assert!(err.to_string().contains("lib/b.c"));
                assert!(!err.to_string().contains('#'));
            }
            other => panic!("expected NoCommand, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_directory_is_resolved_at_load() {
        let json = r#"[{"directory": "build", "file": "../src/a.c", "command": "cc -c a.c"},
                       {"directory": "/abs/build", "file": "b.c", "command": "cc -c b.c"}]"#;
        let cmds = CompileCommands::from_str_in(json, Path::new("/work")).unwrap();

        assert_eq!(cmds.commands()[0].directory, PathBuf::from("/work/build"));
        assert_eq!(cmds.commands()[0].source_path(), PathBuf::from("/work/src/a.c"));
        assert_eq!(cmds.commands()[1].directory, PathBuf::from("/abs/build"));
    }

    #[test]
    fn test_relative_directory_uses_current_dir() {
        let json = r#"[{"directory": "build", "file": "a.c", "command": "cc -c a.c"}]"#;
        let cmds = CompileCommands::from_str(json).unwrap();
        let expected = paths::absolutize(&std::env::current_dir().unwrap(), "build/a.c");

        assert!(cmds.commands()[0].directory.is_absolute());
        assert_eq!(cmds.commands()[0].source_path(), expected);
    }
}
