// ABOUTME: Fixed project skeleton provisioned into every sandbox
// ABOUTME: Project directory, boot-time files, mutable source file and install command

/// A file written once when the sandbox boots
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectFile {
    /// Name relative to the project directory
    pub name: String,
    pub contents: String,
}

impl ProjectFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectLayout {
    /// Absolute directory inside the sandbox, e.g. `/project`
    pub project_dir: String,
    pub files: Vec<ProjectFile>,
    /// Name of the file rewritten on every compile
    pub source_file: String,
    /// Dependency install step; must exit 0 for the boot to succeed
    pub install: CommandLine,
}

impl ProjectLayout {
    /// Absolute sandbox path of a project-relative name
    pub fn path_of(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.project_dir.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    }

    pub fn source_path(&self) -> String {
        self.path_of(&self.source_file)
    }
}
