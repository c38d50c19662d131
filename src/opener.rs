use crate::always;
use crate::util::{GitChartError, GitChartErrorKind};
use std::path::Path;
use std::process::Command;

/// Shows a finished report to the user.
pub trait Opener {
    fn open(&self, path: &Path) -> Result<(), GitChartError>;
}

/// The platform's default handler for HTML files.
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> Result<(), GitChartError> {
        open::that(path.as_os_str()).map_err(|e| {
            GitChartError::sourced_kind(
                GitChartErrorKind::Filesystem,
                Some(&format!("Unable to open report: {}", path.display())),
                e,
            )
        })
    }
}

/// A user-supplied command line, with the report path appended.
pub struct CommandOpener {
    program: String,
    args: Vec<String>,
}

impl CommandOpener {
    pub fn new(command: &str) -> Option<Self> {
        let mut words = command.split_whitespace().map(|x| x.to_string());
        let program = words.next()?;
        Some(CommandOpener {
            program,
            args: words.collect(),
        })
    }
}

impl Opener for CommandOpener {
    fn open(&self, path: &Path) -> Result<(), GitChartError> {
        let status = Command::new(&self.program).args(&self.args).arg(path).status()?;
        match status.success() {
            true => Ok(()),
            false => Err(GitChartError::kind(
                GitChartErrorKind::Filesystem,
                Some(&format!("'{}' failed to open {} ({})", self.program, path.display(), status)),
            )),
        }
    }
}

/// Prints the report location instead of opening it.
pub struct PrintOpener;

impl Opener for PrintOpener {
    fn open(&self, path: &Path) -> Result<(), GitChartError> {
        always!("{}", path.display());
        Ok(())
    }
}

pub fn select_opener(should_open: bool, command: Option<&str>) -> Box<dyn Opener> {
    if !should_open {
        return Box::new(PrintOpener);
    }
    match command.and_then(CommandOpener::new) {
        Some(opener) => Box::new(opener),
        None => Box::new(SystemOpener),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_lines() {
        let opener = CommandOpener::new("firefox --new-tab").unwrap();
        assert_eq!(opener.program, "firefox");
        assert_eq!(opener.args, vec!["--new-tab"]);
        assert!(CommandOpener::new("   ").is_none());
    }

    #[test]
    fn print_opener_never_fails() {
        assert!(select_opener(false, Some("false")).open(Path::new("/tmp/report.html")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn command_exit_status_is_checked() {
        assert!(select_opener(true, Some("true")).open(Path::new("/tmp/report.html")).is_ok());
        let err = select_opener(true, Some("false")).open(Path::new("/tmp/report.html")).unwrap_err();
        assert_eq!(err.error_kind(), GitChartErrorKind::Filesystem);
    }
}
