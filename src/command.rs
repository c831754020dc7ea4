use std::{
    io,
    process::{Command, Stdio},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute `{}`", command)]
    Spawn { command: String, source: io::Error },

    #[error("`{}` exited with code {:?}: {}", command, code, stderr.trim())]
    Failed { command: String, code: Option<i32>, stderr: String },
}

/// Executes an external program and captures its standard output.
///
/// A program that could not be started is distinguished from one that ran
/// and reported a failure through its exit status.
pub trait Runner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError>;
}

impl<'a, R: Runner + ?Sized> Runner for &'a R {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
        (**self).run(program, args)
    }
}

/// Runs commands on the local system.
#[derive(Debug, Default, Clone, Copy)]
pub struct Shell;

impl Runner for Shell {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
        let command = command_line(program, args);
        debug!("executing `{}`", command);

        let output = cascade! {
            Command::new(program);
            ..args(args);
            ..stdin(Stdio::null());
        }
        .output()
        .map_err(|source| CommandError::Spawn { command: command.clone(), source })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub(crate) fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_arguments() {
        assert_eq!(
            command_line("systemctl", &["is-active", "bumblebeed"]),
            "systemctl is-active bumblebeed"
        );
        assert_eq!(command_line("glxinfo", &[]), "glxinfo");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let result = Shell.run("prime-switch-test-no-such-program", &[]);
        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }
}
