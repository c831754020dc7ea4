use std::error::Error;

/// Renders an error followed by each of its sources, separated by `: `.
pub fn format_error(error: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(error), |&why| why.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use crate::{checks::CheckError, command::CommandError};

    #[test]
    fn format_error_chain() {
        let why = CheckError::GlxInfo(CommandError::Failed {
            command: "glxinfo".into(),
            code:    Some(1),
            stderr:  "Error: unable to open display\n".into(),
        });

        assert_eq!(
            super::format_error(&why),
            "cannot find the current mode: `glxinfo` exited with code Some(1): Error: unable to \
             open display"
        );
    }

    #[test]
    fn format_error_without_source() {
        let why =
            CommandError::Failed { command: "lspci -n".into(), code: None, stderr: String::new() };
        assert_eq!(super::format_error(&why), "`lspci -n` exited with code None: ");
    }
}
