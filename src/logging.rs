use fern::{Dispatch, InitError};
use log::{Level, LevelFilter, Record};
use std::io;
use yansi::Painted;

pub fn setup_logging(filter: LevelFilter) -> Result<(), InitError> {
    let location = |record: &Record| match (record.file(), record.line()) {
        (Some(file), Some(line)) => format!(
            "{}{}{}",
            Painted::new(strip_src(file)).blue().bold(),
            Painted::new(":").bold(),
            Painted::new(line).magenta().bold()
        ),
        _ => String::new(),
    };

    let format_level = |record: &Record| match record.level() {
        level @ Level::Trace => Painted::new(level).green().bold(),
        level @ Level::Warn => Painted::new(level).yellow().bold(),
        level @ Level::Error => Painted::new(level).red().bold(),
        level => Painted::new(level).bold(),
    };

    Dispatch::new()
        // Exclude logs for crates that we use
        .level(LevelFilter::Off)
        .level_for("prime_switch", filter)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{:5}] {}: {}",
                format_level(record),
                location(record),
                message
            ));
        })
        .chain(io::stderr())
        .apply()?;
    Ok(())
}

fn strip_src(input: &str) -> &str { input.split("src/").nth(1).unwrap_or(input) }
