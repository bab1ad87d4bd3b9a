//! Helpers for reading flags out of a shared [`clap::ArgMatches`].
//!
//! Every participant contributes its own args to one command. Lookups use
//! the fallible accessors so a participant asking for an id another
//! participant never declared gets nothing rather than a panic.

use clap::{Arg, ArgAction, ArgMatches};

/// A repeatable `--name=VALUE` string flag.
pub fn repeated_flag(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_name("VALUE")
        .action(ArgAction::Append)
        .help(help)
}

/// A single-valued `--name=VALUE` string flag.
pub fn string_flag(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_name("VALUE")
        .action(ArgAction::Set)
        .help(help)
}

/// All values given for `id`, in command-line order.
pub fn flag_values(matches: &ArgMatches, id: &str) -> Vec<String> {
    match matches.try_get_many::<String>(id) {
        Ok(Some(values)) => values.cloned().collect(),
        _ => Vec::new(),
    }
}

/// The value given for `id`, if any.
pub fn flag_value(matches: &ArgMatches, id: &str) -> Option<String> {
    match matches.try_get_one::<String>(id) {
        Ok(value) => value.cloned(),
        Err(_) => None,
    }
}
