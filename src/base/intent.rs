//! `+name` / `-name` directive arguments.

use std::fmt;

/// A directive argument that either enables (`+name`, `name`) or disables
/// (`-name`) something by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Intent {
    /// The referenced name, without the sign.
    pub value: String,
    /// `false` when the argument was prefixed with `-`.
    pub want: bool,
}

impl Intent {
    /// Parse a single argument.
    pub fn parse(arg: &str) -> Self {
        if let Some(value) = arg.strip_prefix('-') {
            Self {
                value: value.to_string(),
                want: false,
            }
        } else {
            Self {
                value: arg.strip_prefix('+').unwrap_or(arg).to_string(),
                want: true,
            }
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.want {
            write!(f, "+{}", self.value)
        } else {
            write!(f, "-{}", self.value)
        }
    }
}

/// Parse a `true`/`false` payload; an empty payload means `true`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("foo", "foo", true)]
    #[case("+foo", "foo", true)]
    #[case("-foo", "foo", false)]
    fn test_parse_intent(#[case] arg: &str, #[case] value: &str, #[case] want: bool) {
        let intent = Intent::parse(arg);
        assert_eq!(intent.value, value);
        assert_eq!(intent.want, want);
    }

    #[rstest]
    #[case("", Some(true))]
    #[case("TRUE", Some(true))]
    #[case("false", Some(false))]
    #[case("0", Some(false))]
    #[case("maybe", None)]
    fn test_parse_bool(#[case] value: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_bool(value), expected);
    }
}
