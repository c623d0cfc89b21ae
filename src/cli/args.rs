//! Command-line argument parsing for prompt-gallery.
//!
//! This module turns the raw argument list into a [`CliCommand`]. With no
//! arguments the first page of the feed is shown.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{PromptId, SortKey};

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// List a page of prompts (default)
    Feed {
        search: String,
        sort: SortKey,
        page: u32,
    },
    Like { id: PromptId },
    Report { id: PromptId },
    /// Print a prompt's text and count the copy
    Copy { id: PromptId },
    Submit {
        title: String,
        text: String,
        image: Option<PathBuf>,
    },
    SignUp { email: String, name: String },
    Login { email: String },
    Logout,
    WhoAmI,
    /// List the signed-in user's prompts
    Mine,
    /// Delete one of the signed-in user's prompts
    Delete { id: PromptId },
}

/// Why the arguments could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

pub const USAGE: &str = "\
Usage: prompt-gallery [COMMAND]

Commands:
  feed [--search TERM] [--sort newest|likes|copies] [--page N]
  like ID              Like or unlike a prompt
  report ID            Report a prompt
  copy ID              Print a prompt's text
  submit --title T --text T [--image PATH]
  signup EMAIL NAME    Create an account
  login EMAIL          Sign in
  logout               Sign out
  whoami               Show the signed-in user
  mine                 List your prompts
  delete ID            Delete one of your prompts

Options:
  -h, --help           Show this help
  -V, --version        Show the version";

/// Parse command-line arguments and return the command to run.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Examples
///
/// ```
/// use prompt_gallery::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["prompt-gallery".to_string(), "like".to_string(), "5".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Like { id: 5 }));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut args = args.skip(1);
    let Some(command) = args.next() else {
        return Ok(default_feed());
    };

    let parsed = match command.as_str() {
        "--version" | "-V" => return Ok(CliCommand::Version),
        "--help" | "-h" | "help" => return Ok(CliCommand::Help),
        "feed" => parse_feed(&mut args)?,
        "like" => CliCommand::Like {
            id: prompt_id(args.next())?,
        },
        "report" => CliCommand::Report {
            id: prompt_id(args.next())?,
        },
        "copy" => CliCommand::Copy {
            id: prompt_id(args.next())?,
        },
        "delete" => CliCommand::Delete {
            id: prompt_id(args.next())?,
        },
        "submit" => parse_submit(&mut args)?,
        "signup" => CliCommand::SignUp {
            email: args.next().ok_or(ArgsError::MissingValue("EMAIL"))?,
            name: args.next().ok_or(ArgsError::MissingValue("NAME"))?,
        },
        "login" => CliCommand::Login {
            email: args.next().ok_or(ArgsError::MissingValue("EMAIL"))?,
        },
        "logout" => CliCommand::Logout,
        "whoami" => CliCommand::WhoAmI,
        "mine" => CliCommand::Mine,
        other if other.starts_with('-') => return Err(ArgsError::UnknownOption(other.to_string())),
        other => return Err(ArgsError::UnknownCommand(other.to_string())),
    };

    match args.next() {
        Some(extra) => Err(ArgsError::Unexpected(extra)),
        None => Ok(parsed),
    }
}

fn default_feed() -> CliCommand {
    CliCommand::Feed {
        search: String::new(),
        sort: SortKey::Newest,
        page: 1,
    }
}

fn parse_feed<I: Iterator<Item = String>>(args: &mut I) -> Result<CliCommand, ArgsError> {
    let mut search = String::new();
    let mut sort = SortKey::Newest;
    let mut page = 1;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--search" | "-s" => search = args.next().ok_or(ArgsError::MissingValue("--search"))?,
            "--sort" => {
                let value = args.next().ok_or(ArgsError::MissingValue("--sort"))?;
                sort = value.parse().map_err(|_| ArgsError::InvalidValue {
                    name: "--sort",
                    value,
                })?;
            }
            "--page" | "-p" => {
                let value = args.next().ok_or(ArgsError::MissingValue("--page"))?;
                page = value.parse().map_err(|_| ArgsError::InvalidValue {
                    name: "--page",
                    value,
                })?;
            }
            other => return Err(ArgsError::UnknownOption(other.to_string())),
        }
    }
    Ok(CliCommand::Feed { search, sort, page })
}

fn parse_submit<I: Iterator<Item = String>>(args: &mut I) -> Result<CliCommand, ArgsError> {
    let mut title = None;
    let mut text = None;
    let mut image = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--title" => title = Some(args.next().ok_or(ArgsError::MissingValue("--title"))?),
            "--text" => text = Some(args.next().ok_or(ArgsError::MissingValue("--text"))?),
            "--image" => {
                image = Some(PathBuf::from(
                    args.next().ok_or(ArgsError::MissingValue("--image"))?,
                ))
            }
            other => return Err(ArgsError::UnknownOption(other.to_string())),
        }
    }

    // Blank values are left to form validation.
    Ok(CliCommand::Submit {
        title: title.unwrap_or_default(),
        text: text.unwrap_or_default(),
        image,
    })
}

fn prompt_id(value: Option<String>) -> Result<PromptId, ArgsError> {
    let value = value.ok_or(ArgsError::MissingValue("ID"))?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidValue { name: "ID", value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, ArgsError> {
        let mut full = vec!["prompt-gallery".to_string()];
        full.extend(args.iter().map(|a| a.to_string()));
        parse_args(full.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), Ok(CliCommand::Version));
        assert_eq!(parse(&["-V"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_parse_no_args_shows_feed() {
        assert_eq!(parse(&[]), Ok(default_feed()));
    }

    #[test]
    fn test_parse_feed_options() {
        assert_eq!(
            parse(&["feed", "--search", "cat", "--sort", "likes", "--page", "3"]),
            Ok(CliCommand::Feed {
                search: "cat".to_string(),
                sort: SortKey::Likes,
                page: 3,
            })
        );
    }

    #[test]
    fn test_parse_feed_bad_sort() {
        assert_eq!(
            parse(&["feed", "--sort", "oldest"]),
            Err(ArgsError::InvalidValue {
                name: "--sort",
                value: "oldest".to_string()
            })
        );
    }

    #[test]
    fn test_parse_id_commands() {
        assert_eq!(parse(&["like", "5"]), Ok(CliCommand::Like { id: 5 }));
        assert_eq!(parse(&["report", "7"]), Ok(CliCommand::Report { id: 7 }));
        assert_eq!(parse(&["delete", "9"]), Ok(CliCommand::Delete { id: 9 }));
        assert_eq!(parse(&["copy"]), Err(ArgsError::MissingValue("ID")));
        assert!(matches!(
            parse(&["like", "five"]),
            Err(ArgsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_submit() {
        assert_eq!(
            parse(&["submit", "--title", "Cat", "--text", "A cat", "--image", "cat.png"]),
            Ok(CliCommand::Submit {
                title: "Cat".to_string(),
                text: "A cat".to_string(),
                image: Some(PathBuf::from("cat.png")),
            })
        );
        assert_eq!(
            parse(&["submit", "--text", "only"]),
            Ok(CliCommand::Submit {
                title: String::new(),
                text: "only".to_string(),
                image: None,
            })
        );
    }

    #[test]
    fn test_parse_account_commands() {
        assert_eq!(
            parse(&["signup", "a@example.com", "Ana"]),
            Ok(CliCommand::SignUp {
                email: "a@example.com".to_string(),
                name: "Ana".to_string()
            })
        );
        assert_eq!(parse(&["signup", "a@example.com"]), Err(ArgsError::MissingValue("NAME")));
        assert_eq!(parse(&["logout"]), Ok(CliCommand::Logout));
        assert_eq!(parse(&["whoami"]), Ok(CliCommand::WhoAmI));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse(&["frobnicate"]),
            Err(ArgsError::UnknownCommand("frobnicate".to_string()))
        );
        assert_eq!(
            parse(&["--unknown"]),
            Err(ArgsError::UnknownOption("--unknown".to_string()))
        );
        assert_eq!(
            parse(&["logout", "now"]),
            Err(ArgsError::Unexpected("now".to_string()))
        );
    }
}
