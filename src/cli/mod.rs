//! CLI module for prompt-gallery.
//!
//! This module provides the command-line front end:
//! - Argument parsing
//! - Line-based output
//! - Dispatch of a parsed command into a [`Gallery`]
//!
//! # Usage
//!
//! ```ignore
//! use prompt_gallery::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args())?;
//! run_cli_command(command, &mut gallery).await?;
//! ```

pub mod args;
pub mod output;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, USAGE};
pub use version::{version_line, VERSION};

use color_eyre::eyre::eyre;
use color_eyre::{Report, Result, Section};
use tracing::debug;

use crate::error::GalleryError;
use crate::gallery::Gallery;
use crate::models::SignUpOutcome;
use crate::notice::Notice;
use crate::submission::{ImageUpload, SubmissionForm};
use crate::traits::Backend;

use output::{format_prompt_line, print_header, print_notice, print_prompt};

/// Turn a gallery error into a report carrying the user-facing message and
/// a recovery suggestion.
pub fn report(err: GalleryError) -> Report {
    debug!("{} ({:?})", err.error_code(), err);
    eyre!(err.user_message()).suggestion(err.recovery_hint())
}

/// Ask for a password without echoing it.
pub fn read_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    Ok(password)
}

/// Run a parsed command against `gallery`.
///
/// The gallery must already be started.
pub async fn run_cli_command<B: Backend>(command: CliCommand, gallery: &mut Gallery<B>) -> Result<()> {
    match command {
        CliCommand::Version => println!("{}", version_line()),
        CliCommand::Help => println!("{}", USAGE),
        CliCommand::Feed { search, sort, page } => {
            gallery.browse(&search, sort, page).await;
            if let Some(err) = gallery.feed_error() {
                print_notice(&Notice::from(err));
            }
            print_feed(gallery);
        }
        CliCommand::Like { id } => {
            let toggled = gallery.toggle_like(id).await.map_err(report)?;
            print_notice(&toggled.notice());
            println!("  ♥ {}", toggled.likes());
            if gallery.reconcile().await > 0 {
                print_notice(&Notice::error(
                    "Like count could not be synced; it will be fixed on the next like",
                ));
            }
        }
        CliCommand::Report { id } => {
            let outcome = gallery.report(id).await.map_err(report)?;
            print_notice(&outcome.notice());
        }
        CliCommand::Copy { id } => {
            let copied = gallery.copy(id).await.map_err(report)?;
            println!("{}", copied.text);
            print_notice(&copied.notice);
        }
        CliCommand::Submit { title, text, image } => {
            let mut form = SubmissionForm::new(title, text);
            if let Some(path) = image {
                form = form.with_image(ImageUpload::from_path(path).await.map_err(report)?);
            }
            let submitted = gallery.submit(&mut form).await.map_err(report)?;
            print_notice(&submitted.notice);
            print_prompt(&submitted.prompt);
        }
        CliCommand::SignUp { email, name } => {
            let password = read_password("Password")?;
            let outcome = gallery
                .sign_up(&email, &password, &name)
                .await
                .map_err(report)?;
            match outcome {
                SignUpOutcome::Active(session) => print_notice(&Notice::success(format!(
                    "Signed up and logged in as {}",
                    session.user.display_username()
                ))),
                SignUpOutcome::PendingConfirmation { .. } => print_notice(&Notice::success(
                    "Check your email to confirm your account, then log in",
                )),
                SignUpOutcome::AlreadyRegistered => {
                    return Err(eyre!("An account with this email already exists")
                        .suggestion("Log in instead"))
                }
            }
        }
        CliCommand::Login { email } => {
            let password = read_password("Password")?;
            let user = gallery.sign_in(&email, &password).await.map_err(report)?;
            print_notice(&Notice::success(format!(
                "Logged in as {}",
                user.display_username()
            )));
        }
        CliCommand::Logout => {
            gallery.sign_out().await.map_err(report)?;
            print_notice(&Notice::success("Logged out"));
        }
        CliCommand::WhoAmI => match gallery.current_user() {
            Some(user) => println!("{} <{}>", user.display_username(), user.email),
            None => println!("Not logged in"),
        },
        CliCommand::Mine => {
            let prompts = gallery.my_prompts().await.map_err(report)?;
            print_header(&format!("YOUR PROMPTS ({})", prompts.len()));
            if prompts.is_empty() {
                println!("You haven't submitted any prompts yet");
            }
            for prompt in prompts {
                println!("{}", format_prompt_line(prompt, false));
            }
        }
        CliCommand::Delete { id } => {
            let deleted = gallery.delete_own(id).await.map_err(report)?;
            print_notice(&deleted.notice);
        }
    }
    Ok(())
}

fn print_feed<B: Backend>(gallery: &Gallery<B>) {
    let feed = gallery.feed();
    let listing = feed.listing();
    print_header(&format!(
        "PROMPTS (page {} of {}, {} total, by {})",
        feed.page(),
        feed.total_pages().max(1),
        listing.total(),
        feed.query().sort
    ));
    if listing.is_empty() {
        println!("No prompts found");
    }
    for prompt in listing.iter() {
        println!("{}", format_prompt_line(prompt, gallery.is_liked(prompt.id)));
    }
}
