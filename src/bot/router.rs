//! Prefix command table.
//!
//! Parsing is pure so the whole surface can be tested without a gateway.
//! An unknown name is an ordinary outcome ([`Route::Unknown`]), not an error.

use crate::audio::{PlayOutcome, PlaybackError, PlayerStatus, SkipOutcome, StopOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Disconnect,
    Play,
    Youtube,
    Library,
    Stop,
    Skip,
    Queue,
    Ping,
    Pong,
    Bruh,
    Stal,
    Flex,
    Text,
    Help,
}

/// Every accepted name, aliases included.
const COMMANDS: &[(&str, Command)] = &[
    ("connect", Command::Connect),
    ("join", Command::Connect),
    ("j", Command::Connect),
    ("disconnect", Command::Disconnect),
    ("leave", Command::Disconnect),
    ("l", Command::Disconnect),
    ("play", Command::Play),
    ("yt", Command::Youtube),
    ("library", Command::Library),
    ("lib", Command::Library),
    ("stop", Command::Stop),
    ("skip", Command::Skip),
    ("next", Command::Skip),
    ("queue", Command::Queue),
    ("ping", Command::Ping),
    ("pong", Command::Pong),
    ("bruh", Command::Bruh),
    ("stal", Command::Stal),
    ("flex", Command::Flex),
    ("text", Command::Text),
    ("help", Command::Help),
];

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, command)| *command)
    }

    /// Canonical name plus aliases, for the help embed.
    pub fn names(self) -> Vec<&'static str> {
        COMMANDS
            .iter()
            .filter(|(_, command)| *command == self)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn usage(self) -> &'static str {
        match self {
            Command::Connect => "join your voice channel",
            Command::Disconnect => "leave the voice channel",
            Command::Play => "play <url> - stream a direct audio link",
            Command::Youtube => "yt <url> - play the audio track of a video",
            Command::Library => "library list <page> | library play <number>",
            Command::Stop => "stop the current track",
            Command::Skip => "play the next queued request now",
            Command::Queue => "show the queue",
            Command::Ping | Command::Pong => "are you there?",
            Command::Bruh | Command::Stal => "play a sound shortcut",
            Command::Flex => "react to whatever was just posted",
            Command::Text => "show a sample embed",
            Command::Help => "this list",
        }
    }

    pub fn all() -> Vec<Command> {
        let mut seen = Vec::new();
        for (_, command) in COMMANDS {
            if !seen.contains(command) {
                seen.push(*command);
            }
        }
        seen
    }
}

/// Outcome of routing one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    /// Not addressed to the bot.
    Ignore,
    Unknown(&'a str),
    Invoke { command: Command, args: Vec<&'a str> },
}

pub fn route<'a>(prefix: &str, content: &'a str) -> Route<'a> {
    let Some(rest) = content.strip_prefix(prefix) else {
        return Route::Ignore;
    };

    let mut words = rest.split_whitespace();
    let Some(name) = words.next() else {
        return Route::Ignore;
    };

    match Command::from_name(name) {
        Some(command) => Route::Invoke {
            command,
            args: words.collect(),
        },
        None => Route::Unknown(name),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryAction {
    List { page: usize },
    Play { number: usize },
}

/// Parses `library` arguments, or returns the hint to reply with.
pub fn parse_library_args(prefix: &str, args: &[&str]) -> Result<LibraryAction, String> {
    match args {
        [] => Err(format!(
            "Use a sub-command: `{prefix}library list <page>` or `{prefix}library play <number>`"
        )),
        ["list"] => Err(format!("You should provide a page: `{prefix}library list <page>`")),
        ["list", page, ..] => match page.parse::<i64>() {
            Ok(page) if page >= 1 => Ok(LibraryAction::List { page: page as usize }),
            Ok(_) => Err("Library list page should be > 0".to_string()),
            Err(_) => Err(format!("`{page}` is not a page number")),
        },
        ["play"] => Err(format!(
            "You should provide a track number: `{prefix}library play <number>`"
        )),
        ["play", number, ..] => match number.parse::<usize>() {
            Ok(number) if number >= 1 => Ok(LibraryAction::Play { number }),
            _ => Err(format!("`{number}` is not a track number from `{prefix}library list`")),
        },
        [other, ..] => Err(format!("Unknown library sub-command `{other}`: use list or play")),
    }
}

/// Answers to plain (non-command) messages.
pub fn auto_reply(content: &str) -> Option<&'static str> {
    (content.to_lowercase() == "да").then_some("П-ворд")
}

pub const FLEX_REPLY: &str = "Ayy LMAO dats a huge cringe u just posted bro";

pub fn unknown_command_reply(prefix: &str, name: &str) -> String {
    format!("Sorry, I do not possess such a command: `{prefix}{name}`. Try `{prefix}help`.")
}

pub fn missing_url_reply(prefix: &str, command: Command) -> String {
    let name = command.names().first().copied().unwrap_or("play");
    format!("The [ {prefix}{name} ] command needs an argument: {prefix}{name} <URL>")
}

/// Converts a controller error into what the user reads.
pub fn error_reply(prefix: &str, error: &PlaybackError) -> String {
    match error {
        PlaybackError::Connection { .. } => "I couldn't join your voice channel.".to_string(),
        PlaybackError::Disconnect { .. } => {
            "Left the voice channel, but the connection did not close cleanly.".to_string()
        }
        PlaybackError::Resolution { .. } => {
            "Sorry, I couldn't extract an audio track from that link.".to_string()
        }
        PlaybackError::NoActiveSession(_) => {
            format!("I'm not in a voice channel here. Use `{prefix}join` first.")
        }
    }
}

pub fn play_reply(outcome: &PlayOutcome) -> String {
    match outcome {
        PlayOutcome::Started => "▶️ Playing".to_string(),
        PlayOutcome::Queued { position } => format!("Queued at position {position}"),
    }
}

pub fn stop_reply(outcome: StopOutcome) -> &'static str {
    match outcome {
        StopOutcome::Stopped => "Stopped",
        StopOutcome::NothingPlaying => "Nothing is playing",
    }
}

pub fn skip_reply(outcome: &SkipOutcome) -> String {
    match outcome {
        SkipOutcome::Skipped(request) => format!("Skipped, now playing {request}"),
        SkipOutcome::Discarded(request) => {
            format!("Skipped {request}: its server is no longer connected")
        }
        SkipOutcome::NothingToSkip => "Nothing to skip!".to_string(),
    }
}

pub fn status_label(status: PlayerStatus) -> &'static str {
    match status {
        PlayerStatus::Idle => "idle",
        PlayerStatus::Playing => "playing",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serenity::model::id::GuildId;

    #[test]
    fn routes_commands_and_aliases() {
        assert_eq!(
            route(".", ".yt https://youtu.be/x"),
            Route::Invoke {
                command: Command::Youtube,
                args: vec!["https://youtu.be/x"]
            }
        );
        assert_eq!(
            route(".", ".j"),
            Route::Invoke {
                command: Command::Connect,
                args: vec![]
            }
        );
        assert_eq!(
            route("!", "!NEXT"),
            Route::Invoke {
                command: Command::Skip,
                args: vec![]
            }
        );
    }

    #[test]
    fn ignores_plain_messages() {
        assert_eq!(route(".", "hello there"), Route::Ignore);
        assert_eq!(route(".", ""), Route::Ignore);
        assert_eq!(route(".", ".   "), Route::Ignore);
    }

    #[test]
    fn unknown_commands_are_reported_not_failed() {
        assert_eq!(route(".", ".dance now"), Route::Unknown("dance"));
        assert!(unknown_command_reply(".", "dance").contains("`.dance`"));
    }

    #[test]
    fn answers_da_in_any_case() {
        assert_eq!(auto_reply("да"), Some("П-ворд"));
        assert_eq!(auto_reply("ДА"), Some("П-ворд"));
        assert_eq!(auto_reply("да нет"), None);
        assert_eq!(route(".", "да"), Route::Ignore);
    }

    #[test]
    fn meme_commands_are_routed() {
        assert_eq!(
            route(".", ".flex"),
            Route::Invoke {
                command: Command::Flex,
                args: vec![]
            }
        );
        assert_eq!(
            route(".", ".TEXT"),
            Route::Invoke {
                command: Command::Text,
                args: vec![]
            }
        );
    }

    #[test]
    fn multi_char_prefix() {
        assert_eq!(
            route("dm!", "dm!lib list 2"),
            Route::Invoke {
                command: Command::Library,
                args: vec!["list", "2"]
            }
        );
        assert_eq!(route("dm!", "dm list"), Route::Ignore);
    }

    #[test]
    fn library_arguments() {
        assert_eq!(parse_library_args(".", &["list", "3"]), Ok(LibraryAction::List { page: 3 }));
        assert_eq!(parse_library_args(".", &["play", "12"]), Ok(LibraryAction::Play { number: 12 }));
        assert_eq!(
            parse_library_args(".", &["list", "0"]),
            Err("Library list page should be > 0".to_string())
        );
        assert!(parse_library_args(".", &[]).is_err());
        assert!(parse_library_args(".", &["list"]).is_err());
        assert!(parse_library_args(".", &["play", "zero"]).is_err());
        assert!(parse_library_args(".", &["shuffle"]).is_err());
    }

    #[test]
    fn every_command_has_a_canonical_name() {
        let all = Command::all();
        assert_eq!(all.len(), 15);
        assert_eq!(Command::Connect.names(), vec!["connect", "join", "j"]);
        assert!(all.iter().all(|c| !c.names().is_empty()));
    }

    #[test]
    fn error_replies_name_the_fix() {
        let reply = error_reply("!", &PlaybackError::NoActiveSession(GuildId::new(1)));
        assert_eq!(reply, "I'm not in a voice channel here. Use `!join` first.");
        assert_eq!(missing_url_reply(".", Command::Youtube), "The [ .yt ] command needs an argument: .yt <URL>");
    }

    #[test]
    fn outcome_replies() {
        assert_eq!(play_reply(&PlayOutcome::Queued { position: 2 }), "Queued at position 2");
        assert_eq!(skip_reply(&SkipOutcome::NothingToSkip), "Nothing to skip!");
        assert_eq!(stop_reply(StopOutcome::NothingPlaying), "Nothing is playing");
    }
}
