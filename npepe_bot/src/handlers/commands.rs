use teloxide::types::BotCommand;

/// What a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Help,
    ContractAddress,
    HowToBuy,
}

pub struct Command {
    pub callname: &'static str,
    pub description: &'static str,
    pub kind: CommandKind,
}

pub const COMMANDS: &[Command] = &[
    Command {
        callname: "/start",
        description: "Say hi and show the main menu.",
        kind: CommandKind::Start,
    },
    Command {
        callname: "/help",
        description: "Show the main menu.",
        kind: CommandKind::Help,
    },
    Command {
        callname: "/ca",
        description: "Get the $NPEPE contract address.",
        kind: CommandKind::ContractAddress,
    },
    Command {
        callname: "/buy",
        description: "Where to buy $NPEPE.",
        kind: CommandKind::HowToBuy,
    },
];

/// Figure out which command this message text is, if any.
///
/// Commands addressed to another bot, like `/ca@SomeOtherBot`, are not ours.
#[must_use]
pub fn parse_command(text: &str, bot_username: &str) -> Option<CommandKind> {
    if !text.starts_with('/') {
        return None;
    }
    let command = text.split_whitespace().next()?;

    // If the command is "/ca@NPEPE_Bot", trim the "@" and everything after it.
    let callname = if let Some(username_start) = command.find('@') {
        // Bot names are guaranteed ASCII, so ignore ASCII case specifically.
        if !command[username_start + '@'.len_utf8()..].eq_ignore_ascii_case(bot_username) {
            return None;
        }
        &command[..username_start]
    } else {
        command
    };

    COMMANDS
        .iter()
        .find(|x| x.callname.eq_ignore_ascii_case(callname))
        .map(|x| x.kind)
}

pub fn generate_bot_commands() -> Vec<BotCommand> {
    COMMANDS
        .iter()
        .map(|command| BotCommand {
            // Cut off the /
            command: command.callname[1..].to_string(),
            description: command.description.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_parsed() {
        assert_eq!(parse_command("/ca", "NPEPE_Bot"), Some(CommandKind::ContractAddress));
        assert_eq!(parse_command("/BUY now pls", "NPEPE_Bot"), Some(CommandKind::HowToBuy));
        assert_eq!(
            parse_command("/start@npepe_bot", "NPEPE_Bot"),
            Some(CommandKind::Start)
        );
        assert_eq!(parse_command("/help@OtherBot", "NPEPE_Bot"), None);
        assert_eq!(parse_command("/unknown", "NPEPE_Bot"), None);
        assert_eq!(parse_command("ca /ca", "NPEPE_Bot"), None);
        assert_eq!(parse_command("/", "NPEPE_Bot"), None);
    }

    #[test]
    /// Validate that bot commands match requirements by Telegram's Bot API
    fn validate_bot_commands() {
        let commands = generate_bot_commands();
        // "At most 100 commands can be specified"
        // - https://core.telegram.org/bots/api#setmycommands
        assert!(commands.len() <= 100);
        for command in commands {
            // Everything here is from https://core.telegram.org/bots/api#botcommand
            // "Text of the command; 1-32 characters."
            assert!(!command.command.is_empty());
            assert!(command.command.len() <= 32);

            // "Can contain only lowercase English letters, digits and underscores."
            for chr in command.command.chars() {
                let is_lowercase_latin = chr.is_ascii_lowercase();
                let is_digit = chr.is_ascii_digit();
                let is_underscore = chr == '_';

                assert!(is_lowercase_latin || is_digit || is_underscore);
            }

            // "Description of the command; 1-256 characters."
            assert!(!command.description.is_empty());
            assert!(command.description.len() <= 256);
        }
    }
}
