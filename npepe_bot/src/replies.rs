/// Words that, on their own, mean someone's asking for the contract address.
const CONTRACT_WORDS: &[&str] = &["ca"];
/// Substrings that mean someone's asking for the contract address.
const CONTRACT_PHRASES: &[&str] = &["contract", "address"];
const BUY_PHRASES: &[&str] = &["how to buy", "where to buy", "buy npepe"];
const IDENTITY_PHRASES: &[&str] = &[
    "what are you",
    "what is this bot",
    "are you a bot",
    "what kind of bot",
    "who made you",
];
const BIRTHDAY_PHRASES: &[&str] = &[
    "my birthday",
    "my bday",
    "it's my birthday",
    "my birthday this week",
];
const COLLABORATION_PHRASES: &[&str] = &[
    "collab",
    "partner",
    "promote",
    "help grow",
    "shill",
    "marketing",
];
const QUESTION_WORDS: &[&str] = &[
    "what", "how", "when", "where", "why", "who", "can", "could", "is", "are", "do", "does",
    "explain",
];

/// What the bot should answer a message with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The contract address.
    ContractAddress,
    /// Where to buy, with the main menu keyboard.
    HowToBuy,
    /// A line about what the bot is.
    BotIdentity,
    /// A birthday wish, in reply to the sender.
    BirthdayGreeting,
    /// A line about growing through the community.
    Collaboration,
    /// An answer generated by the LLM.
    AskOracle,
}

/// Facts about a message that the reply rules depend on, besides its text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyContext {
    /// Sent in a group or supergroup.
    pub in_group: bool,
    /// Mentions the group owner by a link mention.
    pub mentions_owner: bool,
    /// An LLM is available to answer questions.
    pub ai_enabled: bool,
}

/// Pick the reply for a message. The first matching rule wins; `None` means
/// the bot stays quiet.
#[must_use]
pub fn classify(text: &str, context: &ReplyContext) -> Option<Reply> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if context.in_group && context.mentions_owner {
        return Some(Reply::BotIdentity);
    }

    let has_word = |words: &[&str]| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| words.contains(&word))
    };
    let has_phrase = |phrases: &[&str]| phrases.iter().any(|x| lower.contains(x));

    if has_word(CONTRACT_WORDS) || has_phrase(CONTRACT_PHRASES) {
        return Some(Reply::ContractAddress);
    }
    if has_phrase(BUY_PHRASES) {
        return Some(Reply::HowToBuy);
    }
    if has_phrase(IDENTITY_PHRASES) {
        return Some(Reply::BotIdentity);
    }
    if context.in_group && has_phrase(BIRTHDAY_PHRASES) {
        return Some(Reply::BirthdayGreeting);
    }
    if has_phrase(COLLABORATION_PHRASES) {
        return Some(Reply::Collaboration);
    }
    if context.ai_enabled && is_a_question(&lower) {
        return Some(Reply::AskOracle);
    }

    None
}

/// Returns `true` if the text ends with a question mark or starts with a
/// question word.
#[must_use]
pub fn is_a_question(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return false;
    }
    if text.ends_with('?') {
        return true;
    }
    QUESTION_WORDS.iter().any(|x| text.starts_with(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP: ReplyContext = ReplyContext {
        in_group: true,
        mentions_owner: false,
        ai_enabled: true,
    };
    const PRIVATE: ReplyContext = ReplyContext {
        in_group: false,
        mentions_owner: false,
        ai_enabled: true,
    };

    #[test]
    fn contract_questions() {
        assert_eq!(classify("CA?", &GROUP), Some(Reply::ContractAddress));
        assert_eq!(classify("pls send ca", &GROUP), Some(Reply::ContractAddress));
        assert_eq!(
            classify("what's the Contract Address", &GROUP),
            Some(Reply::ContractAddress)
        );
        // "ca" inside other words doesn't count.
        assert_eq!(classify("because I care", &GROUP), None);
        assert_eq!(
            classify("can you explain the roadmap?", &GROUP),
            Some(Reply::AskOracle)
        );
    }

    #[test]
    fn rule_order() {
        // Contract beats buying.
        assert_eq!(
            classify("how to buy, what's the contract?", &GROUP),
            Some(Reply::ContractAddress)
        );
        assert_eq!(
            classify("Where to buy $NPEPE?", &GROUP),
            Some(Reply::HowToBuy)
        );
        // Identity beats the AI.
        assert_eq!(
            classify("are you a bot?", &GROUP),
            Some(Reply::BotIdentity)
        );
        assert_eq!(
            classify("who made you", &PRIVATE),
            Some(Reply::BotIdentity)
        );
        // Birthday beats collaboration.
        assert_eq!(
            classify("my birthday today, shill me a gift", &GROUP),
            Some(Reply::BirthdayGreeting)
        );
        assert_eq!(
            classify("Any marketing plans?", &GROUP),
            Some(Reply::Collaboration)
        );
    }

    #[test]
    fn owner_mentions_get_identity() {
        let context = ReplyContext {
            mentions_owner: true,
            ..GROUP
        };
        assert_eq!(classify("hey boss", &context), Some(Reply::BotIdentity));

        // Not outside groups.
        let context = ReplyContext {
            mentions_owner: true,
            ..PRIVATE
        };
        assert_eq!(classify("hey boss", &context), None);
    }

    #[test]
    fn birthdays_only_in_groups() {
        assert_eq!(
            classify("it's my birthday!", &GROUP),
            Some(Reply::BirthdayGreeting)
        );
        assert_eq!(classify("it's my birthday!", &PRIVATE), None);
    }

    #[test]
    fn questions_need_ai() {
        assert_eq!(classify("wen moon?", &GROUP), Some(Reply::AskOracle));
        let no_ai = ReplyContext {
            ai_enabled: false,
            ..GROUP
        };
        assert_eq!(classify("wen moon?", &no_ai), None);
        assert_eq!(classify("gm frens", &GROUP), None);
        assert_eq!(classify("   ", &GROUP), None);
    }

    #[test]
    fn question_detection() {
        assert!(is_a_question("wen lambo?"));
        assert!(is_a_question("  Why is the chart red  "));
        assert!(is_a_question("Explain tokenomics"));
        assert!(!is_a_question("gm"));
        assert!(!is_a_question(""));
        assert!(!is_a_question("LFG!!!"));
    }
}
