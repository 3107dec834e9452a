use std::{
    collections::HashMap,
    fmt::Display,
    sync::{LazyLock, PoisonError, RwLock},
};

use html_escape::encode_text;
use rand::seq::IndexedRandom;
use regex::{Captures, Regex};

/// A named pool of canned lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Greeting a new member after they've been around for a bit. `{name}`
    GreetNewMembersDelayed,
    /// Daily check-in with a member. `{mention}`
    DailyGreeting,
    /// Thanks for months of membership. `{mention}`, `{months}`
    MembershipAnniversary,
    /// Weekly question about birthdays.
    BirthdayAsk,
    /// Congratulations for someone who says it's their birthday. `{name}`
    BirthdayGreeting,
    /// Reminder to take a break. `{tags}`
    HealthReminder,
    /// Answer to "what are you?".
    BotIdentity,
    /// Answer to collaboration and marketing offers.
    CollaborationResponse,
    /// Said when the AI couldn't answer.
    FinalFallback,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::GreetNewMembersDelayed,
        Category::DailyGreeting,
        Category::MembershipAnniversary,
        Category::BirthdayAsk,
        Category::BirthdayGreeting,
        Category::HealthReminder,
        Category::BotIdentity,
        Category::CollaborationResponse,
        Category::FinalFallback,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::GreetNewMembersDelayed => "GREET_NEW_MEMBERS_DELAYED",
            Category::DailyGreeting => "DAILY_GREETING",
            Category::MembershipAnniversary => "MEMBERSHIP_ANNIVERSARY",
            Category::BirthdayAsk => "BIRTHDAY_ASK",
            Category::BirthdayGreeting => "BIRTHDAY_GREETING",
            Category::HealthReminder => "HEALTH_REMINDER",
            Category::BotIdentity => "BOT_IDENTITY",
            Category::CollaborationResponse => "COLLABORATION_RESPONSE",
            Category::FinalFallback => "FINAL_FALLBACK",
        }
    }

    /// Placeholders every line of this category must contain.
    #[must_use]
    pub fn required_placeholders(self) -> &'static [&'static str] {
        match self {
            Category::GreetNewMembersDelayed | Category::BirthdayGreeting => &["{name}"],
            Category::DailyGreeting => &["{mention}"],
            Category::MembershipAnniversary => &["{mention}", "{months}"],
            Category::HealthReminder => &["{tags}"],
            Category::BirthdayAsk
            | Category::BotIdentity
            | Category::CollaborationResponse
            | Category::FinalFallback => &[],
        }
    }

    /// Line used if the pool somehow ends up empty.
    fn last_resort(self) -> &'static str {
        match self {
            Category::GreetNewMembersDelayed => "Welcome to the NPEPEVERSE, {name}! 🐸",
            Category::DailyGreeting => "Ribbit, {mention}! How's the HODLing going today?",
            Category::MembershipAnniversary => {
                "{mention} has been with us for {months} month(s). Diamond hands! 💎"
            }
            Category::BirthdayAsk => "Any frens having a birthday this week? 🎂",
            Category::BirthdayGreeting => "Happy birthday, {name}! 🎂🐸",
            Category::HealthReminder => "Take a break, {tags}. The charts will still be there. 🐸",
            Category::BotIdentity => "I'm the NPEPE frog, here to keep you sane while you HODL.",
            Category::CollaborationResponse => {
                "We grow through the community: raids and memes, not paid shills. 🐸"
            }
            Category::FinalFallback => "Sorry fren, can't answer now.",
        }
    }

    fn defaults(self) -> &'static [&'static str] {
        match self {
            Category::GreetNewMembersDelayed => &[
                "Ribbit ribbit, {name}! You've survived 5 minutes in the NPEPEVERSE. Welcome home, fren! 🐸",
                "Welcome aboard, {name}! Grab a lily pad and HODL tight. LFG! 🚀",
                "{name} has entered the swamp! Based move, fren. WAGMI 🐸",
                "Look who hopped in: {name}! Diamond hands are issued at the door. 💎",
                "GM {name}! Took a few minutes to look around? Now you're one of the frens. Ribbit!",
                "A wild {name} appears! Welcome to $NPEPE, where memes are fuel and HODLing is a lifestyle.",
            ],
            Category::DailyGreeting => &[
                "Ribbit, {mention}! How's the HODLing going today, fren? 🐸",
                "GM {mention}! Still holding those diamond hands strong? 💎",
                "Hey {mention}, the frog checked in on you. How's your day going? LFG!",
                "{mention}, based fren spotted! What's the vibe today? WAGMI 🚀",
                "Oi {mention}! Drink some water and tell us how you're HODLing up. 🐸",
            ],
            Category::MembershipAnniversary => &[
                "{mention} has been HODLing with us for {months} month(s)! Diamond hands confirmed. 💎🐸",
                "Happy {months}-month swamp-iversary, {mention}! Based and loyal. LFG! 🚀",
                "{months} month(s) in the NPEPEVERSE, {mention}! The frog salutes you. WAGMI",
                "Shoutout to {mention} for {months} month(s) of pure diamond hands. Ribbit! 💎",
            ],
            Category::BirthdayAsk => &[
                "🎂 Ribbit! Is any fren celebrating a birthday this week? Tell the swamp!",
                "Birthday check! Anyone leveling up in age this week? Drop it here, frens 🐸",
                "Who's got a birthday coming up this week? The frog wants to party! 🎉",
                "Any based birthdays this week, frens? Say \"my birthday\" and the frog will sing 🎂",
            ],
            Category::BirthdayGreeting => &[
                "Happy birthday, {name}! May your bags pump and your hands stay diamond 🎂💎",
                "HBD {name}! The whole swamp is croaking for you today. Ribbit! 🐸🎉",
                "It's {name}'s birthday! LFG! Another year of HODLing like a legend 🚀",
                "Happy level-up day, {name}! WAGMI, and especially you today 🎂",
            ],
            Category::HealthReminder => &[
                "{tags} time to step away from the charts! Eat something, stretch, hug your loved ones. The frog will HODL for you 🐸",
                "Frens {tags}, diamond hands need rest too. Drink water and take a break 💎💧",
                "{tags} reminder from your favorite frog: sleep is bullish. Log off for a bit! 😴",
                "Hey {tags}! Burnout is bearish. Go outside, touch grass, come back stronger 🌿🐸",
            ],
            Category::BotIdentity => &[
                "I'm a frog. A based frog. My job is keeping you sane while you HODL $NPEPE. Ribbit 🐸",
                "Who am I? The spirit of the NPEPEVERSE, a frog on a mission to keep frens sane 🐸",
                "Just a humble frog bot, fren. I guard the swamp and keep your diamond hands steady 💎",
                "I'm the NPEPE frog! Part meme, part therapist, 100% HODL 🐸",
            ],
            Category::CollaborationResponse => &[
                "Ribbit! $NPEPE grows through the community: raids, memes and frens. No paid shills needed 🐸",
                "Want to help? Make memes, join raids, spread the frog. That's the NPEPE way! 🚀",
                "We don't do paid promos, fren. The swamp grows with memes and community power 🐸💪",
            ],
            Category::FinalFallback => &[
                "Sorry fren, can't answer now.",
                "The oracle is napping on a lily pad. Try again later, fren 🐸",
                "Ribbit... my frog brain lagged. Ask me again in a bit!",
            ],
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canned lines the bot picks its replies from. Pools can be swapped out
/// at runtime by [`crate::renewal`].
pub struct ResponsePool {
    pools: RwLock<HashMap<Category, Vec<String>>>,
}

impl ResponsePool {
    /// A pool holding the built-in lines of every category.
    #[must_use]
    pub fn with_defaults() -> ResponsePool {
        let pools = Category::ALL
            .iter()
            .map(|&c| (c, c.defaults().iter().map(|x| x.to_string()).collect()))
            .collect();

        ResponsePool {
            pools: RwLock::new(pools),
        }
    }

    /// Pick a random line of this category.
    #[must_use]
    pub fn pick(&self, category: Category) -> String {
        let pools = self.pools.read().unwrap_or_else(PoisonError::into_inner);

        pools
            .get(&category)
            .and_then(|x| x.choose(&mut rand::rng()))
            .cloned()
            .unwrap_or_else(|| category.last_resort().to_string())
    }

    /// Replace all lines of this category.
    pub fn replace(&self, category: Category, lines: Vec<String>) {
        let mut pools = self.pools.write().unwrap_or_else(PoisonError::into_inner);
        pools.insert(category, lines);
    }

    /// Amount of lines in this category.
    #[must_use]
    pub fn len(&self, category: Category) -> usize {
        let pools = self.pools.read().unwrap_or_else(PoisonError::into_inner);
        pools.get(&category).map_or(0, Vec::len)
    }
}

/// Turn a canned line into HTML: escape it, then substitute each
/// `{placeholder}` with its value. Values are inserted as-is, so they must
/// already be valid HTML. They are never scanned for placeholders themselves.
#[must_use]
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    static PLACEHOLDER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("Regex will always be valid"));

    let escaped = encode_text(template);
    PLACEHOLDER
        .replace_all(&escaped, |caps: &Captures| {
            values
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_their_placeholders() {
        for category in Category::ALL {
            let defaults = category.defaults();
            assert!(!defaults.is_empty(), "{category} has no lines");

            for line in defaults.iter().chain([&category.last_resort()]) {
                for placeholder in category.required_placeholders() {
                    assert!(
                        line.contains(placeholder),
                        "{category} line is missing {placeholder}: {line}"
                    );
                }
            }
        }
    }

    #[test]
    fn pick_falls_back_on_empty_pool() {
        let pool = ResponsePool::with_defaults();
        assert_eq!(
            pool.len(Category::BotIdentity),
            Category::BotIdentity.defaults().len()
        );

        pool.replace(Category::BotIdentity, Vec::new());
        assert_eq!(pool.len(Category::BotIdentity), 0);
        assert_eq!(
            pool.pick(Category::BotIdentity),
            Category::BotIdentity.last_resort()
        );
    }

    #[test]
    fn pick_uses_replaced_lines() {
        let pool = ResponsePool::with_defaults();
        pool.replace(Category::BirthdayAsk, vec!["only this one".to_string()]);
        for _ in 0..10 {
            assert_eq!(pool.pick(Category::BirthdayAsk), "only this one");
        }
    }

    #[test]
    fn fill_escapes_template_but_not_values() {
        let filled = fill(
            "Hi {name} & <welcome>!",
            &[("name", "<a href=\"tg://user?id=1\">Pepe</a>")],
        );
        assert_eq!(
            filled,
            "Hi <a href=\"tg://user?id=1\">Pepe</a> &amp; &lt;welcome&gt;!"
        );

        assert_eq!(
            fill("{mention} for {months} months, {mention}", &[("mention", "X"), ("months", "3")]),
            "X for 3 months, X"
        );
        // Unknown placeholders are left alone.
        assert_eq!(fill("{tags} hi", &[]), "{tags} hi");
    }

    #[test]
    fn filled_values_are_not_filled_again() {
        // A display name that happens to look like a placeholder.
        assert_eq!(
            fill(
                "{mention} held for {months} months",
                &[("mention", "{months}"), ("months", "6")]
            ),
            "{months} held for 6 months"
        );
        assert_eq!(
            fill("{name} {name}", &[("name", "{name}")]),
            "{name} {name}"
        );
    }
}
