use chrono::{DateTime, Utc};
use teloxide::types::UserId;

/// A row of the member registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    pub(super) user_id: UserId,
    pub(super) username: Option<String>,
    pub(super) display_name: String,
    pub(super) joined_date: DateTime<Utc>,
    pub(super) last_interacted_date: Option<DateTime<Utc>>,
    pub(super) last_thanked_month: u32,
}

impl MemberInfo {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
    /// When this member was first seen by the bot.
    #[must_use]
    pub fn joined_date(&self) -> DateTime<Utc> {
        self.joined_date
    }
    /// When the bot last greeted or tagged this member, if ever.
    #[must_use]
    pub fn last_interacted_date(&self) -> Option<DateTime<Utc>> {
        self.last_interacted_date
    }
    /// The highest membership month count this member was thanked for.
    #[must_use]
    pub fn last_thanked_month(&self) -> u32 {
        self.last_thanked_month
    }

    /// Name to show when mentioning this member: the username if there is
    /// one, then the display name, then "Fren".
    #[must_use]
    pub fn mention_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|x| !x.is_empty())
            .or_else(|| Some(self.display_name.as_str()).filter(|x| !x.is_empty()))
            .unwrap_or("Fren")
    }
}
