mod period;

use std::sync::{Arc, Weak};

use bot_commons::{is_present_in, useful_methods::mention_html};
use chrono::{DateTime, Utc, Weekday};
use rand::seq::SliceRandom;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::*,
    types::{ChatId, ParseMode},
};

pub use period::{anniversary_months, Period};

use crate::{
    context::BotContext,
    database::MemberInfo,
    renewal::renew_responses,
    responses::{fill, Category},
    Error,
};

const DAILY_GREETING_COUNT: usize = 3;
const HEALTH_REMINDER_TAG_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    HealthReminder,
    DailyGreeting,
    Anniversaries,
    BirthdayAsk,
    Renewal,
}

struct Job {
    /// Key in the schedule log.
    name: &'static str,
    period: Period,
    kind: JobKind,
}

/// All times are UTC.
const JOBS: &[Job] = &[
    Job {
        name: "health_reminder_08",
        period: Period::Daily { hour: 8 },
        kind: JobKind::HealthReminder,
    },
    Job {
        name: "health_reminder_14",
        period: Period::Daily { hour: 14 },
        kind: JobKind::HealthReminder,
    },
    Job {
        name: "health_reminder_20",
        period: Period::Daily { hour: 20 },
        kind: JobKind::HealthReminder,
    },
    Job {
        name: "daily_greeting",
        period: Period::Daily { hour: 10 },
        kind: JobKind::DailyGreeting,
    },
    Job {
        name: "anniversaries",
        period: Period::Daily { hour: 12 },
        kind: JobKind::Anniversaries,
    },
    Job {
        name: "birthday_ask",
        period: Period::Weekly {
            weekday: Weekday::Mon,
            hour: 15,
        },
        kind: JobKind::BirthdayAsk,
    },
    Job {
        name: "ai_renewal",
        period: Period::Weekly {
            weekday: Weekday::Sun,
            hour: 3,
        },
        kind: JobKind::Renewal,
    },
];

/// Runs the periodic jobs. Each job runs at most once per occurrence of its
/// period, no matter how many times or from where it's polled.
pub struct Scheduler {
    bot: Bot,
    context: Arc<BotContext>,
}

impl Scheduler {
    #[must_use]
    pub fn new(bot: Bot, context: Arc<BotContext>) -> Scheduler {
        Scheduler { bot, context }
    }

    /// Run every job that is due right now.
    pub async fn poll(&self) {
        self.poll_at(Utc::now()).await;
    }

    /// Run every job that is due at `now`.
    pub async fn poll_at(&self, now: DateTime<Utc>) {
        for job in JOBS {
            let Some(marker) = job.period.marker(now) else {
                continue;
            };

            let group = self.context.config.group_chat_id;
            let runnable = match job.kind {
                JobKind::Renewal => self.context.llm.is_some(),
                _ => group.is_some(),
            };
            if !runnable {
                continue;
            }

            match self
                .context
                .database
                .claim_schedule_period(job.name, &marker)
                .await
            {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    log::error!("Database error! {e:?}");
                    continue;
                }
            }

            log::info!("Running scheduled job {} for {marker}", job.name);

            let result = match (job.kind, group) {
                (JobKind::Renewal, _) => self.renewal().await,
                (_, None) => Ok(()),
                (JobKind::HealthReminder, Some(group)) => self.health_reminder(group).await,
                (JobKind::DailyGreeting, Some(group)) => self.daily_greeting(group, now).await,
                (JobKind::Anniversaries, Some(group)) => self.anniversaries(group, now).await,
                (JobKind::BirthdayAsk, Some(group)) => self.birthday_ask(group).await,
            };

            if let Err(e) = result {
                log::error!("Scheduled job {} failed: {e}", job.name);
            }
        }
    }

    /// Launches an ever-running loop that polls the jobs every minute, for as
    /// long as the scheduler exists.
    pub async fn spinloop(scheduler: Weak<Scheduler>) {
        use tokio::time::{sleep, Duration};

        if let Some(scheduler) = scheduler.upgrade() {
            for job in JOBS {
                match scheduler.context.database.last_schedule_marker(job.name).await {
                    Ok(Some(marker)) => log::info!("Job {} last ran for {marker}", job.name),
                    Ok(None) => log::info!("Job {} never ran yet", job.name),
                    Err(e) => log::error!("Database error! {e:?}"),
                }
            }
        }

        loop {
            let Some(scheduler) = scheduler.upgrade() else {
                // No more scheduler!
                return;
            };

            scheduler.poll().await;

            // Drop the upgraded scheduler.
            drop(scheduler);
            sleep(Duration::from_secs(60)).await;
        }
    }

    async fn send(&self, group: ChatId, text: String) -> Result<(), Error> {
        self.bot
            .send_message(group, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    /// Members from `candidates` that are still in the group, up to `limit`
    /// of them, in order.
    async fn present_members(
        &self,
        group: ChatId,
        candidates: Vec<MemberInfo>,
        limit: usize,
    ) -> Vec<MemberInfo> {
        let mut present = Vec::new();
        for member in candidates {
            if present.len() >= limit {
                break;
            }
            match is_present_in(&self.bot, member.user_id(), group).await {
                Ok(true) => present.push(member),
                Ok(false) => log::debug!("{} is no longer in the group.", member.user_id()),
                Err(e) => log::warn!("Couldn't check if {} is present: {e}", member.user_id()),
            }
        }
        present
    }

    async fn health_reminder(&self, group: ChatId) -> Result<(), Error> {
        let mut members = self.context.database.all_members().await?;
        members.shuffle(&mut rand::rng());

        let tagged = self
            .present_members(group, members, HEALTH_REMINDER_TAG_COUNT)
            .await;

        let tags = if tagged.is_empty() {
            "Frens".to_string()
        } else {
            tagged
                .iter()
                .map(|x| mention_html(x.user_id(), x.mention_name()))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let reminder = fill(
            &self.context.responses.pick(Category::HealthReminder),
            &[("tags", &tags)],
        );
        self.send(group, format!("🚨 <b>ATTENTION NPEPE ARMY</b> 🚨\n\n{reminder}"))
            .await
    }

    async fn daily_greeting(&self, group: ChatId, now: DateTime<Utc>) -> Result<(), Error> {
        let members = self.context.database.members_by_least_recent_contact().await?;
        let members = self
            .present_members(group, members, DAILY_GREETING_COUNT)
            .await;

        if members.is_empty() {
            log::warn!("No members to greet today.");
            return Ok(());
        }

        let text = members
            .iter()
            .map(|x| {
                let mention = mention_html(x.user_id(), x.mention_name());
                fill(
                    &self.context.responses.pick(Category::DailyGreeting),
                    &[("mention", &mention)],
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        self.send(group, text).await?;

        for member in &members {
            self.context
                .database
                .touch_member(member.user_id(), now)
                .await?;
        }
        Ok(())
    }

    async fn anniversaries(&self, group: ChatId, now: DateTime<Utc>) -> Result<(), Error> {
        let today = now.date_naive();

        let due: Vec<(MemberInfo, u32)> = self
            .context
            .database
            .all_members()
            .await?
            .into_iter()
            .filter_map(|x| {
                anniversary_months(x.joined_date(), today, x.last_thanked_month())
                    .map(|months| (x, months))
            })
            .collect();

        let mut thanked = Vec::new();
        for (member, months) in due {
            match is_present_in(&self.bot, member.user_id(), group).await {
                Ok(true) => thanked.push((member, months)),
                Ok(false) => {}
                Err(e) => log::warn!("Couldn't check if {} is present: {e}", member.user_id()),
            }
        }

        if thanked.is_empty() {
            return Ok(());
        }

        let text = thanked
            .iter()
            .map(|(member, months)| {
                let mention = mention_html(member.user_id(), member.mention_name());
                fill(
                    &self.context.responses.pick(Category::MembershipAnniversary),
                    &[("mention", &mention), ("months", &months.to_string())],
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        // Only mark them as thanked once they actually were.
        self.send(group, text).await?;

        for (member, months) in thanked {
            self.context
                .database
                .set_last_thanked_month(member.user_id(), months)
                .await?;
            log::info!("Thanked {} for {months} months.", member.user_id());
        }
        Ok(())
    }

    async fn birthday_ask(&self, group: ChatId) -> Result<(), Error> {
        let text = fill(&self.context.responses.pick(Category::BirthdayAsk), &[]);
        self.send(group, text).await
    }

    async fn renewal(&self) -> Result<(), Error> {
        if let Some(llm) = &self.context.llm {
            let report = renew_responses(llm, &self.context.responses).await;
            log::info!(
                "Phrase renewal done: {} updated, {} with too few lines, {} failed.",
                report.updated,
                report.too_few_lines,
                report.failed
            );
        }
        Ok(())
    }
}
