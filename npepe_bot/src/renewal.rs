use std::sync::LazyLock;

use regex::Regex;

use crate::{
    llm::{ChatMessage, LlmClient},
    responses::{Category, ResponsePool},
};

const SLANG: &str = "Use $NPEPE slang: 'fren', 'ribbit', 'HODL', 'based', 'LFG', 'WAGMI'.";

/// How a category is refreshed: what to ask for and how many usable lines
/// are needed before the old pool gets replaced.
struct RenewalRequest {
    category: Category,
    prompt: String,
    min_count: usize,
}

fn renewal_requests() -> Vec<RenewalRequest> {
    let request = |category, prompt: &str, min_count| RenewalRequest {
        category,
        prompt: format!("{prompt} {SLANG} Put every message on its own line."),
        min_count,
    };

    vec![
        request(
            Category::GreetNewMembersDelayed,
            "Write 50 unique, friendly and funny welcome messages for people who joined a \
            crypto community group a few minutes ago. Every message must contain the \
            placeholder '{name}'.",
            40,
        ),
        request(
            Category::DailyGreeting,
            "Write 50 short, energetic check-in messages for a crypto group bot. Each one \
            tags a member with the placeholder '{mention}' and asks how their day or their \
            HODLing is going.",
            40,
        ),
        request(
            Category::MembershipAnniversary,
            "Write 50 unique, proud messages thanking a member of a meme coin community for \
            holding for some months. Every message must contain the placeholders '{mention}' \
            for the member and '{months}' for the number of months. Mention diamond hands.",
            40,
        ),
        request(
            Category::BirthdayAsk,
            "Write 30 fun, casual messages asking a meme coin community whether anyone has \
            a birthday this week.",
            25,
        ),
        request(
            Category::BirthdayGreeting,
            "Write 30 energetic, funny birthday wishes for a meme coin community member. \
            Every message must contain the placeholder '{name}'.",
            25,
        ),
        request(
            Category::HealthReminder,
            "Write 100 caring, meme-flavored messages reminding crypto traders to take a \
            break, eat, rest and spend time with loved ones to avoid burnout. Every message \
            must contain the placeholder '{tags}' for a list of mentions.",
            80,
        ),
        request(
            Category::BotIdentity,
            "Write 20 short, chaotic and proud answers a meme coin bot gives when asked what \
            it is. The bot is a frog whose job is keeping members sane while they HODL $NPEPE.",
            15,
        ),
        request(
            Category::CollaborationResponse,
            "Write 20 enthusiastic answers a meme coin bot gives when someone offers \
            collaboration or paid marketing. Favor community effort like raids and memes over \
            paid promotion.",
            15,
        ),
    ]
}

/// Split raw generated text into candidate lines: one per line or numbered
/// list item, trimmed, without the too-short ones.
#[must_use]
pub fn parse_generated_lines(text: &str) -> Vec<String> {
    static SEPARATOR: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n|\d+\.").expect("Regex will always be valid"));

    SEPARATOR
        .split(text)
        .map(str::trim)
        .filter(|x| x.chars().count() > 5)
        .map(str::to_string)
        .collect()
}

/// Keep only the lines usable for `category`, i.e. ones that contain every
/// placeholder it needs.
#[must_use]
pub fn accept_lines(category: Category, lines: Vec<String>) -> Vec<String> {
    let placeholders = category.required_placeholders();
    lines
        .into_iter()
        .filter(|line| placeholders.iter().all(|p| line.contains(p)))
        .collect()
}

/// Outcome of a [`renew_responses`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenewalReport {
    pub updated: usize,
    pub too_few_lines: usize,
    pub failed: usize,
}

/// Ask the LLM for fresh lines for every renewable category and swap them
/// into `pool` if enough of them are usable. Failures are logged and the
/// remaining categories are still attempted.
pub async fn renew_responses(llm: &LlmClient, pool: &ResponsePool) -> RenewalReport {
    log::info!("Starting AI renewal of canned responses with {}...", llm.model());
    let mut report = RenewalReport::default();

    for request in renewal_requests() {
        let category = request.category;
        log::info!("Requesting new lines for {category}...");

        let text = match llm
            .complete(&[ChatMessage::system(request.prompt)], 1.0, 2000)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to renew {category}: {e}");
                report.failed += 1;
                continue;
            }
        };

        let lines = accept_lines(category, parse_generated_lines(&text));

        if lines.len() >= request.min_count {
            log::info!(
                "Renewed {category}: {} old lines, {} new ones.",
                pool.len(category),
                lines.len()
            );
            pool.replace(category, lines);
            report.updated += 1;
        } else {
            log::warn!(
                "Renewal of {category} only produced {} usable lines (needed {}), keeping the old ones.",
                lines.len(),
                request.min_count
            );
            report.too_few_lines += 1;
        }
    }

    report
}
