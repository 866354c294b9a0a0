//! Poll rendering, button layouts, and the vote-toggle operation.

use std::collections::HashSet;
use std::time::Duration;

use countmein_db::polls::{self, PollOption, PollRow, Voter, TITLE_PREFIX_LEN};
use countmein_db::DbPool;
use countmein_models::keyboard::{InlineKeyboardButton, InlineKeyboardMarkup};
use countmein_models::outbound::{ParseMode, SendMessage};

use crate::error::CoreError;
use crate::AppState;

/// A poll auto-finalizes when it reaches this many options.
pub const MAX_OPTIONS: usize = 10;

/// Upper bound on optimistic-write retries for one toggle. A retry only
/// happens when another writer made progress, so with realistic fan-in this
/// budget is never exhausted.
const TOGGLE_MAX_ATTEMPTS: u32 = 8;

/// Poll delivery trails the acknowledgment message slightly so the two
/// arrive in a sensible order despite the queue's loose ordering.
pub const DELIVER_DELAY: Duration = Duration::from_millis(500);

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn bold(text: &str) -> String {
    format!("<b>{}</b>", escape_html(text))
}

/// Bold only the first line; the rest stays plain (but escaped).
pub fn bold_first_line(text: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest)) => format!("{}\n{}", bold(first), escape_html(rest)),
        None => bold(text),
    }
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Human-readable share key for a poll, fed into the inline-query box.
pub fn friendly_id(poll: &PollRow) -> String {
    truncate_chars(&poll.title, TITLE_PREFIX_LEN)
}

pub fn options_summary(poll: &PollRow) -> String {
    poll.options()
        .iter()
        .map(|option| option.title.as_str())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// "Nobody responded" / "1 person responded" / "N people responded",
/// counting distinct voters across all options.
pub fn respondents_summary(poll: &PollRow) -> String {
    let distinct: HashSet<i64> = poll
        .options()
        .iter()
        .flat_map(|option| option.people.iter().map(|voter| voter.id))
        .collect();
    match distinct.len() {
        0 => "Nobody responded".to_string(),
        1 => "1 person responded".to_string(),
        n => format!("{n} people responded"),
    }
}

fn render_option(option: &PollOption) -> String {
    let names = option
        .people
        .iter()
        .map(|voter| escape_html(&voter.first_name))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n{}", bold(&option.title), names)
}

/// The full poll view: bold title, one block per option listing voter
/// first names in insertion order, and the respondent count.
pub fn render_text(poll: &PollRow) -> String {
    let mut blocks = vec![bold_first_line(&poll.title)];
    blocks.extend(poll.options().iter().map(render_option));
    blocks.push(format!("\u{1f465} {}", respondents_summary(poll)));
    blocks.join("\n\n")
}

/// One-line listing entry with a deep link back to the admin view.
pub fn poll_summary_with_link(poll: &PollRow) -> String {
    format!(
        "{} {}.\n/view_{}",
        bold(&truncate_chars(&poll.title, 65)),
        respondents_summary(poll),
        poll.id
    )
}

/// One button row per option; an extra Back row for the admin variant.
pub fn build_vote_buttons(poll: &PollRow, admin: bool) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = poll
        .options()
        .iter()
        .enumerate()
        .map(|(index, option)| {
            vec![InlineKeyboardButton::callback(
                option.title.clone(),
                format!("{} {}", poll.id, index),
            )]
        })
        .collect();
    if admin {
        rows.push(vec![InlineKeyboardButton::callback(
            "Back",
            format!("{} back", poll.id),
        )]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn build_admin_buttons(poll: &PollRow) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::switch_inline(
            "Publish poll",
            friendly_id(poll),
        )],
        vec![InlineKeyboardButton::callback(
            "Update results",
            format!("{} refresh", poll.id),
        )],
        vec![
            InlineKeyboardButton::callback("Vote", format!("{} vote", poll.id)),
            InlineKeyboardButton::callback("Delete", format!("{} delete", poll.id)),
        ],
    ])
}

/// Append an option with a fresh empty voter list. Retries the write when
/// a concurrent toggle bumped the poll's version in between.
pub async fn append_option(
    pool: &DbPool,
    poll_id: i64,
    title: &str,
) -> Result<PollRow, CoreError> {
    for _ in 0..TOGGLE_MAX_ATTEMPTS {
        let poll = polls::get_poll(pool, poll_id)
            .await?
            .ok_or(CoreError::PollNotFound)?;
        let mut options = poll.options().to_vec();
        options.push(PollOption::new(title));
        if let Some(updated) = polls::update_options(pool, poll_id, poll.version, &options).await? {
            return Ok(updated);
        }
        tracing::debug!(poll_id, "append lost a version race, retrying");
    }
    Err(CoreError::ContentionExhausted)
}

/// Toggle one voter's membership on one option.
///
/// Runs as a bounded optimistic read-modify-write: read, flip membership in
/// memory, compare-and-swap on the poll's version. A lost race re-reads and
/// retries, so concurrent toggles against the same poll never overwrite
/// each other. Returns the updated poll and the status line to show the
/// voter.
pub async fn toggle_vote(
    pool: &DbPool,
    poll_id: i64,
    option_index: usize,
    voter: Voter,
) -> Result<(PollRow, String), CoreError> {
    for _ in 0..TOGGLE_MAX_ATTEMPTS {
        let poll = polls::get_poll(pool, poll_id)
            .await?
            .ok_or(CoreError::PollNotFound)?;
        if option_index >= poll.options().len() {
            return Err(CoreError::InvalidOption);
        }

        let mut options = poll.options().to_vec();
        let option = &mut options[option_index];
        let action = match option.people.iter().position(|p| p.id == voter.id) {
            Some(position) => {
                option.people.remove(position);
                "removed from"
            }
            None => {
                option.people.push(voter.clone());
                "added to"
            }
        };
        let status = format!("Your name was {action} {}!", option.title);

        if let Some(updated) = polls::update_options(pool, poll_id, poll.version, &options).await? {
            return Ok((updated, status));
        }
        tracing::debug!(poll_id, option_index, "toggle lost a version race, retrying");
    }
    Err(CoreError::ContentionExhausted)
}

/// Queue delivery of the admin view into the admin's chat.
pub fn deliver_poll(state: &AppState, chat_id: i64, poll: &PollRow) {
    state.outbox.enqueue_delayed(
        SendMessage {
            chat_id,
            text: render_text(poll),
            parse_mode: Some(ParseMode::Html),
            reply_markup: Some(build_admin_buttons(poll)),
        },
        DELIVER_DELAY,
    );
}
