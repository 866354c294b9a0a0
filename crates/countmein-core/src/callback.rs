//! Button-press dispatch: vote toggles, admin actions, and the view swap
//! between the admin panel and the respondent keyboard.

use countmein_db::polls::{self, PollRow, Voter};
use countmein_db::respondents;
use countmein_models::keyboard::InlineKeyboardMarkup;
use countmein_models::outbound::{
    AnswerCallbackQuery, EditMessageReplyMarkup, EditMessageText, MessageTarget, ParseMode,
};
use countmein_models::update::CallbackQuery;

use crate::error::CoreError;
use crate::poll;
use crate::AppState;

/// What the button payload asks for, after splitting off the poll id.
enum Action {
    Vote(usize),
    Refresh,
    ShowVoteView,
    Delete,
    Back,
}

fn parse_callback_data(data: &str) -> Option<(i64, Action)> {
    let mut parts = data.split_whitespace();
    let poll_id = parts.next()?.parse::<i64>().ok()?;
    let action = match parts.next()? {
        "refresh" => Action::Refresh,
        "vote" => Action::ShowVoteView,
        "delete" => Action::Delete,
        "back" => Action::Back,
        raw => Action::Vote(raw.parse::<usize>().ok()?),
    };
    if parts.next().is_some() {
        return None;
    }
    Some((poll_id, action))
}

pub async fn handle_callback(state: &AppState, query: &CallbackQuery) -> Result<(), CoreError> {
    let answer = |text: &str| AnswerCallbackQuery {
        callback_query_id: query.id.clone(),
        text: text.to_string(),
    };

    // Record the respondent identity first; under write overload we answer
    // apologetically instead of half-processing the press.
    let identity = respondents::upsert_respondent(
        &state.db,
        query.from.id,
        &query.from.first_name,
        query.from.last_name.as_deref(),
        query.from.username.as_deref(),
    )
    .await;
    if let Err(err) = identity {
        if err.is_overload() {
            tracing::warn!(user_id = query.from.id, "identity write overloaded");
            state.outbox.enqueue(answer(state.prompts.over_quota));
            return Ok(());
        }
        return Err(err.into());
    }

    let (target, is_inline) = match (&query.inline_message_id, &query.message) {
        (Some(inline_message_id), _) => (
            MessageTarget::Inline {
                inline_message_id: inline_message_id.clone(),
            },
            true,
        ),
        (None, Some(message)) => (
            MessageTarget::Chat {
                chat_id: message.chat.id,
                message_id: message.message_id,
            },
            false,
        ),
        (None, None) => {
            tracing::warn!(query_id = %query.id, "callback without a message context");
            state.outbox.enqueue(answer(state.prompts.invalid_data));
            return Ok(());
        }
    };

    let Some((poll_id, action)) = query.data.as_deref().and_then(parse_callback_data) else {
        tracing::warn!(
            user_id = query.from.id,
            data = query.data.as_deref().unwrap_or(""),
            "malformed callback payload"
        );
        state.outbox.enqueue(answer(state.prompts.invalid_data));
        return Ok(());
    };

    let Some(current) = polls::get_poll(&state.db, poll_id).await? else {
        clear_buttons(state, target);
        state.outbox.enqueue(answer(state.prompts.deleted));
        return Ok(());
    };

    match action {
        Action::Vote(option_index) => {
            let voter = Voter {
                id: query.from.id,
                first_name: query.from.first_name.clone(),
                last_name: query.from.last_name.clone(),
            };
            match poll::toggle_vote(&state.db, poll_id, option_index, voter).await {
                Ok((updated, status)) => {
                    // The inline copy never shows the admin keyboard; the
                    // chat copy a press can reach is always the vote view
                    // of the admin's own message.
                    let markup = poll::build_vote_buttons(&updated, !is_inline);
                    edit_poll_view(state, target, &updated, markup);
                    state.outbox.enqueue(answer(&status));
                }
                Err(CoreError::PollNotFound) => {
                    clear_buttons(state, target);
                    state.outbox.enqueue(answer(state.prompts.deleted));
                }
                Err(CoreError::InvalidOption) => {
                    tracing::warn!(user_id = query.from.id, poll_id, option_index, "vote for an option that does not exist");
                    state.outbox.enqueue(answer(state.prompts.invalid_data));
                }
                Err(err) => return Err(err),
            }
        }
        Action::Refresh if !is_inline => {
            edit_poll_view(state, target, &current, poll::build_admin_buttons(&current));
            state.outbox.enqueue(answer(state.prompts.results_updated));
        }
        Action::ShowVoteView if !is_inline => {
            state.outbox.enqueue(EditMessageReplyMarkup {
                target,
                reply_markup: Some(poll::build_vote_buttons(&current, true)),
            });
            state.outbox.enqueue(answer(state.prompts.may_now_vote));
        }
        Action::Delete if !is_inline => {
            polls::delete_poll(&state.db, poll_id).await?;
            clear_buttons(state, target);
            state.outbox.enqueue(answer(state.prompts.poll_deleted));
        }
        Action::Back if !is_inline => {
            state.outbox.enqueue(EditMessageReplyMarkup {
                target,
                reply_markup: Some(poll::build_admin_buttons(&current)),
            });
            state.outbox.enqueue(answer(""));
        }
        // Admin actions arriving through an inline message are forged.
        _ => {
            tracing::warn!(user_id = query.from.id, poll_id, "admin action on an inline message");
            state.outbox.enqueue(answer(state.prompts.invalid_data));
        }
    }
    Ok(())
}

fn edit_poll_view(
    state: &AppState,
    target: MessageTarget,
    poll: &PollRow,
    markup: InlineKeyboardMarkup,
) {
    state.outbox.enqueue(EditMessageText {
        target,
        text: poll::render_text(poll),
        parse_mode: Some(ParseMode::Html),
        reply_markup: Some(markup),
    });
}

/// Strip the keyboard off a message whose poll no longer exists.
fn clear_buttons(state: &AppState, target: MessageTarget) {
    state.outbox.enqueue(EditMessageReplyMarkup {
        target,
        reply_markup: Some(InlineKeyboardMarkup::empty()),
    });
}
