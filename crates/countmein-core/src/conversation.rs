//! Interprets inbound text against the conversation's session state and
//! drives the poll-creation dialogue.

use countmein_db::polls;
use countmein_db::users;
use countmein_models::outbound::{ParseMode, SendMessage};
use countmein_models::update::Message;

use crate::error::CoreError;
use crate::poll;
use crate::session::SessionState;
use crate::AppState;

/// `/polls` shows at most this many entries.
const POLLS_LIST_LIMIT: i64 = 50;

fn send_text(state: &AppState, chat_id: i64, text: impl Into<String>) {
    state.outbox.enqueue(SendMessage {
        chat_id,
        text: text.into(),
        parse_mode: None,
        reply_markup: None,
    });
}

fn send_html(state: &AppState, chat_id: i64, text: String) {
    state.outbox.enqueue(SendMessage {
        chat_id,
        text,
        parse_mode: Some(ParseMode::Html),
        reply_markup: None,
    });
}

pub async fn handle_message(state: &AppState, message: &Message) -> Result<(), CoreError> {
    // Record the creator identity before interpreting anything.
    if let Some(from) = &message.from {
        users::upsert_user(
            &state.db,
            from.id,
            &from.first_name,
            from.last_name.as_deref(),
            from.username.as_deref(),
        )
        .await?;
    }

    let chat_id = message.chat.id;
    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };

    if text.starts_with("/start") {
        // Always restarts the dialogue, whatever came before.
        send_text(state, chat_id, state.prompts.new_poll);
        state.sessions.set(chat_id, SessionState::Start).await;
    } else if text == "/done" {
        handle_done(state, chat_id).await?;
    } else if text == "/polls" {
        handle_list(state, chat_id).await?;
        state.sessions.clear(chat_id).await;
    } else if let Some(rest) = text.strip_prefix("/view_") {
        handle_view(state, chat_id, rest).await?;
    } else {
        handle_plain_text(state, chat_id, text).await?;
    }
    Ok(())
}

async fn handle_done(state: &AppState, chat_id: i64) -> Result<(), CoreError> {
    let Some(SessionState::AwaitingOption(poll_id)) = state.sessions.get(chat_id).await else {
        send_text(state, chat_id, state.prompts.help);
        return Ok(());
    };
    match polls::get_poll(&state.db, poll_id).await? {
        Some(ref poll) if !poll.options().is_empty() => {
            send_text(state, chat_id, state.prompts.done);
            poll::deliver_poll(state, chat_id, poll);
            state.sessions.clear(chat_id).await;
        }
        Some(_) => {
            // Keep the session; the admin still owes us an option.
            send_text(state, chat_id, state.prompts.premature_done);
        }
        None => {
            // The poll vanished under an open dialogue. Drop the session
            // and fall back to help rather than keep pointing at nothing.
            send_text(state, chat_id, state.prompts.help);
            state.sessions.clear(chat_id).await;
        }
    }
    Ok(())
}

async fn handle_list(state: &AppState, chat_id: i64) -> Result<(), CoreError> {
    let recent = polls::list_polls_by_admin(&state.db, chat_id, POLLS_LIST_LIMIT).await?;

    let mut blocks = vec![poll::bold(state.prompts.polls_header)];
    for (index, entry) in recent.iter().enumerate() {
        blocks.push(format!("{}. {}", index + 1, poll::poll_summary_with_link(entry)));
    }
    blocks.push(state.prompts.polls_footer.to_string());

    send_html(state, chat_id, blocks.join("\n\n"));
    Ok(())
}

async fn handle_view(state: &AppState, chat_id: i64, rest: &str) -> Result<(), CoreError> {
    if let Ok(poll_id) = rest.parse::<i64>() {
        if let Some(ref poll) = polls::get_poll(&state.db, poll_id).await? {
            if poll.admin_id == chat_id {
                poll::deliver_poll(state, chat_id, poll);
                state.sessions.clear(chat_id).await;
                return Ok(());
            }
        }
    }
    // Parse failures, unknown ids, and foreign polls all look the same.
    send_text(state, chat_id, state.prompts.help);
    Ok(())
}

async fn handle_plain_text(state: &AppState, chat_id: i64, text: &str) -> Result<(), CoreError> {
    match state.sessions.get(chat_id).await {
        None => send_text(state, chat_id, state.prompts.help),
        Some(SessionState::Start) => {
            let poll = polls::create_poll(&state.db, chat_id, text).await?;
            let bold_title = poll::bold_first_line(text);
            send_html(state, chat_id, state.prompts.first_option(&bold_title));
            state
                .sessions
                .set(chat_id, SessionState::AwaitingOption(poll.id))
                .await;
        }
        Some(SessionState::AwaitingOption(poll_id)) => {
            if polls::get_poll(&state.db, poll_id).await?.is_none() {
                send_text(state, chat_id, state.prompts.help);
                state.sessions.clear(chat_id).await;
                return Ok(());
            }
            let updated = poll::append_option(&state.db, poll_id, text).await?;
            if updated.options().len() < poll::MAX_OPTIONS {
                send_text(state, chat_id, state.prompts.next_option);
            } else {
                // Hitting the option cap finalizes exactly like /done.
                send_text(state, chat_id, state.prompts.done);
                poll::deliver_poll(state, chat_id, &updated);
                state.sessions.clear(chat_id).await;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{drain, test_state};
    use countmein_models::outbound::BotRequest;
    use countmein_models::update::{Chat, User};

    fn text_message(chat_id: i64, text: &str) -> Message {
        Message {
            message_id: 1,
            from: Some(User {
                id: chat_id,
                first_name: "Sam".to_string(),
                last_name: None,
                username: Some("sam".to_string()),
            }),
            chat: Chat { id: chat_id },
            text: Some(text.to_string()),
        }
    }

    fn sent_texts(jobs: &[crate::outbox::OutboundJob]) -> Vec<String> {
        jobs.iter()
            .filter_map(|job| match &job.request {
                BotRequest::SendMessage(m) => Some(m.text.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn start_prompts_for_a_title_and_records_the_creator() {
        let (state, mut rx) = test_state().await;
        handle_message(&state, &text_message(1, "/start"))
            .await
            .expect("handle");

        assert_eq!(sent_texts(&drain(&mut rx)), vec![state.prompts.new_poll]);
        assert_eq!(state.sessions.get(1).await, Some(SessionState::Start));

        let creator = countmein_db::users::get_user(&state.db, 1)
            .await
            .expect("get")
            .expect("recorded");
        assert_eq!(creator.username.as_deref(), Some("sam"));
    }

    #[tokio::test]
    async fn title_then_options_then_done_builds_and_delivers_a_poll() {
        let (state, mut rx) = test_state().await;
        handle_message(&state, &text_message(1, "/start")).await.expect("start");
        handle_message(&state, &text_message(1, "Lunch?")).await.expect("title");

        let jobs = drain(&mut rx);
        let texts = sent_texts(&jobs);
        assert!(texts[1].starts_with("New poll: '<b>Lunch?</b>'"));
        let Some(SessionState::AwaitingOption(poll_id)) = state.sessions.get(1).await else {
            panic!("expected option state");
        };

        handle_message(&state, &text_message(1, "Pizza")).await.expect("option");
        handle_message(&state, &text_message(1, "/done")).await.expect("done");

        let jobs = drain(&mut rx);
        assert_eq!(jobs.len(), 3);
        assert_eq!(sent_texts(&jobs)[0], state.prompts.next_option);
        assert_eq!(sent_texts(&jobs)[1], state.prompts.done);
        // The delivery itself: delayed, HTML, admin buttons attached.
        let delivery = &jobs[2];
        assert_eq!(delivery.delay, poll::DELIVER_DELAY);
        let BotRequest::SendMessage(m) = &delivery.request else {
            panic!("expected sendMessage");
        };
        assert!(m.text.starts_with("<b>Lunch?</b>"));
        assert!(m.reply_markup.is_some());

        assert_eq!(state.sessions.get(1).await, None);
        let stored = polls::get_poll(&state.db, poll_id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(stored.options().len(), 1);
    }

    #[tokio::test]
    async fn done_with_no_options_does_not_finalize() {
        let (state, mut rx) = test_state().await;
        handle_message(&state, &text_message(1, "/start")).await.expect("start");
        handle_message(&state, &text_message(1, "Lunch?")).await.expect("title");
        drain(&mut rx);

        handle_message(&state, &text_message(1, "/done")).await.expect("done");
        assert_eq!(
            sent_texts(&drain(&mut rx)),
            vec![state.prompts.premature_done]
        );

        // Still collecting options: the dialogue carries on.
        handle_message(&state, &text_message(1, "Pizza")).await.expect("option");
        assert_eq!(sent_texts(&drain(&mut rx)), vec![state.prompts.next_option]);
    }

    #[tokio::test]
    async fn tenth_option_auto_finalizes_exactly_once() {
        let (state, mut rx) = test_state().await;
        handle_message(&state, &text_message(1, "/start")).await.expect("start");
        handle_message(&state, &text_message(1, "Lunch?")).await.expect("title");
        drain(&mut rx);

        for i in 1..poll::MAX_OPTIONS {
            handle_message(&state, &text_message(1, &format!("Option {i}")))
                .await
                .expect("option");
            assert_eq!(
                sent_texts(&drain(&mut rx)),
                vec![state.prompts.next_option],
                "option {i} must only prompt for the next one"
            );
        }

        handle_message(&state, &text_message(1, "Option 10"))
            .await
            .expect("tenth option");
        let jobs = drain(&mut rx);
        assert_eq!(sent_texts(&jobs)[0], state.prompts.done);
        assert_eq!(jobs.len(), 2);
        assert_eq!(state.sessions.get(1).await, None);

        // The dialogue is over; more text is no longer an option.
        handle_message(&state, &text_message(1, "Option 11"))
            .await
            .expect("after finalize");
        assert_eq!(sent_texts(&drain(&mut rx)), vec![state.prompts.help]);
    }

    #[tokio::test]
    async fn plain_text_without_a_session_gets_help() {
        let (state, mut rx) = test_state().await;
        handle_message(&state, &text_message(1, "hello?")).await.expect("handle");
        assert_eq!(sent_texts(&drain(&mut rx)), vec![state.prompts.help]);
        assert_eq!(state.sessions.get(1).await, None);
    }

    #[tokio::test]
    async fn expired_session_reads_as_no_session() {
        let (state, mut rx) = test_state().await;
        state
            .sessions
            .set_already_expired(1, SessionState::Start)
            .await;

        handle_message(&state, &text_message(1, "Lunch?")).await.expect("handle");
        assert_eq!(sent_texts(&drain(&mut rx)), vec![state.prompts.help]);
    }

    #[tokio::test]
    async fn polls_command_lists_own_polls_newest_first_and_clears_session() {
        let (state, mut rx) = test_state().await;
        let first = polls::create_poll(&state.db, 1, "First").await.expect("create");
        let second = polls::create_poll(&state.db, 1, "Second").await.expect("create");
        polls::create_poll(&state.db, 2, "Foreign").await.expect("create");
        state.sessions.set(1, SessionState::Start).await;

        handle_message(&state, &text_message(1, "/polls")).await.expect("handle");

        let jobs = drain(&mut rx);
        let BotRequest::SendMessage(m) = &jobs[0].request else {
            panic!("expected sendMessage");
        };
        assert!(m.text.starts_with("<b>Your polls</b>"));
        assert!(m.text.contains(&format!("1. <b>Second</b> Nobody responded.\n/view_{}", second.id)));
        assert!(m.text.contains(&format!("2. <b>First</b> Nobody responded.\n/view_{}", first.id)));
        assert!(!m.text.contains("Foreign"));
        assert!(m.text.ends_with(state.prompts.polls_footer));
        assert_eq!(state.sessions.get(1).await, None);
    }

    #[tokio::test]
    async fn view_delivers_own_poll_and_rejects_everything_else() {
        let (state, mut rx) = test_state().await;
        let own = polls::create_poll(&state.db, 1, "Mine").await.expect("create");
        let foreign = polls::create_poll(&state.db, 2, "Theirs").await.expect("create");

        handle_message(&state, &text_message(1, &format!("/view_{}", own.id)))
            .await
            .expect("own");
        let jobs = drain(&mut rx);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].delay, poll::DELIVER_DELAY);

        handle_message(&state, &text_message(1, &format!("/view_{}", foreign.id)))
            .await
            .expect("foreign");
        assert_eq!(sent_texts(&drain(&mut rx)), vec![state.prompts.help]);

        handle_message(&state, &text_message(1, "/view_abc"))
            .await
            .expect("bad id");
        assert_eq!(sent_texts(&drain(&mut rx)), vec![state.prompts.help]);
    }

    #[tokio::test]
    async fn option_text_for_a_deleted_poll_resets_the_dialogue() {
        let (state, mut rx) = test_state().await;
        handle_message(&state, &text_message(1, "/start")).await.expect("start");
        handle_message(&state, &text_message(1, "Lunch?")).await.expect("title");
        drain(&mut rx);

        let Some(SessionState::AwaitingOption(poll_id)) = state.sessions.get(1).await else {
            panic!("expected option state");
        };
        polls::delete_poll(&state.db, poll_id).await.expect("delete");

        handle_message(&state, &text_message(1, "Pizza")).await.expect("orphan");
        assert_eq!(sent_texts(&drain(&mut rx)), vec![state.prompts.help]);
        assert_eq!(state.sessions.get(1).await, None);
    }
}
