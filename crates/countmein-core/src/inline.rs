//! Inline search over the asker's own polls, newest first.

use countmein_db::polls;
use countmein_models::outbound::{
    AnswerInlineQuery, InlineQueryResultArticle, InputMessageContent, ParseMode,
};
use countmein_models::update::InlineQuery;

use crate::error::CoreError;
use crate::poll;
use crate::AppState;

const INLINE_RESULT_LIMIT: i64 = 50;

pub async fn handle_inline_query(state: &AppState, query: &InlineQuery) -> Result<(), CoreError> {
    let prefix = query.query.to_lowercase();
    let matches =
        polls::search_polls_by_title_prefix(&state.db, query.from.id, &prefix, INLINE_RESULT_LIMIT)
            .await?;

    let results = matches
        .iter()
        .map(|entry| {
            InlineQueryResultArticle::new(
                entry.id.to_string(),
                entry.title.clone(),
                poll::options_summary(entry),
                InputMessageContent {
                    message_text: poll::render_text(entry),
                    parse_mode: Some(ParseMode::Html),
                },
                poll::build_vote_buttons(entry, false),
                state.config.thumb_url.clone(),
            )
        })
        .collect();

    // cache_time 0: results must track votes, never a cached snapshot.
    state.outbox.enqueue(AnswerInlineQuery {
        inline_query_id: query.id.clone(),
        results,
        cache_time: 0,
        switch_pm_text: state.prompts.create_new_poll.to_string(),
        switch_pm_parameter: "new".to_string(),
    });
    Ok(())
}
