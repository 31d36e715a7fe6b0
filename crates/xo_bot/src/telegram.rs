//! Telegram transport.
//!
//! Inline queries get the game invitation; button presses are decoded, run
//! through the [`Router`] on a blocking worker and the resulting [`Reply`]
//! is applied to the inline message.

use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResult, InlineQueryResultArticle,
    InputMessageContent, InputMessageContentText, User,
};
use tracing::{debug, info, instrument, warn};
use xo_engine::presentation::{Invitation, Keyboard};
use xo_engine::protocol::{Action, ProtocolError};
use xo_engine::{Participant, UserId};

use crate::config::BotConfig;
use crate::handler::{Reply, Router, TRY_AGAIN};
use crate::store::AnyStore;

/// Article id; there is only ever one result.
const ARTICLE_ID: &str = "1";

/// Shared state handed to every update handler.
#[derive(Debug)]
pub struct BotState {
    router: Router<AnyStore>,
    config: BotConfig,
}

impl BotState {
    /// Bundles the router with the settings the transport reads.
    pub fn new(router: Router<AnyStore>, config: BotConfig) -> Self {
        Self { router, config }
    }
}

/// Converts the engine keyboard into Telegram markup.
///
/// # Errors
///
/// Returns [`ProtocolError`] if a button's action does not fit callback data.
pub fn markup(keyboard: &Keyboard) -> Result<InlineKeyboardMarkup, ProtocolError> {
    let rows = keyboard
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| {
                    Ok(InlineKeyboardButton::callback(
                        button.label().clone(),
                        button.action().encode()?,
                    ))
                })
                .collect::<Result<Vec<_>, ProtocolError>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

/// Maps a Telegram user to a game participant.
///
/// # Errors
///
/// Fails only for ids outside `i64`, which Telegram does not issue.
pub fn participant(user: &User) -> Result<Participant> {
    let id = i64::try_from(user.id.0).context("Telegram user id out of range")?;
    Ok(Participant::new(UserId(id), user.full_name()))
}

/// Runs the long-polling dispatcher until Ctrl-C.
#[instrument(skip_all)]
pub async fn run(token: String, state: BotState) -> Result<()> {
    let bot = Bot::new(token);
    let state = Arc::new(state);

    let handler = dptree::entry()
        .branch(Update::filter_inline_query().endpoint(on_inline_query))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    info!("Starting dispatcher");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped");
    Ok(())
}

#[instrument(skip_all, fields(user_id = q.from.id.0))]
async fn on_inline_query(bot: Bot, q: InlineQuery, state: Arc<BotState>) -> Result<()> {
    let initiator = participant(&q.from)?;
    let invitation = Invitation::new(
        *initiator.id(),
        state.config.article_title(),
        state.config.article_description(),
    );

    let article = InlineQueryResultArticle::new(
        ARTICLE_ID,
        invitation.title().clone(),
        InputMessageContent::Text(InputMessageContentText::new(invitation.text().clone())),
    )
    .description(invitation.description().clone())
    .reply_markup(markup(invitation.keyboard())?);

    bot.answer_inline_query(q.id.clone(), vec![InlineQueryResult::Article(article)])
        .is_personal(true)
        .cache_time(0)
        .await?;
    debug!("Invitation offered");
    Ok(())
}

#[instrument(skip_all, fields(user_id = q.from.id.0))]
async fn on_callback(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> Result<()> {
    let Some(inline_id) = q.inline_message_id.clone() else {
        debug!("Callback outside an inline message");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let action = match q.data.as_deref().map(Action::decode) {
        Some(Ok(action)) => action,
        other => {
            warn!(?other, "Ignoring undecodable callback data");
            bot.answer_callback_query(q.id.clone()).await?;
            return Ok(());
        }
    };

    let presser = participant(&q.from)?;
    let worker = Arc::clone(&state);
    let context = inline_id.clone();
    let dispatched =
        tokio::task::spawn_blocking(move || worker.router.dispatch(&context, &presser, &action))
            .await;

    // The press is answered even when dispatch fails; the failure is
    // reported after the answer.
    let (reply, failure) = match dispatched {
        Ok(result) => {
            let (reply, failure) = Reply::or_try_again(result);
            (reply, failure.map(anyhow::Error::from))
        }
        Err(join) => (
            Reply::Reject {
                notice: TRY_AGAIN.to_string(),
            },
            Some(anyhow::Error::from(join).context("Router task panicked")),
        ),
    };

    match reply {
        Reply::Update { text, keyboard } => {
            bot.edit_message_text_inline(inline_id, text)
                .reply_markup(markup(&keyboard)?)
                .await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
        Reply::UpdateKeyboard { keyboard } => {
            bot.edit_message_reply_markup_inline(inline_id)
                .reply_markup(markup(&keyboard)?)
                .await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
        Reply::Finish { text } => {
            bot.edit_message_text_inline(inline_id, text).await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
        Reply::Reject { notice } => {
            bot.answer_callback_query(q.id.clone())
                .text(notice)
                .show_alert(true)
                .cache_time(*state.config.answer_cache_time())
                .await?;
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xo_engine::presentation::{board_keyboard, sign_keyboard};
    use xo_engine::{Board, SessionId};

    #[test]
    fn test_board_markup_is_three_by_three() {
        let markup = markup(&board_keyboard(SessionId(12), &Board::new())).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 3);
        assert!(markup.inline_keyboard.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn test_sign_markup_has_both_signs() {
        let keyboard = sign_keyboard(UserId(5), None, None);
        let markup = markup(&keyboard).unwrap();
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "❌");
    }
}
