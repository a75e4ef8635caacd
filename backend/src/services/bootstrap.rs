/* algopath-bot
 * Copyright (C) 2025 Algopath Community
 *
 * This library is free software; you can redistribute it and/or
 * modify it under the terms of the GNU Lesser General Public
 * License as published by the Free Software Foundation; either
 * version 2 of the License, or (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU
 * Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public
 * License along with this library; if not, write to the
 * Free Software Foundation, Inc., 59 Temple Place - Suite 330,
 * Boston, MA 02111-1307, USA.
 */

//! Startup prompts. Every step dedupes against channel history so a
//! restart never double-posts, and every step is best-effort: a failure
//! here must not keep the bot from serving events.

use actix_web::web;
use serde_json::json;

use crate::discord::components;
use crate::error::Error;
use crate::AppState;

const WELCOME_MARKER: &str = "👋 Welcome to Algopath";
const VERIFY_MARKER: &str = "🔒 Verify to join";
const ASK_MARKER: &str = "📌 Got doubts?";

pub async fn post_startup_prompts(state: &web::Data<AppState>) {
    if let Err(err) = post_welcome_prompt(state).await {
        log::warn!("Failed to post welcome message: {err}");
    }
    if let Err(err) = post_verify_prompt(state).await {
        log::warn!("Failed to post verify button: {err}");
    }
    if let Err(err) = post_ask_prompt(state).await {
        log::warn!("Failed to pin ask/view buttons: {err}");
    }
}

async fn post_welcome_prompt(state: &web::Data<AppState>) -> Result<(), Error> {
    let Some(welcome_channel) = &state.config.welcome_channel else {
        return Ok(());
    };

    let recent = state.chat.recent_messages(welcome_channel, 20).await?;
    if recent.iter().any(|m| m.content.contains(WELCOME_MARKER)) {
        return Ok(());
    }

    let content = format!(
        "👋 Welcome to Algopath Community!\nTo get started, please go to <#{}> and click the verify button.",
        state.config.verify_channel
    );
    state
        .chat
        .send_channel_message(welcome_channel, &components::channel_message(&content))
        .await?;
    Ok(())
}

async fn post_verify_prompt(state: &web::Data<AppState>) -> Result<(), Error> {
    let channel = &state.config.verify_channel;

    let recent = state.chat.recent_messages(channel, 10).await?;
    if recent.iter().any(|m| m.content.contains(VERIFY_MARKER)) {
        return Ok(());
    }

    let payload = components::channel_message_with_components(
        "🔒 Verify to join",
        vec![components::verify_button_row()],
    );
    state.chat.send_channel_message(channel, &payload).await?;
    Ok(())
}

async fn post_ask_prompt(state: &web::Data<AppState>) -> Result<(), Error> {
    let channel = &state.config.open_doubts_channel;

    let pinned = state.chat.pinned_messages(channel).await?;
    if pinned.iter().any(|m| m.content.contains(ASK_MARKER)) {
        return Ok(());
    }

    let payload = components::channel_message_with_components(
        "📌 Got doubts? Use the buttons below anytime:",
        vec![components::ask_view_button_row()],
    );
    let msg_ref = state.chat.send_channel_message(channel, &payload).await?;
    state
        .chat
        .pin_message(&msg_ref.channel_id, &msg_ref.message_id)
        .await?;
    Ok(())
}

/// Guild-scoped command registration, re-run on every startup (the
/// platform upserts by name).
pub async fn register_commands(state: &web::Data<AppState>) {
    let commands = json!([
        {
            "name": "doubts",
            "description": "List the most recent open doubts",
            "type": 1
        }
    ]);
    if let Err(err) = state.chat.register_guild_commands(&commands).await {
        log::warn!("Failed to register guild commands: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::api::ChatMessage;
    use crate::tests::{create_test_state, ChatCall};

    #[actix_web::test]
    async fn test_startup_prompts_posted_once() {
        let (state, chat) = create_test_state();

        post_startup_prompts(&state).await;

        let calls = chat.calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            ChatCall::ChannelMessage { channel, content }
                if channel == "ch-welcome" && content.contains(WELCOME_MARKER)
        )));
        assert!(calls.iter().any(|c| matches!(
            c,
            ChatCall::ChannelMessage { channel, content }
                if channel == "ch-verify" && content.contains(VERIFY_MARKER)
        )));
        assert!(calls.iter().any(|c| matches!(
            c,
            ChatCall::ChannelMessage { channel, content }
                if channel == "ch-open-doubts" && content.contains(ASK_MARKER)
        )));
        // The ask prompt gets pinned.
        assert!(calls.iter().any(|c| matches!(c, ChatCall::PinMessage { .. })));
    }

    #[actix_web::test]
    async fn test_startup_prompts_deduped() {
        let (state, chat) = create_test_state();

        let marker = |content: &str| ChatMessage {
            id: "1".to_string(),
            author_id: "bot".to_string(),
            content: content.to_string(),
        };
        chat.recent.lock().unwrap().push(marker(WELCOME_MARKER));
        chat.recent.lock().unwrap().push(marker(VERIFY_MARKER));
        chat.pinned.lock().unwrap().push(marker(ASK_MARKER));

        post_startup_prompts(&state).await;
        assert!(chat.calls().is_empty());
    }

    #[actix_web::test]
    async fn test_register_commands() {
        let (state, chat) = create_test_state();

        register_commands(&state).await;
        assert_eq!(chat.calls(), vec![ChatCall::RegisterCommands]);
    }
}
