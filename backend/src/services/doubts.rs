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

//! The doubt lifecycle state machine: `open -> resolved`, resolved is
//! terminal. Solutions attach to open doubts without changing status;
//! only the asker can close.

use actix_web::web;
use db_connector::models::doubts::{Doubt, NewDoubt, STATUS_OPEN, STATUS_RESOLVED};
use db_connector::models::solutions::NewSolution;
use diesel::prelude::*;

use crate::discord::components;
use crate::error::Error;
use crate::utils::{get_connection, now_millis, web_block_unpacked};
use crate::AppState;

/// Minimum wall-clock gap between two doubts from the same user.
pub const ASK_COOLDOWN_MS: i64 = 2 * 60 * 1_000;
pub const OPEN_LIST_LIMIT: i64 = 5;
pub const QUESTION_PREVIEW_CHARS: usize = 80;

pub fn announcement_content(doubt_id: i32, user_id: &str, question: &str) -> String {
    format!("🆔 **#{doubt_id}** by <@{user_id}>:\n> {question}")
}

/// Insert a new open doubt and announce it. The announcement is
/// best-effort: when posting fails the doubt still exists, it just has no
/// stored message reference (and close will skip archival).
pub async fn ask(
    state: &web::Data<AppState>,
    user_id: &str,
    username: &str,
    question: &str,
) -> Result<i32, Error> {
    let question = question.trim().to_string();

    let mut conn = get_connection(state)?;
    let doubt_id: i32 = {
        let uid = user_id.to_string();
        let uname = username.to_string();
        let q = question.clone();
        web_block_unpacked(move || {
            use db_connector::schema::doubts::dsl as d_dsl;

            let now = now_millis();
            let last: Option<i64> = d_dsl::doubts
                .filter(d_dsl::discord_id.eq(&uid))
                .select(diesel::dsl::max(d_dsl::created_at))
                .get_result(&mut conn)
                .map_err(|_err| Error::InternalError)?;
            if let Some(last) = last {
                if now - last < ASK_COOLDOWN_MS {
                    return Err(Error::DoubtRateLimited);
                }
            }

            let row = NewDoubt {
                discord_id: uid,
                username: uname,
                question: q,
                created_at: now,
                status: STATUS_OPEN.to_string(),
            };
            diesel::insert_into(d_dsl::doubts)
                .values(&row)
                .returning(d_dsl::id)
                .get_result(&mut conn)
                .map_err(|_err| Error::InternalError)
        })
        .await?
    };

    let payload = components::channel_message_with_components(
        &announcement_content(doubt_id, user_id, &question),
        vec![components::doubt_action_row(doubt_id, user_id, false)],
    );
    match state
        .chat
        .send_channel_message(&state.config.open_doubts_channel, &payload)
        .await
    {
        Ok(msg_ref) => {
            let mut conn = get_connection(state)?;
            let store_ref = web_block_unpacked(move || {
                use db_connector::schema::doubts::dsl as d_dsl;

                diesel::update(d_dsl::doubts.find(doubt_id))
                    .set((
                        d_dsl::channel_id.eq(&msg_ref.channel_id),
                        d_dsl::message_id.eq(&msg_ref.message_id),
                    ))
                    .execute(&mut conn)
                    .map_err(|_err| Error::InternalError)
            })
            .await;
            if let Err(err) = store_ref {
                log::warn!("Failed to store announcement reference for doubt {doubt_id}: {err}");
            }
        }
        Err(err) => log::warn!("Failed to announce doubt {doubt_id}: {err}"),
    }

    Ok(doubt_id)
}

/// Append a solution to an open doubt and deliver it to the asker by DM.
/// Does not change the doubt's status. Returns the asker's id.
pub async fn solve(
    state: &web::Data<AppState>,
    doubt_id: i32,
    solver_id: &str,
    answer: &str,
) -> Result<String, Error> {
    let answer = answer.trim().to_string();

    let mut conn = get_connection(state)?;
    let doubt: Doubt = {
        let solver = solver_id.to_string();
        let ans = answer.clone();
        web_block_unpacked(move || {
            use db_connector::schema::doubts::dsl as d_dsl;
            use db_connector::schema::solutions::dsl as s_dsl;

            let doubt = match d_dsl::doubts
                .filter(d_dsl::id.eq(doubt_id).and(d_dsl::status.eq(STATUS_OPEN)))
                .select(Doubt::as_select())
                .get_result(&mut conn)
            {
                Ok(doubt) => doubt,
                Err(diesel::result::Error::NotFound) => return Err(Error::DoubtNotFound),
                Err(_err) => return Err(Error::InternalError),
            };

            let row = NewSolution {
                doubt_id,
                solver_id: solver,
                answer: ans,
                created_at: now_millis(),
            };
            diesel::insert_into(s_dsl::solutions)
                .values(&row)
                .execute(&mut conn)
                .map_err(|_err| Error::InternalError)?;

            Ok(doubt)
        })
        .await?
    };

    if let Err(err) = state
        .chat
        .send_direct_message(
            &doubt.discord_id,
            &format!("💡 Answer to your Doubt #{doubt_id}:\n{answer}"),
        )
        .await
    {
        log::warn!("Failed to DM solution for doubt {doubt_id} to asker: {err}");
    }

    // The first solution unlocks the close button on the announcement.
    if let (Some(channel), Some(message)) = (&doubt.channel_id, &doubt.message_id) {
        let payload = serde_json::json!({
            "components": [components::doubt_action_row(doubt_id, &doubt.discord_id, true)]
        });
        if let Err(err) = state.chat.edit_message(channel, message, &payload).await {
            log::warn!("Failed to enable close button on doubt {doubt_id}: {err}");
        }
    }

    Ok(doubt.discord_id)
}

/// Owner-gated close: flips the doubt to resolved with one conditional
/// update, then archives the announcement to the resolved channel.
pub async fn close(
    state: &web::Data<AppState>,
    doubt_id: i32,
    requester_id: &str,
) -> Result<(), Error> {
    let mut conn = get_connection(state)?;
    let doubt: Doubt = {
        let requester = requester_id.to_string();
        web_block_unpacked(move || {
            use db_connector::schema::doubts::dsl as d_dsl;

            let doubt = match d_dsl::doubts
                .find(doubt_id)
                .select(Doubt::as_select())
                .get_result(&mut conn)
            {
                Ok(doubt) => doubt,
                Err(diesel::result::Error::NotFound) => return Err(Error::DoubtNotFound),
                Err(_err) => return Err(Error::InternalError),
            };
            if doubt.discord_id != requester {
                return Err(Error::NotDoubtOwner);
            }

            let updated = diesel::update(
                d_dsl::doubts.filter(
                    d_dsl::id
                        .eq(doubt_id)
                        .and(d_dsl::discord_id.eq(&requester))
                        .and(d_dsl::status.eq(STATUS_OPEN)),
                ),
            )
            .set(d_dsl::status.eq(STATUS_RESOLVED))
            .execute(&mut conn)
            .map_err(|_err| Error::InternalError)?;

            // Zero rows means it was already resolved.
            if updated == 0 {
                return Err(Error::DoubtNotFound);
            }

            Ok(doubt)
        })
        .await?
    };

    match (doubt.channel_id.as_deref(), doubt.message_id.as_deref()) {
        (Some(channel), Some(message)) => {
            let archived = format!(
                "✅ **Resolved #{doubt_id}**\n{}",
                announcement_content(doubt_id, &doubt.discord_id, &doubt.question)
            );
            if let Err(err) = state
                .chat
                .send_channel_message(
                    &state.config.resolved_doubts_channel,
                    &components::channel_message(&archived),
                )
                .await
            {
                log::warn!("Failed to archive doubt {doubt_id}: {err}");
            }
            if let Err(err) = state.chat.delete_message(channel, message).await {
                log::warn!("Failed to delete announcement of doubt {doubt_id}: {err}");
            }
        }
        _ => log::debug!("No announcement reference for doubt {doubt_id}, skipping archive"),
    }

    Ok(())
}

pub struct DoubtPreview {
    pub id: i32,
    pub username: String,
    pub preview: String,
}

/// Up to five most recent open doubts, newest first, questions truncated
/// for listing.
pub async fn list_open(state: &web::Data<AppState>) -> Result<Vec<DoubtPreview>, Error> {
    let mut conn = get_connection(state)?;
    let doubts: Vec<Doubt> = web_block_unpacked(move || {
        use db_connector::schema::doubts::dsl as d_dsl;

        d_dsl::doubts
            .filter(d_dsl::status.eq(STATUS_OPEN))
            .order(d_dsl::created_at.desc())
            .limit(OPEN_LIST_LIMIT)
            .select(Doubt::as_select())
            .load(&mut conn)
            .map_err(|_err| Error::InternalError)
    })
    .await?;

    Ok(doubts
        .into_iter()
        .map(|d| DoubtPreview {
            id: d.id,
            username: d.username,
            preview: d.question.chars().take(QUESTION_PREVIEW_CHARS).collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use db_connector::models::solutions::Solution;
    use db_connector::schema::{doubts, solutions};

    use crate::tests::{create_test_state, ChatCall};

    fn stored_doubt(state: &web::Data<AppState>, doubt_id: i32) -> Doubt {
        let mut conn = state.pool.get().unwrap();
        doubts::dsl::doubts
            .find(doubt_id)
            .select(Doubt::as_select())
            .get_result(&mut conn)
            .unwrap()
    }

    fn backdate(state: &web::Data<AppState>, doubt_id: i32, millis: i64) {
        let mut conn = state.pool.get().unwrap();
        diesel::update(doubts::dsl::doubts.find(doubt_id))
            .set(doubts::dsl::created_at.eq(now_millis() - millis))
            .execute(&mut conn)
            .unwrap();
    }

    #[actix_web::test]
    async fn test_ask_creates_open_doubt_with_announcement() {
        let (state, chat) = create_test_state();

        let id = ask(&state, "42", "tester#1", "Why X?").await.unwrap();

        let doubt = stored_doubt(&state, id);
        assert_eq!(doubt.status, STATUS_OPEN);
        assert_eq!(doubt.question, "Why X?");
        assert_eq!(doubt.channel_id.as_deref(), Some("ch-open-doubts"));
        assert!(doubt.message_id.is_some());

        let calls = chat.calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            ChatCall::ChannelMessage { channel, content }
                if channel == "ch-open-doubts" && content.contains(&format!("**#{id}**"))
        )));
    }

    #[actix_web::test]
    async fn test_ask_rate_limit_boundary() {
        let (state, _chat) = create_test_state();

        let first = ask(&state, "42", "tester#1", "first").await.unwrap();

        // 90s after the last doubt: still limited.
        backdate(&state, first, 90_000);
        assert_eq!(
            ask(&state, "42", "tester#1", "second").await,
            Err(Error::DoubtRateLimited)
        );

        // Another user is unaffected.
        ask(&state, "99", "other#2", "unrelated").await.unwrap();

        // 121s after: allowed again.
        backdate(&state, first, 121_000);
        ask(&state, "42", "tester#1", "second").await.unwrap();
    }

    #[actix_web::test]
    async fn test_solve_appends_solution_and_keeps_doubt_open() {
        let (state, chat) = create_test_state();

        let id = ask(&state, "42", "tester#1", "Why X?").await.unwrap();
        let asker = solve(&state, id, "77", "Because Y.").await.unwrap();
        assert_eq!(asker, "42");

        // Status unchanged, solution row present.
        assert_eq!(stored_doubt(&state, id).status, STATUS_OPEN);
        let mut conn = state.pool.get().unwrap();
        let rows: Vec<Solution> = solutions::dsl::solutions
            .filter(solutions::dsl::doubt_id.eq(id))
            .select(Solution::as_select())
            .load(&mut conn)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].solver_id, "77");
        drop(conn);

        let calls = chat.calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            ChatCall::DirectMessage { user, content }
                if user == "42" && content.contains("Because Y.")
        )));
        // Close button re-enabled on the announcement.
        assert!(calls.iter().any(|c| matches!(c, ChatCall::EditMessage { .. })));
    }

    #[actix_web::test]
    async fn test_multiple_solutions_allowed() {
        let (state, _chat) = create_test_state();

        let id = ask(&state, "42", "tester#1", "Why X?").await.unwrap();
        solve(&state, id, "77", "first answer").await.unwrap();
        solve(&state, id, "88", "second answer").await.unwrap();

        let mut conn = state.pool.get().unwrap();
        let count: i64 = solutions::dsl::solutions
            .filter(solutions::dsl::doubt_id.eq(id))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(count, 2);
    }

    #[actix_web::test]
    async fn test_solve_fails_on_missing_or_resolved() {
        let (state, _chat) = create_test_state();

        assert_eq!(
            solve(&state, 12345, "77", "answer").await,
            Err(Error::DoubtNotFound)
        );

        let id = ask(&state, "42", "tester#1", "Why X?").await.unwrap();
        close(&state, id, "42").await.unwrap();
        assert_eq!(
            solve(&state, id, "77", "answer").await,
            Err(Error::DoubtNotFound)
        );
    }

    #[actix_web::test]
    async fn test_close_is_owner_gated() {
        let (state, _chat) = create_test_state();

        let id = ask(&state, "42", "tester#1", "Why X?").await.unwrap();

        assert_eq!(close(&state, id, "77").await, Err(Error::NotDoubtOwner));
        assert_eq!(stored_doubt(&state, id).status, STATUS_OPEN);

        close(&state, id, "42").await.unwrap();
        assert_eq!(stored_doubt(&state, id).status, STATUS_RESOLVED);

        // Resolved is terminal.
        assert_eq!(close(&state, id, "42").await, Err(Error::DoubtNotFound));
    }

    #[actix_web::test]
    async fn test_close_archives_and_deletes_announcement() {
        let (state, chat) = create_test_state();

        let id = ask(&state, "42", "tester#1", "Why X?").await.unwrap();
        let message_id = stored_doubt(&state, id).message_id.unwrap();
        close(&state, id, "42").await.unwrap();

        let calls = chat.calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            ChatCall::ChannelMessage { channel, content }
                if channel == "ch-resolved-doubts"
                    && content.contains(&format!("✅ **Resolved #{id}**"))
        )));
        assert!(calls.contains(&ChatCall::DeleteMessage {
            channel: "ch-open-doubts".to_string(),
            message: message_id,
        }));
    }

    #[actix_web::test]
    async fn test_close_without_reference_still_resolves() {
        let (state, chat) = create_test_state();

        let id = ask(&state, "42", "tester#1", "Why X?").await.unwrap();
        {
            let mut conn = state.pool.get().unwrap();
            diesel::update(doubts::dsl::doubts.find(id))
                .set((
                    doubts::dsl::channel_id.eq::<Option<String>>(None),
                    doubts::dsl::message_id.eq::<Option<String>>(None),
                ))
                .execute(&mut conn)
                .unwrap();
        }
        chat.calls.lock().unwrap().clear();

        close(&state, id, "42").await.unwrap();
        assert_eq!(stored_doubt(&state, id).status, STATUS_RESOLVED);
        // No archive post, no delete.
        assert!(chat.calls().is_empty());
    }

    #[actix_web::test]
    async fn test_list_open_limit_order_and_preview() {
        let (state, _chat) = create_test_state();

        let long_question = "x".repeat(200);
        for i in 0..7i64 {
            let user = format!("user-{i}");
            let id = ask(&state, &user, &user, &long_question).await.unwrap();
            // Spread creation times so ordering is deterministic.
            backdate(&state, id, (7 - i) * 10_000);
        }

        let open = list_open(&state).await.unwrap();
        assert_eq!(open.len(), OPEN_LIST_LIMIT as usize);
        assert_eq!(open[0].username, "user-6");
        assert_eq!(open[4].username, "user-2");
        assert!(open.iter().all(|d| d.preview.chars().count() == QUESTION_PREVIEW_CHARS));

        // Resolved doubts disappear from the listing.
        let id = ask(&state, "42", "tester#1", "short").await.unwrap();
        close(&state, id, "42").await.unwrap();
        assert!(list_open(&state).await.unwrap().iter().all(|d| d.id != id));
    }
}
