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

//! The event router: every interaction the platform delivers lands here
//! and is dispatched on the custom id embedded in the component or modal.

use actix_web::{error::ErrorBadRequest, post, web, HttpRequest, HttpResponse};
use serde_json::Value;

use crate::discord::{
    components, signature, ChatUser, Interaction, INTERACTION_APPLICATION_COMMAND,
    INTERACTION_MESSAGE_COMPONENT, INTERACTION_MODAL_SUBMIT, INTERACTION_PING,
};
use crate::error::Error;
use crate::services::{doubts, verification};
use crate::AppState;

pub(crate) fn check_signature(
    state: &web::Data<AppState>,
    req: &HttpRequest,
    body: &[u8],
) -> Result<(), Error> {
    let Some(public_key) = &state.config.public_key else {
        log::debug!("No public key configured, skipping signature check");
        return Ok(());
    };

    let sig = req
        .headers()
        .get("X-Signature-Ed25519")
        .and_then(|v| v.to_str().ok())
        .ok_or(Error::Unauthorized)?;
    let timestamp = req
        .headers()
        .get("X-Signature-Timestamp")
        .and_then(|v| v.to_str().ok())
        .ok_or(Error::Unauthorized)?;

    signature::verify(public_key, sig, timestamp, body)
}

/// Signed interaction webhook. Domain errors still answer 200 with an
/// ephemeral message; only bad signatures and unparseable payloads get an
/// HTTP error status.
#[utoipa::path(
    request_body = Vec<u8>,
    responses(
        (status = 200, description = "Interaction response payload."),
        (status = 400, description = "Payload could not be parsed."),
        (status = 401, description = "Missing or invalid request signature.")
    )
)]
#[post("/interactions")]
pub async fn interactions(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> actix_web::Result<HttpResponse> {
    check_signature(&state, &req, &body)?;

    let interaction: Interaction = serde_json::from_slice(&body).map_err(ErrorBadRequest)?;

    let response = match dispatch(&state, &interaction).await {
        Ok(response) => response,
        Err(err) => {
            if err == Error::InternalError {
                log::error!("Interaction handling failed: {err}");
            }
            components::ephemeral_message(&err.to_string())
        }
    };

    Ok(HttpResponse::Ok().json(response))
}

async fn dispatch(state: &web::Data<AppState>, interaction: &Interaction) -> Result<Value, Error> {
    match interaction.kind {
        INTERACTION_PING => Ok(components::pong()),
        INTERACTION_APPLICATION_COMMAND => match interaction.command_name() {
            Some("doubts") => open_doubts_reply(state).await,
            other => {
                log::warn!("Unknown command {other:?}");
                Ok(components::ephemeral_message("❔ Unknown command"))
            }
        },
        INTERACTION_MESSAGE_COMPONENT => {
            let user = interaction.user().ok_or(Error::InternalError)?;
            let custom_id = interaction.custom_id().ok_or(Error::InternalError)?;
            component_click(state, user, custom_id).await
        }
        INTERACTION_MODAL_SUBMIT => {
            let user = interaction.user().ok_or(Error::InternalError)?;
            let custom_id = interaction.custom_id().ok_or(Error::InternalError)?;
            modal_submit(state, interaction, user, custom_id).await
        }
        kind => {
            log::warn!("Unsupported interaction kind {kind}");
            Err(Error::InternalError)
        }
    }
}

async fn component_click(
    state: &web::Data<AppState>,
    user: &ChatUser,
    custom_id: &str,
) -> Result<Value, Error> {
    match custom_id {
        "btn_verify" => match verification::request_verification(state, &user.id).await? {
            verification::VerifyPrompt::PromptEmail => Ok(components::email_modal()),
            verification::VerifyPrompt::AlreadyVerified => {
                Ok(components::ephemeral_message("✅ You are already verified."))
            }
            verification::VerifyPrompt::RoleRepaired => Ok(components::ephemeral_message(
                "✅ Verified! Now you can explore the community 😀.",
            )),
        },
        "btn_otp" => Ok(components::otp_modal()),
        "btn_ask" => Ok(components::ask_modal()),
        "btn_view_doubts" => open_doubts_reply(state).await,
        _ => {
            if let Some(doubt_id) = parse_trailing_id(custom_id, "btn_solve_") {
                return Ok(components::solve_modal(doubt_id));
            }
            if let Some((doubt_id, owner_id)) = parse_close_id(custom_id) {
                // The owner id baked into the button is only a fast
                // pre-check; close() re-validates against the store.
                if user.id != owner_id {
                    return Err(Error::NotDoubtOwner);
                }
                doubts::close(state, doubt_id, &user.id).await?;
                return Ok(components::ephemeral_message(&format!(
                    "🎉 Doubt #{doubt_id} closed and moved to #resolved-doubts."
                )));
            }
            log::warn!("Unknown component custom id {custom_id}");
            Ok(components::ephemeral_message("❔ Unknown action"))
        }
    }
}

async fn modal_submit(
    state: &web::Data<AppState>,
    interaction: &Interaction,
    user: &ChatUser,
    custom_id: &str,
) -> Result<Value, Error> {
    match custom_id {
        "mdl_email" => {
            let email = interaction.text_field("email").ok_or(Error::InvalidEmail)?;
            verification::submit_email(state, &user.id, email).await?;
            Ok(components::ephemeral_message_with_components(
                "✉️ OTP sent to the provided email—click below",
                vec![components::otp_button_row()],
            ))
        }
        "mdl_otp" => {
            let code = interaction
                .text_field("otp")
                .ok_or(Error::InvalidOrExpiredOtp)?;
            verification::submit_code(state, &user.id, code).await?;
            Ok(components::ephemeral_message(
                "✅ Verified! Now you can explore the community 😀.",
            ))
        }
        "mdl_ask" => {
            let question = interaction
                .text_field("question")
                .ok_or(Error::InternalError)?;
            let doubt_id = doubts::ask(state, &user.id, &user.username, question).await?;
            Ok(components::ephemeral_message(&format!(
                "✅ Doubt #{doubt_id} posted."
            )))
        }
        _ => {
            if let Some(doubt_id) = parse_trailing_id(custom_id, "mdl_solve_") {
                let answer = interaction
                    .text_field("answer")
                    .ok_or(Error::InternalError)?;
                let asker = doubts::solve(state, doubt_id, &user.id, answer).await?;
                return Ok(components::ephemeral_message(&format!(
                    "✅ Sent solution to <@{asker}>."
                )));
            }
            log::warn!("Unknown modal custom id {custom_id}");
            Ok(components::ephemeral_message("❔ Unknown action"))
        }
    }
}

async fn open_doubts_reply(state: &web::Data<AppState>) -> Result<Value, Error> {
    let open = doubts::list_open(state).await?;
    if open.is_empty() {
        return Ok(components::ephemeral_message(
            "📭 No open doubts at the moment.",
        ));
    }

    let list = open
        .iter()
        .map(|d| format!("🆔 #{} by **{}**\n> {}", d.id, d.username, d.preview))
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(components::ephemeral_message(&format!(
        "📋 **Open Doubts:**\n\n{list}"
    )))
}

fn parse_trailing_id(custom_id: &str, prefix: &str) -> Option<i32> {
    custom_id.strip_prefix(prefix)?.parse().ok()
}

/// `btn_close_{doubtId}_{ownerId}`
fn parse_close_id(custom_id: &str) -> Option<(i32, &str)> {
    let rest = custom_id.strip_prefix("btn_close_")?;
    let (doubt_id, owner_id) = rest.split_once('_')?;
    Some((doubt_id.parse().ok()?, owner_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use diesel::prelude::*;
    use serde_json::json;

    use crate::tests::{create_test_state, ChatCall, RecordingChat};
    use std::sync::Arc;

    fn click(custom_id: &str, user_id: &str) -> Value {
        json!({
            "type": 3,
            "data": { "custom_id": custom_id },
            "member": { "user": { "id": user_id, "username": "tester" }, "roles": [] }
        })
    }

    fn submit(custom_id: &str, field: &str, value: &str, user_id: &str) -> Value {
        json!({
            "type": 5,
            "data": {
                "custom_id": custom_id,
                "components": [
                    { "type": 1, "components": [
                        { "type": 4, "custom_id": field, "value": value }
                    ]}
                ]
            },
            "member": { "user": { "id": user_id, "username": "tester" }, "roles": [] }
        })
    }

    macro_rules! call {
        ($app:expr, $payload:expr) => {{
            let req = test::TestRequest::post()
                .uri("/interactions")
                .set_json($payload)
                .to_request();
            let resp: Value = test::call_and_read_body_json($app, req).await;
            resp
        }};
    }

    #[actix_web::test]
    async fn test_ping_pong() {
        let (state, _chat) = create_test_state();
        let app = App::new().app_data(state).service(interactions);
        let app = test::init_service(app).await;

        let resp = call!(&app, &json!({ "type": 1 }));
        assert_eq!(resp["type"], 1);
    }

    #[actix_web::test]
    async fn test_verify_button_opens_email_modal() {
        let (state, _chat) = create_test_state();
        let app = App::new().app_data(state).service(interactions);
        let app = test::init_service(app).await;

        let resp = call!(&app, &click("btn_verify", "42"));
        assert_eq!(resp["type"], 9);
        assert_eq!(resp["data"]["custom_id"], "mdl_email");
    }

    #[actix_web::test]
    async fn test_email_modal_rejects_foreign_domain() {
        let (state, _chat) = create_test_state();
        let app = App::new().app_data(state).service(interactions);
        let app = test::init_service(app).await;

        let resp = call!(&app, &submit("mdl_email", "email", "a@yahoo.com", "42"));
        assert_eq!(resp["type"], 4);
        assert_eq!(resp["data"]["flags"], 64);
        assert!(resp["data"]["content"]
            .as_str()
            .unwrap()
            .contains("❌ Email domain not allowed"));
    }

    #[actix_web::test]
    async fn test_full_verification_flow() {
        let (state, chat) = create_test_state();
        let app = App::new().app_data(state.clone()).service(interactions);
        let app = test::init_service(app).await;

        let resp = call!(&app, &submit("mdl_email", "email", "a@gmail.com", "42"));
        assert!(resp["data"]["content"].as_str().unwrap().contains("OTP sent"));

        let code: String = {
            use db_connector::schema::otp_codes::dsl::*;
            let mut conn = state.pool.get().unwrap();
            otp_codes
                .find("42")
                .select(code)
                .get_result(&mut conn)
                .unwrap()
        };

        let resp = call!(&app, &submit("mdl_otp", "otp", &code, "42"));
        assert!(resp["data"]["content"].as_str().unwrap().contains("✅ Verified!"));
        assert!(chat.calls().contains(&ChatCall::AddRole {
            user: "42".to_string(),
            role: "role-verified".to_string()
        }));

        // Replay of the consumed code.
        let resp = call!(&app, &submit("mdl_otp", "otp", &code, "42"));
        assert!(resp["data"]["content"]
            .as_str()
            .unwrap()
            .contains("❌ Invalid/expired OTP"));
    }

    #[actix_web::test]
    async fn test_doubt_flow_through_router() {
        let (state, _chat) = create_test_state();
        let app = App::new().app_data(state.clone()).service(interactions);
        let app = test::init_service(app).await;

        let resp = call!(&app, &submit("mdl_ask", "question", "Why X?", "42"));
        assert!(resp["data"]["content"].as_str().unwrap().contains("Doubt #1 posted"));

        let resp = call!(&app, &click("btn_solve_1", "77"));
        assert_eq!(resp["type"], 9);
        assert_eq!(resp["data"]["custom_id"], "mdl_solve_1");

        let resp = call!(&app, &submit("mdl_solve_1", "answer", "Because Y.", "77"));
        assert!(resp["data"]["content"].as_str().unwrap().contains("<@42>"));

        // Non-owner click is rejected by the custom-id pre-check.
        let resp = call!(&app, &click("btn_close_1_42", "77"));
        assert!(resp["data"]["content"]
            .as_str()
            .unwrap()
            .contains("Only the author"));

        let resp = call!(&app, &click("btn_close_1_42", "42"));
        assert!(resp["data"]["content"].as_str().unwrap().contains("Doubt #1 closed"));
    }

    #[actix_web::test]
    async fn test_view_doubts_empty_and_listing() {
        let (state, _chat) = create_test_state();
        let app = App::new().app_data(state.clone()).service(interactions);
        let app = test::init_service(app).await;

        let resp = call!(&app, &click("btn_view_doubts", "42"));
        assert!(resp["data"]["content"].as_str().unwrap().contains("📭 No open doubts"));

        call!(&app, &submit("mdl_ask", "question", "Why X?", "42"));

        // Slash command and button share the listing.
        let command = json!({
            "type": 2,
            "data": { "name": "doubts" },
            "member": { "user": { "id": "42", "username": "tester" }, "roles": [] }
        });
        let resp = call!(&app, &command);
        let content = resp["data"]["content"].as_str().unwrap();
        assert!(content.contains("📋 **Open Doubts:**"));
        assert!(content.contains("Why X?"));
    }

    #[actix_web::test]
    async fn test_signature_required_when_key_configured() {
        let (template, _chat) = create_test_state();
        let chat = Arc::new(RecordingChat::default());
        let mut config = template.config.clone();
        config.public_key = Some(hex::encode([0u8; 32]));
        let state = web::Data::new(crate::AppState {
            pool: db_connector::test_connection_pool(),
            mailer: lettre::SmtpTransport::unencrypted_localhost(),
            chat,
            config,
        });

        let app = App::new().app_data(state).service(interactions);
        let app = test::init_service(app).await;

        let req = test::TestRequest::post()
            .uri("/interactions")
            .set_json(json!({ "type": 1 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }
}
