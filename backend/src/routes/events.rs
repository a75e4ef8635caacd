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

//! Webhook event ingress. The platform delivers guild events here in an
//! envelope separate from interactions; the only event acted on is a
//! member joining the guild.

use actix_web::{error::ErrorBadRequest, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::Value;

use super::interactions::check_signature;
use crate::services::verification;
use crate::AppState;

const ENVELOPE_PING: u8 = 0;
const ENVELOPE_EVENT: u8 = 1;

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    event: Option<EventPayload>,
}

#[derive(Deserialize)]
struct EventPayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Signed webhook event endpoint. Always acknowledges with 204; event
/// handling failures are logged, never surfaced to the platform (it
/// would disable the webhook after repeated error responses).
#[utoipa::path(
    request_body = Vec<u8>,
    responses(
        (status = 204, description = "Event acknowledged."),
        (status = 400, description = "Payload could not be parsed."),
        (status = 401, description = "Missing or invalid request signature.")
    )
)]
#[post("/events")]
pub async fn events(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> actix_web::Result<HttpResponse> {
    check_signature(&state, &req, &body)?;

    let envelope: EventEnvelope = serde_json::from_slice(&body).map_err(ErrorBadRequest)?;

    match envelope.kind {
        ENVELOPE_PING => (),
        ENVELOPE_EVENT => {
            if let Some(event) = envelope.event {
                handle_event(&state, &event).await;
            }
        }
        kind => log::warn!("Unsupported event envelope kind {kind}"),
    }

    Ok(HttpResponse::NoContent().finish())
}

async fn handle_event(state: &web::Data<AppState>, event: &EventPayload) {
    match event.kind.as_str() {
        "GUILD_MEMBER_ADD" => {
            let Some(user_id) = event.data["user"]["id"].as_str() else {
                log::warn!("Member add event without a user id");
                return;
            };
            if let Err(err) = verification::apply_member_roles(state, user_id).await {
                log::error!("Failed to assign roles to joining member {user_id}: {err}");
            }
        }
        other => log::debug!("Ignoring event {other}"),
    }
}
