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

//! Builders for the JSON the platform expects for interaction responses,
//! message components and modals.

use serde_json::{json, Value};

use super::{FLAG_EPHEMERAL, RESPONSE_CHANNEL_MESSAGE, RESPONSE_MODAL, RESPONSE_PONG};

const BUTTON_STYLE_PRIMARY: u8 = 1;
const BUTTON_STYLE_SECONDARY: u8 = 2;
const BUTTON_STYLE_SUCCESS: u8 = 3;
const BUTTON_STYLE_DANGER: u8 = 4;

const TEXT_INPUT_SHORT: u8 = 1;
const TEXT_INPUT_PARAGRAPH: u8 = 2;

pub fn pong() -> Value {
    json!({ "type": RESPONSE_PONG })
}

pub fn ephemeral_message(content: &str) -> Value {
    json!({
        "type": RESPONSE_CHANNEL_MESSAGE,
        "data": { "content": content, "flags": FLAG_EPHEMERAL }
    })
}

pub fn ephemeral_message_with_components(content: &str, components: Vec<Value>) -> Value {
    json!({
        "type": RESPONSE_CHANNEL_MESSAGE,
        "data": { "content": content, "flags": FLAG_EPHEMERAL, "components": components }
    })
}

// Outbound channel message payloads (REST, not interaction responses).

pub fn channel_message(content: &str) -> Value {
    json!({ "content": content })
}

pub fn channel_message_with_components(content: &str, components: Vec<Value>) -> Value {
    json!({ "content": content, "components": components })
}

fn button(custom_id: &str, label: &str, style: u8, disabled: bool) -> Value {
    json!({
        "type": 2,
        "style": style,
        "label": label,
        "custom_id": custom_id,
        "disabled": disabled
    })
}

fn action_row(buttons: Vec<Value>) -> Value {
    json!({ "type": 1, "components": buttons })
}

pub fn verify_button_row() -> Value {
    action_row(vec![button(
        "btn_verify",
        "🔑 Verify Email",
        BUTTON_STYLE_PRIMARY,
        false,
    )])
}

pub fn otp_button_row() -> Value {
    action_row(vec![button(
        "btn_otp",
        "✉️ Enter OTP",
        BUTTON_STYLE_SUCCESS,
        false,
    )])
}

pub fn ask_view_button_row() -> Value {
    action_row(vec![
        button("btn_ask", "❓ Ask Doubt", BUTTON_STYLE_SECONDARY, false),
        button("btn_view_doubts", "📋 View Doubts", BUTTON_STYLE_PRIMARY, false),
    ])
}

/// Solve + Close row under a doubt announcement. Close stays disabled
/// until the first solution arrives.
pub fn doubt_action_row(doubt_id: i32, owner_id: &str, close_enabled: bool) -> Value {
    action_row(vec![
        button(
            &format!("btn_solve_{doubt_id}"),
            "💡 Solve",
            BUTTON_STYLE_SUCCESS,
            false,
        ),
        button(
            &format!("btn_close_{doubt_id}_{owner_id}"),
            "🔒 Close",
            BUTTON_STYLE_DANGER,
            !close_enabled,
        ),
    ])
}

fn modal(custom_id: &str, title: &str, field_id: &str, label: &str, style: u8) -> Value {
    json!({
        "type": RESPONSE_MODAL,
        "data": {
            "custom_id": custom_id,
            "title": title,
            "components": [{
                "type": 1,
                "components": [{
                    "type": 4,
                    "custom_id": field_id,
                    "label": label,
                    "style": style,
                    "required": true
                }]
            }]
        }
    })
}

pub fn email_modal() -> Value {
    modal("mdl_email", "Enter Email", "email", "Algopath Email", TEXT_INPUT_SHORT)
}

pub fn otp_modal() -> Value {
    modal("mdl_otp", "Enter OTP", "otp", "6-digit Code", TEXT_INPUT_SHORT)
}

pub fn ask_modal() -> Value {
    modal("mdl_ask", "Your Doubt", "question", "Question", TEXT_INPUT_PARAGRAPH)
}

pub fn solve_modal(doubt_id: i32) -> Value {
    modal(
        &format!("mdl_solve_{doubt_id}"),
        &format!("Answer Doubt #{doubt_id}"),
        "answer",
        "Your Solution",
        TEXT_INPUT_PARAGRAPH,
    )
}
