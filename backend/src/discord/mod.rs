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

use serde::Deserialize;

pub mod api;
pub mod components;
pub mod signature;

// Inbound interaction kinds.
pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;
pub const INTERACTION_MESSAGE_COMPONENT: u8 = 3;
pub const INTERACTION_MODAL_SUBMIT: u8 = 5;

// Interaction response kinds.
pub const RESPONSE_PONG: u8 = 1;
pub const RESPONSE_CHANNEL_MESSAGE: u8 = 4;
pub const RESPONSE_MODAL: u8 = 9;

/// Only the sender can see the reply.
pub const FLAG_EPHEMERAL: u64 = 64;

/// The subset of the platform's interaction payload the bot dispatches on.
/// Everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<ChatUser>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub components: Vec<SubmittedRow>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedRow {
    #[serde(default)]
    pub components: Vec<SubmittedField>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedField {
    pub custom_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Member {
    pub user: ChatUser,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatUser {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

impl Interaction {
    /// Guild interactions carry the user inside `member`, DM interactions
    /// at top level.
    pub fn user(&self) -> Option<&ChatUser> {
        self.member
            .as_ref()
            .map(|m| &m.user)
            .or(self.user.as_ref())
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref()?.custom_id.as_deref()
    }

    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref()?.name.as_deref()
    }

    /// Value of a modal text input by its custom id.
    pub fn text_field(&self, custom_id: &str) -> Option<&str> {
        self.data
            .as_ref()?
            .components
            .iter()
            .flat_map(|row| row.components.iter())
            .find(|field| field.custom_id == custom_id)?
            .value
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modal_submit() {
        let raw = serde_json::json!({
            "type": 5,
            "data": {
                "custom_id": "mdl_email",
                "components": [
                    { "type": 1, "components": [
                        { "type": 4, "custom_id": "email", "value": "a@gmail.com" }
                    ]}
                ]
            },
            "member": { "user": { "id": "42", "username": "tester" }, "roles": ["1"] }
        });

        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.kind, INTERACTION_MODAL_SUBMIT);
        assert_eq!(interaction.custom_id(), Some("mdl_email"));
        assert_eq!(interaction.text_field("email"), Some("a@gmail.com"));
        assert_eq!(interaction.user().unwrap().id, "42");
    }

    #[test]
    fn test_parse_ping() {
        let interaction: Interaction = serde_json::from_value(serde_json::json!({ "type": 1 })).unwrap();
        assert_eq!(interaction.kind, INTERACTION_PING);
        assert!(interaction.user().is_none());
        assert!(interaction.custom_id().is_none());
    }
}
