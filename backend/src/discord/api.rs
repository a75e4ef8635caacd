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

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Error;

/// Reference to a message the bot posted, persisted on doubt rows so
/// later edits and deletes never have to scan channel history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub author_id: String,
    pub content: String,
}

/// The chat platform as one opaque capability. Everything the state
/// machines need from the platform goes through this trait; tests swap in
/// a recording fake.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn add_role(&self, user_id: &str, role_id: &str) -> Result<(), Error>;
    async fn remove_role(&self, user_id: &str, role_id: &str) -> Result<(), Error>;
    async fn member_roles(&self, user_id: &str) -> Result<Vec<String>, Error>;
    async fn send_channel_message(
        &self,
        channel_id: &str,
        payload: &Value,
    ) -> Result<MessageRef, Error>;
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &Value,
    ) -> Result<(), Error>;
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error>;
    async fn send_direct_message(&self, user_id: &str, content: &str) -> Result<(), Error>;
    async fn recent_messages(&self, channel_id: &str, limit: u8) -> Result<Vec<ChatMessage>, Error>;
    async fn pinned_messages(&self, channel_id: &str) -> Result<Vec<ChatMessage>, Error>;
    async fn pin_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error>;
    async fn register_guild_commands(&self, commands: &Value) -> Result<(), Error>;
}

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

#[derive(Debug, Deserialize)]
struct MessageJson {
    id: String,
    #[serde(default)]
    content: String,
    author: AuthorJson,
}

#[derive(Debug, Deserialize)]
struct AuthorJson {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelJson {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MemberJson {
    #[serde(default)]
    roles: Vec<String>,
}

/// Production [`ChatApi`] over the platform's REST API.
pub struct DiscordRestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    application_id: String,
    guild_id: String,
}

impl DiscordRestClient {
    pub fn new(token: String, application_id: String, guild_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
            application_id,
            guild_id,
        }
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("Authorization", format!("Bot {}", self.token))
    }

    async fn expect_success(
        what: &str,
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, Error> {
        match result {
            Ok(resp) if resp.status().is_success() => Ok(resp),
            Ok(resp) => {
                log::error!("{what} failed with status {}", resp.status());
                Err(Error::InternalError)
            }
            Err(err) => {
                log::error!("{what} failed: {err}");
                Err(Error::InternalError)
            }
        }
    }

    async fn get_messages(&self, what: &str, url: String) -> Result<Vec<ChatMessage>, Error> {
        let resp = Self::expect_success(what, self.auth(self.http.get(url)).send().await).await?;
        let messages: Vec<MessageJson> = resp.json().await.map_err(|err| {
            log::error!("{what} returned an unexpected payload: {err}");
            Error::InternalError
        })?;

        Ok(messages
            .into_iter()
            .map(|m| ChatMessage {
                id: m.id,
                author_id: m.author.id,
                content: m.content,
            })
            .collect())
    }
}

#[async_trait]
impl ChatApi for DiscordRestClient {
    async fn add_role(&self, user_id: &str, role_id: &str) -> Result<(), Error> {
        let url = format!(
            "{}/guilds/{}/members/{user_id}/roles/{role_id}",
            self.base_url, self.guild_id
        );
        Self::expect_success("add_role", self.auth(self.http.put(url)).send().await).await?;
        Ok(())
    }

    async fn remove_role(&self, user_id: &str, role_id: &str) -> Result<(), Error> {
        let url = format!(
            "{}/guilds/{}/members/{user_id}/roles/{role_id}",
            self.base_url, self.guild_id
        );
        Self::expect_success("remove_role", self.auth(self.http.delete(url)).send().await).await?;
        Ok(())
    }

    async fn member_roles(&self, user_id: &str) -> Result<Vec<String>, Error> {
        let url = format!("{}/guilds/{}/members/{user_id}", self.base_url, self.guild_id);
        let resp =
            Self::expect_success("member_roles", self.auth(self.http.get(url)).send().await)
                .await?;
        let member: MemberJson = resp.json().await.map_err(|err| {
            log::error!("member_roles returned an unexpected payload: {err}");
            Error::InternalError
        })?;
        Ok(member.roles)
    }

    async fn send_channel_message(
        &self,
        channel_id: &str,
        payload: &Value,
    ) -> Result<MessageRef, Error> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        let resp = Self::expect_success(
            "send_channel_message",
            self.auth(self.http.post(url)).json(payload).send().await,
        )
        .await?;
        let message: MessageJson = resp.json().await.map_err(|err| {
            log::error!("send_channel_message returned an unexpected payload: {err}");
            Error::InternalError
        })?;

        Ok(MessageRef {
            channel_id: channel_id.to_string(),
            message_id: message.id,
        })
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &Value,
    ) -> Result<(), Error> {
        let url = format!("{}/channels/{channel_id}/messages/{message_id}", self.base_url);
        Self::expect_success(
            "edit_message",
            self.auth(self.http.patch(url)).json(payload).send().await,
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error> {
        let url = format!("{}/channels/{channel_id}/messages/{message_id}", self.base_url);
        Self::expect_success("delete_message", self.auth(self.http.delete(url)).send().await)
            .await?;
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &str, content: &str) -> Result<(), Error> {
        // DMs go through a per-recipient channel that has to be opened first.
        let url = format!("{}/users/@me/channels", self.base_url);
        let resp = Self::expect_success(
            "open_dm_channel",
            self.auth(self.http.post(url))
                .json(&json!({ "recipient_id": user_id }))
                .send()
                .await,
        )
        .await?;
        let channel: ChannelJson = resp.json().await.map_err(|err| {
            log::error!("open_dm_channel returned an unexpected payload: {err}");
            Error::InternalError
        })?;

        let url = format!("{}/channels/{}/messages", self.base_url, channel.id);
        Self::expect_success(
            "send_direct_message",
            self.auth(self.http.post(url))
                .json(&json!({ "content": content }))
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn recent_messages(&self, channel_id: &str, limit: u8) -> Result<Vec<ChatMessage>, Error> {
        let url = format!(
            "{}/channels/{channel_id}/messages?limit={limit}",
            self.base_url
        );
        self.get_messages("recent_messages", url).await
    }

    async fn pinned_messages(&self, channel_id: &str) -> Result<Vec<ChatMessage>, Error> {
        let url = format!("{}/channels/{channel_id}/pins", self.base_url);
        self.get_messages("pinned_messages", url).await
    }

    async fn pin_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error> {
        let url = format!("{}/channels/{channel_id}/pins/{message_id}", self.base_url);
        Self::expect_success("pin_message", self.auth(self.http.put(url)).send().await).await?;
        Ok(())
    }

    async fn register_guild_commands(&self, commands: &Value) -> Result<(), Error> {
        let url = format!(
            "{}/applications/{}/guilds/{}/commands",
            self.base_url, self.application_id, self.guild_id
        );
        Self::expect_success(
            "register_guild_commands",
            self.auth(self.http.put(url)).json(commands).send().await,
        )
        .await?;
        Ok(())
    }
}
