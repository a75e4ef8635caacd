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

/// Everything the bot needs from the environment besides the platform
/// token and SMTP credentials, which stay inside the clients built from
/// them. Read once at startup, no hot reload.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub guild_id: String,
    pub application_id: String,
    /// Hex-encoded Ed25519 key the platform signs webhook deliveries with.
    /// When unset, signature verification is skipped (local dev, tests).
    pub public_key: Option<String>,
    pub role_verified: String,
    pub role_unverified: String,
    pub verify_channel: String,
    pub welcome_channel: Option<String>,
    pub open_doubts_channel: String,
    pub resolved_doubts_channel: String,
    pub allowed_email_domains: Vec<String>,
    pub sender_email: String,
}

impl BotConfig {
    pub fn from_env() -> Self {
        let allowed_email_domains = std::env::var("ALLOWED_EMAIL_DOMAINS")
            .unwrap_or_else(|_| "gmail.com".to_string())
            .split(',')
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Self {
            guild_id: std::env::var("GUILD_ID").expect("GUILD_ID must be set!"),
            application_id: std::env::var("APPLICATION_ID").expect("APPLICATION_ID must be set!"),
            public_key: std::env::var("PUBLIC_KEY").ok(),
            role_verified: std::env::var("ROLE_VERIFIED").expect("ROLE_VERIFIED must be set!"),
            role_unverified: std::env::var("ROLE_UNVERIFIED")
                .expect("ROLE_UNVERIFIED must be set!"),
            verify_channel: std::env::var("VERIFY_CHANNEL_ID")
                .expect("VERIFY_CHANNEL_ID must be set!"),
            welcome_channel: std::env::var("WELCOME_CHANNEL_ID").ok(),
            open_doubts_channel: std::env::var("OPEN_DOUBTS_CHANNEL_ID")
                .expect("OPEN_DOUBTS_CHANNEL_ID must be set!"),
            resolved_doubts_channel: std::env::var("RESOLVED_DOUBTS_CHANNEL_ID")
                .expect("RESOLVED_DOUBTS_CHANNEL_ID must be set!"),
            allowed_email_domains,
            sender_email: std::env::var("SENDER_EMAIL").expect("SENDER_EMAIL must be set!"),
        }
    }

    pub fn email_domain_allowed(&self, email: &str) -> bool {
        self.allowed_email_domains
            .iter()
            .any(|domain| email.ends_with(&format!("@{domain}")))
    }
}
