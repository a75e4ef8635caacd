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

//! The OTP verification state machine. Per-user state is derived from the
//! store: no `users` row or `verified = false` means unverified, a live
//! `otp_codes` row means a code was issued, `verified = true` is terminal.

use actix_web::web;
use askama::Template;
use db_connector::models::users::User;
use diesel::prelude::*;
use validator::ValidateEmail;

use crate::error::Error;
use crate::utils::{generate_otp, get_connection, now_millis, web_block_unpacked};
use crate::AppState;

pub const OTP_LENGTH: usize = 6;
pub const OTP_TTL_MINUTES: i64 = 5;

#[derive(Template)]
#[template(path = "otp_email.html")]
struct OtpEmailTemplate<'a> {
    code: &'a str,
    minutes: i64,
}

/// What a verification request should answer with.
#[derive(Debug, PartialEq, Eq)]
pub enum VerifyPrompt {
    /// Store and role assignment agree; nothing to do.
    AlreadyVerified,
    /// Store said verified but the role was missing; the role was
    /// re-granted without issuing a new code.
    RoleRepaired,
    /// Start the email capture flow.
    PromptEmail,
}

pub async fn request_verification(
    state: &web::Data<AppState>,
    user_id: &str,
) -> Result<VerifyPrompt, Error> {
    let mut conn = get_connection(state)?;
    let uid = user_id.to_string();
    let user: Option<User> = web_block_unpacked(move || {
        use db_connector::schema::users::dsl::*;

        match users.find(&uid).select(User::as_select()).get_result(&mut conn) {
            Ok(user) => Ok(Some(user)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(_err) => Err(Error::InternalError),
        }
    })
    .await?;

    match user {
        Some(user) if user.verified => {
            let roles = state.chat.member_roles(user_id).await?;
            if roles.iter().any(|r| r == &state.config.role_verified) {
                return Ok(VerifyPrompt::AlreadyVerified);
            }

            // Store and platform drifted apart; repair the role instead
            // of sending the user through the flow again.
            log::info!("Repairing missing verified role for {user_id}");
            state
                .chat
                .add_role(user_id, &state.config.role_verified)
                .await?;
            if let Err(err) = state
                .chat
                .remove_role(user_id, &state.config.role_unverified)
                .await
            {
                log::warn!("Failed to remove unverified role from {user_id}: {err}");
            }
            Ok(VerifyPrompt::RoleRepaired)
        }
        _ => Ok(VerifyPrompt::PromptEmail),
    }
}

pub async fn submit_email(
    state: &web::Data<AppState>,
    user_id: &str,
    email: &str,
) -> Result<(), Error> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(Error::InvalidEmail);
    }
    if !state.config.email_domain_allowed(&email) {
        return Err(Error::EmailDomainNotAllowed);
    }

    let code = generate_otp(OTP_LENGTH);
    let expires = now_millis() + OTP_TTL_MINUTES * 60 * 1_000;

    let mut conn = get_connection(state)?;
    {
        let uid = user_id.to_string();
        let mail = email.clone();
        let code = code.clone();
        web_block_unpacked(move || {
            use db_connector::schema::otp_codes::dsl as o_dsl;
            use db_connector::schema::users::dsl as u_dsl;

            let user = User {
                discord_id: uid.clone(),
                email: mail.clone(),
                verified: false,
            };
            diesel::insert_into(u_dsl::users)
                .values(&user)
                .on_conflict(u_dsl::discord_id)
                .do_update()
                .set(u_dsl::email.eq(&mail))
                .execute(&mut conn)
                .map_err(|_err| Error::InternalError)?;

            // A new request replaces any live code for this user.
            let row = db_connector::models::otp_codes::OtpCode {
                discord_id: uid,
                code: code.clone(),
                expires_at: expires,
            };
            diesel::insert_into(o_dsl::otp_codes)
                .values(&row)
                .on_conflict(o_dsl::discord_id)
                .do_update()
                .set((o_dsl::code.eq(&code), o_dsl::expires_at.eq(expires)))
                .execute(&mut conn)
                .map_err(|_err| Error::InternalError)?;

            Ok(())
        })
        .await?;
    }

    #[cfg(not(test))]
    {
        let state_cpy = state.clone();
        std::thread::spawn(move || {
            send_otp_mail(&email, &code, &state_cpy);
        });
    }
    #[cfg(test)]
    drop((email, code));

    Ok(())
}

#[cfg_attr(test, allow(dead_code))]
fn send_otp_mail(email: &str, code: &str, state: &web::Data<AppState>) {
    let template = OtpEmailTemplate {
        code,
        minutes: OTP_TTL_MINUTES,
    };
    let body = match template.render() {
        Ok(body) => body,
        Err(err) => {
            log::error!("Failed to render OTP email template: {err}");
            return;
        }
    };

    crate::utils::send_email(email, "Your Algopath verification code", body, state);
}

pub async fn submit_code(
    state: &web::Data<AppState>,
    user_id: &str,
    code: &str,
) -> Result<(), Error> {
    let code = code.trim().to_string();
    if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidOrExpiredOtp);
    }

    let mut conn = get_connection(state)?;
    let uid = user_id.to_string();
    web_block_unpacked(move || {
        use db_connector::schema::otp_codes::dsl as o_dsl;
        use db_connector::schema::users::dsl as u_dsl;

        // Consume-on-match: the delete is the validity check, so a code
        // can only ever succeed once.
        let consumed = diesel::delete(
            o_dsl::otp_codes.filter(
                o_dsl::discord_id
                    .eq(&uid)
                    .and(o_dsl::code.eq(&code))
                    .and(o_dsl::expires_at.gt(now_millis())),
            ),
        )
        .execute(&mut conn)
        .map_err(|_err| Error::InternalError)?;

        if consumed == 0 {
            return Err(Error::InvalidOrExpiredOtp);
        }

        diesel::update(u_dsl::users.find(&uid))
            .set(u_dsl::verified.eq(true))
            .execute(&mut conn)
            .map_err(|_err| Error::InternalError)?;

        Ok(())
    })
    .await?;

    // The store is already marked verified, so if a role call fails the
    // user sees an error and the next verification request repairs the
    // role from the store.
    state
        .chat
        .add_role(user_id, &state.config.role_verified)
        .await?;
    state
        .chat
        .remove_role(user_id, &state.config.role_unverified)
        .await?;

    if let Some(welcome_channel) = &state.config.welcome_channel {
        let payload = crate::discord::components::channel_message(&format!(
            "🎉 <@{user_id}> just verified. Welcome!"
        ));
        if let Err(err) = state.chat.send_channel_message(welcome_channel, &payload).await {
            log::warn!("Failed to post welcome message for {user_id}: {err}");
        }
    }

    Ok(())
}

/// Member-join role application: verified members get the verified role
/// back, everyone else starts unverified. Role call failures are logged
/// and never fatal.
pub async fn apply_member_roles(state: &web::Data<AppState>, user_id: &str) -> Result<(), Error> {
    let mut conn = get_connection(state)?;
    let uid = user_id.to_string();
    let verified_in_store: bool = web_block_unpacked(move || {
        use db_connector::schema::users::dsl::*;

        match users
            .find(&uid)
            .select(verified)
            .get_result::<bool>(&mut conn)
        {
            Ok(flag) => Ok(flag),
            Err(diesel::result::Error::NotFound) => Ok(false),
            Err(_err) => Err(Error::InternalError),
        }
    })
    .await?;

    let (add, remove) = if verified_in_store {
        (&state.config.role_verified, &state.config.role_unverified)
    } else {
        (&state.config.role_unverified, &state.config.role_verified)
    };

    if let Err(err) = state.chat.add_role(user_id, add).await {
        log::error!("Failed to add role for joining member {user_id}: {err}");
    }
    if let Err(err) = state.chat.remove_role(user_id, remove).await {
        log::warn!("Failed to remove role for joining member {user_id}: {err}");
    }

    Ok(())
}
