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

use actix_web::web;
use diesel::{
    r2d2::{ConnectionManager, PooledConnection},
    SqliteConnection,
};
use lettre::message::header::ContentType;
use lettre::{Message, Transport};
use rand::Rng;

use crate::{error::Error, AppState};

pub fn get_connection(
    state: &web::Data<AppState>,
) -> actix_web::Result<PooledConnection<ConnectionManager<SqliteConnection>>, Error> {
    match state.pool.get() {
        Ok(conn) => Ok(conn),
        Err(_err) => Err(Error::InternalError),
    }
}

pub async fn web_block_unpacked<F, R>(f: F) -> Result<R, Error>
where
    F: FnOnce() -> Result<R, Error> + Send + 'static,
    R: Send + 'static,
{
    match web::block(f).await {
        Ok(res) => match res {
            Ok(v) => Ok(v),
            Err(err) => Err(err),
        },
        Err(_err) => Err(Error::InternalError),
    }
}

/// Unix timestamp in milliseconds, the unit all stored timestamps use.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Fixed-length numeric one-time code, each digit sampled uniformly.
pub fn generate_otp(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len).map(|_| rng.random_range(0..=9).to_string()).collect()
}

/// Fire-and-forget mail delivery. Failures are logged and never surfaced
/// to the requesting user.
pub fn send_email(email: &str, subject: &str, body: String, state: &web::Data<AppState>) {
    let from = match format!("Algopath <{}>", state.config.sender_email).parse() {
        Ok(from) => from,
        Err(err) => {
            log::error!("Invalid sender address '{}': {err}", state.config.sender_email);
            return;
        }
    };
    let to = match email.parse() {
        Ok(to) => to,
        Err(err) => {
            log::error!("Invalid recipient address '{email}': {err}");
            return;
        }
    };

    let email = match Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(body)
    {
        Ok(email) => email,
        Err(err) => {
            log::error!("Failed to build email: {err}");
            return;
        }
    };

    match state.mailer.send(&email) {
        Ok(_) => log::info!("Email sent successfully!"),
        Err(err) => log::error!("Could not send email: {err:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp() {
        for _ in 0..100 {
            let otp = generate_otp(6);
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
