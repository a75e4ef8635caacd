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

use std::sync::Arc;

use db_connector::Pool;
use diesel::prelude::*;
use diesel::r2d2::PooledConnection;
use lettre::SmtpTransport;

use crate::config::BotConfig;
use crate::discord::api::ChatApi;

pub mod config;
pub mod discord;
pub mod error;
pub mod routes;
pub mod services;
pub mod utils;

pub struct AppState {
    pub pool: Pool,
    pub mailer: SmtpTransport,
    pub chat: Arc<dyn ChatApi>,
    pub config: BotConfig,
}

/// Expired-but-unused codes are dead weight; code validity never depends
/// on this sweep because the consume statement checks expiry itself.
pub fn clean_expired_otp_codes(
    conn: &mut PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>,
) {
    use db_connector::schema::otp_codes::dsl::*;

    diesel::delete(otp_codes.filter(expires_at.lt(utils::now_millis())))
        .execute(conn)
        .ok();
}
