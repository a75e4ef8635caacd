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

use actix_web::{
    error,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use derive_more::{Display, Error};

/// Domain errors. The `Display` strings double as the text shown to the
/// requesting user in ephemeral interaction replies.
#[derive(Debug, Display, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[display("⚠️ Unexpected error")]
    InternalError,
    #[display("❌ That does not look like a valid email address")]
    InvalidEmail,
    #[display("❌ Email domain not allowed here")]
    EmailDomainNotAllowed,
    #[display("❌ Invalid/expired OTP")]
    InvalidOrExpiredOtp,
    #[display("❌ No open doubt found.")]
    DoubtNotFound,
    #[display("❌ Only the author of this doubt can close it.")]
    NotDoubtOwner,
    #[display("⏳ Please wait a couple of minutes before asking another doubt.")]
    DoubtRateLimited,
    #[display("Unauthorized")]
    Unauthorized,
}

impl error::ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::EmailDomainNotAllowed => StatusCode::BAD_REQUEST,
            Self::InvalidOrExpiredOtp => StatusCode::BAD_REQUEST,
            Self::DoubtNotFound => StatusCode::NOT_FOUND,
            Self::NotDoubtOwner => StatusCode::UNAUTHORIZED,
            Self::DoubtRateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}
