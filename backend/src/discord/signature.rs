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

use ed25519_dalek::{Signature, VerifyingKey};

use crate::error::Error;

/// The platform signs `timestamp || body` with Ed25519 and sends the
/// hex-encoded signature and the timestamp as headers. Anything that does
/// not check out is treated as unauthorized.
pub fn verify(
    public_key_hex: &str,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<(), Error> {
    let key_bytes: [u8; 32] = hex::decode(public_key_hex)
        .map_err(|_| Error::Unauthorized)?
        .try_into()
        .map_err(|_| Error::Unauthorized)?;
    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| Error::Unauthorized)?;

    let sig_bytes: [u8; 64] = hex::decode(signature_hex)
        .map_err(|_| Error::Unauthorized)?
        .try_into()
        .map_err(|_| Error::Unauthorized)?;
    let signature = Signature::from_bytes(&sig_bytes);

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify_strict(&message, &signature)
        .map_err(|_| Error::Unauthorized)
}
