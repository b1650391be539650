use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a new JWT token for a user. Returns the token and its expiry.
pub fn sign(
    uid: &str,
    email: &str,
    is_admin: bool,
    ttl: Duration,
    secret: &str,
) -> Result<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let expires_at = now + ttl;

    let claims = Claims {
        sub: uid.to_owned(),
        email: email.to_owned(),
        is_admin,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, expires_at))
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
