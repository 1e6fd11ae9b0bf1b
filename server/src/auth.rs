use common::{Error, UserId};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The JWT claims this service reads. Issuing tokens (`/api/auth/*`) is an
/// external collaborator per spec §6; this module only verifies them.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: UserId,
    exp: usize,
}

/// Verifies a bearer token and extracts the caller's [`UserId`].
///
/// Real-time handshakes (spec §4.9) and HTTP requests (spec §6, "bearer-
/// token authenticated") both funnel through this one check.
pub fn verify_token(token: &str, jwt_secret: &str) -> Result<UserId, Error> {
    let data = decode::<Claims>(token, &DecodingKey::from_secret(jwt_secret.as_bytes()), &Validation::default())
        .map_err(|e| Error::InvalidEncoding(format!("invalid token: {e}")))?;
    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(user_id: UserId, secret: &str) -> String {
        let claims = Claims { sub: user_id, exp: 9_999_999_999 };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_the_encoded_user_id() {
        let user_id = UserId::new();
        let token = token_for(user_id, "secret");
        assert_eq!(verify_token(&token, "secret").unwrap(), user_id);
    }

    #[test]
    fn token_signed_with_a_different_secret_is_rejected() {
        let token = token_for(UserId::new(), "secret");
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not-a-jwt", "secret").is_err());
    }
}
