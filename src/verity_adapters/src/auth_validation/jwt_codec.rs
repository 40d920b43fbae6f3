use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, Secret};
use serde_json::{Map, Value};
use uuid::Uuid;
use verity_core::{RESERVED_CLAIMS, TokenClaims, TokenCodec, TokenCodecError, TokenType, UserId};

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub algorithm: Algorithm,
    pub issuer: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl JwtConfig {
    fn has_secret(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }
}

/// HMAC-signed JWTs.
#[derive(Clone)]
pub struct JwtTokenCodec {
    config: JwtConfig,
    validation: Validation,
}

impl JwtTokenCodec {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss"]);
        validation.validate_aud = false;
        validation.leeway = 0;

        Self { config, validation }
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, TokenCodecError> {
        if !self.config.has_secret() {
            return Err(TokenCodecError::MissingSecret);
        }

        encode(
            &Header::new(self.config.algorithm),
            claims,
            &EncodingKey::from_secret(self.config.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| TokenCodecError::Signing(e.to_string()))
    }

    fn base_claims(&self, typ: TokenType, ttl: Duration) -> TokenClaims {
        let now = Utc::now();
        TokenClaims {
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            typ,
            sub: None,
            aud: None,
            jti: None,
            extra: Map::new(),
        }
    }
}

fn take_string(
    payload: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, TokenCodecError> {
    match payload.remove(key) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(TokenCodecError::InvalidClaim(key)),
    }
}

impl TokenCodec for JwtTokenCodec {
    #[tracing::instrument(name = "JwtTokenCodec::sign_access", skip_all)]
    fn sign_access(
        &self,
        mut payload: Map<String, Value>,
        subject: &str,
    ) -> Result<String, TokenCodecError> {
        for key in RESERVED_CLAIMS {
            payload.remove(key);
        }

        let mut claims = self.base_claims(TokenType::Access, self.config.access_token_ttl);
        claims.sub = (!subject.is_empty()).then(|| subject.to_string());
        claims.aud = take_string(&mut payload, "aud")?;
        claims.jti = take_string(&mut payload, "jti")?;
        claims.extra = payload;

        self.sign(&claims)
    }

    #[tracing::instrument(name = "JwtTokenCodec::sign_refresh", skip_all)]
    fn sign_refresh(
        &self,
        user_id: &UserId,
        audience: &str,
        token_id: &Uuid,
    ) -> Result<String, TokenCodecError> {
        let mut claims = self.base_claims(TokenType::Refresh, self.config.refresh_token_ttl);
        claims.sub = Some(user_id.to_string());
        claims.aud = Some(audience.to_string());
        claims.jti = Some(token_id.to_string());

        self.sign(&claims)
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenCodecError> {
        if !self.config.has_secret() {
            return Err(TokenCodecError::Unauthorized);
        }

        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.secret.expose_secret().as_bytes()),
            &self.validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            TokenCodecError::Unauthorized
        })
    }

    fn access_token_ttl(&self) -> Duration {
        self.config.access_token_ttl
    }

    fn refresh_token_ttl(&self) -> Duration {
        self.config.refresh_token_ttl
    }
}
