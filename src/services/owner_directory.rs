//! Owner directory
//!
//! Every QR code belongs to exactly one account. Identities come from bearer
//! tokens issued by the external authentication provider; this module only
//! verifies them and answers "may this caller touch that record".

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::AuthConfig;
use crate::errors::{QrLinkerError, Result};

/// 已认证的调用方
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub owner_id: String,
}

impl CallerIdentity {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }
}

/// Token claims we rely on
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub struct OwnerDirectory {
    /// 未配置密钥时为 None，所有 token 都会被拒绝
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl OwnerDirectory {
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience.filter(|aud| !aud.is_empty()) {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: (!secret.is_empty()).then(|| DecodingKey::from_secret(secret.as_bytes())),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.audience.as_deref())
    }

    /// 校验 bearer token，成功时返回 `sub` 对应的身份
    pub fn verify_token(&self, token: &str) -> Result<CallerIdentity> {
        let Some(key) = self.decoding_key.as_ref() else {
            return Err(QrLinkerError::authorization(
                "token verification is not configured",
            ));
        };

        let data = decode::<OwnerClaims>(token, key, &self.validation).map_err(|e| {
            debug!("Bearer token rejected: {}", e);
            QrLinkerError::authorization(format!("invalid token: {}", e))
        })?;

        let owner_id = data.claims.sub.trim();
        if owner_id.is_empty() {
            return Err(QrLinkerError::authorization("token has an empty subject"));
        }

        trace!("Bearer token accepted for {}", owner_id);
        Ok(CallerIdentity::new(owner_id))
    }
}

/// 调用方必须存在且非空
pub fn require_caller(caller: Option<&CallerIdentity>) -> Result<&CallerIdentity> {
    match caller {
        Some(identity) if !identity.owner_id.is_empty() => Ok(identity),
        _ => Err(QrLinkerError::authorization("authentication required")),
    }
}

/// 调用方必须是记录的所有者
pub fn authorize(caller: Option<&CallerIdentity>, owner_id: &str) -> Result<()> {
    let caller = require_caller(caller)?;
    if owner_id.is_empty() || caller.owner_id != owner_id {
        return Err(QrLinkerError::authorization(
            "caller does not own this QR code",
        ));
    }
    Ok(())
}
