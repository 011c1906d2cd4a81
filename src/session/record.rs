use serde::{Deserialize, Serialize};

use crate::provider::{ProviderId, UserProfile};

/// 会话令牌承载的内容，序列化为 camelCase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user: UserProfile,
    pub provider_name: ProviderId,
    /// 移动端会话没有 provider 访问令牌
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// 绝对过期时间（Unix 秒）
    pub exp: i64,
}

impl SessionRecord {
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// 实际签名的声明：记录本身加签发时间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    #[serde(flatten)]
    pub record: SessionRecord,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_and_omits_absent_tokens() {
        let record = SessionRecord {
            user: UserProfile::new("sub123"),
            provider_name: ProviderId::Google,
            access_token: None,
            refresh_token: None,
            exp: 1_700_000_000,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "user": { "id": "sub123", "email": null, "name": null, "username": null },
                "providerName": "google",
                "exp": 1_700_000_000
            })
        );
    }

    #[test]
    fn expiry_boundary() {
        let record = SessionRecord {
            user: UserProfile::new("1"),
            provider_name: ProviderId::Github,
            access_token: Some("T".into()),
            refresh_token: None,
            exp: 100,
        };
        assert!(!record.is_expired_at(99));
        assert!(record.is_expired_at(100));
    }
}
