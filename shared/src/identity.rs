use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 两个相互独立的身份域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Realm {
    User,
    Admin,
}

impl Realm {
    pub const ALL: [Realm; 2] = [Realm::User, Realm::Admin];

    /// 持久化缓存中的键名
    pub fn storage_key(&self) -> &'static str {
        match self {
            Realm::User => crate::STORAGE_USER_KEY,
            Realm::Admin => crate::STORAGE_ADMIN_KEY,
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.storage_key() == key)
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Employee,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }

    /// 宽松解析：后端有时返回带修饰的角色名 (如 "Employer Admin")，按包含关系匹配
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.contains("employer") {
            Some(Role::Employer)
        } else if lower.contains("employee") {
            Some(Role::Employee)
        } else if lower.contains("admin") {
            Some(Role::Admin)
        } else {
            None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Role::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unknown role: {}", raw)))
    }
}

/// 已登录的身份
///
/// 登录成功后由 Session Store 独占持有，路由守卫与导航栏只读。
/// 后端返回的其余资料字段原样保存在 `extra` 中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(id: u64, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            extra: Map::new(),
        }
    }

    /// 从后端登录响应构造身份；管理员域强制角色为 admin
    pub fn from_login_body(realm: Realm, mut body: Map<String, Value>) -> Result<Self, serde_json::Error> {
        if realm == Realm::Admin {
            body.insert("role".into(), Value::String(Role::Admin.as_str().into()));
        }
        serde_json::from_value(Value::Object(body))
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            match self.role {
                Role::Admin => "Admin",
                _ => "User",
            }
        } else {
            &self.name
        }
    }
}

/// id 可能是数字，也可能是数字字符串
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {}", s))),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_login_body_with_string_id_and_extra_fields() {
        let body = json!({
            "id": "42",
            "name": "Priya",
            "role": "Employer",
            "email": "priya@example.com"
        });
        let identity: Identity = serde_json::from_value(body).unwrap();
        assert_eq!(identity.id, 42);
        assert_eq!(identity.role, Role::Employer);
        assert_eq!(identity.extra["email"], "priya@example.com");
    }

    #[test]
    fn admin_login_forces_admin_role() {
        let body = json!({ "id": 1, "name": "Root", "email": "root@example.com" });
        let Value::Object(map) = body else { unreachable!() };
        let identity = Identity::from_login_body(Realm::Admin, map).unwrap();
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn rejects_unknown_role() {
        let body = json!({ "id": 1, "name": "X", "role": "visitor" });
        assert!(serde_json::from_value::<Identity>(body).is_err());
    }

    #[test]
    fn serialized_identity_round_trips_through_cache_format() {
        let mut identity = Identity::new(9, "Arun", Role::Employee);
        identity.extra.insert("phone".into(), json!("98400"));
        let raw = serde_json::to_string(&identity).unwrap();
        let back: Identity = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, identity);
    }
}
