//! Session Store
//!
//! 每个身份域最多缓存一个身份，写穿透到持久化存储。
//! 构造时从存储读取一次；之后的读取都是纯内存操作。

use crate::identity::{Identity, Realm};
use crate::storage::KeyValueStore;
use crate::{log_info, log_warn};

/// 单个身份域的认证状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    LoggedOut,
    LoggedIn,
}

/// 认证状态迁移事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    LoginSucceeded,
    Logout,
    /// 缓存条目损坏，视为未登录
    CacheMalformed,
}

impl AuthState {
    pub fn on(self, event: AuthEvent) -> AuthState {
        match event {
            AuthEvent::LoginSucceeded => AuthState::LoggedIn,
            AuthEvent::Logout | AuthEvent::CacheMalformed => AuthState::LoggedOut,
        }
    }
}

/// 两个身份域的在位情况，供路由守卫使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RealmPresence {
    pub user: bool,
    pub admin: bool,
}

impl RealmPresence {
    pub fn has(&self, realm: Realm) -> bool {
        match realm {
            Realm::User => self.user,
            Realm::Admin => self.admin,
        }
    }
}

pub struct SessionStore<S> {
    storage: S,
    user: Option<Identity>,
    admin: Option<Identity>,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// 创建并从持久化缓存初始化两个身份域
    pub fn new(storage: S) -> Self {
        let mut store = Self {
            storage,
            user: None,
            admin: None,
        };
        for realm in Realm::ALL {
            store.reload(realm);
        }
        store
    }

    pub fn get_identity(&self, realm: Realm) -> Option<&Identity> {
        match realm {
            Realm::User => self.user.as_ref(),
            Realm::Admin => self.admin.as_ref(),
        }
    }

    /// 设置或清除身份 (写穿透)
    pub fn set_identity(&mut self, realm: Realm, identity: Option<Identity>) {
        match &identity {
            Some(id) => match serde_json::to_string(id) {
                Ok(raw) => {
                    if !self.storage.set(realm.storage_key(), &raw) {
                        log_warn!("[Session] failed to persist {} identity", realm);
                    }
                }
                Err(e) => log_warn!("[Session] failed to encode {} identity: {}", realm, e),
            },
            None => {
                self.storage.remove(realm.storage_key());
            }
        }

        let event = match identity {
            Some(_) => AuthEvent::LoginSucceeded,
            None => AuthEvent::Logout,
        };
        self.apply(realm, event, identity);
    }

    pub fn clear(&mut self, realm: Realm) {
        self.set_identity(realm, None);
    }

    /// 重新读取某个身份域的缓存 (启动时以及其它标签页写入后)
    pub fn reload(&mut self, realm: Realm) -> Option<&Identity> {
        match read_cached(&self.storage, realm) {
            Cached::Valid(identity) => self.apply(realm, AuthEvent::LoginSucceeded, Some(identity)),
            Cached::Absent => self.apply(realm, AuthEvent::Logout, None),
            Cached::Malformed => self.apply(realm, AuthEvent::CacheMalformed, None),
        }
        self.get_identity(realm)
    }

    /// 按事件迁移认证状态；登出状态下不保留身份
    fn apply(&mut self, realm: Realm, event: AuthEvent, identity: Option<Identity>) {
        let before = self.state(realm);
        let after = before.on(event);
        let identity = match after {
            AuthState::LoggedIn => identity,
            AuthState::LoggedOut => None,
        };
        match realm {
            Realm::User => self.user = identity,
            Realm::Admin => self.admin = identity,
        }
        if before != after {
            log_info!("[Session] {} {:?} -> {:?} ({:?})", realm, before, after, event);
        }
    }

    pub fn state(&self, realm: Realm) -> AuthState {
        if self.get_identity(realm).is_some() {
            AuthState::LoggedIn
        } else {
            AuthState::LoggedOut
        }
    }

    pub fn presence(&self) -> RealmPresence {
        RealmPresence {
            user: self.user.is_some(),
            admin: self.admin.is_some(),
        }
    }
}

enum Cached {
    Absent,
    Valid(Identity),
    Malformed,
}

/// 读取缓存身份；损坏的条目视为不存在
fn read_cached<S: KeyValueStore>(storage: &S, realm: Realm) -> Cached {
    let Some(raw) = storage.get(realm.storage_key()) else {
        return Cached::Absent;
    };
    match serde_json::from_str::<Identity>(&raw) {
        Ok(identity) => Cached::Valid(identity),
        Err(e) => {
            log_warn!("[Session] ignoring malformed {} cache entry: {}", realm, e);
            Cached::Malformed
        }
    }
}

#[cfg(test)]
mod tests;
