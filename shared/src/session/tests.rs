use super::*;
use crate::identity::Role;
use crate::storage::MemoryStore;
use crate::{STORAGE_ADMIN_KEY, STORAGE_USER_KEY};

fn employer() -> Identity {
    Identity::new(12, "Kavya", Role::Employer)
}

#[test]
fn starts_logged_out_on_empty_cache() {
    let store = SessionStore::new(MemoryStore::new());
    for realm in Realm::ALL {
        assert!(store.get_identity(realm).is_none());
        assert_eq!(store.state(realm), AuthState::LoggedOut);
    }
    assert_eq!(store.presence(), RealmPresence::default());
}

#[test]
fn login_survives_reload() {
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(storage.clone());
    store.set_identity(Realm::User, Some(employer()));
    assert_eq!(store.get_identity(Realm::User), Some(&employer()));

    // 模拟页面刷新：同一份持久化数据重新初始化
    let rehydrated = SessionStore::new(storage);
    assert_eq!(rehydrated.get_identity(Realm::User), Some(&employer()));
    assert_eq!(rehydrated.state(Realm::User), AuthState::LoggedIn);
}

#[test]
fn logout_clears_memory_and_cache() {
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(storage.clone());
    store.set_identity(Realm::User, Some(employer()));
    assert!(storage.contains(STORAGE_USER_KEY));

    store.clear(Realm::User);
    assert!(store.get_identity(Realm::User).is_none());
    assert!(!storage.contains(STORAGE_USER_KEY));
}

#[test]
fn realms_are_independent() {
    let mut store = SessionStore::new(MemoryStore::new());
    store.set_identity(Realm::User, Some(employer()));
    store.set_identity(Realm::Admin, Some(Identity::new(1, "Root", Role::Admin)));
    assert_eq!(
        store.presence(),
        RealmPresence {
            user: true,
            admin: true
        }
    );

    store.clear(Realm::Admin);
    assert!(store.presence().has(Realm::User));
    assert!(!store.presence().has(Realm::Admin));
}

#[test]
fn malformed_cache_entry_is_treated_as_absent() {
    let storage = MemoryStore::with_entries([
        (STORAGE_USER_KEY, "{not json"),
        (STORAGE_ADMIN_KEY, r#"{"id":"abc","name":"x","role":"admin"}"#),
    ]);
    let store = SessionStore::new(storage);
    assert!(store.get_identity(Realm::User).is_none());
    assert!(store.get_identity(Realm::Admin).is_none());
}

#[test]
fn reload_picks_up_writes_from_another_tab() {
    let storage = MemoryStore::new();
    let mut tab_a = SessionStore::new(storage.clone());
    let mut tab_b = SessionStore::new(storage);

    tab_b.set_identity(Realm::User, Some(employer()));
    assert!(tab_a.get_identity(Realm::User).is_none());
    assert_eq!(tab_a.reload(Realm::User), Some(&employer()));

    tab_b.clear(Realm::User);
    assert!(tab_a.reload(Realm::User).is_none());
}

#[test]
fn auth_state_transitions() {
    assert_eq!(
        AuthState::LoggedOut.on(AuthEvent::LoginSucceeded),
        AuthState::LoggedIn
    );
    assert_eq!(AuthState::LoggedIn.on(AuthEvent::Logout), AuthState::LoggedOut);
    assert_eq!(
        AuthState::LoggedIn.on(AuthEvent::CacheMalformed),
        AuthState::LoggedOut
    );
}

#[test]
fn corrupted_entry_logs_out_on_reload() {
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(storage.clone());
    store.set_identity(Realm::User, Some(employer()));
    assert_eq!(store.state(Realm::User), AuthState::LoggedIn);

    storage.set(STORAGE_USER_KEY, "[]");
    assert!(store.reload(Realm::User).is_none());
    assert_eq!(store.state(Realm::User), AuthState::LoggedOut);
}
