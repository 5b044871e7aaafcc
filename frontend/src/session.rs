//! 会话模块
//!
//! 把共享层的 `SessionStore` 挂到响应式系统上：
//! 存储对象只在本线程持有，两个身份域各自暴露一个信号供路由守卫与导航栏读取。
//! 其它标签页登录/登出时通过 `storage` 事件同步。

use std::rc::Rc;

use leptos::prelude::*;
use portal_shared::session::RealmPresence;
use portal_shared::{Identity, PortalClient, Realm, SessionStore};

use crate::web::{BrowserStorage, FetchTransport};

pub type Client = PortalClient<FetchTransport>;

/// 会话上下文
#[derive(Clone, Copy)]
pub struct SessionContext {
    store: StoredValue<SessionStore<BrowserStorage>, LocalStorage>,
    user: RwSignal<Option<Identity>>,
    admin: RwSignal<Option<Identity>>,
}

impl SessionContext {
    /// 从持久化缓存初始化
    pub fn new() -> Self {
        let store = SessionStore::new(BrowserStorage);
        let user = RwSignal::new(store.get_identity(Realm::User).cloned());
        let admin = RwSignal::new(store.get_identity(Realm::Admin).cloned());
        Self {
            store: StoredValue::new_local(store),
            user,
            admin,
        }
    }

    fn slot(&self, realm: Realm) -> RwSignal<Option<Identity>> {
        match realm {
            Realm::User => self.user,
            Realm::Admin => self.admin,
        }
    }

    pub fn identity(&self, realm: Realm) -> Signal<Option<Identity>> {
        self.slot(realm).into()
    }

    /// 路由守卫注入的在位信号
    pub fn presence_signal(&self) -> Signal<RealmPresence> {
        let (user, admin) = (self.user, self.admin);
        Signal::derive(move || RealmPresence {
            user: user.with(Option::is_some),
            admin: admin.with(Option::is_some),
        })
    }

    pub fn sign_in(&self, realm: Realm, identity: Identity) {
        self.store
            .update_value(|s| s.set_identity(realm, Some(identity.clone())));
        self.slot(realm).set(Some(identity));
    }

    /// 登出只清除该身份域；导航由路由服务自动处理
    pub fn sign_out(&self, realm: Realm) {
        self.store.update_value(|s| s.clear(realm));
        self.slot(realm).set(None);
    }

    /// 其它标签页修改了缓存后重新读取
    pub fn sync_from_storage(&self, realm: Realm) {
        let mut fresh = None;
        self.store
            .update_value(|s| fresh = s.reload(realm).cloned());
        if self.slot(realm).get_untracked() != fresh {
            self.slot(realm).set(fresh);
        }
    }
}

pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().expect("SessionContext should be provided")
}

/// 远程资源客户端 (单线程持有)
#[derive(Clone, Copy)]
pub struct ClientContext(StoredValue<Rc<Client>, LocalStorage>);

impl ClientContext {
    pub fn new(client: Client) -> Self {
        Self(StoredValue::new_local(Rc::new(client)))
    }

    pub fn get(&self) -> Rc<Client> {
        self.0.get_value()
    }
}

pub fn use_client() -> Rc<Client> {
    use_context::<ClientContext>()
        .expect("ClientContext should be provided")
        .get()
}
