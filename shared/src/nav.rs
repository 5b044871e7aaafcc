//! Navigation Shell 的领域部分
//!
//! - 按角色过滤的静态链接表
//! - 未读角标：远端 id 集合与本地"已访问"集合求差

use std::collections::BTreeSet;
use std::rc::Rc;

use chrono::Utc;

use crate::identity::{Realm, Role};
use crate::route::AppRoute;
use crate::storage::KeyValueStore;
use crate::{
    LAST_VISITED_FORMS_KEY, LAST_VISITED_NOTIFICATIONS_KEY, VISITED_FORMS_KEY,
    VISITED_NOTIFICATIONS_KEY, log_info,
};

// =========================================================
// 链接表
// =========================================================

/// 角标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BadgeKind {
    Notifications,
    Forms,
}

impl BadgeKind {
    pub const ALL: [BadgeKind; 2] = [BadgeKind::Notifications, BadgeKind::Forms];

    pub fn visited_key(&self) -> &'static str {
        match self {
            BadgeKind::Notifications => VISITED_NOTIFICATIONS_KEY,
            BadgeKind::Forms => VISITED_FORMS_KEY,
        }
    }

    pub fn last_visited_key(&self) -> &'static str {
        match self {
            BadgeKind::Notifications => LAST_VISITED_NOTIFICATIONS_KEY,
            BadgeKind::Forms => LAST_VISITED_FORMS_KEY,
        }
    }

    /// 根据存储键反查角标类型 (跨标签页 storage 事件)
    pub fn from_visited_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.visited_key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub route: AppRoute,
    pub label: &'static str,
    pub roles: &'static [Role],
    pub badge: Option<BadgeKind>,
}

const BOTH: &[Role] = &[Role::Employer, Role::Employee];
const EMPLOYEE: &[Role] = &[Role::Employee];
const EMPLOYER: &[Role] = &[Role::Employer];
const ADMIN: &[Role] = &[Role::Admin];

const fn entry(route: AppRoute, label: &'static str, roles: &'static [Role]) -> NavEntry {
    NavEntry {
        route,
        label,
        roles,
        badge: None,
    }
}

const fn badged(
    route: AppRoute,
    label: &'static str,
    roles: &'static [Role],
    badge: BadgeKind,
) -> NavEntry {
    NavEntry {
        route,
        label,
        roles,
        badge: Some(badge),
    }
}

pub const USER_LINKS: &[NavEntry] = &[
    entry(AppRoute::Dashboard, "Dashboard", BOTH),
    entry(AppRoute::Profile, "Profile", BOTH),
    badged(
        AppRoute::Notifications,
        "Notifications",
        BOTH,
        BadgeKind::Notifications,
    ),
    entry(AppRoute::Tasks, "Tasks", BOTH),
    badged(AppRoute::Forms, "Forms", EMPLOYEE, BadgeKind::Forms),
    entry(AppRoute::Payslip, "Payslip", EMPLOYEE),
    entry(AppRoute::IdCreation, "Add Employee", EMPLOYER),
    entry(AppRoute::Invoices, "Invoices", EMPLOYER),
    entry(AppRoute::Payments, "Payments", EMPLOYER),
    entry(AppRoute::AddPayslip, "Create Payslip", EMPLOYER),
    entry(AppRoute::Reports, "Reports", EMPLOYER),
    entry(AppRoute::EpfoRequests, "EPFO Requests", EMPLOYER),
];

pub const ADMIN_LINKS: &[NavEntry] = &[
    entry(AppRoute::AdminDashboard, "Dashboard", ADMIN),
    entry(AppRoute::AdminProfile, "Profile", ADMIN),
    entry(AppRoute::AdminNotifications, "Notifications", ADMIN),
    entry(AppRoute::AdminTasks, "Tasks", ADMIN),
    entry(AppRoute::AdminEmployees, "Add Employee", ADMIN),
    entry(AppRoute::AdminInvoices, "Invoices", ADMIN),
    entry(AppRoute::AdminPayments, "Payments", ADMIN),
    entry(AppRoute::AdminPayslip, "Payslips", ADMIN),
    entry(AppRoute::AdminReports, "Reports", ADMIN),
    entry(AppRoute::AdminEpfoRequests, "EPFO Requests", ADMIN),
    entry(AppRoute::AdminForms, "Forms", ADMIN),
    entry(AppRoute::AdminFiles, "Files", ADMIN),
];

pub fn links_for(realm: Realm) -> &'static [NavEntry] {
    match realm {
        Realm::User => USER_LINKS,
        Realm::Admin => ADMIN_LINKS,
    }
}

/// 保持表内顺序，只保留当前角色可见的链接
pub fn visible_links(realm: Realm, role: Role) -> Vec<NavEntry> {
    links_for(realm)
        .iter()
        .filter(|e| e.roles.contains(&role))
        .copied()
        .collect()
}

// =========================================================
// 未读角标
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

type BadgeListener = Rc<dyn Fn(BadgeKind, usize)>;

/// 角标追踪器
///
/// 已访问集合持久化为逗号拼接的 id 列表；远端 id 集合只在内存中缓存。
/// `mark_visited` 写入后同步通知所有订阅者，不等待重新拉取。
pub struct BadgeTracker<S> {
    storage: S,
    notifications: BTreeSet<String>,
    forms: BTreeSet<String>,
    listeners: Vec<(SubscriptionId, BadgeListener)>,
    next_id: u64,
}

impl<S: KeyValueStore> BadgeTracker<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            notifications: BTreeSet::new(),
            forms: BTreeSet::new(),
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    fn remote(&self, kind: BadgeKind) -> &BTreeSet<String> {
        match kind {
            BadgeKind::Notifications => &self.notifications,
            BadgeKind::Forms => &self.forms,
        }
    }

    /// 从持久化存储读取已访问集合
    pub fn visited(&self, kind: BadgeKind) -> BTreeSet<String> {
        self.storage
            .get(kind.visited_key())
            .map(|raw| parse_id_list(&raw))
            .unwrap_or_default()
    }

    /// 更新远端 id 集合，并通知订阅者
    pub fn set_remote<I, T>(&mut self, kind: BadgeKind, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let ids: BTreeSet<String> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| !id.is_empty())
            .collect();
        match kind {
            BadgeKind::Notifications => self.notifications = ids,
            BadgeKind::Forms => self.forms = ids,
        }
        self.notify(kind);
    }

    /// 未读数 = |远端 − 已访问|
    pub fn count(&self, kind: BadgeKind) -> usize {
        let visited = self.visited(kind);
        self.remote(kind)
            .iter()
            .filter(|id| !visited.contains(*id))
            .count()
    }

    /// 标记为已访问
    ///
    /// 已访问集合被整体替换为本次传入的 id (即页面当前加载到的全部 id)，
    /// 同时记录访问时间。
    pub fn mark_visited<I, T>(&mut self, kind: BadgeKind, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let ids: Vec<String> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| !id.is_empty())
            .collect();

        self.storage.set(kind.visited_key(), &ids.join(","));
        self.storage.set(
            kind.last_visited_key(),
            &Utc::now().timestamp_millis().to_string(),
        );
        log_info!("[Badge] {:?} marked {} ids visited", kind, ids.len());
        self.notify(kind);
    }

    /// 其它标签页修改了已访问集合后调用，重新计算并广播
    pub fn external_change(&self, kind: BadgeKind) {
        self.notify(kind);
    }

    pub fn subscribe(&mut self, listener: impl Fn(BadgeKind, usize) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self, kind: BadgeKind) {
        let count = self.count(kind);
        for (_, listener) in &self.listeners {
            listener(kind, count);
        }
    }
}

fn parse_id_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests;
