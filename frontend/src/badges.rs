//! 导航栏未读角标
//!
//! 远端 id 集合按需拉取，已访问集合存放在 localStorage；
//! 计数变化通过追踪器的订阅同步写入信号。

use leptos::prelude::*;
use leptos::task::spawn_local;
use portal_shared::{BadgeKind, BadgeTracker, Identity, log_warn};

use crate::session::use_client;
use crate::web::BrowserStorage;

#[derive(Clone, Copy)]
pub struct BadgeContext {
    tracker: StoredValue<BadgeTracker<BrowserStorage>, LocalStorage>,
    notifications: RwSignal<usize>,
    forms: RwSignal<usize>,
}

impl BadgeContext {
    pub fn new() -> Self {
        let notifications = RwSignal::new(0);
        let forms = RwSignal::new(0);
        let mut tracker = BadgeTracker::new(BrowserStorage);
        tracker.subscribe(move |kind, count| {
            // 页面卸载后信号可能已释放
            let _ = match kind {
                BadgeKind::Notifications => notifications.try_set(count),
                BadgeKind::Forms => forms.try_set(count),
            };
        });
        Self {
            tracker: StoredValue::new_local(tracker),
            notifications,
            forms,
        }
    }

    pub fn count(&self, kind: BadgeKind) -> Signal<usize> {
        match kind {
            BadgeKind::Notifications => self.notifications.into(),
            BadgeKind::Forms => self.forms.into(),
        }
    }

    /// 重新拉取远端 id 集合
    pub fn refresh(&self, identity: Identity) {
        let tracker = self.tracker;
        let client = use_client();
        spawn_local(async move {
            for kind in BadgeKind::ALL {
                match client.badge_ids(kind, &identity).await {
                    Ok(ids) => tracker.update_value(|t| t.set_remote(kind, ids)),
                    Err(e) => log_warn!("[Badge] refresh {:?} failed: {}", kind, e),
                }
            }
        });
    }

    pub fn mark_visited(&self, kind: BadgeKind, ids: Vec<String>) {
        self.tracker.update_value(|t| t.mark_visited(kind, ids));
    }

    /// 其它标签页修改了已访问集合
    pub fn external_change(&self, kind: BadgeKind) {
        self.tracker.with_value(|t| t.external_change(kind));
    }
}

pub fn use_badges() -> BadgeContext {
    use_context::<BadgeContext>().expect("BadgeContext should be provided")
}
