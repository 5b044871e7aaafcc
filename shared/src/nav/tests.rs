use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::storage::MemoryStore;

#[test]
fn employee_sees_forms_and_payslip_but_not_employer_tools() {
    let routes: Vec<AppRoute> = visible_links(Realm::User, Role::Employee)
        .into_iter()
        .map(|e| e.route)
        .collect();
    assert!(routes.contains(&AppRoute::Forms));
    assert!(routes.contains(&AppRoute::Payslip));
    assert!(!routes.contains(&AppRoute::Invoices));
    assert!(!routes.contains(&AppRoute::IdCreation));
    // 文件页只能通过地址直接访问
    assert!(!routes.contains(&AppRoute::Files));
    assert_eq!(routes[0], AppRoute::Dashboard);
}

#[test]
fn employer_sees_management_screens_in_table_order() {
    let labels: Vec<&str> = visible_links(Realm::User, Role::Employer)
        .into_iter()
        .map(|e| e.label)
        .collect();
    assert_eq!(
        labels,
        vec![
            "Dashboard",
            "Profile",
            "Notifications",
            "Tasks",
            "Add Employee",
            "Invoices",
            "Payments",
            "Create Payslip",
            "Reports",
            "EPFO Requests",
        ]
    );
}

#[test]
fn admin_links_only_for_admin_role() {
    assert!(visible_links(Realm::Admin, Role::Employer).is_empty());
    assert_eq!(visible_links(Realm::Admin, Role::Admin).len(), ADMIN_LINKS.len());
}

#[test]
fn badge_count_is_remote_minus_visited() {
    let storage = MemoryStore::with_entries([(VISITED_NOTIFICATIONS_KEY, "1,2")]);
    let mut tracker = BadgeTracker::new(storage);
    tracker.set_remote(BadgeKind::Notifications, ["1", "2", "3"]);
    assert_eq!(tracker.count(BadgeKind::Notifications), 1);

    // 不重新拉取，访问后立即归零
    tracker.mark_visited(BadgeKind::Notifications, ["1", "2", "3"]);
    assert_eq!(tracker.count(BadgeKind::Notifications), 0);
}

#[test]
fn mark_visited_persists_comma_joined_ids_and_timestamp() {
    let storage = MemoryStore::new();
    let mut tracker = BadgeTracker::new(storage.clone());
    tracker.mark_visited(BadgeKind::Forms, ["7", "9"]);
    assert_eq!(storage.get(VISITED_FORMS_KEY).as_deref(), Some("7,9"));
    let ts: i64 = storage
        .get(LAST_VISITED_FORMS_KEY)
        .unwrap()
        .parse()
        .unwrap();
    assert!(ts > 0);
    assert!(!storage.contains(VISITED_NOTIFICATIONS_KEY));
}

#[test]
fn subscribers_are_notified_synchronously_until_unsubscribed() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut tracker = BadgeTracker::new(MemoryStore::new());

    let sink = seen.clone();
    let sub = tracker.subscribe(move |kind, count| sink.borrow_mut().push((kind, count)));

    tracker.set_remote(BadgeKind::Forms, ["a", "b"]);
    tracker.mark_visited(BadgeKind::Forms, ["a", "b"]);
    assert_eq!(
        *seen.borrow(),
        vec![(BadgeKind::Forms, 2), (BadgeKind::Forms, 0)]
    );

    assert!(tracker.unsubscribe(sub));
    assert_eq!(tracker.subscriber_count(), 0);
    tracker.set_remote(BadgeKind::Forms, ["c"]);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn visits_from_another_tab_are_visible_through_shared_storage() {
    let storage = MemoryStore::new();
    let mut tab_a = BadgeTracker::new(storage.clone());
    let mut tab_b = BadgeTracker::new(storage);
    tab_a.set_remote(BadgeKind::Notifications, ["1", "2"]);
    tab_b.mark_visited(BadgeKind::Notifications, ["1", "2"]);

    let last = Rc::new(RefCell::new(None));
    let sink = last.clone();
    tab_a.subscribe(move |_, count| *sink.borrow_mut() = Some(count));
    tab_a.external_change(BadgeKind::Notifications);
    assert_eq!(*last.borrow(), Some(0));
}

#[test]
fn storage_key_maps_back_to_badge_kind() {
    assert_eq!(
        BadgeKind::from_visited_key(VISITED_FORMS_KEY),
        Some(BadgeKind::Forms)
    );
    assert_eq!(BadgeKind::from_visited_key("user"), None);
}
