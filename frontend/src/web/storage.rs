//! LocalStorage 封装模块
//!
//! 使用 `web_sys::Storage` 实现共享层的 `KeyValueStore`，
//! 并监听其它标签页触发的 `storage` 事件。

use portal_shared::KeyValueStore;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// 浏览器 localStorage
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> bool {
        Self::storage()
            .and_then(|s| s.set_item(key, value).ok())
            .is_some()
    }

    fn remove(&self, key: &str) -> bool {
        Self::storage()
            .and_then(|s| s.remove_item(key).ok())
            .is_some()
    }
}

/// 监听同源其它标签页的 localStorage 变更，回调参数为变更的键
/// (`None` 表示整个存储被清空)
///
/// 监听器随页面存活，闭包被泄漏。
pub fn on_storage_change(callback: impl Fn(Option<String>) + 'static) {
    let closure = Closure::<dyn Fn(web_sys::StorageEvent)>::new(move |ev: web_sys::StorageEvent| {
        callback(ev.key());
    });

    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref());
    }
    closure.forget();
}
