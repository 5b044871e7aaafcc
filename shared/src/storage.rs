//! 持久化键值存储抽象
//!
//! 浏览器中由 localStorage 实现，测试中使用内存实现。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// 持久化存储适配器：字符串键值对
pub trait KeyValueStore {
    /// 读取键；不存在或读取失败时返回 None
    fn get(&self, key: &str) -> Option<String>;
    /// 写入键；返回是否成功
    fn set(&self, key: &str, value: &str) -> bool;
    /// 删除键；返回是否成功
    fn remove(&self, key: &str) -> bool;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> bool {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> bool {
        (**self).remove(key)
    }
}

/// 内存存储
///
/// 克隆后共享同一份数据，可用来模拟同源的多个标签页。
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        for (k, v) in entries {
            store.set(k, v);
        }
        store
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.borrow_mut().remove(key);
        true
    }
}
