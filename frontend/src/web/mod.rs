//! 原生 Web API 封装模块
//!
//! 对浏览器原生 API 的轻量级封装：fetch、localStorage、FileReader、History、打印窗口。

pub mod dialog;
pub mod file;
mod http;
pub mod print;
pub mod router;
mod storage;

pub use http::FetchTransport;
pub use storage::{BrowserStorage, on_storage_change};
