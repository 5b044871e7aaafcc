use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::error::{PortalError, PortalResult};

#[cfg(test)]
use std::cell::RefCell;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 后端只使用 GET (列表/读取) 与 POST (全部写操作)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(url, HttpMethod::Get)
    }

    /// JSON 请求体的 POST
    pub fn post_json(url: &str, body: &serde_json::Value) -> Self {
        Self::new(url, HttpMethod::Post)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: &serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// 去掉查询串后的 URL
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> PortalResult<T> {
        serde_json::from_str(&self.body).map_err(PortalError::from)
    }
}

/// 远程资源传输层
///
/// 浏览器中由 fetch 实现；测试中由脚本化的 Mock 或内存后端实现。
/// 单线程事件循环，不要求 `Send`。
#[async_trait::async_trait(?Send)]
pub trait Transport {
    /// 只有传输层失败 (无法连接、读取响应体失败) 才返回 Err；
    /// 任何 HTTP 状态码都作为 Ok 返回，由上层归一化。
    async fn send(&self, req: HttpRequest) -> PortalResult<HttpResponse>;
}

#[async_trait::async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for std::rc::Rc<T> {
    async fn send(&self, req: HttpRequest) -> PortalResult<HttpResponse> {
        (**self).send(req).await
    }
}

// =========================================================
// 测试工具: MockTransport
// =========================================================

#[cfg(test)]
pub struct MockTransport {
    // (不含查询串的 URL, (Status, Response Body))
    responses: RefCell<HashMap<String, (u16, String)>>,
    unreachable: RefCell<bool>,
    pub requests: RefCell<Vec<HttpRequest>>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            unreachable: RefCell::new(false),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn mock_response(&self, url: &str, status: u16, body: serde_json::Value) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn mock_raw(&self, url: &str, status: u16, body: &str) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), (status, body.to_string()));
    }

    /// 之后所有请求都以网络错误失败
    pub fn go_offline(&self) {
        *self.unreachable.borrow_mut() = true;
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, req: HttpRequest) -> PortalResult<HttpResponse> {
        self.requests.borrow_mut().push(req.clone());

        if *self.unreachable.borrow() {
            return Err(PortalError::network("Failed to fetch"));
        }

        let responses = self.responses.borrow();
        if let Some((status, body)) = responses.get(req.path()) {
            Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            })
        } else {
            Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            })
        }
    }
}
