//! HTTP 请求封装模块
//!
//! 使用 `web_sys::fetch` 实现共享层的 `Transport`。
//! 任何 HTTP 状态码都作为响应返回，只有 fetch 被拒绝或读取响应体失败才算错误。

use portal_shared::{HttpMethod, HttpRequest, HttpResponse, PortalError, PortalResult, Transport};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

/// 浏览器 fetch 传输层
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl FetchTransport {
    fn build(req: &HttpRequest) -> PortalResult<Request> {
        let headers = Headers::new()
            .map_err(|e| PortalError::network(format!("failed to create headers: {:?}", e)))?;
        for (key, value) in &req.headers {
            headers
                .set(key, value)
                .map_err(|e| PortalError::network(format!("failed to set header: {:?}", e)))?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());
        if let (HttpMethod::Post, Some(body)) = (req.method, &req.body) {
            opts.set_body(&JsValue::from_str(body));
        }

        Request::new_with_str_and_init(&req.url, &opts)
            .map_err(|e| PortalError::network(format!("{:?}", e)))
    }

    async fn text(response: &Response) -> PortalResult<String> {
        let promise = response
            .text()
            .map_err(|e| PortalError::network(format!("{:?}", e)))?;
        let text = JsFuture::from(promise)
            .await
            .map_err(|e| PortalError::network(format!("{:?}", e)))?;
        Ok(text.as_string().unwrap_or_default())
    }
}

#[async_trait::async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, req: HttpRequest) -> PortalResult<HttpResponse> {
        let request = Self::build(&req)?;
        let window = web_sys::window()
            .ok_or_else(|| PortalError::network("window is not available"))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| PortalError::network(format!("{:?}", e)))?;
        let response: Response = resp_value
            .dyn_into()
            .map_err(|e| PortalError::network(format!("fetch did not return a Response: {:?}", e)))?;

        let status = response.status();
        let body = Self::text(&response).await?;
        Ok(HttpResponse { status, body })
    }
}
