//! 响应信封归一化
//!
//! 后端的列表接口可能返回裸数组、`{success, data}` 或 `{status, data}`；
//! 写接口可能返回 `{success, message|error}`、`{status: "success"}` 或仅一个 2xx 对象。
//! 这里是唯一处理这些差异的地方，组件永远只看到归一化后的结果。
//!
//! 统一的成功判定：HTTP 2xx 且响应体没有表达失败。响应体表达失败的情形：
//! - `success` 为 false (布尔 false、0、"false")
//! - `status` 存在且不等于 "success"/"ok"
//! - 存在非空 `error` 且没有 `success: true`

use serde_json::{Map, Value};

use crate::error::{GENERIC_FAILURE, PortalError, PortalResult};
use crate::protocol::HttpResponse;
use crate::record::Record;

/// 归一化后的列表结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListResult {
    pub items: Vec<Record>,
    pub error: Option<String>,
}

impl ListResult {
    pub fn ok(items: Vec<Record>) -> Self {
        Self { items, error: None }
    }

    /// 读路径失败时回落为空集合，同时保留提示消息
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn from_transport(result: PortalResult<HttpResponse>) -> Self {
        match result {
            Ok(resp) => normalize_list(&resp),
            Err(e) => Self::failed(e.user_message()),
        }
    }
}

/// 归一化后的写操作结果
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub ok: bool,
    /// 后端给出的消息 (成功或失败)，原样保留
    pub message: Option<String>,
    /// 完整响应体 (部分接口在成功时返回生成的编号、初始密码等)
    pub body: Option<Value>,
}

impl MutationOutcome {
    pub fn into_result(self) -> PortalResult<MutationOutcome> {
        if self.ok {
            Ok(self)
        } else {
            Err(PortalError::backend(
                self.message.clone().unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ))
        }
    }
}

// =========================================================
// 判定辅助
// =========================================================

fn text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// 响应体是否表达了失败
///
/// 单条记录本身可能带有业务 `status` 字段，此时 `check_status` 为 false。
fn signals_failure(obj: &Map<String, Value>, check_status: bool) -> bool {
    let success = obj.get("success").and_then(truthy);
    if success == Some(false) {
        return true;
    }
    if let (true, Some(Value::String(status))) = (check_status, obj.get("status")) {
        let status = status.trim().to_ascii_lowercase();
        if status != "success" && status != "ok" {
            return true;
        }
    }
    success != Some(true) && text(obj, "error").is_some()
}

/// 失败时优先取 `error`，成功时优先取 `message`
fn pick_message(obj: &Map<String, Value>, failed: bool) -> Option<String> {
    if failed {
        text(obj, "error").or_else(|| text(obj, "message"))
    } else {
        text(obj, "message")
    }
}

fn records(items: Vec<Value>) -> Vec<Record> {
    items.into_iter().filter_map(Record::from_value).collect()
}

// =========================================================
// 归一化入口
// =========================================================

/// 列表响应归一化；任何异常形状都得到空集合
pub fn normalize_list(resp: &HttpResponse) -> ListResult {
    let body: Value = match serde_json::from_str(&resp.body) {
        Ok(v) => v,
        Err(_) if !resp.is_success() => return ListResult::failed(GENERIC_FAILURE),
        Err(_) if resp.body.trim().is_empty() => return ListResult::ok(Vec::new()),
        Err(_) => return ListResult::failed(GENERIC_FAILURE),
    };

    match body {
        Value::Array(items) if resp.is_success() => ListResult::ok(records(items)),
        Value::Object(obj) => {
            if !resp.is_success() || signals_failure(&obj, true) {
                return ListResult::failed(
                    pick_message(&obj, true).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
                );
            }
            match obj.get("data") {
                Some(Value::Array(items)) => ListResult::ok(records(items.clone())),
                Some(Value::Object(one)) => ListResult::ok(vec![Record::new(one.clone())]),
                _ => ListResult::ok(Vec::new()),
            }
        }
        _ if !resp.is_success() => ListResult::failed(GENERIC_FAILURE),
        _ => ListResult::ok(Vec::new()),
    }
}

/// 写操作响应归一化
pub fn normalize_mutation(resp: &HttpResponse) -> MutationOutcome {
    let parsed: Option<Value> = serde_json::from_str(&resp.body).ok();

    match parsed {
        Some(Value::Object(obj)) => {
            let failed = !resp.is_success() || signals_failure(&obj, true);
            MutationOutcome {
                ok: !failed,
                message: pick_message(&obj, failed),
                body: Some(Value::Object(obj)),
            }
        }
        other => MutationOutcome {
            ok: resp.is_success(),
            message: None,
            body: other,
        },
    }
}

/// 单条记录响应归一化 (资料页)：`{data: {...}}` 或对象本身
pub fn normalize_record(resp: &HttpResponse) -> PortalResult<Record> {
    let body: Value = resp.json()?;
    let Value::Object(obj) = body else {
        return Err(PortalError::serialization("expected an object"));
    };
    if !resp.is_success() || signals_failure(&obj, false) {
        return Err(PortalError::backend(
            pick_message(&obj, true).unwrap_or_default(),
        ));
    }
    match obj.get("data") {
        Some(Value::Object(inner)) => Ok(Record::new(inner.clone())),
        _ => Ok(Record::new(obj)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resp(status: u16, body: Value) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    fn ids(result: &ListResult) -> Vec<String> {
        result.items.iter().filter_map(|r| r.key("id")).collect()
    }

    #[test]
    fn list_accepts_every_observed_shape() {
        let bare = normalize_list(&resp(200, json!([{"id": 1}, {"id": 2}])));
        let wrapped = normalize_list(&resp(200, json!({"success": true, "data": [{"id": 1}, {"id": 2}]})));
        let status = normalize_list(&resp(200, json!({"status": "success", "data": [{"id": 1}, {"id": 2}]})));
        for r in [&bare, &wrapped, &status] {
            assert_eq!(ids(r), vec!["1", "2"]);
            assert!(r.error.is_none());
        }
    }

    #[test]
    fn list_failures_degrade_to_empty() {
        let rejected = normalize_list(&resp(200, json!({"success": false, "message": "No access"})));
        assert!(rejected.items.is_empty());
        assert_eq!(rejected.error.as_deref(), Some("No access"));

        let garbage = normalize_list(&HttpResponse {
            status: 200,
            body: "<br><b>Warning</b>".into(),
        });
        assert!(garbage.items.is_empty());
        assert_eq!(garbage.error.as_deref(), Some(GENERIC_FAILURE));

        let server_error = normalize_list(&resp(500, json!([{"id": 1}])));
        assert!(server_error.items.is_empty());
        assert!(server_error.error.is_some());

        let offline = ListResult::from_transport(Err(PortalError::network("boom")));
        assert_eq!(offline.error.as_deref(), Some(crate::error::SERVER_UNREACHABLE));
    }

    #[test]
    fn list_without_data_is_empty_not_error() {
        let r = normalize_list(&resp(200, json!({"success": true})));
        assert!(r.items.is_empty());
        assert!(r.error.is_none());
    }

    #[test]
    fn mutation_single_success_convention() {
        assert!(normalize_mutation(&resp(200, json!({"success": true, "message": "Saved"}))).ok);
        assert!(normalize_mutation(&resp(200, json!({"status": "success"}))).ok);
        assert!(normalize_mutation(&resp(200, json!({"id": 9}))).ok);
        assert!(!normalize_mutation(&resp(200, json!({"success": false}))).ok);
        assert!(!normalize_mutation(&resp(200, json!({"status": "error"}))).ok);
        assert!(!normalize_mutation(&resp(200, json!({"error": "Duplicate email"}))).ok);
        assert!(!normalize_mutation(&resp(400, json!({"success": true}))).ok);
    }

    #[test]
    fn mutation_failure_prefers_error_field() {
        let out = normalize_mutation(&resp(
            422,
            json!({"success": false, "error": "Invalid amount", "message": "Failed"}),
        ));
        assert_eq!(out.message.as_deref(), Some("Invalid amount"));
        let err = out.into_result().unwrap_err();
        assert_eq!(err.user_message(), "Invalid amount");
    }

    #[test]
    fn record_unwraps_data_object() {
        let r = normalize_record(&resp(200, json!({"success": true, "data": {"name": "A"}}))).unwrap();
        assert_eq!(r.display("name"), "A");
        let r = normalize_record(&resp(200, json!({"name": "B", "email": "b@x", "status": "active"}))).unwrap();
        assert_eq!(r.display("email"), "b@x");
        assert!(normalize_record(&resp(200, json!({"error": "User not found"}))).is_err());
    }
}
