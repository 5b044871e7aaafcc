//! 远程资源客户端
//!
//! 组件只通过这里访问后端：拼接地址、附加身份参数、发送请求并归一化响应。
//! 读操作失败回落为空集合；写操作失败返回带追踪信息的 `PortalError`。

use chrono::Utc;
use serde_json::{Map, Value, json};

use crate::config::ApiConfig;
use crate::envelope::{ListResult, MutationOutcome, normalize_mutation, normalize_record};
use crate::error::{PortalError, PortalResult};
use crate::identity::{Identity, Realm};
use crate::nav::BadgeKind;
use crate::protocol::{HttpRequest, HttpResponse, Transport};
use crate::record::Record;
use crate::report::{
    EMPLOYEE_FULL_REPORT, EMPLOYEE_ID_PARAM, EmployeeReport, REPORT_EMPLOYEES, is_empty_report,
    report_choice,
};
use crate::resources::{ProfileSpec, badge_source};
use crate::schema::{CreateHint, ParamContext, ProgressAction, RemoteOptions, ResourceSchema, StatusTransition};
use crate::{log_info, log_warn};

pub const LOGIN_FAILED: &str = "Login failed";
pub const NO_REPORT: &str = "No report available for this employee";

/// 远端下拉选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

pub struct PortalClient<T> {
    transport: T,
    config: ApiConfig,
}

impl<T: Transport> PortalClient<T> {
    pub fn new(transport: T, config: ApiConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, path: &str, mut query: Vec<(String, String)>) -> PortalResult<String> {
        // 列表接口经由 CDN，附加时间戳绕过缓存
        query.push(("_".to_string(), Utc::now().timestamp_millis().to_string()));
        self.config.endpoint_with_query(path, &query)
    }

    async fn get(&self, path: &str, query: Vec<(String, String)>) -> PortalResult<HttpResponse> {
        let url = self.url(path, query)?;
        self.transport
            .send(HttpRequest::get(&url))
            .await
            .map_err(|e| e.in_op_with("get", path))
    }

    // =========================================================
    // 读操作
    // =========================================================

    /// 拉取列表；失败时得到空集合与提示消息
    pub async fn list(&self, schema: &ResourceSchema, ctx: &ParamContext<'_>) -> ListResult {
        let mut query = ctx.query_pairs(schema.list_query);
        if let (Some(tabs), Some(filter)) = (schema.filter, ctx.filter) {
            query.push((tabs.param.to_string(), filter.to_string()));
        }

        let result = ListResult::from_transport(self.get(schema.endpoints.list, query).await);
        match &result.error {
            Some(msg) => log_warn!("[List] {} failed: {}", schema.name, msg),
            None => log_info!("[List] {} -> {} items", schema.name, result.items.len()),
        }
        result
    }

    /// 远端下拉选项；失败时为空
    pub async fn options(&self, remote: &RemoteOptions, ctx: &ParamContext<'_>) -> Vec<Choice> {
        let query = ctx.query_pairs(remote.query);
        let result = ListResult::from_transport(self.get(remote.endpoint, query).await);
        if let Some(msg) = &result.error {
            log_warn!("[Options] {} failed: {}", remote.endpoint, msg);
        }
        result
            .items
            .iter()
            .filter_map(|r| {
                let value = r.key(remote.value_field)?;
                let mut label = r.display(remote.label_field);
                if let Some(detail) = remote.detail_field {
                    let detail = r.display(detail);
                    if !detail.is_empty() {
                        label = format!("{} ({})", label, detail);
                    }
                }
                Some(Choice { value, label })
            })
            .collect()
    }

    /// 创建表单的提示值；任何失败都回落到默认值
    pub async fn create_hint(&self, hint: &CreateHint, ctx: &ParamContext<'_>) -> String {
        let query = ctx.query_pairs(hint.query);
        let fetched = match self.get(hint.endpoint, query).await {
            Ok(resp) if resp.is_success() => resp
                .json::<Value>()
                .ok()
                .and_then(|body| body.get(hint.field).cloned())
                .and_then(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
            _ => None,
        };
        fetched.unwrap_or_else(|| hint.fallback.to_string())
    }

    /// 角标所需的远端 id 集合
    pub async fn badge_ids(&self, kind: BadgeKind, identity: &Identity) -> PortalResult<Vec<String>> {
        let schema = badge_source(kind);
        let ctx = ParamContext::new(Some(identity), None);
        let result = self.list(schema, &ctx).await;
        if let Some(msg) = result.error {
            return Err(PortalError::backend(msg).in_op("badge_ids"));
        }
        Ok(result
            .items
            .iter()
            .filter_map(|r| r.key(schema.key_field))
            .collect())
    }

    // =========================================================
    // 写操作
    // =========================================================

    /// POST JSON 并按统一约定判定成败
    pub async fn post(&self, path: &str, body: Map<String, Value>) -> PortalResult<MutationOutcome> {
        let url = self.config.endpoint(path);
        let req = HttpRequest::post_json(&url, &Value::Object(body));
        let resp = self
            .transport
            .send(req)
            .await
            .map_err(|e| e.in_op_with("post", path))?;

        let outcome = normalize_mutation(&resp);
        if !outcome.ok {
            log_warn!("[Mutate] {} rejected (HTTP {})", path, resp.status);
        }
        outcome.into_result().map_err(|e| e.in_op_with("post", path))
    }

    fn endpoint_or_err(
        schema: &ResourceSchema,
        endpoint: Option<&'static str>,
        op: &str,
    ) -> PortalResult<&'static str> {
        endpoint.ok_or_else(|| {
            PortalError::unauthorized(format!("{} does not support {}", schema.name, op)).in_op(op.to_string())
        })
    }

    pub async fn create(&self, schema: &ResourceSchema, body: Map<String, Value>) -> PortalResult<MutationOutcome> {
        let path = Self::endpoint_or_err(schema, schema.endpoints.create, "create")?;
        self.post(path, body).await
    }

    pub async fn update(&self, schema: &ResourceSchema, body: Map<String, Value>) -> PortalResult<MutationOutcome> {
        let path = Self::endpoint_or_err(schema, schema.endpoints.update, "update")?;
        self.post(path, body).await
    }

    /// 删除统一为 POST，载荷只携带记录标识
    pub async fn delete(&self, schema: &ResourceSchema, record: &Record) -> PortalResult<MutationOutcome> {
        let path = Self::endpoint_or_err(schema, schema.endpoints.delete, "delete")?;
        let key = record
            .get(schema.key_field)
            .cloned()
            .ok_or_else(|| PortalError::validation("Record has no identifier").in_op("delete"))?;
        let mut body = Map::new();
        body.insert(schema.delete_key.to_string(), key);
        self.post(path, body).await
    }

    pub async fn transition(
        &self,
        transition: &StatusTransition,
        record: &Record,
        ctx: &ParamContext<'_>,
    ) -> PortalResult<MutationOutcome> {
        let mut body = Map::new();
        ctx.with_record(record).insert_into(transition.params, &mut body);
        self.post(transition.endpoint, body).await
    }

    pub async fn progress(
        &self,
        schema: &ResourceSchema,
        action: &ProgressAction,
        record: &Record,
        value: u8,
    ) -> PortalResult<MutationOutcome> {
        let key = record
            .get(schema.key_field)
            .cloned()
            .ok_or_else(|| PortalError::validation("Record has no identifier").in_op("progress"))?;
        let mut body = Map::new();
        body.insert(action.key_param.to_string(), key);
        body.insert(action.value_param.to_string(), json!(value.min(100)));
        self.post(action.endpoint, body).await
    }

    // =========================================================
    // 登录与资料
    // =========================================================

    /// 登录；成功时返回身份 (由调用方写入 Session Store)
    pub async fn login(&self, realm: Realm, email: &str, password: &str) -> PortalResult<Identity> {
        let path = match realm {
            Realm::User => "auth/login.php",
            Realm::Admin => "auth/admin_login.php",
        };
        let url = self.config.endpoint(path);
        let body = json!({ "email": email.trim(), "password": password });
        let resp = self
            .transport
            .send(HttpRequest::post_json(&url, &body))
            .await
            .map_err(|e| e.in_op_with("login", realm.to_string()))?;

        let outcome = normalize_mutation(&resp);
        let obj = match (outcome.ok, outcome.body) {
            (true, Some(Value::Object(obj))) => obj,
            (_, _) => {
                let msg = outcome.message.unwrap_or_else(|| LOGIN_FAILED.to_string());
                return Err(PortalError::unauthorized(msg).in_op_with("login", realm.to_string()));
            }
        };

        let wrapper = match realm {
            Realm::User => "user",
            Realm::Admin => "admin",
        };
        let profile = match obj.get(wrapper) {
            Some(Value::Object(inner)) => inner.clone(),
            _ => obj,
        };
        let identity = Identity::from_login_body(realm, profile)
            .map_err(|e| PortalError::from(e).in_op_with("login", realm.to_string()))?;
        log_info!("[Login] {} signed in as {} ({})", realm, identity.display_name(), identity.role);
        Ok(identity)
    }

    pub async fn fetch_profile(&self, spec: &ProfileSpec, identity: &Identity) -> PortalResult<Record> {
        let query = vec![(spec.fetch_param.to_string(), identity.id.to_string())];
        let resp = self
            .get(spec.fetch, query)
            .await
            .map_err(|e| e.in_op("fetch_profile"))?;
        normalize_record(&resp).map_err(|e| e.in_op_with("fetch_profile", spec.fetch))
    }

    pub async fn save_profile(
        &self,
        spec: &ProfileSpec,
        identity: &Identity,
        mut body: Map<String, Value>,
    ) -> PortalResult<MutationOutcome> {
        // 密码留空表示不修改
        if body.get("password").and_then(Value::as_str).is_some_and(|p| p.is_empty()) {
            body.remove("password");
        }
        body.insert(spec.save_key.to_string(), json!(identity.id));
        self.post(spec.save, body).await
    }

    // =========================================================
    // 报表
    // =========================================================

    /// 报表页的员工下拉
    pub async fn report_employees(&self) -> PortalResult<Vec<Choice>> {
        let result = ListResult::from_transport(self.get(REPORT_EMPLOYEES, Vec::new()).await);
        if let Some(msg) = result.error {
            return Err(PortalError::backend(msg).in_op("report_employees"));
        }
        Ok(result.items.iter().filter_map(report_choice).collect())
    }

    /// 单个员工的完整报表
    pub async fn employee_report(&self, employee_id: &str) -> PortalResult<EmployeeReport> {
        let query = vec![(EMPLOYEE_ID_PARAM.to_string(), employee_id.to_string())];
        let resp = self
            .get(EMPLOYEE_FULL_REPORT, query)
            .await
            .map_err(|e| e.in_op("employee_report"))?;
        let record = normalize_record(&resp).map_err(|e| e.in_op_with("employee_report", employee_id))?;
        if record.get("data").is_some_and(is_empty_report) {
            return Err(PortalError::backend(NO_REPORT).in_op_with("employee_report", employee_id));
        }
        let report = EmployeeReport::from_record(&record);
        log_info!(
            "[Report] employee {} -> {} tasks, {} payslips",
            employee_id,
            report.tasks.total,
            report.payslips.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PortalErrorStatus, SERVER_UNREACHABLE};
    use crate::identity::Role;
    use crate::protocol::{HttpMethod, MockTransport};
    use crate::resources::{ADMIN_FORMS, INVOICES, PAYSLIPS, TASKS, USER_PROFILE};

    const BASE: &str = "https://portal.test/api";

    fn client() -> PortalClient<MockTransport> {
        PortalClient::new(MockTransport::new(), ApiConfig::new(BASE))
    }

    fn url(path: &str) -> String {
        format!("{}/{}", BASE, path)
    }

    fn employer() -> Identity {
        Identity::new(5, "Kavya", Role::Employer)
    }

    #[tokio::test]
    async fn list_sends_identity_params_and_cache_buster() {
        let c = client();
        c.transport()
            .mock_response(&url("tasks/list.php"), 200, json!({"success": true, "data": [{"id": 1}]}));
        let identity = employer();
        let result = c.list(&TASKS, &ParamContext::new(Some(&identity), None)).await;
        assert_eq!(result.items.len(), 1);

        let req = c.transport().last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.url.contains("user_id=5"));
        assert!(req.url.contains("role=employer"));
        assert!(req.url.contains("&_="));
    }

    #[tokio::test]
    async fn offline_list_degrades_to_empty_with_notice() {
        let c = client();
        c.transport().go_offline();
        let result = c.list(&TASKS, &ParamContext::default()).await;
        assert!(result.items.is_empty());
        assert_eq!(result.error.as_deref(), Some(SERVER_UNREACHABLE));
    }

    #[tokio::test]
    async fn options_label_includes_detail() {
        let c = client();
        c.transport().mock_response(
            &url("payslips/employee.php"),
            200,
            json!([{"id": 3, "name": "Arun", "email": "arun@x.in"}, {"name": "no id"}]),
        );
        let remote = match PAYSLIPS.field("employee_id").unwrap().kind {
            crate::schema::FieldKind::RemoteSelect(r) => r,
            _ => unreachable!(),
        };
        let choices = c.options(&remote, &ParamContext::default()).await;
        assert_eq!(
            choices,
            vec![Choice {
                value: "3".into(),
                label: "Arun (arun@x.in)".into()
            }]
        );
    }

    #[tokio::test]
    async fn create_hint_falls_back() {
        let c = client();
        let identity = employer();
        let ctx = ParamContext::new(Some(&identity), None);
        let hint = INVOICES.create_hint.unwrap();
        assert_eq!(c.create_hint(&hint, &ctx).await, "INV001");

        c.transport()
            .mock_response(&url("invoices/next_invoice_no.php"), 200, json!({"invoice_no": "INV014"}));
        assert_eq!(c.create_hint(&hint, &ctx).await, "INV014");
    }

    #[tokio::test]
    async fn rejected_mutation_carries_backend_message_and_trace() {
        let c = client();
        c.transport().mock_response(
            &url("tasks/create.php"),
            200,
            json!({"success": false, "error": "Employee not found"}),
        );
        let err = c.create(&TASKS, Map::new()).await.unwrap_err();
        assert_eq!(err.status, PortalErrorStatus::Backend);
        assert_eq!(err.user_message(), "Employee not found");
        assert_eq!(err.spans()[0].operation, "post");
    }

    #[tokio::test]
    async fn delete_posts_only_the_key() {
        let c = client();
        c.transport()
            .mock_response(&url("forms/delete.php"), 200, json!({"success": true}));
        let record = Record::from_value(json!({"id": 12, "title": "PF"})).unwrap();
        c.delete(&ADMIN_FORMS, &record).await.unwrap();

        let req = c.transport().last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.json_body().unwrap(), json!({"form_id": 12}));
    }

    #[tokio::test]
    async fn read_only_schema_rejects_writes_without_network() {
        let c = client();
        let err = c.create(&crate::resources::REPORTS, Map::new()).await.unwrap_err();
        assert_eq!(err.status, PortalErrorStatus::Unauthorized);
        assert_eq!(c.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn mark_paid_sends_identifier_and_target_only() {
        let c = client();
        c.transport()
            .mock_response(&url("invoices/update_status.php"), 200, json!({"status": "success"}));
        let identity = employer();
        let record = Record::from_value(json!({"id": "INV003", "amount": 500, "status": "pending"})).unwrap();
        let transition = INVOICES.transitions[0];
        c.transition(&transition, &record, &ParamContext::new(Some(&identity), None))
            .await
            .unwrap();
        assert_eq!(
            c.transport().last_request().unwrap().json_body().unwrap(),
            json!({"employer_id": 5, "invoice_no": "INV003", "status": "paid"})
        );
    }

    #[tokio::test]
    async fn progress_is_clamped() {
        let c = client();
        c.transport()
            .mock_response(&url("tasks/update-progress.php"), 200, json!({"success": true}));
        let record = Record::from_value(json!({"id": 4})).unwrap();
        let action = TASKS.progress.unwrap();
        c.progress(&TASKS, &action, &record, 140).await.unwrap();
        assert_eq!(
            c.transport().last_request().unwrap().json_body().unwrap(),
            json!({"task_id": 4, "progress": 100})
        );
    }

    #[tokio::test]
    async fn user_login_unwraps_user_and_trims_email() {
        let c = client();
        c.transport().mock_response(
            &url("auth/login.php"),
            200,
            json!({"success": true, "user": {"id": "8", "name": "Devi", "role": "employee"}}),
        );
        let identity = c.login(Realm::User, "  devi@x.in ", "pw").await.unwrap();
        assert_eq!(identity.id, 8);
        assert_eq!(identity.role, Role::Employee);
        assert_eq!(
            c.transport().last_request().unwrap().json_body().unwrap()["email"],
            "devi@x.in"
        );
    }

    #[tokio::test]
    async fn admin_login_forces_role_and_reports_failures() {
        let c = client();
        c.transport().mock_response(
            &url("auth/admin_login.php"),
            200,
            json!({"success": true, "admin": {"id": 1, "name": "Root"}, "message": "ok"}),
        );
        let identity = c.login(Realm::Admin, "root@x.in", "pw").await.unwrap();
        assert_eq!(identity.role, Role::Admin);

        c.transport().mock_response(
            &url("auth/admin_login.php"),
            200,
            json!({"success": false, "message": "Invalid credentials"}),
        );
        let err = c.login(Realm::Admin, "root@x.in", "bad").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");

        c.transport().mock_response(&url("auth/login.php"), 401, json!({}));
        let err = c.login(Realm::User, "a@x.in", "bad").await.unwrap_err();
        assert_eq!(err.user_message(), LOGIN_FAILED);

        c.transport().go_offline();
        let err = c.login(Realm::User, "a@x.in", "pw").await.unwrap_err();
        assert_eq!(err.user_message(), SERVER_UNREACHABLE);
    }

    #[tokio::test]
    async fn profile_save_skips_blank_password_and_adds_key() {
        let c = client();
        c.transport()
            .mock_response(&url("users/update-profile.php"), 200, json!({"success": true, "message": "Profile updated"}));
        let identity = employer();
        let mut body = Map::new();
        body.insert("name".into(), json!("Kavya R"));
        body.insert("password".into(), json!(""));
        let outcome = c.save_profile(&USER_PROFILE, &identity, body).await.unwrap();
        assert_eq!(outcome.message.as_deref(), Some("Profile updated"));
        assert_eq!(
            c.transport().last_request().unwrap().json_body().unwrap(),
            json!({"name": "Kavya R", "user_id": 5})
        );
    }

    #[tokio::test]
    async fn badge_ids_use_notification_feed() {
        let c = client();
        c.transport().mock_response(
            &url("notifications/user_notifications.php"),
            200,
            json!({"status": "success", "data": [{"id": 1}, {"id": "2"}]}),
        );
        let ids = c.badge_ids(BadgeKind::Notifications, &employer()).await.unwrap();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(c.transport().last_request().unwrap().url.contains("user_type=employer"));
    }

    #[tokio::test]
    async fn employee_report_unwraps_data_and_sends_id() {
        let c = client();
        c.transport().mock_response(
            &url("reports/employee_full.php"),
            200,
            json!({
                "success": true,
                "data": {
                    "tasks": {"total": 3, "completed": 1, "remaining": 2},
                    "salary": 18000,
                    "epfo": [{"status": "pending", "count": 1}],
                    "payslips": [{"month_year": "2025-03", "net_salary": "18000.00"}]
                }
            }),
        );
        let report = c.employee_report("9").await.unwrap();
        assert_eq!(report.tasks.remaining, 2);
        assert_eq!(report.salary, 18000.0);
        assert_eq!(report.payslips[0].display("month_year"), "2025-03");

        let req = c.transport().last_request().unwrap();
        assert!(req.url.contains("employee_id=9"));
        assert!(req.url.contains("&_="));
    }

    #[tokio::test]
    async fn missing_report_is_an_error() {
        let c = client();
        c.transport()
            .mock_response(&url("reports/employee_full.php"), 200, json!({"success": true, "data": null}));
        let err = c.employee_report("9").await.unwrap_err();
        assert_eq!(err.user_message(), NO_REPORT);

        c.transport().mock_response(
            &url("reports/employee_full.php"),
            200,
            json!({"success": false, "message": "Employee not found"}),
        );
        let err = c.employee_report("404").await.unwrap_err();
        assert_eq!(err.user_message(), "Employee not found");
    }

    #[tokio::test]
    async fn report_employees_become_labelled_choices() {
        let c = client();
        c.transport().mock_response(
            &url("reports/employees.php"),
            200,
            json!({"success": true, "data": [
                {"id": 1, "employee_code": "EMP0001", "employee_name": "Arun"},
                {"employee_code": "EMP0002"}
            ]}),
        );
        let choices = c.report_employees().await.unwrap();
        assert_eq!(
            choices,
            vec![Choice {
                value: "1".into(),
                label: "EMP0001 - Arun".into()
            }]
        );
    }
}
