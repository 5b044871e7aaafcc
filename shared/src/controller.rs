//! List-Form-Submit 控制器
//!
//! 一个管理页面的完整交互状态：加载列表、打开创建/编辑表单、校验、提交、
//! 状态迁移、进度上报与删除。渲染层只订阅 `ListState` 并转发用户操作。
//!
//! 状态放在 `RefCell` 中，任何 `.await` 期间都不持有借用；
//! 观察者在借用释放后以快照调用。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::client::{Choice, PortalClient};
use crate::error::{PortalError, PortalResult};
use crate::form::{FileUpload, FormValues, build_payload, check_file, validate};
use crate::identity::Identity;
use crate::nav::{BadgeKind, SubscriptionId};
use crate::protocol::Transport;
use crate::record::Record;
use crate::schema::{FieldKind, ParamContext, ResourceSchema, StatusTransition};
use crate::{log_info, log_warn};

pub const SAVED: &str = "Saved successfully";
pub const DELETED: &str = "Deleted successfully";
pub const UPDATED: &str = "Updated successfully";
pub const NO_PERMISSION: &str = "You do not have permission to do that";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// 页面内提示；直到用户关闭或下一次操作前一直显示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListState {
    pub items: Vec<Record>,
    pub loading: bool,
    pub submitting: bool,
    pub notice: Option<Notice>,
    pub form_open: bool,
    /// 编辑中的记录标识；None 表示创建
    pub editing: Option<String>,
    pub form: FormValues,
    /// 远端下拉选项，按字段名
    pub choices: Vec<(&'static str, Vec<Choice>)>,
    /// 创建提示值，如下一个发票编号
    pub hint: Option<String>,
    pub filter: Option<String>,
    pub query: String,
}

impl ListState {
    /// 按搜索词过滤后的记录 (大小写不敏感，匹配任意可见列)
    pub fn visible_items(&self, schema: &ResourceSchema) -> Vec<Record> {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return self.items.clone();
        }
        let columns = schema.visible_columns(self.filter.as_deref());
        self.items
            .iter()
            .filter(|r| {
                columns
                    .iter()
                    .any(|c| r.display(c.field).to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    pub fn choices_for(&self, field: &str) -> &[Choice] {
        self.choices
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, c)| c.as_slice())
            .unwrap_or(&[])
    }
}

type Observer = Rc<dyn Fn(&ListState)>;

pub struct ListController<T> {
    client: Rc<PortalClient<T>>,
    schema: &'static ResourceSchema,
    identity: Identity,
    state: RefCell<ListState>,
    observers: RefCell<Vec<(SubscriptionId, Observer)>>,
    next_id: RefCell<u64>,
    /// 最近一次发出的列表请求序号
    load_seq: Cell<u64>,
}

impl<T: Transport> ListController<T> {
    pub fn new(client: Rc<PortalClient<T>>, schema: &'static ResourceSchema, identity: Identity) -> Self {
        let state = ListState {
            filter: schema.default_filter().map(str::to_string),
            form: FormValues::empty(schema),
            ..ListState::default()
        };
        Self {
            client,
            schema,
            identity,
            state: RefCell::new(state),
            observers: RefCell::new(Vec::new()),
            next_id: RefCell::new(0),
            load_seq: Cell::new(0),
        }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn snapshot(&self) -> ListState {
        self.state.borrow().clone()
    }

    // =========================================================
    // 订阅
    // =========================================================

    pub fn subscribe(&self, observer: impl Fn(&ListState) + 'static) -> SubscriptionId {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        let id = SubscriptionId::from_raw(*next);
        self.observers.borrow_mut().push((id, Rc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(sid, _)| *sid != id);
        observers.len() != before
    }

    fn update(&self, f: impl FnOnce(&mut ListState)) {
        f(&mut self.state.borrow_mut());
        let snapshot = self.snapshot();
        let observers: Vec<Observer> = self.observers.borrow().iter().map(|(_, o)| o.clone()).collect();
        for observer in observers {
            observer(&snapshot);
        }
    }

    fn filter(&self) -> Option<String> {
        self.state.borrow().filter.clone()
    }

    fn fail(&self, err: &PortalError) {
        log_warn!("[{}] {}", self.schema.name, err);
        let text = err.user_message();
        self.update(|s| s.notice = Some(Notice::error(text)));
    }

    // =========================================================
    // 列表
    // =========================================================

    /// 加载列表
    ///
    /// 每次调用都会发出请求 (筛选切换、提交后的重新加载不能丢)。
    /// 多个加载重叠时只采用最后发出的那一次，更早的响应到达后直接丢弃。
    /// 返回本次结果是否被采用且没有错误。
    pub async fn load(&self) -> bool {
        let seq = self.load_seq.get() + 1;
        self.load_seq.set(seq);
        self.update(|s| s.loading = true);

        let filter = self.filter();
        let ctx = ParamContext::new(Some(&self.identity), filter.as_deref());
        let result = self.client.list(self.schema, &ctx).await;

        if self.load_seq.get() != seq {
            log_info!("[{}] list response #{} superseded", self.schema.name, seq);
            return false;
        }
        let ok = result.error.is_none();
        self.update(|s| {
            s.loading = false;
            s.items = result.items;
            if let Some(msg) = result.error {
                s.notice = Some(Notice::error(msg));
            }
        });
        ok
    }

    /// 加载并返回应标记为已读的角标与 id
    ///
    /// 页面没有角标、加载失败或被更新的加载取代时返回 None，
    /// 已访问集合保持原样。
    pub async fn load_visited(&self) -> Option<(BadgeKind, Vec<String>)> {
        if !self.load().await {
            return None;
        }
        let kind = self.schema.badge?;
        let ids = self
            .state
            .borrow()
            .items
            .iter()
            .filter_map(|r| r.key(self.schema.key_field))
            .collect();
        Some((kind, ids))
    }

    /// 切换筛选标签并重新加载
    pub async fn set_filter(&self, value: &str) {
        let Some(tabs) = self.schema.filter else {
            return;
        };
        if !tabs.tabs.iter().any(|t| t.value == value) || self.filter().as_deref() == Some(value) {
            return;
        }
        self.update(|s| {
            s.filter = Some(value.to_string());
            s.items.clear();
            s.form_open = false;
        });
        self.load().await;
    }

    pub fn set_query(&self, query: &str) {
        let query = query.to_string();
        self.update(|s| s.query = query);
    }

    pub fn dismiss_notice(&self) {
        self.update(|s| s.notice = None);
    }

    /// 页面本地操作 (如打印) 的失败提示
    pub fn show_error(&self, text: &str) {
        let text = text.to_string();
        self.update(|s| s.notice = Some(Notice::error(text)));
    }

    // =========================================================
    // 表单
    // =========================================================

    /// 打开创建表单并预取远端选项与提示值
    pub async fn open_create(&self) {
        if !self.schema.can_create(self.identity.role, self.filter().as_deref()) {
            self.fail(&PortalError::unauthorized(NO_PERMISSION).in_op("open_create"));
            return;
        }
        let form = FormValues::empty(self.schema);
        self.update(|s| {
            s.form = form;
            s.editing = None;
            s.hint = None;
            s.notice = None;
            s.form_open = true;
        });

        self.fetch_choices().await;
        if let Some(hint) = self.schema.create_hint {
            let filter = self.filter();
            let ctx = ParamContext::new(Some(&self.identity), filter.as_deref());
            let value = self.client.create_hint(&hint, &ctx).await;
            self.update(|s| s.hint = Some(value));
        }
    }

    /// 打开编辑表单，以记录当前值预填
    pub async fn open_edit(&self, record: &Record) {
        if !self.schema.can_edit(self.identity.role, self.filter().as_deref()) {
            self.fail(&PortalError::unauthorized(NO_PERMISSION).in_op("open_edit"));
            return;
        }
        let Some(key) = record.key(self.schema.key_field) else {
            self.fail(&PortalError::validation("Record has no identifier").in_op("open_edit"));
            return;
        };
        let form = FormValues::from_record(self.schema, record);
        self.update(|s| {
            s.form = form;
            s.editing = Some(key);
            s.hint = None;
            s.notice = None;
            s.form_open = true;
        });
        self.fetch_choices().await;
    }

    async fn fetch_choices(&self) {
        let filter = self.filter();
        for field in self.schema.fields {
            let FieldKind::RemoteSelect(remote) = field.kind else {
                continue;
            };
            if !field.visible(filter.as_deref(), false) {
                continue;
            }
            let ctx = ParamContext::new(Some(&self.identity), filter.as_deref());
            let choices = self.client.options(&remote, &ctx).await;
            let name = field.name;
            self.update(|s| {
                s.choices.retain(|(n, _)| *n != name);
                s.choices.push((name, choices));
            });
        }
    }

    pub fn close_form(&self) {
        let form = FormValues::empty(self.schema);
        self.update(|s| {
            s.form_open = false;
            s.editing = None;
            s.hint = None;
            s.form = form;
        });
    }

    /// 修改字段；派生输入变化时重新计算派生字段
    pub fn set_field(&self, name: &str, value: &str) {
        let rederive = self.schema.is_derive_input(name);
        if self.schema.field(name).is_some_and(|f| f.kind == FieldKind::Derived) {
            return;
        }
        self.update(|s| {
            s.form.set_text(name, value);
            if rederive {
                s.form.rederive(self.schema);
            }
        });
    }

    /// 选择附件；不符合策略时拒绝并清除
    pub fn set_file(&self, name: &str, file: FileUpload) -> PortalResult<()> {
        let Some(policy) = self.schema.field(name).and_then(|f| f.file_policy()) else {
            return Err(PortalError::validation(format!("{} is not a file field", name)));
        };
        if let Err(e) = check_file(policy, &file.name, file.size) {
            self.update(|s| {
                s.form.clear_file(name);
                s.notice = Some(Notice::error(e.user_message()));
            });
            return Err(e);
        }
        self.update(|s| s.form.set_file(name, file));
        Ok(())
    }

    /// 提交表单
    ///
    /// 校验失败时不发出任何请求；成功后关闭表单并重新加载列表。
    /// 返回是否成功。
    pub async fn submit(&self) -> bool {
        let (form, editing, filter) = {
            let s = self.state.borrow();
            if s.submitting || !s.form_open {
                return false;
            }
            (s.form.clone(), s.editing.clone(), s.filter.clone())
        };

        let permitted = match editing {
            Some(_) => self.schema.can_edit(self.identity.role, filter.as_deref()),
            None => self.schema.can_create(self.identity.role, filter.as_deref()),
        };
        if !permitted {
            self.fail(&PortalError::unauthorized(NO_PERMISSION).in_op("submit"));
            return false;
        }
        if let Err(e) = validate(self.schema, &form) {
            self.fail(&e.in_op("submit"));
            return false;
        }

        self.update(|s| {
            s.submitting = true;
            s.notice = None;
        });

        let ctx = ParamContext::new(Some(&self.identity), filter.as_deref());
        let body = build_payload(self.schema, &form, &ctx, editing.as_deref());
        let result = match editing {
            Some(_) => self.client.update(self.schema, body).await,
            None => self.client.create(self.schema, body).await,
        };

        match result {
            Ok(outcome) => {
                let created_notice = match (&editing, self.schema.created_notice, &outcome.body) {
                    (None, Some(notice), Some(serde_json::Value::Object(obj))) => notice(obj),
                    _ => None,
                };
                let text = created_notice
                    .or(outcome.message)
                    .unwrap_or_else(|| SAVED.to_string());
                log_info!("[{}] saved ({})", self.schema.name, if editing.is_some() { "update" } else { "create" });
                let empty = FormValues::empty(self.schema);
                self.update(|s| {
                    s.submitting = false;
                    s.form_open = false;
                    s.editing = None;
                    s.hint = None;
                    s.form = empty;
                    s.notice = Some(Notice::success(text));
                });
                self.load().await;
                true
            }
            Err(e) => {
                self.update(|s| s.submitting = false);
                self.fail(&e);
                false
            }
        }
    }

    // =========================================================
    // 行操作
    // =========================================================

    /// 状态迁移 (如标记发票为已支付)；只携带标识与目标状态
    pub async fn transition(&self, transition: &StatusTransition, record: &Record) -> bool {
        if !transition.applies_to(record, self.schema.status_field, self.identity.role) {
            self.fail(&PortalError::unauthorized(NO_PERMISSION).in_op_with("transition", transition.label));
            return false;
        }
        let filter = self.filter();
        let ctx = ParamContext::new(Some(&self.identity), filter.as_deref());
        match self.client.transition(transition, record, &ctx).await {
            Ok(outcome) => {
                let text = outcome.message.unwrap_or_else(|| UPDATED.to_string());
                self.update(|s| s.notice = Some(Notice::success(text)));
                self.load().await;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// 上报任务进度；已完成的任务锁定
    pub async fn update_progress(&self, record: &Record, value: u8) -> bool {
        let Some(action) = self.schema.progress else {
            return false;
        };
        if !action.roles.contains(&self.identity.role) {
            self.fail(&PortalError::unauthorized(NO_PERMISSION).in_op("update_progress"));
            return false;
        }
        if action.locked(record, self.schema.status_field) {
            self.fail(&PortalError::validation("Task is already completed").in_op("update_progress"));
            return false;
        }
        match self.client.progress(self.schema, &action, record, value).await {
            Ok(_) => {
                self.load().await;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// 删除记录；`confirm` 拒绝时不发出请求
    pub async fn delete(&self, record: &Record, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !self.schema.can_delete(self.identity.role, self.filter().as_deref()) {
            self.fail(&PortalError::unauthorized(NO_PERMISSION).in_op("delete"));
            return false;
        }
        if !confirm(self.schema.delete_prompt) {
            return false;
        }
        match self.client.delete(self.schema, record).await {
            Ok(outcome) => {
                let text = outcome.message.unwrap_or_else(|| DELETED.to_string());
                self.update(|s| s.notice = Some(Notice::success(text)));
                self.load().await;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }
}
