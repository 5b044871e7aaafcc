//! List-Form-Submit 的参数化描述
//!
//! 每个管理页面都是同一个交互形状的一次实例化，差异全部收敛到 `ResourceSchema`：
//! 接口路径、字段、列、校验规则、状态迁移、派生字段与载荷整形钩子。

use serde_json::{Map, Value};

use crate::form::FormValues;
use crate::identity::{Identity, Realm, Role};
use crate::nav::BadgeKind;
use crate::record::Record;

// =========================================================
// 参数来源
// =========================================================

/// 请求参数的取值来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// 当前身份的 id
    IdentityId,
    /// 当前身份的角色名
    IdentityRole,
    Static(&'static str),
    /// 当前选中的筛选标签
    Filter,
    /// 目标记录上的字段
    RecordField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub source: ParamSource,
}

pub const fn param(name: &'static str, source: ParamSource) -> Param {
    Param { name, source }
}

/// 解析参数时可用的上下文
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamContext<'a> {
    pub identity: Option<&'a Identity>,
    pub filter: Option<&'a str>,
    pub record: Option<&'a Record>,
}

impl<'a> ParamContext<'a> {
    pub fn new(identity: Option<&'a Identity>, filter: Option<&'a str>) -> Self {
        Self {
            identity,
            filter,
            record: None,
        }
    }

    pub fn with_record(mut self, record: &'a Record) -> Self {
        self.record = Some(record);
        self
    }

    /// 解析为 JSON 值；来源缺失时返回 None (参数被省略)
    pub fn value(&self, source: ParamSource) -> Option<Value> {
        match source {
            ParamSource::IdentityId => self.identity.map(|i| Value::from(i.id)),
            ParamSource::IdentityRole => self
                .identity
                .map(|i| Value::String(i.role.as_str().to_string())),
            ParamSource::Static(v) => Some(Value::String(v.to_string())),
            ParamSource::Filter => self.filter.map(|f| Value::String(f.to_string())),
            ParamSource::RecordField(field) => self.record.and_then(|r| r.get(field).cloned()),
        }
    }

    /// 解析为查询串文本
    pub fn text(&self, source: ParamSource) -> Option<String> {
        match self.value(source)? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn query_pairs(&self, params: &[Param]) -> Vec<(String, String)> {
        params
            .iter()
            .filter_map(|p| self.text(p.source).map(|v| (p.name.to_string(), v)))
            .collect()
    }

    pub fn insert_into(&self, params: &[Param], body: &mut Map<String, Value>) {
        for p in params {
            if let Some(v) = self.value(p.source) {
                body.insert(p.name.to_string(), v);
            }
        }
    }
}

// =========================================================
// 字段
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub const fn opt(value: &'static str, label: &'static str) -> SelectOption {
    SelectOption { value, label }
}

/// 选项来自远端列表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteOptions {
    pub endpoint: &'static str,
    pub query: &'static [Param],
    pub value_field: &'static str,
    pub label_field: &'static str,
    /// 附在标签后的括号说明，如邮箱
    pub detail_field: Option<&'static str>,
}

/// 附件在载荷中的编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    /// `file_name` + `file_base64` 平铺在载荷顶层
    Flat,
    /// `<field>: {name, base64}`
    Nested,
    /// `titles: [..]` + `files: [{name, base64}]`，标题取自另一字段
    Grouped { title_field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePolicy {
    pub max_bytes: u64,
    /// 空表示不限制扩展名
    pub allowed_ext: &'static [&'static str],
    pub encoding: FileEncoding,
}

pub const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    TextArea,
    Number,
    Date,
    Month,
    Select(&'static [SelectOption]),
    RemoteSelect(RemoteOptions),
    File(FilePolicy),
    /// 只读，由派生钩子计算
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// 只在该筛选标签下出现 (并提交)
    pub only_on_filter: Option<&'static str>,
    /// 仅创建时出现，编辑时隐藏
    pub create_only: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            only_on_filter: None,
            create_only: false,
        }
    }

    pub const fn on_filter(mut self, filter: &'static str) -> Self {
        self.only_on_filter = Some(filter);
        self
    }

    pub const fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    pub fn visible(&self, filter: Option<&str>, editing: bool) -> bool {
        if editing && self.create_only {
            return false;
        }
        match self.only_on_filter {
            Some(f) => filter == Some(f),
            None => true,
        }
    }

    pub fn file_policy(&self) -> Option<&FilePolicy> {
        match &self.kind {
            FieldKind::File(p) => Some(p),
            _ => None,
        }
    }
}

// =========================================================
// 列
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// 带前缀的编号，如 `T-12`
    Prefixed(&'static str),
    /// 状态徽章；字段为空时使用默认状态
    Status { default: Option<&'static str> },
    Money,
    Date,
    Progress,
    /// 单个附件 (相对路径)
    File,
    /// 文件分组下的多个附件
    FileGroup {
        files_field: &'static str,
        path_field: &'static str,
        name_field: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub title: &'static str,
    pub kind: ColumnKind,
    pub only_on_filter: Option<&'static str>,
}

impl ColumnSpec {
    pub const fn new(field: &'static str, title: &'static str, kind: ColumnKind) -> Self {
        Self {
            field,
            title,
            kind,
            only_on_filter: None,
        }
    }

    pub const fn text(field: &'static str, title: &'static str) -> Self {
        Self::new(field, title, ColumnKind::Text)
    }

    pub const fn on_filter(mut self, filter: &'static str) -> Self {
        self.only_on_filter = Some(filter);
        self
    }

    pub fn visible(&self, filter: Option<&str>) -> bool {
        match self.only_on_filter {
            Some(f) => filter == Some(f),
            None => true,
        }
    }
}

// =========================================================
// 校验与动作
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// 所有字段均非空
    Required {
        fields: &'static [&'static str],
        message: &'static str,
    },
    /// 除非 `other == equals`，否则 `field` 必填
    RequiredUnless {
        field: &'static str,
        other: &'static str,
        equals: &'static str,
        message: &'static str,
    },
}

/// 单一用途的状态迁移：只携带记录标识与目标状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub label: &'static str,
    pub endpoint: &'static str,
    pub params: &'static [Param],
    pub target: &'static str,
    /// 记录处于这些状态之一时才可用 (大小写不敏感)
    pub from: &'static [&'static str],
    pub roles: &'static [Role],
}

impl StatusTransition {
    pub fn applies_to(&self, record: &Record, status_field: &str, role: Role) -> bool {
        if !self.roles.contains(&role) {
            return false;
        }
        let current = record.status(status_field);
        self.from.iter().any(|from| match &current {
            Some(s) => s.as_str().eq_ignore_ascii_case(from),
            None => *from == "pending",
        })
    }
}

/// 进度上报 (任务)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressAction {
    pub endpoint: &'static str,
    pub key_param: &'static str,
    pub value_param: &'static str,
    /// 记录中进度所在字段
    pub field: &'static str,
    pub roles: &'static [Role],
    /// 处于该状态后锁定
    pub locked_status: &'static str,
}

impl ProgressAction {
    pub fn locked(&self, record: &Record, status_field: &str) -> bool {
        record
            .status(status_field)
            .is_some_and(|s| s.as_str().eq_ignore_ascii_case(self.locked_status))
    }

    pub fn current(&self, record: &Record) -> u8 {
        record.number(self.field).unwrap_or(0.0).clamp(0.0, 100.0) as u8
    }
}

/// 创建表单打开时展示的提示值，如下一个发票编号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateHint {
    pub label: &'static str,
    pub endpoint: &'static str,
    pub query: &'static [Param],
    pub field: &'static str,
    pub fallback: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterTabs {
    pub param: &'static str,
    /// 第一项为默认
    pub tabs: &'static [SelectOption],
}

impl FilterTabs {
    pub fn default_value(&self) -> Option<&'static str> {
        self.tabs.first().map(|t| t.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Endpoints {
    pub list: &'static str,
    pub create: Option<&'static str>,
    pub update: Option<&'static str>,
    pub delete: Option<&'static str>,
}

// =========================================================
// 资源描述
// =========================================================

#[derive(Clone, Copy)]
pub struct ResourceSchema {
    /// 日志中使用的名字
    pub name: &'static str,
    pub title: &'static str,
    pub realm: Realm,
    pub endpoints: Endpoints,
    pub key_field: &'static str,
    pub status_field: &'static str,
    /// 更新时携带记录标识的参数名
    pub update_key: &'static str,
    /// 删除时携带记录标识的参数名
    pub delete_key: &'static str,
    pub list_query: &'static [Param],
    pub filter: Option<FilterTabs>,
    pub fields: &'static [FieldSpec],
    pub columns: &'static [ColumnSpec],
    pub rules: &'static [ValidationRule],
    /// 创建/更新载荷附加参数
    pub inject: &'static [Param],
    pub transitions: &'static [StatusTransition],
    pub progress: Option<ProgressAction>,
    pub derive: Option<fn(&mut FormValues)>,
    pub shape_payload: Option<fn(&mut Map<String, Value>)>,
    /// 成功创建后根据响应体生成提示
    pub created_notice: Option<fn(&Map<String, Value>) -> Option<String>>,
    pub create_hint: Option<CreateHint>,
    pub badge: Option<BadgeKind>,
    /// 可以创建/编辑/删除的角色
    pub manage_roles: &'static [Role],
    /// 仅在该筛选标签下允许写操作
    pub mutable_on_filter: Option<&'static str>,
    /// 是否显示客户端搜索框
    pub searchable: bool,
    /// 行操作中是否提供打印 (工资单)
    pub printable: bool,
    pub empty_text: &'static str,
    pub delete_prompt: &'static str,
}

impl ResourceSchema {
    pub const BASE: ResourceSchema = ResourceSchema {
        name: "",
        title: "",
        realm: Realm::User,
        endpoints: Endpoints {
            list: "",
            create: None,
            update: None,
            delete: None,
        },
        key_field: "id",
        status_field: "status",
        update_key: "id",
        delete_key: "id",
        list_query: &[],
        filter: None,
        fields: &[],
        columns: &[],
        rules: &[],
        inject: &[],
        transitions: &[],
        progress: None,
        derive: None,
        shape_payload: None,
        created_notice: None,
        create_hint: None,
        badge: None,
        manage_roles: &[],
        mutable_on_filter: None,
        searchable: false,
        printable: false,
        empty_text: "No records found",
        delete_prompt: "Are you sure you want to delete this record?",
    };

    pub fn can_create(&self, role: Role, filter: Option<&str>) -> bool {
        self.endpoints.create.is_some() && self.may_mutate(role, filter)
    }

    pub fn can_edit(&self, role: Role, filter: Option<&str>) -> bool {
        self.endpoints.update.is_some() && self.may_mutate(role, filter)
    }

    pub fn can_delete(&self, role: Role, filter: Option<&str>) -> bool {
        self.endpoints.delete.is_some() && self.may_mutate(role, filter)
    }

    fn may_mutate(&self, role: Role, filter: Option<&str>) -> bool {
        if !self.manage_roles.contains(&role) {
            return false;
        }
        match self.mutable_on_filter {
            Some(f) => filter == Some(f),
            None => true,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn visible_fields(&self, filter: Option<&str>, editing: bool) -> Vec<&FieldSpec> {
        self.fields
            .iter()
            .filter(|f| f.visible(filter, editing))
            .collect()
    }

    pub fn visible_columns(&self, filter: Option<&str>) -> Vec<&ColumnSpec> {
        self.columns.iter().filter(|c| c.visible(filter)).collect()
    }

    pub fn default_filter(&self) -> Option<&'static str> {
        self.filter.and_then(|f| f.default_value())
    }

    /// 该字段变化是否需要重新派生
    pub fn is_derive_input(&self, name: &str) -> bool {
        self.derive.is_some() && self.field(name).is_some_and(|f| f.kind != FieldKind::Derived)
    }
}

impl std::fmt::Debug for ResourceSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSchema")
            .field("name", &self.name)
            .field("list", &self.endpoints.list)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_resolve_from_identity_filter_and_record() {
        let identity = Identity::new(7, "Meena", Role::Employer);
        let record = Record::from_value(json!({"id": 31, "invoice_no": "INV-3"})).unwrap();
        let ctx = ParamContext::new(Some(&identity), Some("employer")).with_record(&record);

        let params = [
            param("user_id", ParamSource::IdentityId),
            param("role", ParamSource::IdentityRole),
            param("type", ParamSource::Filter),
            param("status", ParamSource::Static("paid")),
            param("invoice_no", ParamSource::RecordField("id")),
            param("missing", ParamSource::RecordField("nope")),
        ];
        assert_eq!(
            ctx.query_pairs(&params),
            vec![
                ("user_id".to_string(), "7".to_string()),
                ("role".to_string(), "employer".to_string()),
                ("type".to_string(), "employer".to_string()),
                ("status".to_string(), "paid".to_string()),
                ("invoice_no".to_string(), "31".to_string()),
            ]
        );

        let mut body = Map::new();
        ctx.insert_into(&params[..1], &mut body);
        assert_eq!(body["user_id"], json!(7));
    }

    #[test]
    fn transition_only_applies_from_listed_states_and_roles() {
        const MARK_PAID: StatusTransition = StatusTransition {
            label: "Mark as Paid",
            endpoint: "invoices/update_status.php",
            params: &[],
            target: "paid",
            from: &["pending"],
            roles: &[Role::Employer],
        };
        let pending = Record::from_value(json!({"status": "Pending"})).unwrap();
        let unset = Record::from_value(json!({"id": 1})).unwrap();
        let paid = Record::from_value(json!({"status": "paid"})).unwrap();
        assert!(MARK_PAID.applies_to(&pending, "status", Role::Employer));
        assert!(MARK_PAID.applies_to(&unset, "status", Role::Employer));
        assert!(!MARK_PAID.applies_to(&paid, "status", Role::Employer));
        assert!(!MARK_PAID.applies_to(&pending, "status", Role::Employee));
    }

    #[test]
    fn mutations_gated_by_role_and_filter() {
        const SCHEMA: ResourceSchema = ResourceSchema {
            endpoints: Endpoints {
                list: "x/list.php",
                create: Some("x/create.php"),
                update: None,
                delete: Some("x/delete.php"),
            },
            manage_roles: &[Role::Admin],
            mutable_on_filter: Some("employer"),
            ..ResourceSchema::BASE
        };
        assert!(SCHEMA.can_create(Role::Admin, Some("employer")));
        assert!(!SCHEMA.can_create(Role::Admin, Some("employee")));
        assert!(!SCHEMA.can_edit(Role::Admin, Some("employer")));
        assert!(!SCHEMA.can_delete(Role::Employer, Some("employer")));
    }
}
