//! 表单状态、客户端校验与载荷构造

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value, json};

use crate::error::{PortalError, PortalResult};
use crate::record::Record;
use crate::schema::{FieldKind, FileEncoding, FilePolicy, ParamContext, ResourceSchema, ValidationRule};

/// 已读取为 data URL 的附件
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub name: String,
    pub size: u64,
    /// `data:<mime>;base64,<payload>`，原样提交
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormValues {
    texts: BTreeMap<String, String>,
    files: BTreeMap<String, FileUpload>,
}

impl FormValues {
    /// 创建表单：全部为空，随后应用派生钩子
    pub fn empty(schema: &ResourceSchema) -> Self {
        let mut values = Self::default();
        for field in schema.fields {
            if let FieldKind::Select(options) = field.kind {
                // 下拉框默认选中第一项
                if let Some(first) = options.first() {
                    values.set_text(field.name, first.value);
                }
            }
        }
        values.rederive(schema);
        values
    }

    /// 编辑表单：以记录当前值预填
    pub fn from_record(schema: &ResourceSchema, record: &Record) -> Self {
        let mut values = Self::empty(schema);
        for field in schema.fields {
            if matches!(field.kind, FieldKind::File(_) | FieldKind::Password) {
                continue;
            }
            if record.get(field.name).is_some() {
                values.set_text(field.name, record.display(field.name));
            }
        }
        values.rederive(schema);
        values
    }

    pub fn text(&self, name: &str) -> &str {
        self.texts.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.texts.insert(name.to_string(), value.into());
    }

    pub fn file(&self, name: &str) -> Option<&FileUpload> {
        self.files.get(name)
    }

    pub fn set_file(&mut self, name: &str, file: FileUpload) {
        self.files.insert(name.to_string(), file);
    }

    pub fn clear_file(&mut self, name: &str) {
        self.files.remove(name);
    }

    pub fn is_blank(&self, name: &str) -> bool {
        self.text(name).trim().is_empty() && !self.files.contains_key(name)
    }

    pub fn rederive(&mut self, schema: &ResourceSchema) {
        if let Some(derive) = schema.derive {
            derive(self);
        }
    }
}

// =========================================================
// 校验
// =========================================================

/// 提交前校验；失败时不得发出任何请求
pub fn validate(schema: &ResourceSchema, values: &FormValues) -> PortalResult<()> {
    for rule in schema.rules {
        match *rule {
            ValidationRule::Required { fields, message } => {
                if fields.iter().any(|f| values.is_blank(f)) {
                    return Err(PortalError::validation(message));
                }
            }
            ValidationRule::RequiredUnless {
                field,
                other,
                equals,
                message,
            } => {
                if values.text(other) != equals && values.is_blank(field) {
                    return Err(PortalError::validation(message));
                }
            }
        }
    }
    Ok(())
}

fn human_size(bytes: u64) -> String {
    format!("{} MB", bytes / crate::schema::MB)
}

/// 附件策略：大小上限与扩展名白名单
pub fn check_file(policy: &FilePolicy, name: &str, size: u64) -> PortalResult<()> {
    if size > policy.max_bytes {
        return Err(PortalError::validation(format!(
            "File must be under {}",
            human_size(policy.max_bytes)
        )));
    }
    if !policy.allowed_ext.is_empty() {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !policy.allowed_ext.contains(&ext.as_str()) {
            let allowed: Vec<String> = policy
                .allowed_ext
                .iter()
                .map(|e| e.to_ascii_uppercase())
                .collect();
            return Err(PortalError::validation(format!(
                "Invalid file type. Allowed: {}",
                allowed.join(", ")
            )));
        }
    }
    Ok(())
}

// =========================================================
// 载荷
// =========================================================

fn number_or_text(raw: &str) -> Value {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(trimmed.to_string()))
}

/// 构造创建/更新载荷
///
/// `editing_key` 为 Some 时表示更新，按 `update_key` 写入记录标识。
pub fn build_payload(
    schema: &ResourceSchema,
    values: &FormValues,
    ctx: &ParamContext<'_>,
    editing_key: Option<&str>,
) -> Map<String, Value> {
    let mut body = Map::new();
    let editing = editing_key.is_some();

    for field in schema.fields {
        if !field.visible(ctx.filter, editing) {
            continue;
        }
        match &field.kind {
            FieldKind::File(policy) => {
                let Some(file) = values.file(field.name) else {
                    continue;
                };
                match policy.encoding {
                    FileEncoding::Flat => {
                        body.insert("file_name".into(), json!(file.name));
                        body.insert("file_base64".into(), json!(file.data_url));
                    }
                    FileEncoding::Nested => {
                        body.insert(
                            field.name.into(),
                            json!({ "name": file.name, "base64": file.data_url }),
                        );
                    }
                    FileEncoding::Grouped { title_field } => {
                        body.insert("titles".into(), json!([values.text(title_field)]));
                        body.insert(
                            "files".into(),
                            json!([{ "name": file.name, "base64": file.data_url }]),
                        );
                    }
                }
            }
            FieldKind::Number | FieldKind::Derived => {
                body.insert(field.name.into(), number_or_text(values.text(field.name)));
            }
            _ => {
                body.insert(field.name.into(), json!(values.text(field.name)));
            }
        }
    }

    ctx.insert_into(schema.inject, &mut body);

    if let Some(key) = editing_key {
        body.insert(schema.update_key.into(), json!(key));
    }

    if let Some(shape) = schema.shape_payload {
        shape(&mut body);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, Role};
    use crate::schema::{FieldSpec, MB, ParamSource, SelectOption, opt, param};

    const METHODS: &[SelectOption] = &[opt("Cash", "Cash"), opt("UPI", "UPI")];

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::new("title", "Title", FieldKind::Text),
        FieldSpec::new("amount", "Amount", FieldKind::Number),
        FieldSpec::new("method", "Method", FieldKind::Select(METHODS)),
        FieldSpec::new("txn", "Transaction", FieldKind::Text),
        FieldSpec::new(
            "upload_file",
            "Attachment",
            FieldKind::File(FilePolicy {
                max_bytes: 5 * MB,
                allowed_ext: &[],
                encoding: FileEncoding::Flat,
            }),
        ),
    ];

    const SCHEMA: ResourceSchema = ResourceSchema {
        fields: FIELDS,
        rules: &[
            ValidationRule::Required {
                fields: &["title", "amount"],
                message: "Title and amount required",
            },
            ValidationRule::RequiredUnless {
                field: "txn",
                other: "method",
                equals: "Cash",
                message: "Transaction ID required",
            },
        ],
        inject: &[param("employer_id", ParamSource::IdentityId)],
        ..ResourceSchema::BASE
    };

    fn pdf(size: u64) -> FileUpload {
        FileUpload {
            name: "brief.pdf".into(),
            size,
            data_url: "data:application/pdf;base64,JVBERi0=".into(),
        }
    }

    #[test]
    fn empty_form_selects_first_option() {
        let values = FormValues::empty(&SCHEMA);
        assert_eq!(values.text("method"), "Cash");
        assert_eq!(values.text("title"), "");
    }

    #[test]
    fn required_rules_block_blank_fields() {
        let mut values = FormValues::empty(&SCHEMA);
        values.set_text("title", "   ");
        values.set_text("amount", "10");
        let err = validate(&SCHEMA, &values).unwrap_err();
        assert_eq!(err.user_message(), "Title and amount required");

        values.set_text("title", "Audit");
        assert!(validate(&SCHEMA, &values).is_ok());
    }

    #[test]
    fn transaction_required_unless_cash() {
        let mut values = FormValues::empty(&SCHEMA);
        values.set_text("title", "Rent");
        values.set_text("amount", "500");
        values.set_text("method", "UPI");
        assert_eq!(
            validate(&SCHEMA, &values).unwrap_err().message(),
            "Transaction ID required"
        );
        values.set_text("method", "Cash");
        assert!(validate(&SCHEMA, &values).is_ok());
    }

    #[test]
    fn file_policy_limits() {
        let policy = FilePolicy {
            max_bytes: 10 * MB,
            allowed_ext: &["pdf", "png"],
            encoding: FileEncoding::Nested,
        };
        assert!(check_file(&policy, "a.PDF", 1024).is_ok());
        assert_eq!(
            check_file(&policy, "a.pdf", 11 * MB).unwrap_err().message(),
            "File must be under 10 MB"
        );
        assert_eq!(
            check_file(&policy, "a.exe", 10).unwrap_err().message(),
            "Invalid file type. Allowed: PDF, PNG"
        );
    }

    #[test]
    fn payload_for_create_and_update() {
        let identity = Identity::new(4, "Ravi", Role::Employer);
        let ctx = ParamContext::new(Some(&identity), None);
        let mut values = FormValues::empty(&SCHEMA);
        values.set_text("title", "Rent");
        values.set_text("amount", "1500.5");
        values.set_file("upload_file", pdf(100));

        let created = build_payload(&SCHEMA, &values, &ctx, None);
        assert_eq!(created["title"], "Rent");
        assert_eq!(created["amount"], json!(1500.5));
        assert_eq!(created["employer_id"], json!(4));
        assert_eq!(created["file_name"], "brief.pdf");
        assert!(created["file_base64"].as_str().unwrap().starts_with("data:"));
        assert!(!created.contains_key("id"));

        let updated = build_payload(&SCHEMA, &values, &ctx, Some("12"));
        assert_eq!(updated["id"], "12");
    }

    #[test]
    fn edit_prefill_copies_record_values() {
        let record = Record::from_value(json!({"id": 3, "title": "Old", "amount": 20, "method": "UPI"}))
            .unwrap();
        let values = FormValues::from_record(&SCHEMA, &record);
        assert_eq!(values.text("title"), "Old");
        assert_eq!(values.text("amount"), "20");
        assert_eq!(values.text("method"), "UPI");
        assert!(values.file("upload_file").is_none());
    }
}
