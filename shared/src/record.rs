//! Managed Record
//!
//! 后端拥有的任意实体 (任务、发票、付款、工资单……) 的统一表示。
//! 字段因实体而异，因此保留原始 JSON 对象，只提供类型化的读取方法。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// 非对象的值无法作为记录
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// 标识键，数字与字符串统一为字符串
    pub fn key(&self, key_field: &str) -> Option<String> {
        match self.0.get(key_field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// 表格展示用的文本；null 与缺失显示为空
    pub fn display(&self, field: &str) -> String {
        match self.0.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.0.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn status(&self, field: &str) -> Option<RecordStatus> {
        match self.0.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(RecordStatus::parse(s)),
            _ => None,
        }
    }

    /// 附件的相对路径 (若有)
    pub fn file_path(&self, field: &str) -> Option<&str> {
        match self.0.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// 文件分组下的子文件列表
    pub fn children(&self, field: &str) -> Vec<Record> {
        match self.0.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .cloned()
                .filter_map(Record::from_value)
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// 记录状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Pending,
    Paid,
    Completed,
    Processing,
    InProgress,
    Rejected,
    Failed,
    Other(String),
}

impl RecordStatus {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "pending" => Self::Pending,
            "paid" => Self::Paid,
            "completed" => Self::Completed,
            "processing" => Self::Processing,
            "in_progress" => Self::InProgress,
            "rejected" => Self::Rejected,
            "failed" => Self::Failed,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::Processing => "processing",
            Self::InProgress => "in_progress",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }

    /// 状态徽章的样式类
    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "badge-warning",
            Self::Paid | Self::Completed => "badge-success",
            Self::Processing | Self::InProgress => "badge-info",
            Self::Rejected | Self::Failed => "badge-error",
            Self::Other(_) => "badge-ghost",
        }
    }

    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// 终态：不再允许状态迁移
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Paid | Self::Completed | Self::Rejected | Self::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn key_accepts_numbers_and_strings() {
        assert_eq!(record(json!({"id": 5})).key("id").as_deref(), Some("5"));
        assert_eq!(
            record(json!({"invoice_no": "INV-9"})).key("invoice_no").as_deref(),
            Some("INV-9")
        );
        assert_eq!(record(json!({"id": null})).key("id"), None);
    }

    #[test]
    fn status_badge_styles() {
        let paid = record(json!({"status": "Paid"})).status("status").unwrap();
        assert_eq!(paid, RecordStatus::Paid);
        assert_eq!(paid.badge_class(), "badge-success");
        assert_eq!(RecordStatus::parse("pending").badge_class(), "badge-warning");
        assert_eq!(RecordStatus::parse("in progress"), RecordStatus::InProgress);
        assert_eq!(RecordStatus::InProgress.label(), "in progress");
        assert_eq!(RecordStatus::parse("archived").badge_class(), "badge-ghost");
    }

    #[test]
    fn display_renders_missing_as_blank() {
        let r = record(json!({"amount": 1200.5, "note": null}));
        assert_eq!(r.display("amount"), "1200.5");
        assert_eq!(r.display("note"), "");
        assert_eq!(r.display("absent"), "");
        assert_eq!(r.number("amount"), Some(1200.5));
    }

    #[test]
    fn children_of_file_group() {
        let r = record(json!({
            "group_id": 3,
            "files": [{"title": "PF", "file_path": "uploads/pf.pdf"}, "junk"]
        }));
        let files = r.children("files");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_path("file_path"), Some("uploads/pf.pdf"));
    }
}
