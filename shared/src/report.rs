//! 员工完整报表
//!
//! 管理员选择一名员工后拉取 `reports/employee_full.php`，
//! 得到任务统计、累计工资、EPFO 申请按状态计数以及全部工资单。
//! 后端的数字字段有时是字符串，这里统一宽松解析。

use serde_json::Value;

use crate::client::Choice;
use crate::record::Record;
use crate::schema::{ColumnKind, ColumnSpec};

pub const REPORT_EMPLOYEES: &str = "reports/employees.php";
pub const EMPLOYEE_FULL_REPORT: &str = "reports/employee_full.php";
pub const EMPLOYEE_ID_PARAM: &str = "employee_id";

/// 报表中工资单表格的列
pub const REPORT_PAYSLIP_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::text("month_year", "Month"),
    ColumnSpec::new("basic_salary", "Basic", ColumnKind::Money),
    ColumnSpec::new("allowances", "Allowances", ColumnKind::Money),
    ColumnSpec::new("deductions", "Deductions", ColumnKind::Money),
    ColumnSpec::new("net_salary", "Net Salary", ColumnKind::Money),
    ColumnSpec::new("generated_at", "Generated On", ColumnKind::Date),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskTally {
    pub total: u64,
    pub completed: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpfoTally {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmployeeReport {
    pub tasks: TaskTally,
    /// 累计已发工资
    pub salary: f64,
    pub epfo: Vec<EpfoTally>,
    pub payslips: Vec<Record>,
}

fn count(record: &Record, field: &str) -> Option<u64> {
    record
        .number(field)
        .filter(|n| n.is_finite())
        .map(|n| n.max(0.0).round() as u64)
}

impl EmployeeReport {
    pub fn from_record(record: &Record) -> Self {
        let tasks = match record.get("tasks").cloned().and_then(Record::from_value) {
            Some(t) => {
                let total = count(&t, "total").unwrap_or(0);
                let completed = count(&t, "completed").unwrap_or(0);
                // 缺少剩余数时按 总数 − 已完成 计
                let remaining = count(&t, "remaining").unwrap_or(total.saturating_sub(completed));
                TaskTally {
                    total,
                    completed,
                    remaining,
                }
            }
            None => TaskTally::default(),
        };

        let epfo = record
            .children("epfo")
            .iter()
            .map(|e| EpfoTally {
                status: match e.display("status") {
                    s if s.trim().is_empty() => "unknown".to_string(),
                    s => s,
                },
                count: count(e, "count").unwrap_or(0),
            })
            .collect();

        Self {
            tasks,
            salary: record.number("salary").filter(|n| n.is_finite()).unwrap_or(0.0),
            epfo,
            payslips: record.children("payslips"),
        }
    }

    pub fn epfo_total(&self) -> u64 {
        self.epfo.iter().map(|e| e.count).sum()
    }
}

/// 员工下拉选项："<工号> - <姓名>"
///
/// 管理员接口返回 `id`/`employee_name`，用户接口返回 `employee_id`/`name`，两种都接受。
pub fn report_choice(record: &Record) -> Option<Choice> {
    let value = record.key("id").or_else(|| record.key("employee_id"))?;
    let name = match record.display("employee_name") {
        n if n.is_empty() => record.display("name"),
        n => n,
    };
    let code = record.display("employee_code");
    let label = match (code.is_empty(), name.is_empty()) {
        (false, false) => format!("{} - {}", code, name),
        (true, false) => name,
        (false, true) => code,
        (true, true) => value.clone(),
    };
    Some(Choice { value, label })
}

/// 报表为空对象时后端有时返回 `data: null`
pub fn is_empty_report(value: &Value) -> bool {
    matches!(value, Value::Null) || value.as_object().is_some_and(|m| m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn parses_counts_given_as_strings() {
        let report = EmployeeReport::from_record(&record(json!({
            "tasks": {"total": "7", "completed": 4, "remaining": "3"},
            "salary": "45250.50",
            "epfo": [{"status": "pending", "count": "2"}, {"status": "completed", "count": 1}],
            "payslips": [{"month_year": "2025-01", "net_salary": 22000}]
        })));
        assert_eq!(
            report.tasks,
            TaskTally {
                total: 7,
                completed: 4,
                remaining: 3
            }
        );
        assert_eq!(report.salary, 45250.5);
        assert_eq!(report.epfo_total(), 3);
        assert_eq!(report.epfo[0].status, "pending");
        assert_eq!(report.payslips.len(), 1);
    }

    #[test]
    fn missing_sections_default_to_zero() {
        let report = EmployeeReport::from_record(&record(json!({"tasks": {"total": 5, "completed": 2}})));
        assert_eq!(report.tasks.remaining, 3);
        assert_eq!(report.salary, 0.0);
        assert!(report.epfo.is_empty());
        assert!(report.payslips.is_empty());

        assert_eq!(EmployeeReport::from_record(&Record::default()), EmployeeReport::default());
    }

    #[test]
    fn choice_label_accepts_both_list_shapes() {
        let admin = report_choice(&record(json!({"id": 9, "employee_code": "EMP0009", "employee_name": "Arun"})));
        assert_eq!(
            admin,
            Some(Choice {
                value: "9".into(),
                label: "EMP0009 - Arun".into()
            })
        );

        let user = report_choice(&record(json!({"employee_id": "4", "name": "Devi"}))).unwrap();
        assert_eq!(user.value, "4");
        assert_eq!(user.label, "Devi");

        assert_eq!(report_choice(&record(json!({"name": "no id"}))), None);
    }

    #[test]
    fn null_report_is_empty() {
        assert!(is_empty_report(&Value::Null));
        assert!(is_empty_report(&json!({})));
        assert!(!is_empty_report(&json!({"salary": 0})));
    }
}
