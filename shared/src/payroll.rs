//! 工资单派生字段与打印版式
//!
//! `net_salary = basic_salary + allowances − deductions`，
//! 任一输入变化时重新计算，从不单独录入。

use chrono::{Datelike, NaiveDate};

use crate::form::FormValues;
use crate::record::Record;

pub const BASIC_SALARY: &str = "basic_salary";
pub const ALLOWANCES: &str = "allowances";
pub const DEDUCTIONS: &str = "deductions";
pub const NET_SALARY: &str = "net_salary";

pub const COMPANY_NAME: &str = "Sri Sai Groups";
pub const PORTAL_NAME: &str = "Employer & Employee Portal";
pub const PRINT_BLOCKED: &str = "Allow pop-ups for this site to print the payslip";

/// 空串或无法解析的输入按 0 计
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn net_salary(basic: f64, allowances: f64, deductions: f64) -> f64 {
    basic + allowances - deductions
}

pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// 派生钩子：在表单值上重新计算净工资
pub fn derive_net_salary(values: &mut FormValues) {
    let net = net_salary(
        parse_amount(values.text(BASIC_SALARY)),
        parse_amount(values.text(ALLOWANCES)),
        parse_amount(values.text(DEDUCTIONS)),
    );
    values.set_text(NET_SALARY, format_amount(net));
}

// =========================================================
// 打印
// =========================================================

/// 印度记数法：末三位一组，其余两位一组，最多两位小数
pub fn format_inr(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let text = format!("{:.2}", value.abs());
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let grouped = if int.len() <= 3 {
        int.to_string()
    } else {
        let (mut head, tail) = int.split_at(int.len() - 3);
        let mut parts = Vec::new();
        while head.len() > 2 {
            let (rest, pair) = head.split_at(head.len() - 2);
            parts.push(pair);
            head = rest;
        }
        parts.push(head);
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    let sign = if value < 0.0 && text != "0.00" { "-" } else { "" };
    match frac.trim_end_matches('0') {
        "" => format!("{}{}", sign, grouped),
        frac => format!("{}{}.{}", sign, grouped, frac),
    }
}

/// `2025-01-31 10:20:00` → `31/1/2025`；无法解析时原样返回
fn format_generated(raw: &str) -> String {
    let raw = raw.trim();
    let date = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => format!("{}/{}/{}", d.day(), d.month(), d.year()),
        Err(_) => raw.to_string(),
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PRINT_STYLE: &str = "body{font-family:Arial,sans-serif;padding:40px;max-width:800px;margin:0 auto}\
.header{text-align:center;margin-bottom:30px;border-bottom:2px solid #333;padding-bottom:20px}\
.header h1{margin:0;color:#ea580c}.header p{margin:5px 0;color:#666}\
.info-row{display:flex;justify-content:space-between;margin:10px 0;padding:10px;background:#f9f9f9}\
.info-label{font-weight:bold;color:#555}\
.salary-table{width:100%;border-collapse:collapse;margin:20px 0}\
.salary-table th,.salary-table td{border:1px solid #ddd;padding:12px;text-align:left}\
.salary-table th{background:#ea580c;color:white}\
.salary-table .total-row{background:#fef3c7;font-weight:bold}\
.text-right{text-align:right}\
@media print{body{padding:20px}}";

/// 可打印的工资单
#[derive(Debug, Clone, PartialEq)]
pub struct PayslipSheet {
    pub employee_id: String,
    pub employee_name: String,
    pub month_year: String,
    pub generated_on: String,
    pub basic: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub net: f64,
}

impl PayslipSheet {
    pub fn from_record(record: &Record) -> Self {
        let amount = |field: &str| record.number(field).filter(|v| v.is_finite());
        let basic = amount(BASIC_SALARY).unwrap_or(0.0);
        let allowances = amount(ALLOWANCES).unwrap_or(0.0);
        let deductions = amount(DEDUCTIONS).unwrap_or(0.0);
        let employee_name = match record.display("employee_name") {
            n if n.is_empty() => record.display("employer_name"),
            n => n,
        };
        Self {
            employee_id: record.display("employee_id"),
            employee_name,
            month_year: record.display("month_year"),
            generated_on: format_generated(&record.display("generated_at")),
            basic,
            allowances,
            deductions,
            // 旧记录可能没有存净工资
            net: amount(NET_SALARY).unwrap_or_else(|| net_salary(basic, allowances, deductions)),
        }
    }

    pub fn title(&self) -> String {
        match self.employee_name.trim() {
            "" => format!("Payslip - {}", self.month_year),
            name => format!("Payslip - {}", name),
        }
    }

    /// 金额表的行：(说明, 金额文本)
    pub fn rows(&self) -> [(&'static str, String); 4] {
        [
            ("Basic Salary", format_inr(self.basic)),
            ("Allowances", format_inr(self.allowances)),
            ("Deductions", format!("-{}", format_inr(self.deductions))),
            ("Net Salary", format!("₹ {}", format_inr(self.net))),
        ]
    }

    /// `<html>` 元素的内容 (head + body)
    pub fn to_html(&self) -> String {
        let or_dash = |v: &str| if v.trim().is_empty() { "-".to_string() } else { escape(v) };
        let rows: String = self
            .rows()
            .iter()
            .map(|(label, amount)| {
                let class = if *label == "Net Salary" { " class=\"total-row\"" } else { "" };
                format!(
                    "<tr{}><td>{}</td><td class=\"text-right\">{}</td></tr>",
                    class, label, amount
                )
            })
            .collect();

        format!(
            "<head><meta charset=\"utf-8\"><title>{title}</title><style>{style}</style></head>\
<body>\
<div class=\"header\"><h1>{company}</h1><p>{portal}</p><p>Payslip for {month}</p></div>\
<div class=\"info-row\"><div><span class=\"info-label\">Employee ID:</span> {id}</div>\
<div><span class=\"info-label\">Employee Name:</span> {name}</div></div>\
<div class=\"info-row\"><div><span class=\"info-label\">Month/Year:</span> {month}</div>\
<div><span class=\"info-label\">Generated:</span> {generated}</div></div>\
<table class=\"salary-table\"><thead><tr><th>Description</th><th class=\"text-right\">Amount (₹)</th></tr></thead>\
<tbody>{rows}</tbody></table>\
</body>",
            title = escape(&self.title()),
            style = PRINT_STYLE,
            company = COMPANY_NAME,
            portal = escape(PORTAL_NAME),
            month = or_dash(&self.month_year),
            id = or_dash(&self.employee_id),
            name = or_dash(&self.employee_name),
            generated = or_dash(&self.generated_on),
            rows = rows,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn net_is_basic_plus_allowances_minus_deductions() {
        for (b, a, d) in [(0.0, 0.0, 0.0), (25000.0, 3000.0, 1800.0), (1.5, 0.25, 0.75)] {
            assert_eq!(net_salary(b, a, d), b + a - d);
        }
    }

    #[test]
    fn empty_inputs_count_as_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("  "), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("1200.50"), 1200.5);
    }

    #[test]
    fn recomputes_on_every_input_change() {
        let mut values = FormValues::default();
        values.set_text(BASIC_SALARY, "20000");
        derive_net_salary(&mut values);
        assert_eq!(values.text(NET_SALARY), "20000.00");

        values.set_text(ALLOWANCES, "2500");
        derive_net_salary(&mut values);
        assert_eq!(values.text(NET_SALARY), "22500.00");

        values.set_text(DEDUCTIONS, "1200.5");
        derive_net_salary(&mut values);
        assert_eq!(values.text(NET_SALARY), "21299.50");

        values.set_text(ALLOWANCES, "");
        derive_net_salary(&mut values);
        assert_eq!(values.text(NET_SALARY), "18799.50");

        values.set_text(BASIC_SALARY, "0");
        derive_net_salary(&mut values);
        assert_eq!(values.text(NET_SALARY), "-1200.50");
    }

    #[test]
    fn inr_grouping() {
        assert_eq!(format_inr(0.0), "0");
        assert_eq!(format_inr(999.0), "999");
        assert_eq!(format_inr(1000.0), "1,000");
        assert_eq!(format_inr(123456.5), "1,23,456.5");
        assert_eq!(format_inr(12345678.25), "1,23,45,678.25");
        assert_eq!(format_inr(-2500.0), "-2,500");
        assert_eq!(format_inr(f64::NAN), "0");
    }

    #[test]
    fn sheet_reads_record_and_formats_rows() {
        let record = Record::from_value(json!({
            "employee_id": 12,
            "employee_name": "Arun",
            "month_year": "2025-01",
            "generated_at": "2025-01-31 10:20:00",
            "basic_salary": "25000",
            "allowances": 3000,
            "deductions": "1800.50"
        }))
        .unwrap();
        let sheet = PayslipSheet::from_record(&record);
        assert_eq!(sheet.generated_on, "31/1/2025");
        assert_eq!(sheet.net, 26199.5);
        assert_eq!(sheet.title(), "Payslip - Arun");

        let rows = sheet.rows();
        assert_eq!(rows[0], ("Basic Salary", "25,000".to_string()));
        assert_eq!(rows[2], ("Deductions", "-1,800.5".to_string()));
        assert_eq!(rows[3], ("Net Salary", "₹ 26,199.5".to_string()));
    }

    #[test]
    fn html_escapes_names_and_marks_total_row() {
        let record = Record::from_value(json!({
            "employee_name": "<b>Devi</b>",
            "month_year": "2025-02",
            "net_salary": 1000,
            "generated_at": "yesterday"
        }))
        .unwrap();
        let html = PayslipSheet::from_record(&record).to_html();
        assert!(html.contains("&lt;b&gt;Devi&lt;/b&gt;"));
        assert!(!html.contains("<b>Devi"));
        assert!(html.contains("Payslip for 2025-02"));
        assert!(html.contains("yesterday"));
        assert!(html.contains("<tr class=\"total-row\"><td>Net Salary</td><td class=\"text-right\">₹ 1,000</td></tr>"));
        assert!(html.contains("Employee ID:</span> -"));
    }
}
