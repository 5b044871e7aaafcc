//! 仪表盘汇总

use crate::record::{Record, RecordStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub task_count: usize,
    /// 全部任务进度的平均值 (四舍五入)
    pub average_progress: u8,
    pub invoices_paid: usize,
    /// 未标记为已支付的发票
    pub invoices_pending: usize,
}

impl DashboardSummary {
    pub fn from_records(tasks: &[Record], invoices: &[Record]) -> Self {
        let total: f64 = tasks
            .iter()
            .map(|t| t.number("progress_percent").unwrap_or(0.0).clamp(0.0, 100.0))
            .sum();
        let average = total / tasks.len().max(1) as f64;

        let invoices_paid = invoices
            .iter()
            .filter(|i| i.status("status") == Some(RecordStatus::Paid))
            .count();

        Self {
            task_count: tasks.len(),
            average_progress: average.round() as u8,
            invoices_paid,
            invoices_pending: invoices.len() - invoices_paid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<Record> {
        let serde_json::Value::Array(items) = value else {
            panic!("expected array")
        };
        items.into_iter().filter_map(Record::from_value).collect()
    }

    #[test]
    fn averages_progress_and_counts_invoices() {
        let tasks = records(json!([
            {"id": 1, "progress_percent": 40},
            {"id": 2, "progress_percent": "85"},
            {"id": 3}
        ]));
        let invoices = records(json!([
            {"id": "INV001", "status": "paid"},
            {"id": "INV002", "status": "pending"},
            {"id": "INV003"}
        ]));
        let summary = DashboardSummary::from_records(&tasks, &invoices);
        assert_eq!(summary.task_count, 3);
        assert_eq!(summary.average_progress, 42);
        assert_eq!(summary.invoices_paid, 1);
        assert_eq!(summary.invoices_pending, 2);
    }

    #[test]
    fn empty_lists_give_zeroes() {
        assert_eq!(DashboardSummary::from_records(&[], &[]), DashboardSummary::default());
    }
}
