//! 各管理页面的资源描述
//!
//! 接口路径均相对于 API 根地址。

use serde_json::{Map, Value};

use crate::identity::{Realm, Role};
use crate::nav::BadgeKind;
use crate::payroll::derive_net_salary;
use crate::report::REPORT_EMPLOYEES;
use crate::route::AppRoute;
use crate::schema::{
    ColumnKind, ColumnSpec, CreateHint, Endpoints, FieldKind, FieldSpec, FileEncoding, FilePolicy,
    FilterTabs, MB, Param, ParamSource, ProgressAction, RemoteOptions, ResourceSchema,
    SelectOption, StatusTransition, ValidationRule, opt, param,
};

const EMPLOYER: &[Role] = &[Role::Employer];
const EMPLOYEE: &[Role] = &[Role::Employee];
const ADMIN: &[Role] = &[Role::Admin];

const BY_USER: &[Param] = &[
    param("user_id", ParamSource::IdentityId),
    param("role", ParamSource::IdentityRole),
];
const BY_EMPLOYER: &[Param] = &[param("employer_id", ParamSource::IdentityId)];

const ATTACHMENT_5MB: FieldKind = FieldKind::File(FilePolicy {
    max_bytes: 5 * MB,
    allowed_ext: &[],
    encoding: FileEncoding::Flat,
});

const ATTACHMENT_10MB: FieldKind = FieldKind::File(FilePolicy {
    max_bytes: 10 * MB,
    allowed_ext: &[],
    encoding: FileEncoding::Flat,
});

const STATUS: ColumnSpec = ColumnSpec::new("status", "Status", ColumnKind::Status { default: None });

// =========================================================
// 通知
// =========================================================

pub static USER_NOTIFICATIONS: ResourceSchema = ResourceSchema {
    name: "notifications",
    title: "Notifications",
    endpoints: Endpoints {
        list: "notifications/user_notifications.php",
        create: None,
        update: None,
        delete: None,
    },
    list_query: &[param("user_type", ParamSource::IdentityRole)],
    columns: &[
        ColumnSpec::text("title", "Title"),
        ColumnSpec::text("message", "Message"),
        ColumnSpec::new("file_path", "Attachment", ColumnKind::File),
        ColumnSpec::new("created_at", "Date", ColumnKind::Date),
    ],
    badge: Some(BadgeKind::Notifications),
    empty_text: "No notifications yet",
    ..ResourceSchema::BASE
};

const AUDIENCES: &[SelectOption] = &[opt("employee", "All Employees"), opt("employer", "All Employers")];

const NOTIFICATION_FILE: FieldKind = FieldKind::File(FilePolicy {
    max_bytes: 10 * MB,
    allowed_ext: &["pdf", "doc", "docx", "jpg", "jpeg", "png", "xls", "xlsx"],
    encoding: FileEncoding::Nested,
});

pub static ADMIN_NOTIFICATIONS: ResourceSchema = ResourceSchema {
    name: "admin-notifications",
    title: "Notifications",
    realm: Realm::Admin,
    endpoints: Endpoints {
        list: "notifications/list.php",
        create: Some("notifications/add.php"),
        update: Some("notifications/update.php"),
        delete: Some("notifications/delete.php"),
    },
    fields: &[
        FieldSpec::new("title", "Title", FieldKind::Text),
        FieldSpec::new("message", "Message", FieldKind::TextArea),
        FieldSpec::new("file", "Attachment", NOTIFICATION_FILE),
        FieldSpec::new("user_type", "Send To", FieldKind::Select(AUDIENCES)),
    ],
    columns: &[
        ColumnSpec::text("title", "Title"),
        ColumnSpec::text("message", "Message"),
        ColumnSpec::new("file_path", "Attachment", ColumnKind::File),
        ColumnSpec::text("user_type", "Sent To"),
        ColumnSpec::new("created_at", "Date & Time", ColumnKind::Date),
    ],
    rules: &[ValidationRule::Required {
        fields: &["title", "message", "user_type"],
        message: "Please fill all fields",
    }],
    manage_roles: ADMIN,
    empty_text: "No notifications sent yet",
    delete_prompt: "Are you sure you want to delete this notification?",
    ..ResourceSchema::BASE
};

// =========================================================
// 任务
// =========================================================

const TASK_ASSIGNEES: RemoteOptions = RemoteOptions {
    endpoint: "users/list.php",
    query: &[],
    value_field: "employee_id",
    label_field: "name",
    detail_field: None,
};

pub static TASKS: ResourceSchema = ResourceSchema {
    name: "tasks",
    title: "Tasks",
    endpoints: Endpoints {
        list: "tasks/list.php",
        create: Some("tasks/create.php"),
        update: None,
        delete: None,
    },
    list_query: BY_USER,
    fields: &[
        FieldSpec::new("title", "Title", FieldKind::Text),
        FieldSpec::new("description", "Description", FieldKind::TextArea),
        FieldSpec::new("employee_id", "Assign To", FieldKind::RemoteSelect(TASK_ASSIGNEES)),
        FieldSpec::new("due_date", "Due Date", FieldKind::Date),
        FieldSpec::new("upload_file", "Attachment", ATTACHMENT_5MB),
    ],
    columns: &[
        ColumnSpec::new("id", "Task ID", ColumnKind::Prefixed("T-")),
        ColumnSpec::text("title", "Title"),
        ColumnSpec::text("employee_name", "Assignee"),
        STATUS,
        ColumnSpec::new("progress_percent", "Progress", ColumnKind::Progress),
        ColumnSpec::new("upload_file", "File", ColumnKind::File),
    ],
    rules: &[ValidationRule::Required {
        fields: &["title", "employee_id"],
        message: "Title & employee required",
    }],
    inject: BY_EMPLOYER,
    progress: Some(ProgressAction {
        endpoint: "tasks/update-progress.php",
        key_param: "task_id",
        value_param: "progress",
        field: "progress_percent",
        roles: EMPLOYEE,
        locked_status: "completed",
    }),
    manage_roles: EMPLOYER,
    empty_text: "No tasks found",
    ..ResourceSchema::BASE
};

pub static ADMIN_TASKS: ResourceSchema = ResourceSchema {
    name: "admin-tasks",
    title: "All Tasks",
    realm: Realm::Admin,
    endpoints: Endpoints {
        list: "admin/tasks/list.php",
        create: None,
        update: None,
        delete: None,
    },
    list_query: BY_USER,
    columns: &[
        ColumnSpec::text("title", "Title"),
        ColumnSpec::text("employer_name", "Employer"),
        ColumnSpec::text("employee_name", "Employee"),
        STATUS,
        ColumnSpec::new("progress_percent", "Progress", ColumnKind::Progress),
        ColumnSpec::new("due_date", "Due Date", ColumnKind::Date),
    ],
    searchable: true,
    empty_text: "No tasks found",
    ..ResourceSchema::BASE
};

// =========================================================
// 表单与文件
// =========================================================

const FORM_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::text("title", "Form Title"),
    ColumnSpec::new("uploaded_date", "Uploaded", ColumnKind::Date),
    ColumnSpec::new("file_path", "File", ColumnKind::File),
];

pub static USER_FORMS: ResourceSchema = ResourceSchema {
    name: "forms",
    title: "Forms",
    endpoints: Endpoints {
        list: "forms/list.php",
        create: None,
        update: None,
        delete: None,
    },
    columns: FORM_COLUMNS,
    badge: Some(BadgeKind::Forms),
    empty_text: "No forms available",
    ..ResourceSchema::BASE
};

pub static ADMIN_FORMS: ResourceSchema = ResourceSchema {
    name: "admin-forms",
    title: "Forms",
    realm: Realm::Admin,
    endpoints: Endpoints {
        list: "forms/list.php",
        create: Some("forms/create.php"),
        update: None,
        delete: Some("forms/delete.php"),
    },
    delete_key: "form_id",
    fields: &[
        FieldSpec::new("title", "Form Title", FieldKind::Text),
        FieldSpec::new("upload_file", "File", ATTACHMENT_10MB),
    ],
    columns: FORM_COLUMNS,
    rules: &[ValidationRule::Required {
        fields: &["title", "upload_file"],
        message: "Title and file are required",
    }],
    manage_roles: ADMIN,
    empty_text: "No forms uploaded yet",
    delete_prompt: "Are you sure you want to delete this form?",
    ..ResourceSchema::BASE
};

const FILE_GROUP: ColumnKind = ColumnKind::FileGroup {
    files_field: "files",
    path_field: "file_path",
    name_field: "file_name",
};

pub static USER_FILES: ResourceSchema = ResourceSchema {
    name: "files",
    title: "Files",
    endpoints: Endpoints {
        list: "files/userfile.php",
        create: None,
        update: None,
        delete: None,
    },
    key_field: "group_id",
    list_query: &[param("user_id", ParamSource::IdentityId)],
    columns: &[
        ColumnSpec::text("main_title", "Title"),
        ColumnSpec::new("file_date", "Date", ColumnKind::Date),
        ColumnSpec::new("files", "Files", FILE_GROUP),
    ],
    empty_text: "No files shared with you yet",
    ..ResourceSchema::BASE
};

const EMPLOYER_ACCOUNTS: RemoteOptions = RemoteOptions {
    endpoint: "employers/list.php",
    query: &[],
    value_field: "user_id",
    label_field: "user_name",
    detail_field: Some("organization_name"),
};

pub static ADMIN_FILES: ResourceSchema = ResourceSchema {
    name: "admin-files",
    title: "File Attachments",
    realm: Realm::Admin,
    endpoints: Endpoints {
        list: "files/list.php",
        create: Some("files/create.php"),
        update: None,
        delete: Some("files/delete.php"),
    },
    key_field: "group_id",
    delete_key: "group_id",
    fields: &[
        FieldSpec::new("user_id", "Employer", FieldKind::RemoteSelect(EMPLOYER_ACCOUNTS)),
        FieldSpec::new("file_date", "Date", FieldKind::Date),
        FieldSpec::new("main_title", "Main Title", FieldKind::Text),
        FieldSpec::new("entry_title", "File Title", FieldKind::Text),
        FieldSpec::new(
            "entry_file",
            "File",
            FieldKind::File(FilePolicy {
                max_bytes: 10 * MB,
                allowed_ext: &[],
                encoding: FileEncoding::Grouped {
                    title_field: "entry_title",
                },
            }),
        ),
    ],
    columns: &[
        ColumnSpec::text("main_title", "Main Title"),
        ColumnSpec::text("user_name", "Employer"),
        ColumnSpec::new("file_date", "Date", ColumnKind::Date),
        ColumnSpec::new("files", "Files", FILE_GROUP),
    ],
    rules: &[
        ValidationRule::Required {
            fields: &["user_id"],
            message: "Please select an employer",
        },
        ValidationRule::Required {
            fields: &["main_title"],
            message: "Please enter a main title",
        },
        ValidationRule::Required {
            fields: &["entry_title", "entry_file"],
            message: "Title and file are required",
        },
    ],
    shape_payload: Some(drop_entry_title),
    manage_roles: ADMIN,
    empty_text: "No file attachments found",
    delete_prompt: "Are you sure you want to delete this file group and all its files?",
    ..ResourceSchema::BASE
};

/// 单条标题已进入 `titles` 数组
fn drop_entry_title(body: &mut Map<String, Value>) {
    body.remove("entry_title");
}

// =========================================================
// 员工账号
// =========================================================

pub static EMPLOYEES: ResourceSchema = ResourceSchema {
    name: "employees",
    title: "Employees",
    endpoints: Endpoints {
        list: "users/list.php",
        create: Some("users/create-employee.php"),
        update: Some("users/update-employee.php"),
        delete: Some("users/delete-employee.php"),
    },
    key_field: "user_id",
    update_key: "user_id",
    delete_key: "user_id",
    fields: &[
        FieldSpec::new("name", "Name", FieldKind::Text),
        FieldSpec::new("email", "Email", FieldKind::Email),
        FieldSpec::new("phone", "Phone", FieldKind::Text),
        FieldSpec::new("department", "Department", FieldKind::Text),
        FieldSpec::new("designation", "Designation", FieldKind::Text),
        FieldSpec::new("epfo_number", "EPFO Number", FieldKind::Text),
        FieldSpec::new("joining_date", "Joining Date", FieldKind::Date),
    ],
    columns: &[
        ColumnSpec::text("employee_code", "Employee ID"),
        ColumnSpec::text("name", "Name"),
        ColumnSpec::text("designation", "Designation"),
        ColumnSpec::text("department", "Department"),
        ColumnSpec::text("email", "Email"),
        ColumnSpec::text("phone", "Phone"),
        ColumnSpec::text("epfo_number", "EPFO Number"),
        ColumnSpec::new("joining_date", "Joining Date", ColumnKind::Date),
    ],
    rules: &[ValidationRule::Required {
        fields: &["name", "email"],
        message: "Name and Email required",
    }],
    created_notice: Some(employee_created_notice),
    manage_roles: EMPLOYER,
    searchable: true,
    empty_text: "No employees found",
    delete_prompt: "Are you sure you want to delete this employee?",
    ..ResourceSchema::BASE
};

/// 创建成功后展示生成的工号与初始密码
fn employee_created_notice(body: &Map<String, Value>) -> Option<String> {
    let code = body.get("employee_code").and_then(Value::as_str)?;
    let password = body
        .get("default_password")
        .and_then(Value::as_str)
        .unwrap_or("-");
    Some(format!("Employee Created\nID: {}\nPassword: {}", code, password))
}

const ACCOUNT_TYPES: &[SelectOption] = &[opt("employee", "Employees"), opt("employer", "Employers")];

pub static ADMIN_EMPLOYEES: ResourceSchema = ResourceSchema {
    name: "admin-employees",
    title: "Users",
    realm: Realm::Admin,
    endpoints: Endpoints {
        list: "admin/employees/list.php",
        create: Some("admin/employees/create.php"),
        update: Some("admin/employees/update.php"),
        delete: Some("admin/employees/delete.php"),
    },
    filter: Some(FilterTabs {
        param: "type",
        tabs: ACCOUNT_TYPES,
    }),
    fields: &[
        FieldSpec::new("name", "Name", FieldKind::Text),
        FieldSpec::new("email", "Email", FieldKind::Email),
        FieldSpec::new("phone", "Phone", FieldKind::Text),
        FieldSpec::new("password", "Password", FieldKind::Password),
        FieldSpec::new("department", "Department", FieldKind::Text).on_filter("employee"),
        FieldSpec::new("designation", "Designation", FieldKind::Text).on_filter("employee"),
        FieldSpec::new("joining_date", "Joining Date", FieldKind::Date).on_filter("employee"),
        FieldSpec::new("epfo_number", "EPFO Number", FieldKind::Text).on_filter("employee"),
        FieldSpec::new("organization_name", "Organization", FieldKind::Text).on_filter("employer"),
        FieldSpec::new("address", "Address", FieldKind::TextArea).on_filter("employer"),
        FieldSpec::new("phone_no", "Office Phone", FieldKind::Text).on_filter("employer"),
        FieldSpec::new("website", "Website", FieldKind::Text).on_filter("employer"),
        FieldSpec::new("employer_epfo_number", "EPFO Number", FieldKind::Text).on_filter("employer"),
        FieldSpec::new("esic_number", "ESIC Number", FieldKind::Text).on_filter("employer"),
        FieldSpec::new("gst_number", "GST Number", FieldKind::Text).on_filter("employer"),
        FieldSpec::new("balance", "Balance", FieldKind::Number).on_filter("employer"),
        FieldSpec::new("Digital_key", "Digital Key Expiry", FieldKind::Date).on_filter("employer"),
    ],
    columns: &[
        ColumnSpec::text("employee_code", "Code").on_filter("employee"),
        ColumnSpec::text("organization_code", "Code").on_filter("employer"),
        ColumnSpec::text("name", "Name"),
        ColumnSpec::text("email", "Email"),
        ColumnSpec::text("phone", "Phone"),
        ColumnSpec::text("department", "Department").on_filter("employee"),
        ColumnSpec::text("organization_name", "Organization").on_filter("employer"),
    ],
    rules: &[ValidationRule::Required {
        fields: &["name", "email"],
        message: "Name and Email required",
    }],
    inject: &[param("user_type", ParamSource::Filter)],
    manage_roles: ADMIN,
    searchable: true,
    empty_text: "No users found",
    delete_prompt: "Are you sure you want to delete this user?",
    ..ResourceSchema::BASE
};

// =========================================================
// 发票与付款
// =========================================================

const INVOICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("invoice_date", "Invoice Date", FieldKind::Date),
    FieldSpec::new("amount", "Amount (₹)", FieldKind::Number),
    FieldSpec::new("upload_file", "Invoice File", ATTACHMENT_5MB),
];

const INVOICE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::text("id", "Invoice No"),
    ColumnSpec::new("amount", "Amount (₹)", ColumnKind::Money),
    ColumnSpec::new(
        "status",
        "Status",
        ColumnKind::Status {
            default: Some("pending"),
        },
    ),
    ColumnSpec::new("date", "Invoice Date", ColumnKind::Date),
    ColumnSpec::new("upload_file", "Invoice", ColumnKind::File),
];

const INVOICE_RULES: &[ValidationRule] = &[ValidationRule::Required {
    fields: &["invoice_date", "amount"],
    message: "Invoice date and amount required",
}];

const MARK_PAID_PARAMS: &[Param] = &[
    param("employer_id", ParamSource::IdentityId),
    param("invoice_no", ParamSource::RecordField("id")),
    param("status", ParamSource::Static("paid")),
];

const NEXT_INVOICE_NO: CreateHint = CreateHint {
    label: "Invoice No",
    endpoint: "invoices/next_invoice_no.php",
    query: BY_EMPLOYER,
    field: "invoice_no",
    fallback: "INV001",
};

const INVOICES_BASE: ResourceSchema = ResourceSchema {
    name: "invoices",
    title: "Invoices",
    endpoints: Endpoints {
        list: "invoices/list.php",
        create: Some("invoices/create.php"),
        update: None,
        delete: None,
    },
    list_query: BY_EMPLOYER,
    fields: INVOICE_FIELDS,
    columns: INVOICE_COLUMNS,
    rules: INVOICE_RULES,
    inject: BY_EMPLOYER,
    transitions: &[StatusTransition {
        label: "Mark as Paid",
        endpoint: "invoices/update_status.php",
        params: MARK_PAID_PARAMS,
        target: "paid",
        from: &["pending"],
        roles: EMPLOYER,
    }],
    create_hint: Some(NEXT_INVOICE_NO),
    manage_roles: EMPLOYER,
    empty_text: "No invoices found",
    ..ResourceSchema::BASE
};

pub static INVOICES: ResourceSchema = INVOICES_BASE;

pub static ADMIN_INVOICES: ResourceSchema = ResourceSchema {
    name: "admin-invoices",
    realm: Realm::Admin,
    transitions: &[StatusTransition {
        label: "Mark as Paid",
        endpoint: "invoices/update_status.php",
        params: MARK_PAID_PARAMS,
        target: "paid",
        from: &["pending"],
        roles: ADMIN,
    }],
    manage_roles: ADMIN,
    ..INVOICES_BASE
};

const PAYMENT_METHODS: &[SelectOption] = &[opt("Cash", "Cash"), opt("UPI", "UPI"), opt("Bank", "Bank")];

const PAYMENTS_BASE: ResourceSchema = ResourceSchema {
    name: "payments",
    title: "Payments",
    endpoints: Endpoints {
        list: "Payment/list.php",
        create: Some("Payment/create.php"),
        update: Some("Payment/update.php"),
        delete: Some("Payment/delete.php"),
    },
    fields: &[
        FieldSpec::new("payment_method", "Method", FieldKind::Select(PAYMENT_METHODS)),
        FieldSpec::new("amount", "Amount", FieldKind::Number),
        FieldSpec::new("transaction_id", "Transaction ID", FieldKind::Text),
    ],
    columns: &[
        ColumnSpec::text("id", "ID"),
        ColumnSpec::text("payment_method", "Method"),
        ColumnSpec::text("transaction_id", "Transaction"),
        ColumnSpec::new("amount", "Amount", ColumnKind::Money),
        STATUS,
        ColumnSpec::new("created_at", "Date", ColumnKind::Date),
    ],
    rules: &[
        ValidationRule::Required {
            fields: &["amount"],
            message: "Amount required",
        },
        ValidationRule::RequiredUnless {
            field: "transaction_id",
            other: "payment_method",
            equals: "Cash",
            message: "Transaction ID required",
        },
    ],
    shape_payload: Some(cash_has_no_transaction),
    manage_roles: EMPLOYER,
    empty_text: "No payments recorded",
    delete_prompt: "Delete this payment?",
    ..ResourceSchema::BASE
};

pub static PAYMENTS: ResourceSchema = PAYMENTS_BASE;

pub static ADMIN_PAYMENTS: ResourceSchema = ResourceSchema {
    name: "admin-payments",
    realm: Realm::Admin,
    manage_roles: ADMIN,
    ..PAYMENTS_BASE
};

fn cash_has_no_transaction(body: &mut Map<String, Value>) {
    if body.get("payment_method").and_then(Value::as_str) == Some("Cash") {
        body.insert("transaction_id".into(), Value::Null);
    }
}

// =========================================================
// 工资单
// =========================================================

const PAYSLIP_EMPLOYEES: RemoteOptions = RemoteOptions {
    endpoint: "payslips/employee.php",
    query: &[],
    value_field: "id",
    label_field: "name",
    detail_field: Some("email"),
};

const ADMIN_EMPLOYER_QUERY: &[Param] = &[param("type", ParamSource::Static("employer"))];

const PAYSLIP_EMPLOYERS: RemoteOptions = RemoteOptions {
    endpoint: "admin/employees/list.php",
    query: ADMIN_EMPLOYER_QUERY,
    value_field: "id",
    label_field: "name",
    detail_field: None,
};

const MONEY_FIELDS: [FieldSpec; 4] = [
    FieldSpec::new("basic_salary", "Basic Salary", FieldKind::Number),
    FieldSpec::new("allowances", "Allowances", FieldKind::Number),
    FieldSpec::new("deductions", "Deductions", FieldKind::Number),
    FieldSpec::new("net_salary", "Net Salary", FieldKind::Derived),
];

pub static MY_PAYSLIPS: ResourceSchema = ResourceSchema {
    name: "my-payslips",
    title: "My Payslips",
    endpoints: Endpoints {
        list: "payslips/list.php",
        create: None,
        update: None,
        delete: None,
    },
    list_query: &[param("employee_id", ParamSource::IdentityId)],
    columns: &[
        ColumnSpec::text("month_year", "Month"),
        ColumnSpec::new("basic_salary", "Basic", ColumnKind::Money),
        ColumnSpec::new("allowances", "Allowances", ColumnKind::Money),
        ColumnSpec::new("deductions", "Deductions", ColumnKind::Money),
        ColumnSpec::new("net_salary", "Net Salary", ColumnKind::Money),
        ColumnSpec::new("generated_at", "Generated", ColumnKind::Date),
    ],
    printable: true,
    empty_text: "No payslips generated yet",
    ..ResourceSchema::BASE
};

pub static PAYSLIPS: ResourceSchema = ResourceSchema {
    name: "payslips",
    title: "Payslips",
    endpoints: Endpoints {
        list: "payslips/list.php",
        create: Some("payslips/create.php"),
        update: Some("payslips/update.php"),
        delete: Some("payslips/delete.php"),
    },
    fields: &[
        FieldSpec::new("employee_id", "Employee", FieldKind::RemoteSelect(PAYSLIP_EMPLOYEES)),
        FieldSpec::new("month_year", "Month", FieldKind::Month),
        MONEY_FIELDS[0],
        MONEY_FIELDS[1],
        MONEY_FIELDS[2],
        MONEY_FIELDS[3],
    ],
    columns: &[
        ColumnSpec::text("employee_id", "Employee ID"),
        ColumnSpec::text("employee_name", "Name"),
        ColumnSpec::text("month_year", "Month"),
        ColumnSpec::new("basic_salary", "Basic", ColumnKind::Money),
        ColumnSpec::new("allowances", "Allowances", ColumnKind::Money),
        ColumnSpec::new("deductions", "Deductions", ColumnKind::Money),
        ColumnSpec::new("net_salary", "Net Salary", ColumnKind::Money),
        ColumnSpec::new("generated_at", "Generated", ColumnKind::Date),
    ],
    rules: &[ValidationRule::Required {
        fields: &["employee_id", "month_year"],
        message: "Employee & Month required",
    }],
    derive: Some(derive_net_salary),
    manage_roles: EMPLOYER,
    printable: true,
    empty_text: "No payslips yet",
    delete_prompt: "Are you sure you want to delete this payslip?",
    ..ResourceSchema::BASE
};

const PAYSLIP_MODES: &[SelectOption] = &[opt("employee", "Employee"), opt("employer", "Employer")];

pub static ADMIN_PAYSLIPS: ResourceSchema = ResourceSchema {
    name: "admin-payslips",
    title: "Payslips",
    realm: Realm::Admin,
    endpoints: Endpoints {
        list: "admin/payslips/list.php",
        create: Some("admin/payslips/create.php"),
        update: Some("admin/payslips/update.php"),
        delete: Some("admin/payslips/delete.php"),
    },
    filter: Some(FilterTabs {
        param: "mode",
        tabs: PAYSLIP_MODES,
    }),
    fields: &[
        FieldSpec::new("employer_id", "Employer", FieldKind::RemoteSelect(PAYSLIP_EMPLOYERS)),
        FieldSpec::new("month_year", "Month", FieldKind::Month),
        MONEY_FIELDS[0],
        MONEY_FIELDS[1],
        MONEY_FIELDS[2],
        MONEY_FIELDS[3],
    ],
    columns: &[
        ColumnSpec::text("id", "ID"),
        ColumnSpec::text("employee_name", "Employee").on_filter("employee"),
        ColumnSpec::text("employer_name", "Employer").on_filter("employer"),
        ColumnSpec::text("month_year", "Month"),
        ColumnSpec::new("net_salary", "Net Salary", ColumnKind::Money),
    ],
    rules: &[ValidationRule::Required {
        fields: &["employer_id", "month_year"],
        message: "Employer & Month required",
    }],
    derive: Some(derive_net_salary),
    manage_roles: ADMIN,
    mutable_on_filter: Some("employer"),
    printable: true,
    empty_text: "No payslips found",
    delete_prompt: "Delete this payslip?",
    ..ResourceSchema::BASE
};

// =========================================================
// 报表与 EPFO
// =========================================================

/// 管理员报表页是按员工的完整报表，见 `report`
pub static REPORTS: ResourceSchema = ResourceSchema {
    name: "reports",
    title: "Employee Reports",
    endpoints: Endpoints {
        list: REPORT_EMPLOYEES,
        create: None,
        update: None,
        delete: None,
    },
    columns: &[
        ColumnSpec::text("employee_code", "Code"),
        ColumnSpec::text("name", "Name"),
        ColumnSpec::text("department", "Department"),
        ColumnSpec::text("designation", "Designation"),
    ],
    searchable: true,
    empty_text: "No employees found",
    ..ResourceSchema::BASE
};

const EPFO_REQUEST_TYPES: &[SelectOption] = &[
    opt("Withdrawal", "PF Withdrawal"),
    opt("Transfer", "PF Transfer"),
    opt("KYC Update", "KYC Update"),
    opt("Nominee Update", "Nominee Update"),
];

const EPFO_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::text("employee_name", "Employee"),
    ColumnSpec::text("request_type", "Request Type"),
    ColumnSpec::text("description", "Description"),
    STATUS,
    ColumnSpec::new("created_at", "Date", ColumnKind::Date),
];

pub static EPFO_REQUESTS: ResourceSchema = ResourceSchema {
    name: "epfo-requests",
    title: "EPFO Requests",
    endpoints: Endpoints {
        list: "epfo_requests/list.php",
        create: Some("epfo_requests/create.php"),
        update: None,
        delete: None,
    },
    list_query: BY_EMPLOYER,
    fields: &[
        FieldSpec::new("employee_id", "Employee", FieldKind::RemoteSelect(TASK_ASSIGNEES)),
        FieldSpec::new("request_type", "Request Type", FieldKind::Select(EPFO_REQUEST_TYPES)),
        FieldSpec::new("description", "Description", FieldKind::TextArea),
    ],
    columns: EPFO_COLUMNS,
    rules: &[ValidationRule::Required {
        fields: &["request_type", "description"],
        message: "Request type and description required",
    }],
    inject: BY_EMPLOYER,
    manage_roles: EMPLOYER,
    empty_text: "No EPFO requests found",
    ..ResourceSchema::BASE
};

const EPFO_COMPLETE: &[Param] = &[
    param("id", ParamSource::RecordField("id")),
    param("status", ParamSource::Static("completed")),
];

const EPFO_REJECT: &[Param] = &[
    param("id", ParamSource::RecordField("id")),
    param("status", ParamSource::Static("rejected")),
];

pub static ADMIN_EPFO_REQUESTS: ResourceSchema = ResourceSchema {
    name: "admin-epfo-requests",
    title: "EPFO Requests",
    realm: Realm::Admin,
    endpoints: Endpoints {
        list: "admin/epfo_requests/list.php",
        create: None,
        update: None,
        delete: None,
    },
    columns: EPFO_COLUMNS,
    transitions: &[
        StatusTransition {
            label: "Complete",
            endpoint: "admin/epfo_requests/update_status.php",
            params: EPFO_COMPLETE,
            target: "completed",
            from: &["pending", "processing", "in_progress"],
            roles: ADMIN,
        },
        StatusTransition {
            label: "Reject",
            endpoint: "admin/epfo_requests/update_status.php",
            params: EPFO_REJECT,
            target: "rejected",
            from: &["pending", "processing", "in_progress"],
            roles: ADMIN,
        },
    ],
    searchable: true,
    empty_text: "No EPFO requests found",
    ..ResourceSchema::BASE
};

// =========================================================
// 路由映射
// =========================================================

/// 路由对应的列表页资源；仪表盘、资料页、管理员报表与登录页没有
pub fn schema_for(route: AppRoute) -> Option<&'static ResourceSchema> {
    let schema = match route {
        AppRoute::Notifications => &USER_NOTIFICATIONS,
        AppRoute::Tasks => &TASKS,
        AppRoute::Forms => &USER_FORMS,
        AppRoute::Files => &USER_FILES,
        AppRoute::Payslip => &MY_PAYSLIPS,
        AppRoute::IdCreation => &EMPLOYEES,
        AppRoute::Invoices => &INVOICES,
        AppRoute::Payments => &PAYMENTS,
        AppRoute::AddPayslip => &PAYSLIPS,
        AppRoute::Reports => &REPORTS,
        AppRoute::EpfoRequests => &EPFO_REQUESTS,

        AppRoute::AdminNotifications => &ADMIN_NOTIFICATIONS,
        AppRoute::AdminTasks => &ADMIN_TASKS,
        AppRoute::AdminEmployees => &ADMIN_EMPLOYEES,
        AppRoute::AdminInvoices => &ADMIN_INVOICES,
        AppRoute::AdminPayments => &ADMIN_PAYMENTS,
        AppRoute::AdminEpfoRequests => &ADMIN_EPFO_REQUESTS,
        AppRoute::AdminPayslip => &ADMIN_PAYSLIPS,
        AppRoute::AdminForms => &ADMIN_FORMS,
        AppRoute::AdminFiles => &ADMIN_FILES,
        _ => return None,
    };
    Some(schema)
}

/// 角标的数据来源
pub fn badge_source(kind: BadgeKind) -> &'static ResourceSchema {
    match kind {
        BadgeKind::Notifications => &USER_NOTIFICATIONS,
        BadgeKind::Forms => &USER_FORMS,
    }
}

// =========================================================
// 资料页
// =========================================================

#[derive(Debug, Clone, Copy)]
pub struct ProfileSpec {
    pub realm: Realm,
    pub fetch: &'static str,
    pub fetch_param: &'static str,
    pub save: &'static str,
    /// 保存时携带身份 id 的参数名
    pub save_key: &'static str,
    /// 只读展示的字段 (字段名, 标签)
    pub info: &'static [(&'static str, &'static str)],
    pub fields: &'static [FieldSpec],
}

pub static USER_PROFILE: ProfileSpec = ProfileSpec {
    realm: Realm::User,
    fetch: "users/get-profile.php",
    fetch_param: "user_id",
    save: "users/update-profile.php",
    save_key: "user_id",
    info: &[
        ("name", "Name"),
        ("email", "Email"),
        ("phone", "Phone"),
        ("employee_code", "Employee Code"),
        ("department", "Department"),
        ("designation", "Designation"),
    ],
    fields: &[
        FieldSpec::new("name", "Name", FieldKind::Text),
        FieldSpec::new("phone", "Phone", FieldKind::Text),
        FieldSpec::new("email", "Email", FieldKind::Email),
        FieldSpec::new("password", "Password", FieldKind::Password),
        FieldSpec::new("department", "Department", FieldKind::Text),
        FieldSpec::new("designation", "Designation", FieldKind::Text),
    ],
};

pub static ADMIN_PROFILE: ProfileSpec = ProfileSpec {
    realm: Realm::Admin,
    fetch: "admin/get-profile.php",
    fetch_param: "admin_id",
    save: "admin/update-profile.php",
    save_key: "admin_id",
    info: &[("name", "Name"), ("email", "Email")],
    fields: &[
        FieldSpec::new("name", "Name", FieldKind::Text),
        FieldSpec::new("email", "Email", FieldKind::Email),
        FieldSpec::new("password", "Password", FieldKind::Password),
    ],
};

pub fn profile_for(realm: Realm) -> &'static ProfileSpec {
    match realm {
        Realm::User => &USER_PROFILE,
        Realm::Admin => &ADMIN_PROFILE,
    }
}

// =========================================================
// 仪表盘
// =========================================================

/// 仪表盘汇总所用的资源：任务，以及 (有权限时的) 发票
pub fn dashboard_sources(
    realm: Realm,
    role: Role,
) -> (&'static ResourceSchema, Option<&'static ResourceSchema>) {
    match (realm, role) {
        (Realm::Admin, _) => (&ADMIN_TASKS, Some(&ADMIN_INVOICES)),
        (Realm::User, Role::Employer) => (&TASKS, Some(&INVOICES)),
        (Realm::User, _) => (&TASKS, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormValues, build_payload};
    use crate::identity::Identity;
    use crate::schema::ParamContext;
    use serde_json::json;

    #[test]
    fn every_guarded_list_route_has_a_schema_in_its_realm() {
        for entry in crate::nav::USER_LINKS.iter().chain(crate::nav::ADMIN_LINKS) {
            let Some(schema) = schema_for(entry.route) else {
                continue;
            };
            assert_eq!(Some(schema.realm), entry.route.guarded_by(), "{}", schema.name);
            assert!(!schema.endpoints.list.is_empty(), "{}", schema.name);
            assert!(!schema.columns.is_empty(), "{}", schema.name);
        }
    }

    #[test]
    fn admin_reports_use_the_full_report_page() {
        assert!(schema_for(AppRoute::AdminReports).is_none());
        assert_eq!(schema_for(AppRoute::Reports).map(|s| s.endpoints.list), Some(REPORT_EMPLOYEES));
    }

    #[test]
    fn mutable_schemas_have_fields_and_managers() {
        let all = [
            &ADMIN_NOTIFICATIONS,
            &TASKS,
            &ADMIN_FORMS,
            &ADMIN_FILES,
            &EMPLOYEES,
            &ADMIN_EMPLOYEES,
            &INVOICES,
            &PAYMENTS,
            &PAYSLIPS,
            &ADMIN_PAYSLIPS,
            &EPFO_REQUESTS,
        ];
        for schema in all {
            assert!(schema.endpoints.create.is_some(), "{}", schema.name);
            assert!(!schema.fields.is_empty(), "{}", schema.name);
            assert!(!schema.manage_roles.is_empty(), "{}", schema.name);
        }
    }

    #[test]
    fn cash_payment_sends_null_transaction() {
        let identity = Identity::new(2, "E", Role::Employer);
        let ctx = ParamContext::new(Some(&identity), None);
        let mut values = FormValues::empty(&PAYMENTS);
        values.set_text("amount", "900");
        values.set_text("transaction_id", "stale");
        let body = build_payload(&PAYMENTS, &values, &ctx, None);
        assert_eq!(body["payment_method"], "Cash");
        assert_eq!(body["transaction_id"], Value::Null);
    }

    #[test]
    fn admin_employee_payload_follows_active_tab() {
        let identity = Identity::new(1, "Root", Role::Admin);
        let ctx = ParamContext::new(Some(&identity), Some("employer"));
        let mut values = FormValues::empty(&ADMIN_EMPLOYEES);
        values.set_text("name", "Acme");
        values.set_text("organization_name", "Acme Pvt Ltd");
        values.set_text("department", "ignored");
        let body = build_payload(&ADMIN_EMPLOYEES, &values, &ctx, None);
        assert_eq!(body["user_type"], "employer");
        assert_eq!(body["organization_name"], "Acme Pvt Ltd");
        assert!(!body.contains_key("department"));
    }

    #[test]
    fn file_group_payload_uses_title_and_file_arrays() {
        let identity = Identity::new(1, "Root", Role::Admin);
        let ctx = ParamContext::new(Some(&identity), None);
        let mut values = FormValues::empty(&ADMIN_FILES);
        values.set_text("user_id", "8");
        values.set_text("main_title", "March");
        values.set_text("entry_title", "PF Challan");
        values.set_file(
            "entry_file",
            crate::form::FileUpload {
                name: "pf.pdf".into(),
                size: 10,
                data_url: "data:application/pdf;base64,AA==".into(),
            },
        );
        let body = build_payload(&ADMIN_FILES, &values, &ctx, None);
        assert_eq!(body["titles"], json!(["PF Challan"]));
        assert_eq!(body["files"][0]["name"], "pf.pdf");
        assert!(!body.contains_key("entry_title"));
    }

    #[test]
    fn employee_creation_notice_shows_generated_credentials() {
        let body = json!({"success": true, "employee_code": "EMP0042", "default_password": "pass@42"});
        let Value::Object(map) = body else { unreachable!() };
        assert_eq!(
            employee_created_notice(&map).as_deref(),
            Some("Employee Created\nID: EMP0042\nPassword: pass@42")
        );
    }
}
