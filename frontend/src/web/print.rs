//! 打印窗口
//!
//! 打开空白窗口，写入整页内容后调用 `window.print()`。

use portal_shared::log_warn;

/// `html` 为 `<html>` 元素的内容；弹窗被拦截时返回 false
pub fn print_document(title: &str, html: &str) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let popup = match window.open_with_url_and_target("", "_blank") {
        Ok(Some(popup)) => popup,
        Ok(None) => {
            log_warn!("[Print] popup blocked");
            return false;
        }
        Err(e) => {
            log_warn!("[Print] failed to open window: {:?}", e);
            return false;
        }
    };
    let Some(root) = popup.document().and_then(|d| d.document_element()) else {
        return false;
    };
    root.set_inner_html(html);
    if let Some(doc) = popup.document() {
        doc.set_title(title);
    }
    if let Err(e) = popup.print() {
        log_warn!("[Print] print failed: {:?}", e);
        return false;
    }
    true
}
