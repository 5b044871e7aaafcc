//! 附件读取
//!
//! 用 `FileReader.readAsDataURL` 把选中的文件读成 data URL，原样作为 base64 载荷提交。

use futures::channel::oneshot;
use portal_shared::{FileUpload, PortalError, PortalResult};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, File, FileReader, HtmlInputElement};

/// 取出 `<input type="file">` 当前选中的第一个文件
pub fn selected_file(ev: &Event) -> Option<File> {
    let input: HtmlInputElement = ev.target()?.dyn_into().ok()?;
    input.files()?.get(0)
}

/// 清空文件输入框 (拒绝不合规的文件后)
pub fn clear_input(ev: &Event) {
    if let Some(input) = ev
        .target()
        .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
    {
        input.set_value("");
    }
}

pub async fn read_as_data_url(file: File) -> PortalResult<FileUpload> {
    let reader = FileReader::new().map_err(|e| PortalError::storage(format!("{:?}", e)))?;
    let (tx, rx) = oneshot::channel::<Option<String>>();
    let tx = std::cell::RefCell::new(Some(tx));

    let onload = {
        let reader = reader.clone();
        Closure::<dyn Fn()>::new(move || {
            let result = reader.result().ok().and_then(|v| v.as_string());
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(result);
            }
        })
    };
    reader.set_onloadend(Some(onload.as_ref().unchecked_ref()));
    reader
        .read_as_data_url(&file)
        .map_err(|e| PortalError::storage(format!("{:?}", e)))?;

    let data_url = rx
        .await
        .ok()
        .flatten()
        .ok_or_else(|| PortalError::storage(format!("failed to read {}", file.name())))?;
    drop(onload);

    Ok(FileUpload {
        name: file.name(),
        size: file.size() as u64,
        data_url,
    })
}
