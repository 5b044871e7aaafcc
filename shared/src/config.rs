use url::Url;

use crate::error::PortalResult;

/// 生产环境 API 根地址
pub const DEFAULT_API_BASE: &str = "https://projects.growtechnologies.in/srisaigroups/api";

/// 运行时配置
///
/// 远端资源地址统一从这里拼接；文件地址以去掉 `/api` 后缀的站点根为基准。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    api_base: String,
}

impl ApiConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { api_base }
    }

    /// 读取构建期的 `PORTAL_API_BASE`，缺省使用生产地址
    pub fn from_build_env() -> Self {
        match option_env!("PORTAL_API_BASE") {
            Some(base) if !base.trim().is_empty() => Self::new(base.trim()),
            _ => Self::new(DEFAULT_API_BASE),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// 后端站点根 (API 根去掉 `/api` 后缀)
    pub fn file_origin(&self) -> &str {
        self.api_base
            .strip_suffix("/api")
            .unwrap_or(&self.api_base)
    }

    /// 资源路径 -> 完整 URL 字符串
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}/{}", self.api_base, path)
        }
    }

    /// 带查询参数的资源 URL
    pub fn endpoint_with_query(&self, path: &str, params: &[(String, String)]) -> PortalResult<String> {
        let mut url = Url::parse(&self.endpoint(path))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url.to_string())
    }

    /// 列表接口返回的相对文件路径 -> 可下载的绝对地址
    pub fn file_url(&self, relative: &str) -> String {
        if relative.starts_with("http://") || relative.starts_with("https://") {
            return relative.to_string();
        }
        format!(
            "{}/{}",
            self.file_origin(),
            relative.trim_start_matches('/')
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_build_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_and_joins_paths() {
        let config = ApiConfig::new("https://example.test/portal/api/");
        assert_eq!(config.api_base(), "https://example.test/portal/api");
        assert_eq!(
            config.endpoint("tasks/list.php"),
            "https://example.test/portal/api/tasks/list.php"
        );
        assert_eq!(
            config.endpoint("/tasks/list.php"),
            "https://example.test/portal/api/tasks/list.php"
        );
    }

    #[test]
    fn file_urls_resolve_against_origin_without_api_suffix() {
        let config = ApiConfig::new("https://example.test/portal/api");
        assert_eq!(config.file_origin(), "https://example.test/portal");
        assert_eq!(
            config.file_url("uploads/tasks/a.pdf"),
            "https://example.test/portal/uploads/tasks/a.pdf"
        );
        assert_eq!(
            config.file_url("https://cdn.test/a.pdf"),
            "https://cdn.test/a.pdf"
        );
    }

    #[test]
    fn query_values_are_encoded() {
        let config = ApiConfig::new("https://example.test/api");
        let url = config
            .endpoint_with_query(
                "tasks/list.php",
                &[
                    ("user_id".to_string(), "7".to_string()),
                    ("role".to_string(), "employer admin".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(
            url,
            "https://example.test/api/tasks/list.php?user_id=7&role=employer+admin"
        );
    }
}
