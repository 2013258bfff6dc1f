//! 静态配置校验
//!
//! 启动时检查一次，错误直接阻止启动，警告只记录日志。

use super::StaticConfig;
use crate::utils::url_validator::validate_url;

/// 校验结果中的警告（不阻止启动）
pub type ConfigWarnings = Vec<String>;

/// 校验静态配置
///
/// 返回 Err 表示配置不可用；Ok 中携带需要提示的警告。
pub fn validate_static_config(config: &StaticConfig) -> Result<ConfigWarnings, String> {
    let mut warnings = Vec::new();

    validate_url(&config.redirect.fallback_url)
        .map_err(|e| format!("redirect.fallback_url is invalid: {}", e))?;

    let sample_public_url = config.redirect.public_base_url.replace(":slug", "sample");
    validate_url(&sample_public_url)
        .map_err(|e| format!("redirect.public_base_url is invalid: {}", e))?;

    validate_url(&config.renderer.endpoint)
        .map_err(|e| format!("renderer.endpoint is invalid: {}", e))?;

    if !(4..=32).contains(&config.registry.slug_length) {
        return Err(format!(
            "registry.slug_length must be between 4 and 32, got {}",
            config.registry.slug_length
        ));
    }

    if config.registry.max_slug_attempts == 0 {
        return Err("registry.max_slug_attempts must be at least 1".to_string());
    }

    if config.redirect.lookup_timeout_ms == 0 {
        return Err("redirect.lookup_timeout_ms must be greater than 0".to_string());
    }

    if config.scan_counter.max_scans_before_flush == 0 {
        return Err("scan_counter.max_scans_before_flush must be at least 1".to_string());
    }

    if config.auth.jwt_secret.is_empty() {
        warnings.push(
            "auth.jwt_secret is empty: every owner-scoped API request will be rejected"
                .to_string(),
        );
    }

    if config.redirect.status == super::RedirectStatus::Permanent {
        warnings.push(
            "redirect.status is 'permanent': browsers may cache 301 responses and ignore later target changes"
                .to_string(),
        );
    }

    if !config.redirect.public_base_url.contains(":slug")
        && !config.redirect.public_base_url.ends_with('/')
    {
        warnings.push(format!(
            "redirect.public_base_url '{}' has no trailing slash; one will be inserted before the slug",
            config.redirect.public_base_url
        ));
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedirectStatus;

    fn config_with_secret() -> StaticConfig {
        let mut config = StaticConfig::default();
        config.auth.jwt_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_default_config_only_warns_about_secret() {
        let warnings = validate_static_config(&StaticConfig::default()).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("jwt_secret"));
    }

    #[test]
    fn test_configured_secret_has_no_warnings() {
        let warnings = validate_static_config(&config_with_secret()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_invalid_fallback_url_rejected() {
        let mut config = config_with_secret();
        config.redirect.fallback_url = "javascript:alert(1)".to_string();
        let err = validate_static_config(&config).unwrap_err();
        assert!(err.contains("fallback_url"));
    }

    #[test]
    fn test_slug_placeholder_base_url_accepted() {
        let mut config = config_with_secret();
        config.redirect.public_base_url = "https://qr.example/r/:slug?src=qr".to_string();
        assert!(validate_static_config(&config).unwrap().is_empty());
    }

    #[test]
    fn test_slug_length_bounds() {
        let mut config = config_with_secret();
        config.registry.slug_length = 2;
        assert!(validate_static_config(&config).is_err());
        config.registry.slug_length = 64;
        assert!(validate_static_config(&config).is_err());
    }

    #[test]
    fn test_permanent_redirect_warns() {
        let mut config = config_with_secret();
        config.redirect.status = RedirectStatus::Permanent;
        let warnings = validate_static_config(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("permanent"));
    }
}
