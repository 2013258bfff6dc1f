pub mod time_parser;
pub mod url_validator;

pub use time_parser::TimeParser;

/// slug 允许的字符集（与生成器保持一致，另外允许 `-` 和 `_` 供自定义 slug 使用）
const SLUG_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// 自定义 slug 的最大长度
pub const MAX_SLUG_LENGTH: usize = 64;

/// 与内置路由冲突的 slug
const RESERVED_SLUGS: &[&str] = &["api", "health", "favicon.ico", "robots.txt"];

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| SLUG_ALPHABET[rand::random_range(0..SLUG_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// 检查 slug 格式：1..=64 个字符，仅限字母数字、`-`、`_`
///
/// 重定向入口先用它挡掉非法路径，不触达存储。
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// 检查 slug 是否与内置路由冲突（大小写不敏感）
pub fn is_reserved_slug(slug: &str, extra_prefixes: &[&str]) -> bool {
    let lower = slug.to_ascii_lowercase();
    RESERVED_SLUGS.contains(&lower.as_str())
        || extra_prefixes
            .iter()
            .map(|p| p.trim_matches('/').to_ascii_lowercase())
            .any(|p| !p.is_empty() && p == lower)
}
