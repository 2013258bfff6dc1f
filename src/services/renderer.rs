//! Public URL and QR image URL building
//!
//! The QR image itself is produced by an external renderer; we only build the
//! request URL that embeds the resolvable public address.

use crate::config::{RedirectConfig, RendererConfig};

#[derive(Debug, Clone)]
pub struct QrRenderer {
    public_base_url: String,
    endpoint: String,
    size: u32,
}

impl QrRenderer {
    pub fn new(public_base_url: impl Into<String>, endpoint: impl Into<String>, size: u32) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            endpoint: endpoint.into(),
            size: size.max(1),
        }
    }

    pub fn from_config(redirect: &RedirectConfig, renderer: &RendererConfig) -> Self {
        Self::new(&redirect.public_base_url, &renderer.endpoint, renderer.size)
    }

    /// 二维码里编码的地址
    ///
    /// 基础地址含 `:slug` 占位符时替换，否则拼接在末尾。
    pub fn public_url(&self, slug: &str) -> String {
        if self.public_base_url.contains(":slug") {
            return self.public_base_url.replace(":slug", slug);
        }
        if self.public_base_url.ends_with('/') {
            format!("{}{}", self.public_base_url, slug)
        } else {
            format!("{}/{}", self.public_base_url, slug)
        }
    }

    /// 外部渲染服务的图片地址
    pub fn image_url(&self, slug: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}size={}x{}&data={}",
            self.endpoint,
            separator,
            self.size,
            self.size,
            urlencoding::encode(&self.public_url(slug))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_join() {
        let r = QrRenderer::new("https://qr.example/r/", "https://render.example/", 300);
        assert_eq!(r.public_url("promo1"), "https://qr.example/r/promo1");

        let r = QrRenderer::new("https://qr.example/r", "https://render.example/", 300);
        assert_eq!(r.public_url("promo1"), "https://qr.example/r/promo1");
    }

    #[test]
    fn test_public_url_placeholder() {
        let r = QrRenderer::new(
            "https://qr.example/:slug?src=print",
            "https://render.example/",
            300,
        );
        assert_eq!(r.public_url("promo1"), "https://qr.example/promo1?src=print");
    }

    #[test]
    fn test_image_url_encodes_public_url() {
        let r = QrRenderer::new(
            "https://qr.example/r/",
            "https://api.qrserver.com/v1/create-qr-code/",
            200,
        );
        assert_eq!(
            r.image_url("promo1"),
            "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=https%3A%2F%2Fqr.example%2Fr%2Fpromo1"
        );

        let r = QrRenderer::new("https://qr.example/", "https://render.example/qr?fmt=svg", 64);
        assert!(r.image_url("a").starts_with("https://render.example/qr?fmt=svg&size=64x64&data="));
    }
}
