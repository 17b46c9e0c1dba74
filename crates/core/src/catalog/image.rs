//! Product and category image resolution.
//!
//! Every product card shows exactly one image. The source is chosen in
//! order of preference:
//!
//! 1. The primary inline attachment (base64), when it is valid
//! 2. The remote `imageUrl`, when non-empty
//! 3. A generated SVG placeholder
//!
//! Resolution never fails; every fallback is logged at debug level.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::model::{Category, Product, ProductImageAttach};

const PLACEHOLDER_SVG: &str = concat!(
    r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="400" viewBox="0 0 400 400">"##,
    r##"<rect width="400" height="400" fill="#f3f4f6"/>"##,
    r##"<text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" "##,
    r##"font-family="Arial, sans-serif" font-size="16" fill="#9ca3af">Product Image</text>"##,
    "</svg>"
);

static PLACEHOLDER_URL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(PLACEHOLDER_SVG)
    )
});

/// The placeholder shown when nothing else is usable.
#[must_use]
pub fn placeholder_image() -> &'static str {
    PLACEHOLDER_URL.as_str()
}

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Attachment,
    Url,
    Placeholder,
}

/// A displayable image URL (remote or `data:`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    pub origin: ImageOrigin,
}

impl ResolvedImage {
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self.origin, ImageOrigin::Placeholder)
    }
}

/// An inline image candidate: base64 payload plus its MIME type.
#[derive(Debug, Clone, Copy)]
pub struct InlineImage<'a> {
    pub content: &'a str,
    pub content_type: &'a str,
}

/// Anything that can carry an inline image and/or an image URL.
pub trait ImageSource {
    /// The inline candidate to try first, if any.
    fn inline_image(&self) -> Option<InlineImage<'_>>;

    /// The remote image URL, if any.
    fn image_url(&self) -> Option<&str>;
}

impl ImageSource for Product {
    fn inline_image(&self) -> Option<InlineImage<'_>> {
        primary_attachment(&self.image_attaches).map(|attach| InlineImage {
            content: &attach.file_content,
            content_type: &attach.content_type,
        })
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

impl ImageSource for Category {
    fn inline_image(&self) -> Option<InlineImage<'_>> {
        Some(InlineImage {
            content: self.image_content.as_deref()?,
            content_type: self.image_content_type.as_deref().unwrap_or_default(),
        })
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// Pick the attachment to display.
///
/// The one flagged `primary` wins. Otherwise the lowest `displayOrder`,
/// with ties and missing orders falling back to list position.
#[must_use]
pub fn primary_attachment(attaches: &[ProductImageAttach]) -> Option<&ProductImageAttach> {
    attaches.iter().find(|a| a.primary).or_else(|| {
        attaches
            .iter()
            .min_by_key(|a| a.display_order.unwrap_or(i64::MAX))
    })
}

/// Whether `content` is non-empty, canonical base64.
#[must_use]
pub fn is_valid_base64(content: &str) -> bool {
    if content.is_empty() {
        return false;
    }
    STANDARD
        .decode(content)
        .is_ok_and(|bytes| STANDARD.encode(bytes) == content)
}

/// Resolve the single image to display for `source`.
///
/// For products the inline candidate is the attachment flagged `primary`.
/// Without such a flag it is the attachment with the lowest `displayOrder`
/// rather than simply the first in the list; list position only breaks
/// ties and covers attachments with no order.
pub fn resolve_image<S: ImageSource + ?Sized>(source: &S) -> ResolvedImage {
    if let Some(inline) = source.inline_image() {
        if inline.content_type.trim().is_empty() {
            tracing::debug!("inline image has no content type, falling back");
        } else if is_valid_base64(inline.content) {
            return ResolvedImage {
                url: format!("data:{};base64,{}", inline.content_type, inline.content),
                origin: ImageOrigin::Attachment,
            };
        } else {
            tracing::debug!(
                content_len = inline.content.len(),
                "inline image is not valid base64, falling back"
            );
        }
    }

    if let Some(url) = source.image_url().map(str::trim).filter(|u| !u.is_empty()) {
        return ResolvedImage {
            url: url.to_string(),
            origin: ImageOrigin::Url,
        };
    }

    tracing::debug!("no usable image, using placeholder");
    ResolvedImage {
        url: placeholder_image().to_string(),
        origin: ImageOrigin::Placeholder,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn attach(content: &str, content_type: &str, primary: bool, order: Option<i64>) -> ProductImageAttach {
        ProductImageAttach {
            id: None,
            file_name: None,
            file_content: content.to_string(),
            content_type: content_type.to_string(),
            display_order: order,
            primary,
        }
    }

    fn product() -> Product {
        Product::new(1, "Lamp", Decimal::from(10))
    }

    #[test]
    fn test_valid_primary_attachment_becomes_data_url() {
        let mut p = product();
        p.image_url = Some("https://cdn.example.com/lamp.jpg".to_string());
        p.image_attaches = vec![
            attach("b3RoZXI=", "image/jpeg", false, Some(0)),
            attach("aGVsbG8=", "image/png", true, Some(1)),
        ];

        let image = resolve_image(&p);
        assert_eq!(image.url, "data:image/png;base64,aGVsbG8=");
        assert_eq!(image.origin, ImageOrigin::Attachment);
    }

    #[test]
    fn test_invalid_base64_falls_back_to_url() {
        let mut p = product();
        p.image_url = Some("https://cdn.example.com/lamp.jpg".to_string());
        p.image_attaches = vec![attach("not base64!!", "image/png", true, None)];

        let image = resolve_image(&p);
        assert_eq!(image.url, "https://cdn.example.com/lamp.jpg");
        assert_eq!(image.origin, ImageOrigin::Url);
    }

    #[test]
    fn test_empty_content_type_is_invalid() {
        let mut p = product();
        p.image_attaches = vec![attach("aGVsbG8=", "", true, None)];

        let image = resolve_image(&p);
        assert!(image.is_placeholder());
    }

    #[test]
    fn test_nothing_usable_gives_placeholder() {
        let mut p = product();
        p.image_url = Some("   ".to_string());

        let image = resolve_image(&p);
        assert!(image.url.starts_with("data:image/svg+xml;base64,"));
        assert!(image.is_placeholder());
    }

    #[test]
    fn test_placeholder_svg_content() {
        let encoded = placeholder_image()
            .strip_prefix("data:image/svg+xml;base64,")
            .unwrap();
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(svg.contains("Product Image"));
        assert!(svg.contains(r#"width="400""#));
    }

    #[test]
    fn test_primary_attachment_prefers_flag_then_display_order() {
        let attaches = vec![
            attach("YQ==", "image/png", false, Some(3)),
            attach("Yg==", "image/png", false, Some(1)),
            attach("Yw==", "image/png", false, None),
        ];
        assert_eq!(primary_attachment(&attaches).unwrap().file_content, "Yg==");

        let unordered = vec![
            attach("YQ==", "image/png", false, None),
            attach("Yg==", "image/png", false, None),
        ];
        assert_eq!(primary_attachment(&unordered).unwrap().file_content, "YQ==");
        assert!(primary_attachment(&[]).is_none());
    }

    #[test]
    fn test_unflagged_attachments_resolve_by_display_order() {
        let mut p = product();
        p.image_attaches = vec![
            attach("Zmlyc3Q=", "image/png", false, Some(2)),
            attach("c2Vjb25k", "image/webp", false, Some(0)),
        ];

        let image = resolve_image(&p);
        assert_eq!(image.url, "data:image/webp;base64,c2Vjb25k");
    }

    #[test]
    fn test_base64_validation() {
        assert!(is_valid_base64("aGVsbG8="));
        assert!(!is_valid_base64(""));
        assert!(!is_valid_base64("aGVsbG8"));
        assert!(!is_valid_base64("@@@@"));
    }

    #[test]
    fn test_category_inline_image() {
        let mut category = Category::new(1, "Garden");
        category.image_content = Some("aGVsbG8=".to_string());
        category.image_content_type = Some("image/webp".to_string());
        assert_eq!(resolve_image(&category).url, "data:image/webp;base64,aGVsbG8=");

        category.image_content_type = None;
        category.image_url = Some("https://cdn.example.com/garden.png".to_string());
        assert_eq!(resolve_image(&category).origin, ImageOrigin::Url);
    }
}
