//! CDN-aware image URL rewriting.
//!
//! Product images live on two CDNs. Cloudinary takes its transforms as a
//! path segment right after `/upload/`; Unsplash takes them as query
//! parameters. Anything else (payment-provider hosted images, other CDNs) is
//! passed through untouched.

/// Marker identifying Cloudinary URLs.
const CLOUDINARY_HOST: &str = "res.cloudinary.com";

/// Marker identifying Unsplash URLs.
const UNSPLASH_HOST: &str = "images.unsplash.com";

/// Path separator after which Cloudinary transforms are placed.
const CLOUDINARY_UPLOAD: &str = "/upload/";

/// Cloudinary asset used when a product has no image.
const FALLBACK_CLOUD: &str = "https://res.cloudinary.com/dts2hsdnj/image/upload";
const FALLBACK_ASSET: &str = "zinga/public/2000g_r2j2s1.png";

/// Default quality for [`optimized_image_url`] callers that don't care.
pub const DEFAULT_QUALITY: u8 = 80;

/// Rewrite an image URL for the requested width and quality.
///
/// | input | output |
/// |---|---|
/// | missing or blank | fallback Cloudinary asset at `width`/`quality` |
/// | Cloudinary | `q_{quality},w_{width},c_fill/` inserted after `/upload/` |
/// | Unsplash | query replaced with `auto=format&fit=crop&w=..&q=..` |
/// | other | unchanged |
///
/// Applying it to its own Cloudinary output replaces the existing transform
/// segment instead of stacking a second one.
///
/// # Example
///
/// ```
/// use zinga_core::optimized_image_url;
///
/// let url = optimized_image_url(
///     Some("https://images.unsplash.com/photo-1?auto=format&w=800&q=80"),
///     600,
///     80,
/// );
/// assert_eq!(
///     url,
///     "https://images.unsplash.com/photo-1?auto=format&fit=crop&w=600&q=80"
/// );
/// ```
#[must_use]
pub fn optimized_image_url(url: Option<&str>, width: u32, quality: u8) -> String {
    let transform = cloudinary_transform(width, quality);

    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return format!("{FALLBACK_CLOUD}/{transform}/{FALLBACK_ASSET}");
    };

    if url.contains(CLOUDINARY_HOST) {
        return rewrite_cloudinary(url, &transform);
    }

    if url.contains(UNSPLASH_HOST) {
        let base = url.split_once('?').map_or(url, |(base, _)| base);
        return format!("{base}?auto=format&fit=crop&w={width}&q={quality}");
    }

    url.to_string()
}

fn cloudinary_transform(width: u32, quality: u8) -> String {
    format!("q_{quality},w_{width},c_fill")
}

fn rewrite_cloudinary(url: &str, transform: &str) -> String {
    let Some((head, tail)) = url.split_once(CLOUDINARY_UPLOAD) else {
        return url.to_string();
    };

    // Drop a transform segment left by an earlier pass.
    let rest = match tail.split_once('/') {
        Some((segment, rest)) if is_transform_segment(segment) => rest,
        _ => tail,
    };

    format!("{head}{CLOUDINARY_UPLOAD}{transform}/{rest}")
}

/// Whether a path segment is a transform this module produces.
fn is_transform_segment(segment: &str) -> bool {
    let mut parts = segment.split(',');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(q), Some(w), Some("c_fill"), None)
            if q.strip_prefix("q_").is_some_and(is_digits)
                && w.strip_prefix("w_").is_some_and(is_digits)
    )
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
