//! Origin computation for the relay's trust boundary.
//!
//! The content frame is served from the frame domain, the host UI from the
//! main domain. The sender computes its parent's origin once at startup by
//! swapping the frame-domain hostname for the main-domain hostname,
//! preserving a `.local` development suffix. The host computes the expected
//! frame origin from the resolved frame URL the same way.

use crate::constants::LOCAL_SUFFIX;
use anyhow::{bail, Context, Result};
use url::Url;

/// Origin (`scheme://host[:port]`) of a URL.
pub fn origin_of(url_str: &str) -> Result<String> {
    let url = Url::parse(url_str).with_context(|| format!("invalid URL {url_str:?}"))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        bail!("URL {url_str:?} has an opaque origin");
    }
    Ok(origin.ascii_serialization())
}

/// Target origin the frame posts to, computed from the frame's own URL.
///
/// The hostname is replaced with the main domain; when the frame is served
/// from `<domain_frame>.local`, the main domain keeps the `.local` suffix
/// too. Scheme and port carry over unchanged.
pub fn parent_origin(frame_url: &str, domain_main: &str, domain_frame: &str) -> Result<String> {
    let mut url = Url::parse(frame_url).with_context(|| format!("invalid URL {frame_url:?}"))?;

    let host = url
        .host_str()
        .with_context(|| format!("frame URL {frame_url:?} has no host"))?;

    let main_host = if host == format!("{domain_frame}{LOCAL_SUFFIX}") {
        format!("{domain_main}{LOCAL_SUFFIX}")
    } else {
        domain_main.to_string()
    };

    url.set_host(Some(&main_host))
        .with_context(|| format!("cannot use {main_host:?} as a hostname"))?;

    let origin = url.origin();
    if !origin.is_tuple() {
        bail!("frame URL {frame_url:?} has an opaque origin");
    }
    Ok(origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of_drops_path_and_default_port() {
        assert_eq!(
            origin_of("https://ject.page/api/session/abc/page").expect("origin"),
            "https://ject.page"
        );
        assert_eq!(
            origin_of("http://ject.page.local:1850/x").expect("origin"),
            "http://ject.page.local:1850"
        );
    }

    #[test]
    fn test_parent_origin_swaps_frame_domain_for_main() {
        let origin = parent_origin("https://ject.page/api/session/abc/page", "ject.dev", "ject.page")
            .expect("origin");
        assert_eq!(origin, "https://ject.dev");
    }

    #[test]
    fn test_parent_origin_preserves_local_suffix_and_port() {
        let origin = parent_origin(
            "http://ject.page.local:1850/api/session/abc/page",
            "ject.dev",
            "ject.page",
        )
        .expect("origin");
        assert_eq!(origin, "http://ject.dev.local:1850");
    }

    #[test]
    fn test_parent_origin_without_local_suffix_uses_bare_main_domain() {
        // An unexpected frame host still maps onto the main domain; the
        // receiver's origin check is what actually gates trust.
        let origin =
            parent_origin("https://other.example/page", "ject.dev", "ject.page").expect("origin");
        assert_eq!(origin, "https://ject.dev");
    }

    #[test]
    fn test_invalid_url_is_an_error() {
        assert!(parent_origin("not a url", "ject.dev", "ject.page").is_err());
        assert!(origin_of("data:text/plain,hi").is_err());
    }
}
