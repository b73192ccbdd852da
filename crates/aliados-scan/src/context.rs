//! Secure-context rule for camera access.
//!
//! Cameras may only be opened when the portal is served over HTTPS or from
//! the local machine (`localhost`, `127.0.0.1`, `::1`). Anything else,
//! including an origin that does not parse, is refused.

use std::net::Ipv4Addr;

use url::{Host, Url};

use crate::error::CameraAccessError;

/// Returns true if `origin` may use the camera.
pub fn is_secure_context(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin.trim()) else {
        return false;
    };

    if url.scheme() == "https" {
        return true;
    }

    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip == Ipv4Addr::LOCALHOST,
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Same check, as an error the scanner can surface.
pub fn ensure_secure_context(origin: &str) -> Result<(), CameraAccessError> {
    if is_secure_context(origin) {
        Ok(())
    } else {
        Err(CameraAccessError::InsecureContext {
            origin: origin.to_string(),
        })
    }
}
