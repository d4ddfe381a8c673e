// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Parses GitHub's `Link` response header into the next page's URL so
//! pagination can resume lazily from a [`PageCursor`] without the caller
//! tracking page numbers itself.
//!
//! [`PageCursor`]: ghsync_domain::services::github_client::PageCursor

use ghsync_domain::services::github_client::PageCursor;
use reqwest::header::HeaderMap;

/// Extracts the `rel="next"` URL from a `Link` header, if present.
pub fn next_cursor(headers: &HeaderMap) -> PageCursor {
    let Some(link) = headers.get(reqwest::header::LINK).and_then(|v| v.to_str().ok()) else {
        return PageCursor(None);
    };
    PageCursor(parse_next(link))
}

fn parse_next(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let mut segments = part.split(';');
        let url_part = segments.next()?.trim();
        let is_next = segments.any(|s| s.trim() == r#"rel="next""#);
        if is_next {
            let url = url_part.trim_start_matches('<').trim_end_matches('>');
            return Some(url.to_string());
        }
    }
    None
}
