// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn numbered_endpoints_skip_blanks() {
    let endpoints = Endpoint::numbered("http://127.0.0.1:9222, ,http://127.0.0.1:9223 ".split(','));
    assert_eq!(
        endpoints,
        vec![
            Endpoint::new("browser-1", "http://127.0.0.1:9222"),
            Endpoint::new("browser-2", "http://127.0.0.1:9223"),
        ]
    );
}
