// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn scan_finds_triggers_case_insensitively() {
    let found = scan_triggers("Everyone FENIX_DOWN now, this is a moon_crash");
    assert!(found.contains(&"fenix_down"));
    assert!(found.contains(&"moon_crash"));
}

#[test]
fn scan_ignores_unrelated_text() {
    assert!(scan_triggers("just a normal status update").is_empty());
}

#[test]
fn codebook_lists_every_word() {
    let codebook = format_trigger_codebook();
    for (word, _) in TRIGGER_WORDS {
        assert!(codebook.contains(word));
    }
}
