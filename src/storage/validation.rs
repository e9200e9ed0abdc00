// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

/// Data file format names are 1 to 16 characters of lowercase ASCII letters,
/// digits, `_`, `-` and `.`.
pub fn is_valid_format_name(name: &str) -> bool {
    lazy_regex::regex_is_match!(r"^[a-z0-9_\-.]{1,16}$", name)
}
