//! License detection.
//!
//! Pure function from a repository root to an optional SPDX identifier:
//! the first existing file from a priority-ordered filename list is matched
//! against an ordered pattern table. A file that matches no pattern yields
//! `"Unknown"` with low confidence; no file at all yields `None`.

use std::path::Path;

/// Confidence of a license match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseConfidence {
    High,
    Medium,
    Low,
}

/// A detected license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedLicense {
    /// SPDX identifier, or `"Unknown"` when a license file exists but no
    /// pattern matches.
    pub identifier: String,
    pub confidence: LicenseConfidence,
}

/// Filenames checked in priority order.
const LICENSE_FILENAMES: &[&str] = &[
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "LICENSE-MIT",
    "LICENSE-APACHE",
    "LICENCE",
    "LICENCE.md",
    "COPYING",
    "COPYING.md",
    "UNLICENSE",
];

/// Ordered pattern table. Every pattern in a row must appear (case
/// sensitive) for the row to match; earlier rows win.
const LICENSE_PATTERNS: &[(&str, &[&str], LicenseConfidence)] = &[
    (
        "Apache-2.0",
        &["Apache License", "Version 2.0"],
        LicenseConfidence::High,
    ),
    (
        "MIT",
        &["Permission is hereby granted, free of charge"],
        LicenseConfidence::High,
    ),
    ("MIT", &["MIT License"], LicenseConfidence::Medium),
    (
        "AGPL-3.0-only",
        &["GNU AFFERO GENERAL PUBLIC LICENSE", "Version 3"],
        LicenseConfidence::High,
    ),
    (
        "LGPL-3.0-only",
        &["GNU LESSER GENERAL PUBLIC LICENSE", "Version 3"],
        LicenseConfidence::High,
    ),
    (
        "GPL-3.0-only",
        &["GNU GENERAL PUBLIC LICENSE", "Version 3"],
        LicenseConfidence::High,
    ),
    (
        "GPL-2.0-only",
        &["GNU GENERAL PUBLIC LICENSE", "Version 2"],
        LicenseConfidence::High,
    ),
    (
        "MPL-2.0",
        &["Mozilla Public License Version 2.0"],
        LicenseConfidence::High,
    ),
    (
        "BSD-3-Clause",
        &[
            "Redistribution and use",
            "Neither the name",
        ],
        LicenseConfidence::High,
    ),
    (
        "BSD-2-Clause",
        &["Redistribution and use"],
        LicenseConfidence::Medium,
    ),
    ("ISC", &["ISC License"], LicenseConfidence::High),
    (
        "Unlicense",
        &["This is free and unencumbered software"],
        LicenseConfidence::High,
    ),
    (
        "CC0-1.0",
        &["CC0 1.0 Universal"],
        LicenseConfidence::High,
    ),
];

/// Match license file content against the pattern table.
#[must_use]
pub fn classify_license_text(content: &str) -> DetectedLicense {
    for (identifier, patterns, confidence) in LICENSE_PATTERNS {
        if patterns.iter().all(|p| content.contains(p)) {
            return DetectedLicense {
                identifier: (*identifier).to_string(),
                confidence: *confidence,
            };
        }
    }
    DetectedLicense {
        identifier: "Unknown".to_string(),
        confidence: LicenseConfidence::Low,
    }
}

/// Detect the license of the tree rooted at `root`.
///
/// Returns `None` when no license file exists.
#[must_use]
pub fn detect_license(root: &Path) -> Option<DetectedLicense> {
    for filename in LICENSE_FILENAMES {
        let path = root.join(filename);
        if !path.is_file() {
            continue;
        }
        return match std::fs::read_to_string(&path) {
            Ok(content) => Some(classify_license_text(&content)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "license file unreadable");
                Some(DetectedLicense {
                    identifier: "Unknown".to_string(),
                    confidence: LicenseConfidence::Low,
                })
            }
        };
    }
    None
}
