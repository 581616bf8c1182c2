// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the presentation layer.
//
// Every technical error is mapped to a plain sentence with a clear suggestion.
// The severity drives how the caller presents it.

use crate::error::SeitenwerkError;

/// Who can fix the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A page expression or parameter needs correcting.
    InputProblem,
    /// A file is missing, damaged, or cannot be written.
    FileProblem,
    /// Something went wrong inside the document engine.
    Internal,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `SeitenwerkError` into something a user can act on.
pub fn humanize_error(err: &SeitenwerkError) -> HumanError {
    match err {
        SeitenwerkError::MalformedExpression { token } => HumanError {
            message: format!("\"{token}\" is not a page number or range."),
            suggestion: "Write pages like 1-3,5: single numbers or start-end pairs, separated by commas.".into(),
            severity: Severity::InputProblem,
        },

        SeitenwerkError::OutOfRange { page, max_page } => HumanError {
            message: format!("Page {page} does not exist."),
            suggestion: format!("This document has pages 1 to {max_page}."),
            severity: Severity::InputProblem,
        },

        SeitenwerkError::CountMismatch { targets, sources } => HumanError {
            message: "The number of pages to replace doesn't match.".into(),
            suggestion: format!(
                "You chose {targets} page(s) to replace but {sources} replacement page(s). Pick the same number on both sides."
            ),
            severity: Severity::InputProblem,
        },

        SeitenwerkError::InvalidParameter(detail) => HumanError {
            message: "One of the settings isn't valid.".into(),
            suggestion: format!("Check the value and try again. ({detail})"),
            severity: Severity::InputProblem,
        },

        SeitenwerkError::NoInput => HumanError {
            message: "No files were chosen.".into(),
            suggestion: "Add at least one PDF file, then try again.".into(),
            severity: Severity::InputProblem,
        },

        SeitenwerkError::Open { path, .. } => HumanError {
            message: format!("{path} couldn't be opened as a PDF."),
            suggestion: "The file may be damaged or not a PDF. Try opening it in a PDF viewer first.".into(),
            severity: Severity::FileProblem,
        },

        SeitenwerkError::Document(_) => HumanError {
            message: "There's a problem with the structure of this PDF.".into(),
            suggestion: "The file may be damaged. Try re-saving it from a PDF viewer, or use a different file.".into(),
            severity: Severity::FileProblem,
        },

        SeitenwerkError::Encryption(_) => HumanError {
            message: "The document couldn't be password-protected.".into(),
            suggestion: "Try again with a different password, or check the file isn't already protected.".into(),
            severity: Severity::Internal,
        },

        SeitenwerkError::OverlayResource(_) => HumanError {
            message: "The watermark image couldn't be read.".into(),
            suggestion: "Try saving the image as PNG or JPEG and choose it again.".into(),
            severity: Severity::FileProblem,
        },

        SeitenwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                severity: Severity::FileProblem,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: "Choose a folder you can write to, or close the file in other programs.".into(),
                severity: Severity::FileProblem,
            },
            std::io::ErrorKind::AlreadyExists => HumanError {
                message: "A file with that name already exists.".into(),
                suggestion: "Choose another name, or allow overwriting.".into(),
                severity: Severity::FileProblem,
            },
            _ => HumanError {
                message: "The file couldn't be read or written.".into(),
                suggestion: format!("Check there is enough disk space and try again. ({io_err})"),
                severity: Severity::FileProblem,
            },
        },

        SeitenwerkError::Config(_) | SeitenwerkError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Fix or delete the settings file; defaults will be used.".into(),
            severity: Severity::FileProblem,
        },
    }
}
