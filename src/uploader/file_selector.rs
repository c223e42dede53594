use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::UploadSettings;
use crate::errors::{AppError, AppResult};

/// A local file that belongs to the requested document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub absolute_path: PathBuf,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct SelectorOptions {
    pub extension: String,
    pub case_insensitive: bool,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            extension: "pdf".to_string(),
            case_insensitive: false,
        }
    }
}

impl From<&UploadSettings> for SelectorOptions {
    fn from(settings: &UploadSettings) -> Self {
        Self {
            extension: settings.file_extension.clone(),
            case_insensitive: settings.case_insensitive_match,
        }
    }
}

/// Matches `<base>.<ext>` and `<base> part <N>.<ext>`
pub fn document_pattern(base_name: &str, options: &SelectorOptions) -> AppResult<Regex> {
    let pattern = format!(
        r"^{}(?: part \d+)?\.{}$",
        regex::escape(base_name),
        regex::escape(&options.extension)
    );

    RegexBuilder::new(&pattern)
        .case_insensitive(options.case_insensitive)
        .build()
        .map_err(|e| AppError::Internal(format!("Invalid file pattern: {}", e)))
}

/// Find every part of `base_name` in `directory`, in natural order.
pub fn select_files(
    directory: &Path,
    base_name: &str,
    options: &SelectorOptions,
) -> AppResult<Vec<FileCandidate>> {
    let pattern = document_pattern(base_name, options)?;
    let directory = fs::canonicalize(directory)?;

    let mut candidates = Vec::new();
    for entry in fs::read_dir(&directory)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();

        if !pattern.is_match(&file_name) {
            continue;
        }

        let path = entry.path();
        if !path.is_file() {
            log::debug!("Skipping non-file entry {}", path.display());
            continue;
        }

        candidates.push(FileCandidate {
            absolute_path: path,
            display_name: file_name,
        });
    }

    if candidates.is_empty() {
        return Err(AppError::no_matching_files(
            &directory.to_string_lossy(),
            base_name,
        ));
    }

    candidates.sort_by(|a, b| candidate_order(&a.display_name, &b.display_name));

    log::info!(
        "Selected {} file(s) for '{}': {:?}",
        candidates.len(),
        base_name,
        candidates.iter().map(|c| &c.display_name).collect::<Vec<_>>()
    );

    Ok(candidates)
}

/// Order by stem first so "doc.pdf" lands before "doc part 2.pdf"
pub fn candidate_order(a: &str, b: &str) -> Ordering {
    let stem = |name: &str| -> String {
        Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    };

    natural_cmp(&stem(a), &stem(b)).then_with(|| natural_cmp(a, b))
}

/// Human ordering: digit runs compare by value, so "part 2" < "part 10".
/// Ties fall back to byte order so the result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natord::compare(a, b).then_with(|| a.cmp(b))
}
