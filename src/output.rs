use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::{ExporterError, Result, WriteFailure};
use crate::render::{Format, Rendered};

// ======================================================
// PLAN
// ======================================================

/// Files an export would write into `dir`, with their contents.
pub fn planned_files<'a>(
    rendered: &'a Rendered,
    format: Format,
    dir: &Path,
    today: NaiveDate,
) -> Vec<(PathBuf, &'a str)> {
    match rendered {
        Rendered::Text(text) => {
            let filename = format!(
                "docker_dump-{}.{}",
                today.format("%Y_%m_%d"),
                format.extension()
            );
            vec![(dir.join(filename), text.as_str())]
        }
        Rendered::Manifests(manifests) => manifests
            .iter()
            .map(|(service, content)| (dir.join(format!("{}.yml", service)), content.as_str()))
            .collect(),
    }
}

/// What goes to stdout for `rendered`.
pub fn stdout_text(rendered: &Rendered) -> String {
    match rendered {
        Rendered::Text(text) => text.clone(),
        Rendered::Manifests(manifests) => manifests
            .iter()
            .map(|(service, content)| format!("# {}\n{}\n---\n", service, content))
            .collect(),
    }
}

// ======================================================
// DISPATCH
// ======================================================

/// Writes the export files (when `output_dir` is set), then the stdout text.
///
/// Every file is attempted; failures are reported together and nothing is
/// printed, so a failed export never also looks like a successful one.
pub fn dispatch<W: Write>(
    rendered: &Rendered,
    format: Format,
    output_dir: Option<&Path>,
    today: NaiveDate,
    stdout: &mut W,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if let Some(dir) = output_dir {
        let mut failures = Vec::new();

        match fs::create_dir_all(dir) {
            Ok(()) => {
                for (path, content) in planned_files(rendered, format, dir, today) {
                    info!("Writing to {}", path.display());

                    match fs::write(&path, content) {
                        Ok(()) => written.push(path),
                        Err(source) => failures.push(WriteFailure { path, source }),
                    }
                }
            }
            Err(source) => failures.push(WriteFailure {
                path: dir.to_path_buf(),
                source,
            }),
        }

        if !failures.is_empty() {
            return Err(ExporterError::Write(failures));
        }
    }

    writeln!(stdout, "{}", stdout_text(rendered)).map_err(|source| {
        ExporterError::Write(vec![WriteFailure {
            path: PathBuf::from("<stdout>"),
            source,
        }])
    })?;

    Ok(written)
}
