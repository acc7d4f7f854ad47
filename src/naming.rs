//! Output filenames for previews.
//!
//! The preview keeps the input's full file name, extension included, and
//! appends `.jpg`. Sections of a stack get a zero-based `_section<i>` suffix:
//!
//! - `grid.mrc` → `grid.mrc.jpg`
//! - `tilt.mrcs`, section 2 → `tilt.mrcs_section2.jpg`
//!
//! Only the final path component is used, so two inputs with the same file
//! name in different directories map to the same output and the later write
//! wins.

use std::path::{Path, PathBuf};

pub const OUTPUT_EXTENSION: &str = "jpg";

/// Preview file name for `input`, or for one `section` of it.
///
/// A path with no final component (`/`, `..`) falls back to its full
/// display form.
pub fn output_filename(input: &Path, section: Option<usize>) -> String {
    let base = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    match section {
        Some(i) => format!("{base}_section{i}.{OUTPUT_EXTENSION}"),
        None => format!("{base}.{OUTPUT_EXTENSION}"),
    }
}

/// Where the preview for `input` is written inside `output_dir`.
pub fn output_path(output_dir: &Path, input: &Path, section: Option<usize>) -> PathBuf {
    output_dir.join(output_filename(input, section))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_image_keeps_extension() {
        assert_eq!(output_filename(Path::new("a.mrc"), None), "a.mrc.jpg");
    }

    #[test]
    fn directories_are_dropped() {
        assert_eq!(
            output_filename(Path::new("/data/session1/grid_03.mrc"), None),
            "grid_03.mrc.jpg"
        );
    }

    #[test]
    fn sections_are_zero_based_suffixes() {
        assert_eq!(
            output_filename(Path::new("stack.mrcs"), Some(0)),
            "stack.mrcs_section0.jpg"
        );
        assert_eq!(
            output_filename(Path::new("stack.mrcs"), Some(12)),
            "stack.mrcs_section12.jpg"
        );
    }

    #[test]
    fn file_without_extension() {
        assert_eq!(output_filename(Path::new("micrograph"), None), "micrograph.jpg");
    }

    #[test]
    fn output_path_joins_directory() {
        assert_eq!(
            output_path(Path::new("/out"), Path::new("in/b.mrc"), Some(1)),
            PathBuf::from("/out/b.mrc_section1.jpg")
        );
    }

    #[test]
    fn same_name_in_different_directories_collides() {
        let a = output_path(Path::new("/out"), Path::new("/one/x.mrc"), None);
        let b = output_path(Path::new("/out"), Path::new("/two/x.mrc"), None);
        assert_eq!(a, b);
    }
}
