// Sequential output numbering
//
// Generated files are named "NNN-<title>.<ext>". The next number is derived
// from whatever is already in the destination directory, so it is recomputed
// on every call and never stored. Two concurrent downloads into the same
// directory can therefore pick the same number; there is no lock.

use std::path::Path;

use super::models::ContainerFormat;

/// Whether the file name carries one of the extensions we can produce
fn is_media_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    ContainerFormat::ALL
        .iter()
        .any(|f| lower.ends_with(&format!(".{}", f.extension())))
}

/// Numeric prefix before the first '-', if any
fn parse_prefix(name: &str) -> Option<u32> {
    let (prefix, _) = name.split_once('-')?;
    prefix.parse().ok()
}

/// Next free number for `dir`: `max(existing) + 1`, or 1 when nothing parses
pub fn next_number(dir: &Path) -> u32 {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "cannot list output dir, starting at 1");
            return 1;
        }
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_media_file(name))
        .filter_map(|name| parse_prefix(&name))
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            File::create(dir.join(name)).unwrap();
        }
    }

    #[test]
    fn test_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(next_number(tmp.path()), 1);
    }

    #[test]
    fn test_max_plus_one() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), &["001-a.mp4", "002-b.mp4", "005-c.mp3"]);
        assert_eq!(next_number(tmp.path()), 6);
    }

    #[test]
    fn test_ignores_unparseable_and_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        touch(
            tmp.path(),
            &["video.mp4", "abc-def.mp4", "no_dash.mp3", "009-notes.txt", "-x.webm"],
        );
        assert_eq!(next_number(tmp.path()), 1);
    }

    #[test]
    fn test_all_container_extensions_count() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), &["003-a.webm", "010-b.mkv", "004-c.AVI"]);
        assert_eq!(next_number(tmp.path()), 11);
    }

    #[test]
    fn test_stable_for_same_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), &["007-stream.mp4"]);
        assert_eq!(next_number(tmp.path()), next_number(tmp.path()));
    }

    #[test]
    fn test_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(next_number(&tmp.path().join("nope")), 1);
    }
}
