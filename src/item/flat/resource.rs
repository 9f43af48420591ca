use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};

/// Case-insensitive file name predicate: prefix and suffix.
#[derive(Debug, Clone)]
pub struct FileNameFilter {
    prefix: String,
    suffix: String,
}

impl FileNameFilter {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.to_lowercase(),
            suffix: suffix.to_lowercase(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        name.starts_with(&self.prefix) && name.ends_with(&self.suffix)
    }
}

/// Lists the regular files of `directory` accepted by `filter`, sorted by
/// file name.
///
/// A missing or unreadable directory yields an empty list: the job then runs
/// and inserts nothing. Unreadable entries are skipped.
pub fn select_resources(directory: &Path, filter: &FileNameFilter) -> Vec<PathBuf> {
    if !directory.is_dir() {
        warn!(
            "Source directory {} does not exist or is not a directory",
            directory.display()
        );
        return Vec::new();
    }

    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Unable to list {}: {}", directory.display(), e);
            return Vec::new();
        }
    };

    let mut resources: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!("Skipping unreadable entry of {}: {}", directory.display(), e);
                None
            }
        })
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .map(|name| filter.matches(&name.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();

    resources.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for resource in &resources {
        let absolute = resource.canonicalize().unwrap_or_else(|_| resource.clone());
        info!("Selected resource: {}", absolute.display());
    }

    resources
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{FileNameFilter, select_resources};

    fn address_filter() -> FileNameFilter {
        FileNameFilter::new("match_building", "txt")
    }

    #[test]
    fn filter_is_case_insensitive() {
        let filter = address_filter();

        assert!(filter.matches("match_building_01.txt"));
        assert!(filter.matches("MATCH_BUILDING_SEOUL.TXT"));
        assert!(filter.matches("Match_Buildingtxt"));
        assert!(!filter.matches("match_jibun_01.txt"));
        assert!(!filter.matches("match_building_01.csv"));
        assert!(!filter.matches("old_match_building.txt"));
    }

    #[test]
    fn selects_matching_files_sorted_by_name() {
        let dir = tempdir().unwrap();
        for name in [
            "match_building_02.txt",
            "MATCH_BUILDING_01.TXT",
            "other.txt",
            "match_building_03.csv",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("match_building_dir.txt")).unwrap();

        let selected = select_resources(dir.path(), &address_filter());

        let names: Vec<String> = selected
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["MATCH_BUILDING_01.TXT", "match_building_02.txt"]);
    }

    #[test]
    fn missing_directory_selects_nothing() {
        let dir = tempdir().unwrap();

        let selected = select_resources(&dir.path().join("missing"), &address_filter());

        assert!(selected.is_empty());
    }

    #[test]
    fn file_instead_of_directory_selects_nothing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("match_building_01.txt");
        fs::write(&file, "").unwrap();

        assert!(select_resources(&file, &address_filter()).is_empty());
    }
}
