//! Scanning pipeline: sequential and parallel paths, single-owner merge.

use super::{DefinitionMap, ProjectRoot, ScanOptions, ScanStats};
use crate::definition::{parse_definition_bytes, EnvVarDefinition};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Batches with <= this many files are read sequentially
pub(crate) const SEQUENTIAL_THRESHOLD: usize = 64;
/// Bound on in-flight parsed files between producers and the merger
const CHANNEL_CAPACITY: usize = 64;

/// Read one definition file. Invalid UTF-8 is replaced rather than rejected.
fn read_definition_file(path: &Path) -> std::io::Result<Vec<EnvVarDefinition>> {
    let bytes = fs::read(path)?;
    Ok(parse_definition_bytes(path, &bytes))
}

/// Outcome of reading a list of files into a fresh map
#[derive(Debug, Default)]
struct FileScan {
    map: DefinitionMap,
    files_scanned: usize,
    files_skipped: usize,
}

/// Discover definition files under `roots` and build a new map.
pub fn scan(options: &ScanOptions, roots: &[ProjectRoot]) -> (DefinitionMap, ScanStats) {
    let start = Instant::now();
    let roots_excluded = roots.iter().filter(|r| options.is_root_excluded(r)).count();

    let files = options.discover(roots);
    let FileScan {
        map,
        files_scanned,
        files_skipped,
    } = scan_paths(&files);

    let stats = ScanStats {
        roots_scanned: roots.len() - roots_excluded,
        roots_excluded,
        files_scanned,
        files_skipped,
        definitions: map.definition_count(),
        names: map.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    (map, stats)
}

/// Build a map from an explicit file list, preserving list order per name.
pub fn scan_files(files: &[PathBuf]) -> DefinitionMap {
    scan_paths(files).map
}

fn scan_paths(files: &[PathBuf]) -> FileScan {
    if files.len() <= SEQUENTIAL_THRESHOLD {
        scan_sequential(files)
    } else {
        scan_parallel(files)
    }
}

fn scan_sequential(files: &[PathBuf]) -> FileScan {
    let mut scan = FileScan::default();
    for path in files {
        match read_definition_file(path) {
            Ok(definitions) => {
                tracing::debug!(path = %path.display(), count = definitions.len(), "scanned");
                scan.files_scanned += 1;
                for definition in definitions {
                    scan.map.put(definition);
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable definition file");
                scan.files_skipped += 1;
            }
        }
    }
    scan
}

/// Rayon producers read files concurrently; the calling thread is the only
/// writer. Results arrive out of order, so they are slotted by file ordinal
/// and merged in discovery order.
fn scan_parallel(files: &[PathBuf]) -> FileScan {
    type Parsed = (usize, std::io::Result<Vec<EnvVarDefinition>>);
    let (tx, rx) = crossbeam_channel::bounded::<Parsed>(CHANNEL_CAPACITY);

    let mut slots: Vec<Option<std::io::Result<Vec<EnvVarDefinition>>>> =
        (0..files.len()).map(|_| None).collect();

    std::thread::scope(|s| {
        let producer = tx.clone();
        s.spawn(move || {
            files
                .par_iter()
                .enumerate()
                .for_each_with(producer, |sender, (ordinal, path)| {
                    // Receiver lives until the scope ends, so send only fails on a bug.
                    let _ = sender.send((ordinal, read_definition_file(path)));
                });
        });

        // Only the producer's sender keeps the channel open
        drop(tx);

        for (ordinal, parsed) in rx.iter() {
            slots[ordinal] = Some(parsed);
        }
    });

    let mut scan = FileScan::default();
    for (path, slot) in files.iter().zip(slots) {
        match slot {
            Some(Ok(definitions)) => {
                scan.files_scanned += 1;
                for definition in definitions {
                    scan.map.put(definition);
                }
            }
            Some(Err(err)) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable definition file");
                scan.files_skipped += 1;
            }
            None => scan.files_skipped += 1,
        }
    }
    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, text: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_sequential_path_scans_small_batch() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/service.env", "PORT=8080\n# note\nHOST=a\n");
        write(dir.path(), "lib/shared.env", "PORT=9090\n");

        let options = ScanOptions::from_config(&ScanConfig::default()).unwrap();
        let (map, stats) = scan(&options, &[ProjectRoot::new(dir.path())]);

        assert_eq!(stats.files_scanned, 2);
        assert_eq!(stats.files_skipped, 0);
        assert_eq!(stats.definitions, 3);
        assert_eq!(stats.names, 2);
        assert_eq!(stats.roots_scanned, 1);

        let ports: Vec<&str> = map.get("PORT").iter().map(|d| d.value()).collect();
        assert_eq!(ports, vec!["8080", "9090"]);
    }

    #[test]
    fn test_parallel_path_preserves_discovery_order() {
        // > SEQUENTIAL_THRESHOLD files to force the parallel path
        let dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..SEQUENTIAL_THRESHOLD + 16)
            .map(|i| write(dir.path(), &format!("d{i:03}/x.env"), &format!("N={i}\nF{i}=y\n")))
            .collect();

        let map = scan_files(&files);
        assert_eq!(map.definition_count(), files.len() * 2);

        let values: Vec<String> = map.get("N").iter().map(|d| d.value().to_string()).collect();
        let expected: Vec<String> = (0..files.len()).map(|i| i.to_string()).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "good.env", "A=1\n");
        let missing = dir.path().join("missing.env");

        let scan = scan_paths(&[missing, good]);
        assert_eq!(scan.files_scanned, 1);
        assert_eq!(scan.files_skipped, 1);
        assert_eq!(scan.map.get("A").len(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_read_lossily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bin.env");
        fs::write(&path, b"A=\xff\xfe\nB=ok\n").unwrap();

        let map = scan_files(&[path]);
        assert_eq!(map.get("B")[0].value(), "ok");
        assert_eq!(map.get("A").len(), 1);
        // line start in the file, not in the decoded text
        assert_eq!(map.get("B")[0].location().offset, 5);
        assert_eq!(map.get("B")[0].location().line, 1);
    }
}
