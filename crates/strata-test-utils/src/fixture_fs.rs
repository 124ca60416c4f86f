use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a `(relative_path -> text)` map below `root`, creating directories
/// as needed. Paths ending in `/` create empty directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, text) in files {
        let rel = rel.trim_start_matches('/');
        if let Some(dir) = rel.strip_suffix('/') {
            fs::create_dir_all(root.join(dir)).expect("fixture dir creatable");
            continue;
        }
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("fixture dir creatable");
        }
        fs::write(&path, text).expect("fixture file writable");
    }
}

/// Load a directory into a `(relative_path -> text)` map.
pub fn load_tree(dir: &Path) -> BTreeMap<PathBuf, String> {
    fn visit_dir(
        root: &Path,
        dir: &Path,
        out: &mut BTreeMap<PathBuf, String>,
    ) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                visit_dir(root, &path, out)?;
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                let text = fs::read_to_string(&path)?;
                out.insert(rel, text);
            }
        }
        Ok(())
    }

    let mut out = BTreeMap::new();
    visit_dir(dir, dir, &mut out).expect("fixture dir readable");
    out
}
