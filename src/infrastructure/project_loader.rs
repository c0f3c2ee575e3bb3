use cargo_metadata::MetadataCommand;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

pub struct ProjectLoader;

impl ProjectLoader {
    /// Load all source files from a Cargo workspace manifest.
    /// Returns a vector of (file_path, file_content).
    pub fn load_workspace(manifest_path: &str) -> Result<Vec<(String, String)>> {
        let metadata = MetadataCommand::new()
            .manifest_path(manifest_path)
            .no_deps()
            .exec()
            .context("Failed to execute cargo metadata")?;

        let mut files = Vec::new();

        for package_id in &metadata.workspace_members {
            if let Some(package) = metadata.packages.iter().find(|p| &p.id == package_id) {
                for target in &package.targets {
                    if !target
                        .kind
                        .iter()
                        .any(|k| k == "lib" || k == "bin" || k == "proc-macro")
                    {
                        continue;
                    }

                    let src_path = &target.src_path;
                    let src_dir = src_path.parent().unwrap_or(src_path);
                    Self::collect_rs_recursive(src_dir.as_std_path(), &mut files)?;
                }
            }
        }

        // Dedup files if multiple targets point at the same sources.
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files.dedup_by(|a, b| a.0 == b.0);

        Ok(files)
    }

    /// Recursively load every `.rs` file under a folder.
    pub fn load_folder(dir: &str) -> Result<Vec<(String, String)>> {
        let mut files = Vec::new();
        Self::collect_rs_recursive(Path::new(dir), &mut files)?;
        Ok(files)
    }

    fn collect_rs_recursive(dir: &Path, out: &mut Vec<(String, String)>) -> Result<()> {
        if dir.ends_with("target") || dir.ends_with(".git") {
            return Ok(());
        }
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory: {}", dir.display()))?
            .flatten()
        {
            let path = entry.path();
            if path.is_dir() {
                Self::collect_rs_recursive(&path, out)?;
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                if let Ok(content) = fs::read_to_string(&path) {
                    out.push((path.to_string_lossy().to_string(), content));
                }
            }
        }
        Ok(())
    }
}
