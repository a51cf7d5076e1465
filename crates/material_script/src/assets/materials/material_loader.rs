//! Material loader for script files
//!
//! Reads `materials.cs` files from disk, decodes their records and resolves
//! texture references relative to the declaring file.

use std::fs;
use std::path::{Path, PathBuf};

use super::material::Material;
use super::script_parser::{MaterialScriptParser, RawMaterial};
use crate::config::LoaderConfig;
use crate::MaterialError;

/// Material loader for creating [`Material`] instances from script files
pub struct MaterialLoader;

impl MaterialLoader {
    /// Load every material from script text
    ///
    /// # Arguments
    /// * `source` - Script text
    /// * `origin` - Label used in error locations
    pub fn load_str(source: &str, origin: &str) -> Result<Vec<Material>, MaterialError> {
        MaterialScriptParser::parse(source, origin)?
            .iter()
            .map(Material::from_raw)
            .collect()
    }

    /// Load every material from a script file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Material>, MaterialError> {
        let path = path.as_ref();
        let contents = Self::read(path)?;
        let materials = Self::load_str(&contents, &path.display().to_string())?;
        log::debug!("Loaded {} material(s) from {:?}", materials.len(), path);
        Ok(materials)
    }

    /// Parse a script file into raw records without decoding values
    pub fn read_raw(path: impl AsRef<Path>) -> Result<Vec<RawMaterial>, MaterialError> {
        let path = path.as_ref();
        let contents = Self::read(path)?;
        MaterialScriptParser::parse_records(&contents, &path.display().to_string())
    }

    /// Find every material script below `root`
    ///
    /// Directories are walked recursively; file names are compared against
    /// `config.file_name` case-insensitively. If `root` is itself a file it
    /// is returned as is.
    ///
    /// # Returns
    /// Script paths in sorted order
    pub fn find_material_files(root: impl AsRef<Path>, config: &LoaderConfig) -> Result<Vec<PathBuf>, MaterialError> {
        let root = root.as_ref();
        let metadata = fs::metadata(root).map_err(|e| MaterialError::io(root, e))?;
        if metadata.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut found = Vec::new();
        Self::walk(root, &config.file_name, &mut found)?;
        found.sort();
        log::debug!("Found {} material script(s) under {:?}", found.len(), root);
        Ok(found)
    }

    fn walk(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<(), MaterialError> {
        let entries = fs::read_dir(dir).map_err(|e| MaterialError::io(dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| MaterialError::io(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| MaterialError::io(&path, e))?;

            if file_type.is_dir() {
                Self::walk(&path, file_name, found)?;
            } else if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(file_name))
            {
                found.push(path);
            }
        }

        Ok(())
    }

    /// Resolve a texture reference to an existing file
    ///
    /// References are relative to `script_dir`. A reference with an extension
    /// is tried as written first; then the reference without its extension is
    /// probed with each configured extension in order.
    ///
    /// # Returns
    /// The first existing candidate, or `None`
    pub fn resolve_texture(script_dir: &Path, texture: &str, config: &LoaderConfig) -> Option<PathBuf> {
        let texture = texture.trim();
        if texture.is_empty() {
            return None;
        }

        let written = script_dir.join(texture);
        if written.extension().is_some() && written.is_file() {
            return Some(written);
        }

        let stem = if written.extension().is_some() {
            written.with_extension("")
        } else {
            written
        };

        config
            .texture_extensions
            .iter()
            .map(|ext| stem.with_extension(ext.trim_start_matches('.')))
            .find(|candidate| candidate.is_file())
    }

    fn read(path: &Path) -> Result<String, MaterialError> {
        fs::read_to_string(path).map_err(|e| MaterialError::io(path, e))
    }
}
