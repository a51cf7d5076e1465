//! Material registry keyed by name
//!
//! Materials are referenced by name from mesh assets, so a name may be
//! registered only once across every loaded file. Names compare
//! case-insensitively.

use std::collections::HashMap;
use std::path::Path;

use super::material::Material;
use super::material_loader::MaterialLoader;
use crate::config::LoaderConfig;
use crate::foundation::collections::{HandleMap, TypedHandle};
use crate::MaterialError;

/// Stable handle to a registered material
pub type MaterialHandle = TypedHandle<Material>;

/// Registry of uniquely named materials
#[derive(Default)]
pub struct MaterialLibrary {
    materials: HandleMap<Material>,
    by_name: HashMap<String, MaterialHandle>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material
    ///
    /// # Returns
    /// The new handle, or `DuplicateName` if the name is taken
    pub fn insert(&mut self, material: Material) -> Result<MaterialHandle, MaterialError> {
        self.check_available(&material)?;
        Ok(self.insert_unchecked(material))
    }

    /// Register a batch of materials, all or none
    pub fn insert_all(&mut self, materials: Vec<Material>) -> Result<Vec<MaterialHandle>, MaterialError> {
        let mut batch: HashMap<String, &Material> = HashMap::new();
        for material in &materials {
            self.check_available(material)?;
            if let Some(first) = batch.insert(material.name.to_ascii_lowercase(), material) {
                return Err(duplicate(first, material));
            }
        }

        Ok(materials.into_iter().map(|m| self.insert_unchecked(m)).collect())
    }

    /// Load and register every material of a script file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<MaterialHandle>, MaterialError> {
        let materials = MaterialLoader::load_file(path)?;
        self.insert_all(materials)
    }

    /// Load and register every script below `root`
    ///
    /// Stops at the first file that fails; files loaded before it stay registered.
    ///
    /// # Returns
    /// Number of materials registered
    pub fn load_dir(&mut self, root: impl AsRef<Path>, config: &LoaderConfig) -> Result<usize, MaterialError> {
        let mut count = 0;
        for path in MaterialLoader::find_material_files(root, config)? {
            count += self.load_file(&path)?.len();
        }
        log::info!("Material library holds {} material(s)", self.len());
        Ok(count)
    }

    /// Look up a material by name
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.handle(name).and_then(|h| self.get_by_handle(h))
    }

    /// Look up a material by name, failing with `NotFound`
    pub fn require(&self, name: &str) -> Result<&Material, MaterialError> {
        self.get(name).ok_or_else(|| MaterialError::NotFound(name.to_string()))
    }

    /// Handle of a named material
    pub fn handle(&self, name: &str) -> Option<MaterialHandle> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    /// Look up a material by handle
    pub fn get_by_handle(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.key())
    }

    /// Every material bound to a mesh texture slot
    pub fn find_by_map_to(&self, slot: &str) -> Vec<&Material> {
        let mut found: Vec<&Material> = self
            .materials
            .values()
            .filter(|m| m.map_to.eq_ignore_ascii_case(slot))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Remove a material by name
    pub fn remove(&mut self, name: &str) -> Option<Material> {
        let handle = self.by_name.remove(&name.to_ascii_lowercase())?;
        self.materials.remove(handle.key())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.values().map(|m| m.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over all materials in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.materials.iter().map(|(key, m)| (MaterialHandle::new(key), m))
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether no material is registered
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    fn check_available(&self, material: &Material) -> Result<(), MaterialError> {
        match self.get(&material.name) {
            Some(existing) => Err(duplicate(existing, material)),
            None => Ok(()),
        }
    }

    fn insert_unchecked(&mut self, material: Material) -> MaterialHandle {
        let name = material.name.to_ascii_lowercase();
        let handle = MaterialHandle::new(self.materials.insert(material));
        self.by_name.insert(name, handle);
        handle
    }
}

fn duplicate(first: &Material, second: &Material) -> MaterialError {
    MaterialError::DuplicateName {
        name: second.name.clone(),
        first: first.location.clone(),
        second: second.location.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceLocation;

    fn material(name: &str, map_to: &str, origin: &str) -> Material {
        let mut m = Material::new(name, SourceLocation::new(origin, 1, 1));
        m.map_to = map_to.to_string();
        m
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut library = MaterialLibrary::new();
        let handle = library.insert(material("Conifer04_Tall_ConBare01", "ConBare01", "tree.cs")).unwrap();

        assert_eq!(library.len(), 1);
        assert_eq!(library.get("conifer04_tall_conbare01").unwrap().map_to, "ConBare01");
        assert_eq!(library.handle("Conifer04_Tall_ConBare01"), Some(handle));
        assert_eq!(library.get_by_handle(handle).unwrap().name, "Conifer04_Tall_ConBare01");
        assert!(matches!(library.require("Nope"), Err(MaterialError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_names_are_rejected_across_files() {
        let mut library = MaterialLibrary::new();
        library.insert(material("Wood", "wood", "a.cs")).unwrap();

        match library.insert(material("WOOD", "wood", "b.cs")).unwrap_err() {
            MaterialError::DuplicateName { first, second, .. } => {
                assert_eq!(first.origin, "a.cs");
                assert_eq!(second.origin, "b.cs");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_insert_all_is_atomic() {
        let mut library = MaterialLibrary::new();
        library.insert(material("Taken", "t", "a.cs")).unwrap();

        let batch = vec![material("Fresh", "f", "b.cs"), material("Taken", "t", "b.cs")];
        assert!(library.insert_all(batch).is_err());
        assert!(library.get("Fresh").is_none());

        let batch = vec![material("One", "x", "c.cs"), material("one", "x", "c.cs")];
        assert!(library.insert_all(batch).is_err());
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_find_by_map_to_and_remove() {
        let mut library = MaterialLibrary::new();
        library.insert(material("B_Bark", "BarkConif04", "a.cs")).unwrap();
        library.insert(material("A_Bark", "barkconif04", "b.cs")).unwrap();
        library.insert(material("Needles", "ConBare01", "a.cs")).unwrap();

        let names: Vec<&str> = library.find_by_map_to("BarkConif04").iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A_Bark", "B_Bark"]);
        assert_eq!(library.names(), vec!["A_Bark", "B_Bark", "Needles"]);

        let removed = library.remove("b_bark").unwrap();
        assert_eq!(removed.name, "B_Bark");
        assert!(library.get("B_Bark").is_none());
        assert_eq!(library.iter().count(), 2);

        library.insert(material("B_Bark", "BarkConif04", "c.cs")).unwrap();
        assert_eq!(library.len(), 3);
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        let shack = dir.path().join("SHACK");
        std::fs::create_dir_all(&shack).unwrap();
        std::fs::write(
            shack.join("materials.cs"),
            "singleton Material(Shack_conc01) { mapTo = \"conc01\"; };\n\
             singleton Material(Shack_wood) { mapTo = \"BumpWood01\"; };\n",
        )
        .unwrap();

        let mut library = MaterialLibrary::new();
        let count = library.load_dir(dir.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(library.find_by_map_to("conc01").len(), 1);

        // loading the same tree twice collides with itself
        assert!(matches!(
            library.load_dir(dir.path(), &LoaderConfig::default()),
            Err(MaterialError::DuplicateName { .. })
        ));
    }
}
