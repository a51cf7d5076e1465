//! Structural validation of material script corpora
//!
//! A [`Validator`] checks every file it is given and keeps going after
//! problems, collecting them as [`Diagnostic`]s in a [`Report`]. Name
//! uniqueness is checked across all files of one run.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use serde::Serialize;

use super::material_loader::MaterialLoader;
use super::property::{PropertyKey, PropertyValue, ValueKind};
use super::script_parser::{MaterialScriptParser, RawMaterial};
use crate::config::{ConfigError, LoaderConfig, ToolkitConfig};
use crate::{MaterialError, SourceLocation};

bitflags! {
    /// Set of checks a validation run performs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Checks: u32 {
        /// Material names are unique across the corpus
        const UNIQUE_NAMES = 1 << 0;
        /// Records are syntactically well formed
        const BALANCED = 1 << 1;
        /// Property keys are in the recognized set
        const KNOWN_KEYS = 1 << 2;
        /// Numbers, colors and flags decode
        const NUMERIC_FIELDS = 1 << 3;
        /// `mapTo` is present and non-empty
        const MAP_TO = 1 << 4;
        /// Referenced texture files exist
        const TEXTURES = 1 << 5;
        /// `translucentBlendOp` names a known operation
        const BLEND_OP = 1 << 6;
    }
}

const CHECK_NAMES: &[(&str, Checks)] = &[
    ("unique_names", Checks::UNIQUE_NAMES),
    ("balanced", Checks::BALANCED),
    ("known_keys", Checks::KNOWN_KEYS),
    ("numeric_fields", Checks::NUMERIC_FIELDS),
    ("map_to", Checks::MAP_TO),
    ("textures", Checks::TEXTURES),
    ("blend_op", Checks::BLEND_OP),
];

impl Checks {
    /// Resolve check names such as `"unique_names"`; `"all"` selects every check
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        let mut checks = Self::empty();
        for name in names {
            let name = name.as_ref().trim();
            if name.eq_ignore_ascii_case("all") {
                checks |= Self::all();
                continue;
            }
            let (_, flag) = CHECK_NAMES
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .ok_or_else(|| format!("unknown check '{name}'"))?;
            checks |= *flag;
        }
        Ok(checks)
    }

    /// Names of the selected checks
    pub fn names(&self) -> Vec<&'static str> {
        CHECK_NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Name of a single check
    pub fn name(&self) -> &'static str {
        CHECK_NAMES
            .iter()
            .find(|(_, flag)| flag == self)
            .map_or("io", |(name, _)| *name)
    }
}

impl Default for Checks {
    /// Everything except the filesystem texture lookup
    fn default() -> Self {
        Self::all() - Self::TEXTURES
    }
}

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but loadable
    Warning,
    /// Breaks loading or lookup
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One problem found during validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// How serious it is
    pub severity: Severity,
    /// Name of the check that produced it
    pub check: &'static str,
    /// Where it was found
    pub location: SourceLocation,
    /// Material involved, if any
    pub material: Option<String>,
    /// Human readable description
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}: {}", self.severity, self.check, self.location, self.message)
    }
}

/// Outcome of a validation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Files examined
    pub files: usize,
    /// Material records found
    pub materials: usize,
    /// Problems, ordered by file, line and column
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Number of error diagnostics
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning diagnostics
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Whether any error was found
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Whether nothing at all was found
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics produced by one check
    pub fn by_check(&self, check: Checks) -> impl Iterator<Item = &Diagnostic> {
        let name = check.name();
        self.diagnostics.iter().filter(move |d| d.check == name)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }
}

/// Runs structural checks over material scripts
#[derive(Debug, Clone)]
pub struct Validator {
    checks: Checks,
    extra_properties: HashSet<String>,
    max_specular_power: f32,
    loader: LoaderConfig,
}

impl Validator {
    /// Create a validator running `checks` with default limits
    pub fn new(checks: Checks) -> Self {
        Self {
            checks,
            extra_properties: HashSet::new(),
            max_specular_power: crate::config::ValidationConfig::default().max_specular_power,
            loader: LoaderConfig::default(),
        }
    }

    /// Create a validator from configuration
    pub fn from_config(config: &ToolkitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            checks: config.validation.checks()?,
            extra_properties: config
                .validation
                .extra_properties
                .iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
            max_specular_power: config.validation.max_specular_power,
            loader: config.loader.clone(),
        })
    }

    /// Add checks to the run
    pub fn with_checks(mut self, checks: Checks) -> Self {
        self.checks |= checks;
        self
    }

    /// Accept a property name outside the recognized set
    pub fn allow_property(mut self, name: &str) -> Self {
        self.extra_properties.insert(name.to_ascii_lowercase());
        self
    }

    /// Checks this validator runs
    pub const fn checks(&self) -> Checks {
        self.checks
    }

    /// Validate script files as one corpus
    pub fn validate_files<P: AsRef<Path>>(&self, paths: &[P]) -> Report {
        let mut run = Run::new(self);
        for path in paths {
            let path = path.as_ref();
            match std::fs::read_to_string(path) {
                Ok(source) => run.check_source(&path.display().to_string(), &source, path.parent()),
                Err(e) => {
                    run.files += 1;
                    run.push(
                        Severity::Error,
                        "io",
                        SourceLocation::new(path.display().to_string(), 0, 0),
                        None,
                        format!("cannot read file: {e}"),
                    );
                }
            }
        }
        run.finish()
    }

    /// Find scripts below `root` and validate them as one corpus
    pub fn validate_dir(&self, root: impl AsRef<Path>) -> Result<Report, MaterialError> {
        let files: Vec<PathBuf> = MaterialLoader::find_material_files(root, &self.loader)?;
        Ok(self.validate_files(&files))
    }

    /// Validate script text; texture references are not checked
    pub fn validate_str(&self, origin: &str, source: &str) -> Report {
        let mut run = Run::new(self);
        run.check_source(origin, source, None);
        run.finish()
    }
}

/// State of one validation run
struct Run<'a> {
    validator: &'a Validator,
    seen: HashMap<String, SourceLocation>,
    files: usize,
    materials: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Run<'a> {
    fn new(validator: &'a Validator) -> Self {
        Self {
            validator,
            seen: HashMap::new(),
            files: 0,
            materials: 0,
            diagnostics: Vec::new(),
        }
    }

    fn enabled(&self, check: Checks) -> bool {
        self.validator.checks.contains(check)
    }

    fn push(
        &mut self,
        severity: Severity,
        check: &'static str,
        location: SourceLocation,
        material: Option<&str>,
        message: String,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            check,
            location,
            material: material.map(ToString::to_string),
            message,
        });
    }

    fn check_source(&mut self, origin: &str, source: &str, script_dir: Option<&Path>) {
        self.files += 1;

        let records = match MaterialScriptParser::parse_records(source, origin) {
            Ok(records) => records,
            Err(e) => {
                if self.enabled(Checks::BALANCED) {
                    let location = e
                        .location()
                        .cloned()
                        .unwrap_or_else(|| SourceLocation::new(origin, 0, 0));
                    let message = match e {
                        MaterialError::Parse { message, .. } => message,
                        other => other.to_string(),
                    };
                    self.push(Severity::Error, Checks::BALANCED.name(), location, None, message);
                } else {
                    log::warn!("Skipping {origin}: {e}");
                }
                return;
            }
        };

        for record in &records {
            self.materials += 1;
            self.check_name(record);
            self.check_map_to(record);
            self.check_properties(record, script_dir);
        }
    }

    fn check_name(&mut self, record: &RawMaterial) {
        if !self.enabled(Checks::UNIQUE_NAMES) {
            return;
        }
        let key = record.name.to_ascii_lowercase();
        if let Some(first) = self.seen.get(&key) {
            let message = format!("material '{}' is already declared at {first}", record.name);
            self.push(
                Severity::Error,
                Checks::UNIQUE_NAMES.name(),
                record.location.clone(),
                Some(&record.name),
                message,
            );
        } else {
            self.seen.insert(key, record.location.clone());
        }
    }

    fn check_map_to(&mut self, record: &RawMaterial) {
        if !self.enabled(Checks::MAP_TO) {
            return;
        }
        let message = match record.get("mapTo") {
            None => "no mapTo; the material cannot bind to a mesh texture slot",
            Some(v) if v.trim().is_empty() => "mapTo is empty",
            Some(_) => return,
        };
        self.push(
            Severity::Warning,
            Checks::MAP_TO.name(),
            record.location.clone(),
            Some(&record.name),
            message.to_string(),
        );
    }

    fn check_properties(&mut self, record: &RawMaterial, script_dir: Option<&Path>) {
        for property in &record.properties {
            let key = match PropertyKey::parse(&property.name, property.index) {
                Ok(key) => key,
                Err(reason) => {
                    let allowed = self
                        .validator
                        .extra_properties
                        .contains(&property.name.to_ascii_lowercase());
                    if self.enabled(Checks::KNOWN_KEYS) && !allowed {
                        self.push(
                            Severity::Error,
                            Checks::KNOWN_KEYS.name(),
                            property.location.clone(),
                            Some(&record.name),
                            reason,
                        );
                    }
                    continue;
                }
            };

            let check = if key.value_kind() == ValueKind::BlendOp {
                Checks::BLEND_OP
            } else {
                Checks::NUMERIC_FIELDS
            };

            match key.decode(&property.value) {
                Err(reason) => {
                    if self.enabled(check) {
                        self.push(
                            Severity::Error,
                            check.name(),
                            property.location.clone(),
                            Some(&record.name),
                            format!("{key} = \"{}\": {reason}", property.value),
                        );
                    }
                }
                Ok(PropertyValue::Float(power))
                    if matches!(key, PropertyKey::SpecularPower(_))
                        && power > self.validator.max_specular_power
                        && self.enabled(Checks::NUMERIC_FIELDS) =>
                {
                    let message = format!(
                        "{key} = \"{}\" exceeds the configured maximum of {}",
                        property.value, self.validator.max_specular_power
                    );
                    self.push(
                        Severity::Warning,
                        Checks::NUMERIC_FIELDS.name(),
                        property.location.clone(),
                        Some(&record.name),
                        message,
                    );
                }
                Ok(PropertyValue::Text(texture)) if key.value_kind() == ValueKind::Texture => {
                    if let Some(dir) = script_dir {
                        self.check_texture(record, property.location.clone(), key, &texture, dir);
                    }
                }
                Ok(_) => {}
            }
        }
    }

    fn check_texture(
        &mut self,
        record: &RawMaterial,
        location: SourceLocation,
        key: PropertyKey,
        texture: &str,
        dir: &Path,
    ) {
        if !self.enabled(Checks::TEXTURES) || texture.trim().is_empty() {
            return;
        }
        if MaterialLoader::resolve_texture(dir, texture, &self.validator.loader).is_none() {
            self.push(
                Severity::Warning,
                Checks::TEXTURES.name(),
                location,
                Some(&record.name),
                format!("{key} references \"{texture}\" but no matching file exists in {}", dir.display()),
            );
        }
    }

    fn finish(mut self) -> Report {
        self.diagnostics.sort_by(|a, b| {
            (&a.location.origin, a.location.line, a.location.column)
                .cmp(&(&b.location.origin, b.location.line, b.location.column))
        });
        log::info!(
            "Validated {} material(s) in {} file(s): {} diagnostic(s)",
            self.materials,
            self.files,
            self.diagnostics.len()
        );
        Report {
            files: self.files,
            materials: self.materials,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID: &str = r#"
singleton Material(Conifer04_Tall_ConBare01)
{
   mapTo = "ConBare01";
   diffuseMap[0] = "ConBare01";
   specular[0] = "0.9 0.9 0.9 1";
   specularPower[0] = "10";
   translucentBlendOp = "None";
   normalMap[0] = "ConBare01_NRM.png";
   useAnisotropic[0] = "1";
   doubleSided = "1";
   alphaTest = "1";
   alphaRef = "120";
};
"#;

    #[test]
    fn test_valid_source_is_clean() {
        let report = Validator::new(Checks::all()).validate_str("tree.cs", VALID);
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        assert_eq!(report.files, 1);
        assert_eq!(report.materials, 1);
    }

    #[test]
    fn test_check_name_round_trip() {
        let checks = Checks::from_names(&["unique_names", "TEXTURES"]).unwrap();
        assert_eq!(checks, Checks::UNIQUE_NAMES | Checks::TEXTURES);
        assert_eq!(checks.names(), vec!["unique_names", "textures"]);
        assert_eq!(Checks::from_names(&["all"]).unwrap(), Checks::all());
        assert!(Checks::from_names(&["typos"]).is_err());
        assert!(!Checks::default().contains(Checks::TEXTURES));
        assert_eq!(Checks::MAP_TO.name(), "map_to");
    }

    #[test]
    fn test_reports_every_problem_in_a_file() {
        let source = r#"
singleton Material(Broken)
{
   diffuseMap[0] = "wood";
   shininess = "4";
   specularPower[0] = "sharp";
   alphaRef = "300";
   translucentBlendOp = "Screen";
   doubleSided = "maybe";
};
"#;
        let report = Validator::new(Checks::default()).validate_str("broken.cs", source);

        let checks: Vec<&str> = report.diagnostics.iter().map(|d| d.check).collect();
        assert_eq!(
            checks,
            vec!["map_to", "known_keys", "numeric_fields", "numeric_fields", "blend_op", "numeric_fields"]
        );
        assert_eq!(report.error_count(), 5);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.diagnostics[1].location.line, 5);
        assert_eq!(report.diagnostics[1].material.as_deref(), Some("Broken"));
        assert_eq!(report.by_check(Checks::NUMERIC_FIELDS).count(), 3);
    }

    #[test]
    fn test_disabled_checks_stay_quiet() {
        let source = "singleton Material(A) { shininess = \"4\"; alphaRef = \"x\"; };";
        let report = Validator::new(Checks::BALANCED).validate_str("a.cs", source);
        assert!(report.is_clean());
    }

    #[test]
    fn test_extra_properties_are_accepted() {
        let source = "singleton Material(A) { mapTo = \"a\"; materialTag0 = \"Foliage\"; };";
        let strict = Validator::new(Checks::default()).validate_str("a.cs", source);
        assert_eq!(strict.error_count(), 1);

        let lenient = Validator::new(Checks::default())
            .allow_property("materialTag0")
            .validate_str("a.cs", source);
        assert!(lenient.is_clean());
    }

    #[test]
    fn test_specular_power_limit_warns() {
        let source = "singleton Material(A) { mapTo = \"a\"; specularPower[0] = \"500\"; };";
        let report = Validator::new(Checks::default()).validate_str("a.cs", source);
        assert_eq!(report.warning_count(), 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_syntax_error_is_reported_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad");
        let good = dir.path().join("good");
        fs::create_dir_all(&bad).unwrap();
        fs::create_dir_all(&good).unwrap();
        fs::write(bad.join("materials.cs"), "singleton Material(A)\n{\n   mapTo = \"a\";\n").unwrap();
        fs::write(good.join("materials.cs"), VALID).unwrap();

        let report = Validator::new(Checks::default()).validate_dir(dir.path()).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.materials, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].check, "balanced");
        assert!(report.diagnostics[0].location.origin.ends_with("materials.cs"));
    }

    #[test]
    fn test_duplicate_names_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.cs");
        let b = dir.path().join("b.cs");
        fs::write(&a, VALID).unwrap();
        fs::write(&b, VALID.replace("ConBare01)", "CONBARE01)")).unwrap();

        let report = Validator::new(Checks::default()).validate_files(&[&a, &b]);
        assert_eq!(report.error_count(), 1);
        let diagnostic = &report.diagnostics[0];
        assert_eq!(diagnostic.check, "unique_names");
        assert_eq!(diagnostic.location.origin, b.display().to_string());
        assert!(diagnostic.message.contains(&a.display().to_string()));
    }

    #[test]
    fn test_missing_texture_files() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("materials.cs");
        fs::write(&script, VALID).unwrap();
        fs::write(dir.path().join("ConBare01.dds"), b"").unwrap();

        let report = Validator::new(Checks::default() | Checks::TEXTURES).validate_files(&[&script]);
        assert_eq!(report.warning_count(), 1);
        assert!(report.diagnostics[0].message.contains("ConBare01_NRM.png"));

        let quiet = Validator::new(Checks::default()).validate_files(&[&script]);
        assert!(quiet.is_clean());
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let report = Validator::new(Checks::default()).validate_files(&["no/such/materials.cs"]);
        assert_eq!(report.files, 1);
        assert_eq!(report.diagnostics[0].check, "io");
    }

    #[test]
    fn test_from_config() {
        let mut config = ToolkitConfig::default();
        config.validation.checks = vec!["known_keys".to_string()];
        config.validation.extra_properties = vec!["MaterialTag0".to_string()];
        let validator = Validator::from_config(&config).unwrap();
        assert_eq!(validator.checks(), Checks::KNOWN_KEYS);

        let report = validator.validate_str("a.cs", "singleton Material(A) { materialtag0 = \"x\"; };");
        assert!(report.is_clean());
    }
}
