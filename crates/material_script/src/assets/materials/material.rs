//! Typed material definitions
//!
//! A [`Material`] is the decoded form of one `singleton Material(...)`
//! record. Properties that a record leaves out keep the defaults the
//! consuming renderer assumes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::property::{PropertyKey, PropertyValue, MAX_STAGES};
use super::script_parser::RawMaterial;
use crate::foundation::math::{white, Color};
use crate::{MaterialError, SourceLocation};

/// Default `specularPower[n]`
pub const DEFAULT_SPECULAR_POWER: f32 = 8.0;

/// Default `alphaRef`
pub const DEFAULT_ALPHA_REF: u8 = 1;

/// Default `subSurfaceColor[n]`
pub fn default_sub_surface_color() -> Color {
    Color::new(1.0, 0.2, 0.2, 1.0)
}

/// Blend operation used when compositing translucent surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TranslucentBlendOp {
    /// Opaque, no blending
    None,
    /// Multiply
    Mul,
    /// Additive
    Add,
    /// Additive, weighted by source alpha
    AddAlpha,
    /// Subtractive
    Sub,
    /// Linear interpolation by source alpha
    #[default]
    LerpAlpha,
    /// Premultiplied alpha
    PreMul,
}

impl TranslucentBlendOp {
    /// All blend operations, in declaration order
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::Mul,
        Self::Add,
        Self::AddAlpha,
        Self::Sub,
        Self::LerpAlpha,
        Self::PreMul,
    ];

    /// Script spelling
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Mul => "Mul",
            Self::Add => "Add",
            Self::AddAlpha => "AddAlpha",
            Self::Sub => "Sub",
            Self::LerpAlpha => "LerpAlpha",
            Self::PreMul => "PreMul",
        }
    }
}

impl fmt::Display for TranslucentBlendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslucentBlendOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("'{s}' is not a blend operation"))
    }
}

/// One texture stage of a material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialStage {
    /// Base color texture
    pub diffuse_map: Option<String>,
    /// Normal map texture
    pub normal_map: Option<String>,
    /// Specular map texture
    pub specular_map: Option<String>,
    /// Base color multiplier
    pub diffuse_color: Color,
    /// Specular color
    pub specular: Color,
    /// Specular exponent
    pub specular_power: f32,
    /// Per-pixel specular lighting
    pub pixel_specular: bool,
    /// Anisotropic texture filtering
    pub use_anisotropic: bool,
    /// Sub surface scattering
    pub sub_surface: bool,
    /// Sub surface scattering color
    pub sub_surface_color: Color,
    /// Contributes to the glow pass
    pub glow: bool,
    /// Ignores scene lighting
    pub emissive: bool,
}

impl Default for MaterialStage {
    fn default() -> Self {
        Self {
            diffuse_map: None,
            normal_map: None,
            specular_map: None,
            diffuse_color: white(),
            specular: white(),
            specular_power: DEFAULT_SPECULAR_POWER,
            pixel_specular: false,
            use_anisotropic: false,
            sub_surface: false,
            sub_surface_color: default_sub_surface_color(),
            glow: false,
            emissive: false,
        }
    }
}

impl MaterialStage {
    /// Whether every property still has its default value
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Texture references declared on this stage
    pub fn textures(&self) -> impl Iterator<Item = &str> {
        [&self.diffuse_map, &self.normal_map, &self.specular_map]
            .into_iter()
            .filter_map(|t| t.as_deref())
    }
}

/// A decoded material record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    /// Unique material name
    pub name: String,
    /// Mesh texture slot this material binds to
    pub map_to: String,
    /// Texture stages
    pub stages: [MaterialStage; MAX_STAGES],
    /// Translucency blend operation
    pub translucent_blend_op: TranslucentBlendOp,
    /// Render both faces
    pub double_sided: bool,
    /// Discard pixels below `alpha_ref`
    pub alpha_test: bool,
    /// Alpha test threshold
    pub alpha_ref: u8,
    /// Rendered in the translucent pass
    pub translucent: bool,
    /// Casts shadows
    pub cast_shadows: bool,
    /// Uses planar reflection
    pub planar_reflection: bool,
    /// Accepted properties outside the recognized set, by key text
    pub extra: BTreeMap<String, String>,
    /// Where the record was declared
    pub location: SourceLocation,
}

impl Material {
    /// Create a material with default properties
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            map_to: String::new(),
            stages: Default::default(),
            translucent_blend_op: TranslucentBlendOp::default(),
            double_sided: false,
            alpha_test: false,
            alpha_ref: DEFAULT_ALPHA_REF,
            translucent: false,
            cast_shadows: true,
            planar_reflection: false,
            extra: BTreeMap::new(),
            location,
        }
    }

    /// Decode a parsed record, rejecting any property outside the recognized set
    pub fn from_raw(raw: &RawMaterial) -> Result<Self, MaterialError> {
        Self::from_raw_with_extras(raw, &HashSet::new())
    }

    /// Decode a parsed record
    ///
    /// Unrecognized properties whose lowercase name is in `extras` are kept
    /// verbatim in [`Material::extra`]. Assignments apply in order, so a
    /// repeated key keeps its last value.
    pub fn from_raw_with_extras(raw: &RawMaterial, extras: &HashSet<String>) -> Result<Self, MaterialError> {
        let mut material = Self::new(&raw.name, raw.location.clone());

        for property in &raw.properties {
            let key = match PropertyKey::parse(&property.name, property.index) {
                Ok(key) => key,
                Err(_) if extras.contains(&property.name.to_ascii_lowercase()) => {
                    material.extra.insert(property.key_text(), property.value.clone());
                    continue;
                }
                Err(_) => {
                    return Err(MaterialError::UnknownProperty {
                        material: raw.name.clone(),
                        key: property.key_text(),
                        location: property.location.clone(),
                    });
                }
            };

            key.decode(&property.value)
                .and_then(|value| material.apply(key, value))
                .map_err(|reason| MaterialError::InvalidValue {
                    material: raw.name.clone(),
                    key: property.key_text(),
                    value: property.value.clone(),
                    reason,
                    location: property.location.clone(),
                })?;
        }

        Ok(material)
    }

    /// Set one property from a decoded value
    ///
    /// Fails without changing the material when the value's type does not
    /// match the key or the stage index is out of range.
    pub fn apply(&mut self, key: PropertyKey, value: PropertyValue) -> Result<(), String> {
        use PropertyValue as V;

        if let Some(stage) = key.stage() {
            if stage >= MAX_STAGES {
                return Err(format!("stage index {stage} is out of range (0..{MAX_STAGES})"));
            }
        }

        match (key, value) {
            (PropertyKey::MapTo, V::Text(v)) => self.map_to = v,
            (PropertyKey::TranslucentBlendOp, V::BlendOp(v)) => self.translucent_blend_op = v,
            (PropertyKey::DoubleSided, V::Bool(v)) => self.double_sided = v,
            (PropertyKey::AlphaTest, V::Bool(v)) => self.alpha_test = v,
            (PropertyKey::AlphaRef, V::AlphaRef(v)) => self.alpha_ref = v,
            (PropertyKey::Translucent, V::Bool(v)) => self.translucent = v,
            (PropertyKey::CastShadows, V::Bool(v)) => self.cast_shadows = v,
            (PropertyKey::PlanarReflection, V::Bool(v)) => self.planar_reflection = v,
            (PropertyKey::DiffuseMap(i), V::Text(v)) => self.stages[i].diffuse_map = non_empty(v),
            (PropertyKey::NormalMap(i), V::Text(v)) => self.stages[i].normal_map = non_empty(v),
            (PropertyKey::SpecularMap(i), V::Text(v)) => self.stages[i].specular_map = non_empty(v),
            (PropertyKey::Specular(i), V::Color(v)) => self.stages[i].specular = v,
            (PropertyKey::SpecularPower(i), V::Float(v)) => self.stages[i].specular_power = v,
            (PropertyKey::UseAnisotropic(i), V::Bool(v)) => self.stages[i].use_anisotropic = v,
            (PropertyKey::PixelSpecular(i), V::Bool(v)) => self.stages[i].pixel_specular = v,
            (PropertyKey::SubSurface(i), V::Bool(v)) => self.stages[i].sub_surface = v,
            (PropertyKey::SubSurfaceColor(i), V::Color(v)) => self.stages[i].sub_surface_color = v,
            (PropertyKey::DiffuseColor(i), V::Color(v)) => self.stages[i].diffuse_color = v,
            (PropertyKey::Glow(i), V::Bool(v)) => self.stages[i].glow = v,
            (PropertyKey::Emissive(i), V::Bool(v)) => self.stages[i].emissive = v,
            (key, value) => return Err(format!("{value:?} does not fit '{key}'")),
        }
        Ok(())
    }

    /// Number of stages up to and including the last non-default one
    pub fn active_stages(&self) -> usize {
        self.stages
            .iter()
            .rposition(|stage| !stage.is_default())
            .map_or(0, |i| i + 1)
    }

    /// Every texture reference with the key that declares it
    pub fn texture_references(&self) -> Vec<(PropertyKey, &str)> {
        let mut refs = Vec::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if let Some(t) = stage.diffuse_map.as_deref() {
                refs.push((PropertyKey::DiffuseMap(i), t));
            }
            if let Some(t) = stage.normal_map.as_deref() {
                refs.push((PropertyKey::NormalMap(i), t));
            }
            if let Some(t) = stage.specular_map.as_deref() {
                refs.push((PropertyKey::SpecularMap(i), t));
            }
        }
        refs
    }

    /// Whether the material discards or blends pixels by alpha
    pub fn uses_alpha(&self) -> bool {
        self.alpha_test || self.translucent
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::materials::MaterialScriptParser;
    use approx::assert_relative_eq;

    fn decode(source: &str) -> Result<Material, MaterialError> {
        let raw = MaterialScriptParser::parse(source, "test.cs").unwrap();
        Material::from_raw(&raw[0])
    }

    #[test]
    fn test_decode_foliage_material() {
        let material = decode(
            r#"
singleton Material(Conifer04_Tall_BroadPine01)
{
   mapTo = "BroadPine01";
   diffuseMap[0] = "BroadPine1";
   specular[0] = "0.9 0.9 0.9 1";
   specularPower[0] = "10";
   translucentBlendOp = "None";
   useAnisotropic[0] = "1";
   subSurface[0] = "1";
   subSurfaceColor[0] = "0.811765 0.909804 0.298039 1";
   doubleSided = "1";
   alphaTest = "1";
   alphaRef = "120";
};
"#,
        )
        .unwrap();

        assert_eq!(material.name, "Conifer04_Tall_BroadPine01");
        assert_eq!(material.map_to, "BroadPine01");
        assert_eq!(material.stages[0].diffuse_map.as_deref(), Some("BroadPine1"));
        assert_eq!(material.stages[0].normal_map, None);
        assert_relative_eq!(material.stages[0].specular.x, 0.9);
        assert_relative_eq!(material.stages[0].specular_power, 10.0);
        assert!(material.stages[0].use_anisotropic);
        assert!(material.stages[0].sub_surface);
        assert_relative_eq!(material.stages[0].sub_surface_color.y, 0.909_804);
        assert_eq!(material.translucent_blend_op, TranslucentBlendOp::None);
        assert!(material.double_sided);
        assert!(material.alpha_test);
        assert_eq!(material.alpha_ref, 120);
        assert!(material.uses_alpha());
        assert_eq!(material.active_stages(), 1);
    }

    #[test]
    fn test_defaults_when_absent() {
        let material = decode("singleton Material(Bare) { mapTo = \"bare\"; };").unwrap();
        assert_eq!(material.translucent_blend_op, TranslucentBlendOp::LerpAlpha);
        assert_eq!(material.alpha_ref, DEFAULT_ALPHA_REF);
        assert!(material.cast_shadows);
        assert_eq!(material.active_stages(), 0);
        assert_relative_eq!(material.stages[3].specular_power, DEFAULT_SPECULAR_POWER);
    }

    #[test]
    fn test_last_assignment_wins() {
        let material = decode(
            "singleton Material(Twice) { specularPower[0] = \"10\"; specularPower[0] = \"30\"; };",
        )
        .unwrap();
        assert_relative_eq!(material.stages[0].specular_power, 30.0);
    }

    #[test]
    fn test_apply_rejects_mismatched_values() {
        let mut material = Material::new("Manual", SourceLocation::new("code", 0, 0));
        material.apply(PropertyKey::AlphaRef, PropertyValue::AlphaRef(64)).unwrap();
        assert_eq!(material.alpha_ref, 64);

        let err = material
            .apply(PropertyKey::AlphaRef, PropertyValue::Bool(true))
            .unwrap_err();
        assert!(err.contains("alphaRef"), "{err}");
        assert_eq!(material.alpha_ref, 64);

        let before = material.clone();
        assert!(material
            .apply(PropertyKey::DiffuseMap(MAX_STAGES), PropertyValue::Text("bark".into()))
            .is_err());
        assert_eq!(material, before);
    }

    #[test]
    fn test_unknown_property_is_rejected() {
        let err = decode("singleton Material(Odd)\n{\n   shininess[0] = \"4\";\n};").unwrap_err();
        match err {
            MaterialError::UnknownProperty { material, key, location } => {
                assert_eq!(material, "Odd");
                assert_eq!(key, "shininess[0]");
                assert_eq!(location.line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extras_are_kept_verbatim() {
        let raw = MaterialScriptParser::parse(
            "singleton Material(Tagged) { materialTag0 = \"Foliage\"; };",
            "test.cs",
        )
        .unwrap();
        let extras: HashSet<String> = ["materialtag0".to_string()].into_iter().collect();
        let material = Material::from_raw_with_extras(&raw[0], &extras).unwrap();
        assert_eq!(material.extra.get("materialTag0").map(String::as_str), Some("Foliage"));
    }

    #[test]
    fn test_invalid_numeric_value() {
        let err = decode("singleton Material(Bad) { alphaRef = \"high\"; };").unwrap_err();
        assert!(matches!(err, MaterialError::InvalidValue { ref key, .. } if key == "alphaRef"));
    }

    #[test]
    fn test_texture_references_across_stages() {
        let material = decode(
            "singleton Material(Layered) { diffuseMap[0] = \"a\"; normalMap[0] = \"a_NRM.png\"; diffuseMap[2] = \"c\"; };",
        )
        .unwrap();
        let refs = material.texture_references();
        assert_eq!(
            refs,
            vec![
                (PropertyKey::DiffuseMap(0), "a"),
                (PropertyKey::NormalMap(0), "a_NRM.png"),
                (PropertyKey::DiffuseMap(2), "c"),
            ]
        );
        assert_eq!(material.active_stages(), 3);
    }

    #[test]
    fn test_blend_op_parsing() {
        assert_eq!("addalpha".parse::<TranslucentBlendOp>().unwrap(), TranslucentBlendOp::AddAlpha);
        for op in TranslucentBlendOp::ALL {
            assert_eq!(op.to_string().parse::<TranslucentBlendOp>().unwrap(), op);
        }
    }
}
