//! Serializes materials back into script form
//!
//! Output uses three-space indentation and canonical key spelling. Only
//! properties that differ from their defaults are written, except `mapTo`
//! and `translucentBlendOp` which are always present.

use std::fmt::Write as _;

use super::material::{Material, MaterialStage, DEFAULT_ALPHA_REF};
use super::property::PropertyKey;
use crate::foundation::math::{format_color, Color};

/// Material script writer
pub struct MaterialWriter;

impl MaterialWriter {
    /// Write a single material declaration
    pub fn write_material(material: &Material) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "singleton Material({})", material.name);
        out.push_str("{\n");

        Self::property(&mut out, PropertyKey::MapTo, &material.map_to);

        let defaults = MaterialStage::default();
        for (i, stage) in material.stages.iter().enumerate() {
            Self::write_stage(&mut out, i, stage, &defaults);
        }

        Self::property(&mut out, PropertyKey::TranslucentBlendOp, material.translucent_blend_op.as_str());

        if material.translucent {
            Self::flag(&mut out, PropertyKey::Translucent, true);
        }
        if material.double_sided {
            Self::flag(&mut out, PropertyKey::DoubleSided, true);
        }
        if material.alpha_test {
            Self::flag(&mut out, PropertyKey::AlphaTest, true);
        }
        if material.alpha_ref != DEFAULT_ALPHA_REF {
            Self::property(&mut out, PropertyKey::AlphaRef, &material.alpha_ref.to_string());
        }
        if !material.cast_shadows {
            Self::flag(&mut out, PropertyKey::CastShadows, false);
        }
        if material.planar_reflection {
            Self::flag(&mut out, PropertyKey::PlanarReflection, true);
        }

        for (key, value) in &material.extra {
            let _ = writeln!(out, "   {key} = \"{}\";", escape(value));
        }

        out.push_str("};\n");
        out
    }

    /// Write several declarations separated by blank lines
    pub fn write_all<'a>(materials: impl IntoIterator<Item = &'a Material>) -> String {
        materials
            .into_iter()
            .map(Self::write_material)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write_stage(out: &mut String, i: usize, stage: &MaterialStage, defaults: &MaterialStage) {
        if let Some(map) = &stage.diffuse_map {
            Self::property(out, PropertyKey::DiffuseMap(i), map);
        }
        if stage.diffuse_color != defaults.diffuse_color {
            Self::color(out, PropertyKey::DiffuseColor(i), &stage.diffuse_color);
        }
        if stage.specular != defaults.specular {
            Self::color(out, PropertyKey::Specular(i), &stage.specular);
        }
        if stage.specular_power != defaults.specular_power {
            Self::property(out, PropertyKey::SpecularPower(i), &stage.specular_power.to_string());
        }
        if let Some(map) = &stage.normal_map {
            Self::property(out, PropertyKey::NormalMap(i), map);
        }
        if let Some(map) = &stage.specular_map {
            Self::property(out, PropertyKey::SpecularMap(i), map);
        }
        if stage.pixel_specular {
            Self::flag(out, PropertyKey::PixelSpecular(i), true);
        }
        if stage.use_anisotropic {
            Self::flag(out, PropertyKey::UseAnisotropic(i), true);
        }
        if stage.sub_surface {
            Self::flag(out, PropertyKey::SubSurface(i), true);
        }
        if stage.sub_surface_color != defaults.sub_surface_color {
            Self::color(out, PropertyKey::SubSurfaceColor(i), &stage.sub_surface_color);
        }
        if stage.glow {
            Self::flag(out, PropertyKey::Glow(i), true);
        }
        if stage.emissive {
            Self::flag(out, PropertyKey::Emissive(i), true);
        }
    }

    fn property(out: &mut String, key: PropertyKey, value: &str) {
        let _ = writeln!(out, "   {key} = \"{}\";", escape(value));
    }

    fn flag(out: &mut String, key: PropertyKey, value: bool) {
        Self::property(out, key, if value { "1" } else { "0" });
    }

    fn color(out: &mut String, key: PropertyKey, value: &Color) {
        Self::property(out, key, &format_color(value));
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}
