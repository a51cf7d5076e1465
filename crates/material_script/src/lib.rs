//! # Material Script
//!
//! Loader, validator and writer for `singleton Material(...)` declarations,
//! the per-mesh `materials.cs` files that bind mesh texture slots to textures
//! and shader parameters.
//!
//! ## Features
//!
//! - **Parsing**: Tokenizer and record parser with line/column diagnostics
//! - **Typed Materials**: Stage-indexed properties decoded into typed values
//! - **Registry**: Corpus-wide name lookup with duplicate detection
//! - **Caching**: File-level cache with modification-time reloading
//! - **Validation**: Structural checks reported as diagnostics
//! - **Writing**: Serialization back into the script format
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use material_script::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut library = MaterialLibrary::new();
//!     library.load_dir("resources", &LoaderConfig::default())?;
//!
//!     if let Some(material) = library.get("Conifer04_Tall_ConBare01") {
//!         println!("{} -> {}", material.name, material.map_to);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;

mod error;

pub use error::{MaterialError, SourceLocation};

/// Common imports for toolkit users
pub mod prelude {
    pub use crate::{
        MaterialError, SourceLocation,
        assets::materials::{
            Material, MaterialStage, TranslucentBlendOp, PropertyKey,
            MaterialScriptParser, RawMaterial,
            MaterialLoader, MaterialLibrary, MaterialHandle, MaterialCache,
            MaterialWriter,
            Validator, Checks, Diagnostic, Severity, Report,
        },
        config::{Config, ConfigError, ToolkitConfig, LoaderConfig, ValidationConfig},
        foundation::math::Color,
    };
}
