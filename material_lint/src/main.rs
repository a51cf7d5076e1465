//! Material script linter
//!
//! Checks `materials.cs` files for duplicate names, malformed records,
//! unknown property keys and undecodable values, and can list or print the
//! materials it finds.
//!
//! Usage: material_lint [PATH...] [--config lint.toml] [--check-textures]

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use material_script::foundation::logging;
use material_script::prelude::*;

mod report;
use report::{passes, render_json, render_listing, render_text};

const DEFAULT_ROOT: &str = "resources";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug)]
struct LintOptions {
    paths: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    check_textures: bool,
    format: OutputFormat,
    list: bool,
    show: Option<String>,
    deny_warnings: bool,
    verbose: bool,
}

impl LintOptions {
    fn from_matches(matches: &ArgMatches) -> Self {
        let paths = matches
            .get_many::<String>("paths")
            .map(|values| values.map(PathBuf::from).collect())
            .unwrap_or_else(|| vec![PathBuf::from(DEFAULT_ROOT)]);

        let format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };

        Self {
            paths,
            config_path: matches.get_one::<String>("config").map(PathBuf::from),
            check_textures: matches.get_flag("check-textures"),
            format,
            list: matches.get_flag("list"),
            show: matches.get_one::<String>("show").cloned(),
            deny_warnings: matches.get_flag("deny-warnings"),
            verbose: matches.get_flag("verbose"),
        }
    }
}

fn build_cli() -> Command {
    Command::new("material_lint")
        .about("Checks material script declarations for structural problems")
        .arg(
            Arg::new("paths")
                .value_name("PATH")
                .help("Script files or directories to scan [default: resources]")
                .num_args(1..),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML or RON configuration file"),
        )
        .arg(
            Arg::new("check-textures")
                .long("check-textures")
                .help("Warn about texture references with no file on disk")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Diagnostic output format")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List every loadable material with its mapTo slot")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show")
                .long("show")
                .value_name("NAME")
                .help("Print one material in normalized script form"),
        )
        .arg(
            Arg::new("deny-warnings")
                .long("deny-warnings")
                .help("Fail when any warning is reported")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> Result<ExitCode> {
    let matches = build_cli().get_matches();
    let options = LintOptions::from_matches(&matches);
    let stdout = io::stdout();
    let stderr = io::stderr();
    Ok(if run(&options, &mut stdout.lock(), &mut stderr.lock())? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Lint the configured paths; `Ok(false)` when the report fails
///
/// The report goes to `out`. Listings go to `out` as well for text output,
/// and to `aux` for JSON output so `out` stays a single JSON document.
fn run(options: &LintOptions, out: &mut dyn Write, aux: &mut dyn Write) -> Result<bool> {
    let config = match &options.config_path {
        Some(path) => ToolkitConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ToolkitConfig::default(),
    };

    logging::init_with_level(if options.verbose { "debug" } else { config.log_level.as_str() });

    let mut validator = Validator::from_config(&config).context("Invalid configuration")?;
    if options.check_textures {
        validator = validator.with_checks(Checks::TEXTURES);
    }

    let files = collect_files(&options.paths, &config.loader)?;
    if files.is_empty() {
        log::warn!("No '{}' files found", config.loader.file_name);
    }

    let report = validator.validate_files(&files);

    if options.list || options.show.is_some() {
        let library = build_library(&files, &config);
        let listing_out: &mut dyn Write = match options.format {
            OutputFormat::Text => &mut *out,
            OutputFormat::Json => &mut *aux,
        };

        if options.list {
            write!(listing_out, "{}", render_listing(&library))?;
        }

        if let Some(name) = &options.show {
            let material = library
                .require(name)
                .with_context(|| format!("Cannot show '{name}'"))?;
            write!(listing_out, "{}", MaterialWriter::write_material(material))?;
        }
    }

    match options.format {
        OutputFormat::Text => write!(out, "{}", render_text(&report))?,
        OutputFormat::Json => writeln!(out, "{}", render_json(&report)?)?,
    }

    Ok(passes(&report, options.deny_warnings))
}

fn collect_files(paths: &[PathBuf], loader: &LoaderConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let found = MaterialLoader::find_material_files(path, loader)
            .with_context(|| format!("Failed to scan {}", path.display()))?;
        files.extend(found);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Registry of every material that loads cleanly; broken files are skipped
fn build_library(files: &[PathBuf], config: &ToolkitConfig) -> MaterialLibrary {
    let extras: HashSet<String> = config
        .validation
        .extra_properties
        .iter()
        .map(|p| p.to_ascii_lowercase())
        .collect();

    let mut library = MaterialLibrary::new();
    for path in files {
        let loaded = MaterialLoader::read_raw(path).and_then(|records| {
            records
                .iter()
                .map(|raw| Material::from_raw_with_extras(raw, &extras))
                .collect::<Result<Vec<_>, _>>()
        });

        match loaded.and_then(|materials| library.insert_all(materials)) {
            Ok(handles) => log::debug!("Registered {} material(s) from {}", handles.len(), path.display()),
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    library
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options(args: &[&str]) -> LintOptions {
        let matches = build_cli().try_get_matches_from(args).unwrap();
        LintOptions::from_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let opts = options(&["material_lint"]);
        assert_eq!(opts.paths, vec![PathBuf::from(DEFAULT_ROOT)]);
        assert_eq!(opts.format, OutputFormat::Text);
        assert!(!opts.check_textures && !opts.list && !opts.deny_warnings);
        assert!(opts.config_path.is_none() && opts.show.is_none());
    }

    #[test]
    fn test_all_flags() {
        let opts = options(&[
            "material_lint",
            "meshes/SHACK",
            "meshes/TREE2/materials.cs",
            "--config",
            "lint.toml",
            "--check-textures",
            "-f",
            "json",
            "--list",
            "--show",
            "Conifer04_Tall_ConBare01",
            "--deny-warnings",
            "-v",
        ]);
        assert_eq!(opts.paths.len(), 2);
        assert_eq!(opts.config_path, Some(PathBuf::from("lint.toml")));
        assert_eq!(opts.format, OutputFormat::Json);
        assert_eq!(opts.show.as_deref(), Some("Conifer04_Tall_ConBare01"));
        assert!(opts.check_textures && opts.list && opts.deny_warnings && opts.verbose);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(build_cli().try_get_matches_from(["material_lint", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_collect_files_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("materials.cs");
        fs::write(&script, "").unwrap();

        let files = collect_files(
            &[dir.path().to_path_buf(), script.clone()],
            &LoaderConfig::default(),
        )
        .unwrap();
        assert_eq!(files, vec![script]);

        assert!(collect_files(&[dir.path().join("missing")], &LoaderConfig::default()).is_err());
    }

    #[test]
    fn test_build_library_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.cs");
        let bad = dir.path().join("bad.cs");
        fs::write(&good, "singleton Material(Good) { mapTo = \"good\"; materialTag0 = \"Misc\"; };").unwrap();
        fs::write(&bad, "singleton Material(Bad) { mapTo = \"bad\"; ").unwrap();

        let mut config = ToolkitConfig::default();
        config.validation.extra_properties.push("materialTag0".to_string());

        let library = build_library(&[good, bad], &config);
        assert_eq!(library.names(), vec!["Good"]);
    }

    #[test]
    fn test_run_fails_on_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("materials.cs"),
            "singleton Material(A) { mapTo = \"a\"; alphaRef = \"999\"; };",
        )
        .unwrap();

        let opts = LintOptions {
            paths: vec![dir.path().to_path_buf()],
            config_path: None,
            check_textures: false,
            format: OutputFormat::Json,
            list: false,
            show: None,
            deny_warnings: false,
            verbose: false,
        };
        let (mut out, mut aux) = (Vec::new(), Vec::new());
        assert!(!run(&opts, &mut out, &mut aux).unwrap());
    }

    #[test]
    fn test_json_output_stays_parseable_with_listing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("materials.cs"),
            "singleton Material(Shack_conc01) { mapTo = \"conc01\"; };",
        )
        .unwrap();

        let dir_arg = dir.path().display().to_string();
        let opts = options(&["material_lint", &dir_arg, "--format", "json", "--list", "--show", "shack_conc01"]);
        let (mut out, mut aux) = (Vec::new(), Vec::new());
        assert!(run(&opts, &mut out, &mut aux).unwrap());

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["materials"], 1);
        let aux = String::from_utf8(aux).unwrap();
        assert!(aux.contains("Shack_conc01"), "{aux}");
        assert!(aux.contains("mapTo = \"conc01\";"), "{aux}");

        let text_opts = options(&["material_lint", &dir_arg, "--list"]);
        let (mut out, mut aux) = (Vec::new(), Vec::new());
        assert!(run(&text_opts, &mut out, &mut aux).unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("NAME"));
        assert!(aux.is_empty());
    }
}
