#![allow(missing_docs)]

use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Returns the library target name declared in a `[lib]` table, if any.
fn lib_name(manifest: &str) -> Option<String> {
    let mut in_lib = false;

    for line in manifest.lines().map(str::trim) {
        if line.starts_with('[') {
            in_lib = line == "[lib]";
            continue;
        }

        if !in_lib {
            continue;
        }

        if let Some(value) = line.strip_prefix("name") {
            let value = value.trim_start().strip_prefix('=')?.trim();
            return Some(value.trim_matches('"').to_owned());
        }
    }

    None
}

fn list_crates() -> Vec<String> {
    let mut crates = Vec::new();

    for result in fs::read_dir("../").unwrap() {
        let entry = result.unwrap();

        if !entry.file_type().unwrap().is_dir() {
            continue;
        }

        let Some(dir) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };

        if !dir.starts_with("sampler") {
            continue;
        }

        let manifest = entry.path().join("Cargo.toml");
        println!("cargo:rerun-if-changed={}", manifest.display());

        let Ok(manifest) = fs::read_to_string(&manifest) else {
            continue;
        };

        let name = lib_name(&manifest).unwrap_or_else(|| dir.replace('-', "_"));
        crates.push(name);
    }

    crates.sort();
    crates
}

fn emit_crate_list() -> Result<(), io::Error> {
    let crates = list_crates();

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("constants.gen.rs");
    let mut f = File::create(dest_path)?;

    write!(f, "const CRATE_NAMES: &[&str] = &[")?;
    for name in &crates {
        write!(f, "\"{name}\",")?;
    }
    writeln!(f, "];")?;

    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=../");
    emit_crate_list().unwrap();
}
