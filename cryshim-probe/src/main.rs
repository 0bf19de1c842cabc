use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use cryshim_abi::{AbiLayout, WordSize};
use cryshim_core::builds;
use cryshim_core::paths;
use cryshim_core::version::read_image_version_from_file;
use log::debug;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Game folder, the one holding Bin32 and/or Bin64
    game_dir: PathBuf,
    /// Print the report as JSON
    #[clap(long)]
    json: bool,
    /// Also print the init record layout for both pointer widths
    #[clap(long)]
    layout: bool,
}

#[derive(Debug, Serialize)]
struct ModuleReport {
    path: PathBuf,
    word_size: Option<String>,
    file_version: Option<String>,
    build: Option<u32>,
    product: Option<String>,
    status: String,
    /// Loadable by a launcher of this build's pointer width.
    launchable: bool,
}

#[derive(Debug, Serialize)]
struct FieldReport {
    name: &'static str,
    offset: usize,
    size: usize,
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    word_size: String,
    size: usize,
    expected_size: usize,
    fields: Vec<FieldReport>,
}

#[derive(Debug, Serialize)]
struct Report {
    launcher_word_size: String,
    modules: Vec<ModuleReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layouts: Option<Vec<LayoutReport>>,
}

fn probe_module(path: &Path) -> ModuleReport {
    let version = match read_image_version_from_file(path) {
        Ok(version) => version,
        Err(err) => {
            return ModuleReport {
                path: path.to_path_buf(),
                word_size: None,
                file_version: None,
                build: None,
                product: None,
                status: err.to_string(),
                launchable: false,
            }
        }
    };

    let identity = version.identity();
    let v = version.file_version;
    let (status, supported) = match builds::classify(identity) {
        Ok(_) => ("supported".to_owned(), true),
        Err(err) => (err.to_string(), false),
    };

    ModuleReport {
        path: path.to_path_buf(),
        word_size: Some(identity.word_size.to_string()),
        file_version: Some(format!("{}.{}.{}.{}", v.major, v.minor, v.patch, v.build)),
        build: Some(identity.build),
        product: builds::product_of(identity).map(|p| p.to_string()),
        status,
        launchable: supported && identity.word_size == WordSize::NATIVE,
    }
}

fn layout_report(word_size: WordSize) -> LayoutReport {
    let layout = AbiLayout::init_params(word_size);
    LayoutReport {
        word_size: word_size.to_string(),
        size: layout.size(),
        expected_size: AbiLayout::expected_size(word_size),
        fields: layout
            .fields()
            .iter()
            .map(|f| FieldReport { name: f.name, offset: f.offset, size: f.size })
            .collect(),
    }
}

fn probe(game_dir: &Path, with_layout: bool) -> Report {
    let modules = [WordSize::Bits32, WordSize::Bits64]
        .into_iter()
        .map(|word_size| paths::module_path(game_dir, word_size, "CrySystem"))
        .inspect(|path| debug!("Looking for {}", path.display()))
        .filter(|path| path.is_file())
        .map(|path| probe_module(&path))
        .collect();

    Report {
        launcher_word_size: WordSize::NATIVE.to_string(),
        modules,
        layouts: with_layout.then(|| vec![layout_report(WordSize::Bits32), layout_report(WordSize::Bits64)]),
    }
}

fn print_text(report: &Report) {
    for module in &report.modules {
        println!("{}", module.path.display());
        if let (Some(version), Some(word_size)) = (&module.file_version, &module.word_size) {
            println!("  version:  {version} ({word_size})");
        }
        if let Some(product) = &module.product {
            println!("  product:  {product}");
        }
        println!("  status:   {}", module.status);
        println!("  launch:   {}", if module.launchable { "yes" } else { "no" });
    }

    for layout in report.layouts.iter().flatten() {
        println!();
        println!("SSystemInitParams ({}): {} bytes, host expects {}", layout.word_size, layout.size, layout.expected_size);
        for field in &layout.fields {
            println!("  {:#06x} {:>5}  {}", field.offset, field.size, field.name);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let report = probe(&args.game_dir, args.layout);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    if report.modules.is_empty() {
        bail!("No CrySystem.dll under {}", args.game_dir.display());
    }
    Ok(())
}
