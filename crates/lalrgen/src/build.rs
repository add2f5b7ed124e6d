//! Build script support.
//!
//! ```no_run
//! // build.rs
//! fn main() -> anyhow::Result<()> {
//!     lalrgen::build::process_root()
//! }
//! ```
//!
//! Each `*.g` file found below the root directory is compiled into
//! `$OUT_DIR/<relative path without extension>/`, e.g. `src/calc.g` with
//! `%merged_output calc.rs` ends up in `$OUT_DIR/src/calc/calc.rs`.

use crate::{
    automaton::Automaton,
    codegen::{Codegen, Options},
    grammar::Grammar,
    report::Report,
    table,
};
use anyhow::Context as _;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

pub fn process_root() -> anyhow::Result<()> {
    let build = Build::new()?;
    build.process()
}

pub fn process_dir(root_dir: &Path) -> anyhow::Result<()> {
    let build = Build::with_root_dir(root_dir.to_owned())?;
    build.process()
}

#[derive(Debug)]
pub struct Build {
    root_dir: PathBuf,
    out_dir: PathBuf,
    options: Options,
}

impl Build {
    pub fn new() -> anyhow::Result<Self> {
        let root_dir = env::var_os("CARGO_MANIFEST_DIR")
            .map(PathBuf::from)
            .context("The environment variable `CARGO_MANIFEST_DIR' is not set")?;
        Self::with_root_dir(root_dir)
    }

    pub fn with_root_dir(root_dir: PathBuf) -> anyhow::Result<Self> {
        let out_dir = env::var_os("OUT_DIR")
            .map(PathBuf::from)
            .context("The environment variable `OUT_DIR' is not set")?;
        Ok(Self::with_dirs(root_dir, out_dir))
    }

    pub fn with_dirs(root_dir: PathBuf, out_dir: PathBuf) -> Self {
        Self {
            root_dir,
            out_dir,
            options: Options::default(),
        }
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn process(&self) -> anyhow::Result<()> {
        let walker = WalkDir::new(&self.root_dir)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != "target");
        for entry in walker {
            let entry = entry.context("from WalkDir entry")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let in_file = entry.path();
            match in_file.extension().and_then(|ext| ext.to_str()) {
                Some("g") => self.process_file(in_file)?,
                _ => continue,
            }
        }

        Ok(())
    }

    fn process_file(&self, in_file: &Path) -> anyhow::Result<()> {
        let mut out_dir = self.out_dir.join(in_file.strip_prefix(&self.root_dir)?);
        out_dir.set_extension("");
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating {}", out_dir.display()))?;

        println!("cargo:rerun-if-changed={}", in_file.display());

        let mut grammar = Grammar::from_file(in_file)
            .with_context(|| format!("loading {}", in_file.display()))?;
        grammar.build_extended_grammar();
        grammar.build_rule_map();

        let aut = Automaton::build(&grammar);
        let table = table::generate(&aut);
        if table.has_unexpected_conflicts(&grammar) {
            println!(
                "cargo:warning={}: {} shift/reduce, {} reduce/reduce conflicts",
                in_file.display(),
                table.shift_reduce_conflicts(),
                table.reduce_reduce_conflicts()
            );
        }
        for rule in &table.useless_rules {
            println!(
                "cargo:warning={}: rule `{}' is useless",
                in_file.display(),
                grammar.rule(*rule).display(&grammar)
            );
        }

        let codegen = Codegen::new(&grammar, &table).options(self.options.clone());
        for output in codegen.outputs() {
            let path = out_dir.join(&output.name);
            fs::write(&path, output.contents)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        fs::write(out_dir.join("grammar.txt"), grammar.to_string())?;
        fs::write(out_dir.join("report.txt"), Report::new(&aut, &table).to_string())?;

        Ok(())
    }
}
