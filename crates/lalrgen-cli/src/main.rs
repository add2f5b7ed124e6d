use anyhow::Context as _;
use clap::{CommandFactory, Parser};
use lalrgen::{
    automaton::Automaton,
    codegen::{Codegen, Options},
    dot::DotGraph,
    grammar::Grammar,
    report::Report,
    table,
};
use std::{fs, path::PathBuf};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of grammar definition file.
    input: Option<PathBuf>,

    /// Report the conflicts and print the states of the automaton.
    #[arg(short, long)]
    verbose: bool,

    /// Print the automaton in Graphviz format instead of the state report.
    #[arg(long)]
    dot: bool,

    /// Do not annotate the user code blocks with `// line` comments.
    #[arg(long)]
    no_lines: bool,

    /// Omit the nonterminal spellings and rule info tables.
    #[arg(long)]
    no_debug: bool,

    /// Prepend the Qt license header to the generated files.
    #[arg(long)]
    qt: bool,

    /// The directory receiving the generated files.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let Some(input) = &args.input else {
        Args::command().print_help()?;
        return Ok(());
    };

    let mut grammar = Grammar::from_file(input)
        .with_context(|| format!("failed to load the grammar from {}", input.display()))?;
    grammar.build_extended_grammar();
    grammar.build_rule_map();

    let aut = Automaton::build(&grammar);
    let table = table::generate(&aut);

    if args.verbose {
        for terminal in grammar.unused_terminals() {
            eprintln!(
                "*** Warning. Token `{}' is never used",
                grammar.terminals[&terminal].name()
            );
        }
        for conflict in &table.conflicts {
            eprintln!("{}", conflict.display(&grammar));
        }
    }
    for rule in &table.useless_rules {
        tracing::warn!(
            "rule {} is useless: {}",
            rule,
            grammar.rule(*rule).display(&grammar)
        );
    }
    if table.has_unexpected_conflicts(&grammar) {
        eprintln!(
            "*** Conflicts: {} shift/reduce, {} reduce/reduce",
            table.shift_reduce_conflicts(),
            table.reduce_reduce_conflicts()
        );
    }

    if args.dot {
        print!("{}", DotGraph::new(&aut));
    } else if args.verbose {
        print!("{}", Report::new(&aut, &table));
    }

    let options = Options::default()
        .debug_info(!args.no_debug)
        .lines(!args.no_lines)
        .copyright(args.qt);
    let codegen = Codegen::new(&grammar, &table).options(options);

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "failed to create the output directory {}",
            args.output_dir.display()
        )
    })?;
    let sh = xshell::Shell::new()?;
    for output in codegen.outputs() {
        let mut generated: Vec<u8> = output.contents.into();

        // attempt to apply rustfmt to generated code.
        let res = xshell::cmd!(sh, "rustfmt --emit=stdout --color=never --quiet")
            .quiet()
            .stdin(&generated)
            .output();
        if let Ok(formatted) = res {
            if formatted.status.success() {
                generated = formatted.stdout;
            }
        }

        let out_file = args.output_dir.join(&output.name);
        tracing::debug!("writing {}", out_file.display());
        fs::write(&out_file, &generated).with_context(|| {
            anyhow::anyhow!("failed to write generated tables to {}", out_file.display())
        })?;
    }

    Ok(())
}
