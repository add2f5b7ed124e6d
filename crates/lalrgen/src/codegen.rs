//! Generation of the Rust source files holding the parse tables.

use crate::{
    grammar::{CodeBlock, Grammar, SymbolID, TerminalID},
    table::ParseTable,
};
use std::fmt;

const HEADER: &str = "// This file was generated by lalrgen - DO NOT EDIT!\n";

const COPYRIGHT_HEADER: &str = "\
// Copyright (C) The Qt Company Ltd.
// SPDX-License-Identifier: LicenseRef-Qt-Commercial OR GPL-3.0-only WITH Qt-GPL-exception-1.0
";

const PRIVATE_HEADER: &str = "\
//
//  W A R N I N G
//  -------------
//
// This file is not part of the public API. It exists purely as an
// implementation detail. This file may change from version to version
// without notice, or even be removed.
//
// We mean it.
//
";

/// Settings of the code generator.
#[derive(Debug, Clone)]
pub struct Options {
    debug_info: bool,
    lines: bool,
    copyright: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug_info: true,
            lines: true,
            copyright: false,
        }
    }
}

impl Options {
    /// Emit the nonterminal names in `SPELL` together with `RULE_INFO` and `RULE_INDEX`.
    pub fn debug_info(mut self, enabled: bool) -> Self {
        self.debug_info = enabled;
        self
    }

    /// Annotate user code blocks with their location in the grammar file.
    pub fn lines(mut self, enabled: bool) -> Self {
        self.lines = enabled;
        self
    }

    /// Prepend the license banners and emit the index type aliases.
    pub fn copyright(mut self, enabled: bool) -> Self {
        self.copyright = enabled;
        self
    }
}

/// A generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug)]
pub struct Codegen<'g> {
    grammar: &'g Grammar,
    table: &'g ParseTable,
    options: Options,
}

impl<'g> Codegen<'g> {
    pub fn new(grammar: &'g Grammar, table: &'g ParseTable) -> Self {
        Self {
            grammar,
            table,
            options: Options::default(),
        }
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// The name of the tables file when `%merged_output` is not given.
    pub fn table_file_name(&self) -> String {
        format!("{}.rs", self.grammar.directives.table_name().to_lowercase())
    }

    /// The `/: ... :/` blocks.
    pub fn decls(&self) -> String {
        self.code_blocks(&self.grammar.decls)
    }

    /// The `/. ... ./` blocks.
    pub fn impls(&self) -> String {
        self.code_blocks(&self.grammar.impls)
    }

    /// Lay out the generated sources into files.
    pub fn outputs(&self) -> Vec<OutputFile> {
        let directives = &self.grammar.directives;

        if let Some(merged) = &directives.merged_output {
            let mut contents = self.to_string();
            contents.push_str(&self.decls());
            contents.push_str(&self.impls());
            return vec![OutputFile {
                name: merged.clone(),
                contents,
            }];
        }

        let mut outputs = vec![OutputFile {
            name: self.table_file_name(),
            contents: self.to_string(),
        }];
        if let Some(decl_file) = &directives.decl_file {
            outputs.push(OutputFile {
                name: decl_file.clone(),
                contents: self.decls(),
            });
        }
        if let Some(impl_file) = &directives.impl_file {
            outputs.push(OutputFile {
                name: impl_file.clone(),
                contents: self.impls(),
            });
        }
        outputs
    }

    fn code_blocks(&self, blocks: &[CodeBlock]) -> String {
        let mut out = String::new();
        for block in blocks {
            if self.options.lines {
                if let Some(source) = &self.grammar.source_name {
                    out.push_str(&format!("\n// line {} {:?}\n", block.line, source));
                }
            }
            out.push_str(&block.text);
        }
        out
    }

    fn write_consts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.grammar;
        let table = self.table;

        for terminal in g.terminals.values() {
            let name = match terminal.id() {
                TerminalID::EOI => "EOF_SYMBOL".to_string(),
                _ => format!("{}{}", g.directives.token_prefix, terminal.name()),
            };
            writeln!(f, "    pub const {}: i32 = {};", name, terminal.id().index())?;
        }
        writeln!(f)?;

        writeln!(f, "    pub const ACCEPT_STATE: i32 = {};", table.accept_state.index())?;
        writeln!(f, "    pub const RULE_COUNT: usize = {};", g.rules.len())?;
        writeln!(f, "    pub const STATE_COUNT: i32 = {};", table.state_count)?;
        writeln!(f, "    pub const TERMINAL_COUNT: i32 = {};", table.terminal_count)?;
        writeln!(f, "    pub const NON_TERMINAL_COUNT: i32 = {};", table.nonterminal_count)?;
        writeln!(f)?;
        writeln!(f, "    pub const GOTO_INDEX_OFFSET: usize = {};", table.goto_index_offset())?;
        writeln!(f, "    pub const GOTO_INFO_OFFSET: usize = {};", table.goto_info_offset())?;
        writeln!(f, "    pub const GOTO_CHECK_OFFSET: usize = {};", table.goto_check_offset())?;
        writeln!(f)
    }

    fn write_spell(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.grammar;
        let mut spells: Vec<String> = g
            .terminals
            .values()
            .map(|t| match t.spell() {
                Some(spell) => format!("Some({:?})", spell),
                None => "None".to_string(),
            })
            .collect();
        if self.options.debug_info {
            spells.extend(g.nonterminals.values().map(|n| format!("Some({:?})", n.name())));
        }
        write_list(f, "SPELL", "Option<&'static str>", spells)
    }

    fn write_rule_info(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.grammar;
        let mut info = vec![];
        let mut index = vec![];
        for rule in g.rules.values() {
            index.push(info.len());
            info.push(g.symbol_number(SymbolID::N(rule.left())));
            info.extend(rule.right().iter().map(|s| g.symbol_number(*s)));
        }
        write_list(f, "RULE_INFO", "usize", info)?;
        write_list(f, "RULE_INDEX", "usize", index)
    }
}

impl fmt::Display for Codegen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table;
        let name = self.grammar.directives.table_name();

        if self.options.copyright {
            f.write_str(COPYRIGHT_HEADER)?;
            f.write_str(PRIVATE_HEADER)?;
            writeln!(f)?;
        }
        f.write_str(HEADER)?;
        writeln!(f)?;

        if self.options.copyright {
            writeln!(f, "pub type StateIndex = ::lalrgen_runtime::StateIndex;")?;
            writeln!(f, "pub type TerminalIndex = ::lalrgen_runtime::TerminalIndex;")?;
            writeln!(f, "pub type NonterminalIndex = ::lalrgen_runtime::NonterminalIndex;")?;
            writeln!(f, "pub type RuleIndex = ::lalrgen_runtime::RuleIndex;")?;
            writeln!(f)?;
        }

        writeln!(f, "#[allow(non_camel_case_types)]")?;
        writeln!(f, "#[derive(Debug, Copy, Clone, Default)]")?;
        writeln!(f, "pub struct {};", name)?;
        writeln!(f)?;
        writeln!(f, "#[allow(dead_code, non_upper_case_globals)]")?;
        writeln!(f, "impl {} {{", name)?;

        self.write_consts(f)?;
        self.write_spell(f)?;
        write_list(f, "LHS", "i32", &table.lhs)?;
        write_list(f, "RHS", "i32", &table.rhs)?;
        if self.options.debug_info {
            self.write_rule_info(f)?;
        }
        write_list(f, "GOTO_DEFAULT", "i32", &table.goto_default)?;
        write_list(f, "ACTION_DEFAULT", "i32", &table.action_default)?;
        write_list(f, "ACTION_INDEX", "i32", table.action_index())?;
        write_list(f, "ACTION_INFO", "i32", table.action_info())?;
        write_list(f, "ACTION_CHECK", "i32", table.action_check())?;

        f.write_str(
            "\
    pub const TABLES: ::lalrgen_runtime::Tables<'static> = ::lalrgen_runtime::Tables {
        terminal_count: Self::TERMINAL_COUNT,
        nonterminal_count: Self::NON_TERMINAL_COUNT,
        state_count: Self::STATE_COUNT,
        accept_state: Self::ACCEPT_STATE,
        lhs: Self::LHS,
        rhs: Self::RHS,
        goto_default: Self::GOTO_DEFAULT,
        action_default: Self::ACTION_DEFAULT,
        action_index: Self::ACTION_INDEX,
        action_info: Self::ACTION_INFO,
        action_check: Self::ACTION_CHECK,
        goto_index_offset: Self::GOTO_INDEX_OFFSET,
        goto_info_offset: Self::GOTO_INFO_OFFSET,
        goto_check_offset: Self::GOTO_CHECK_OFFSET,
    };

    #[inline]
    pub fn t_action(state: i32, token: i32) -> i32 {
        Self::TABLES.t_action(state, token)
    }

    #[inline]
    pub fn nt_action(state: i32, nt: i32) -> i32 {
        Self::TABLES.nt_action(state, nt)
    }
}
",
        )
    }
}

// ten values per line.
fn write_list<I>(f: &mut fmt::Formatter<'_>, name: &str, ty: &str, values: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    write!(f, "    pub const {}: &'static [{}] = &[", name, ty)?;
    for (i, value) in values.into_iter().enumerate() {
        if i % 10 == 0 {
            write!(f, "\n        ")?;
        } else {
            write!(f, " ")?;
        }
        write!(f, "{},", value)?;
    }
    writeln!(f, "\n    ];\n")
}
