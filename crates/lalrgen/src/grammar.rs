//! Grammar types.

use crate::{
    digraph,
    types::{Map, Set},
    util::{display_fn, join},
};
use std::{fmt, fs, io, marker::PhantomData, path::Path};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    /// The position of this terminal in the symbol table.
    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: String,
    spell: Option<String>,
    precedence: Option<Precedence>,
}
impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The human readable spelling given by `%token NAME "spell"`.
    pub fn spell(&self) -> Option<&str> {
        self.spell.as_deref()
    }

    pub fn precedence(&self) -> Option<Precedence> {
        self.precedence
    }
}
impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}
impl NonterminalID {
    /// The left-hand side of the augmented start rule.
    pub const ACCEPT: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    /// The position of this nonterminal among the nonterminals.
    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    name: String,
}
impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u16,
}

impl RuleID {
    /// `$accept ::= Start $end`, inserted by [`Grammar::build_extended_grammar`].
    pub const ACCEPT: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    /// The rule number used in the emitted tables and by `$rule_number`.
    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }

    /// Panics if `index` does not name a rule, i.e. exceeds the rule id range.
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        assert!(index <= u16::MAX as usize, "rule index out of range");
        Self::new(index as u16)
    }
}

impl fmt::Display for RuleID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Rule {
    id: RuleID,
    left: NonterminalID,
    right: Vec<SymbolID>,
    precedence: Option<Precedence>,
}
impl Rule {
    pub fn id(&self) -> RuleID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// The precedence given by `%prec`, or else the one of the right-most
    /// terminal that has a precedence.
    pub fn precedence(&self, g: &Grammar) -> Option<Precedence> {
        match self.precedence {
            Some(prec) => Some(prec),
            None => self
                .right
                .iter()
                .rev()
                .find_map(|symbol| match symbol {
                    SymbolID::T(t) => Some(t),
                    SymbolID::N(..) => None,
                })
                .and_then(|t| g.terminals[t].precedence()),
        }
    }

    // `"LHS ::= R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} ::=", g.nonterminals[&self.left])?;
            for symbol in &self.right {
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Precedence {
    /// Larger values bind tighter.
    pub priority: u16,
    pub assoc: Assoc,
}

impl Precedence {
    pub const fn new(priority: u16, assoc: Assoc) -> Self {
        Self { priority, assoc }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

impl fmt::Display for Assoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Nonassoc => write!(f, "nonassoc"),
        }
    }
}

/// The settings given by the `%` directives of a grammar file.
#[derive(Debug, Default, Clone)]
#[non_exhaustive]
pub struct Directives {
    /// `%parser`: the name of the generated table type.
    pub table_name: Option<String>,
    /// `%decl`: the file receiving the `/: ... :/` blocks.
    pub decl_file: Option<String>,
    /// `%impl`: the file receiving the `/. ... ./` blocks.
    pub impl_file: Option<String>,
    /// `%merged_output`: write tables and code blocks into a single file.
    pub merged_output: Option<String>,
    pub token_prefix: String,
    pub expected_shift_reduce: usize,
    pub expected_reduce_reduce: usize,
}

impl Directives {
    pub const DEFAULT_TABLE_NAME: &'static str = "parser_table";

    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(Self::DEFAULT_TABLE_NAME)
    }
}

/// A chunk of user code copied verbatim into the generated sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// 1-based line of the first line of `text` in the grammar file.
    pub line: usize,
    pub text: String,
}

/// A set of terminal symbols, e.g. the lookaheads of an item.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}
impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.index())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.index())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.inner.is_disjoint(&other.inner)
    }
    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| u16::try_from(raw).ok().map(TerminalID::new))
    }
}
impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(TerminalID::index).collect(),
        }
    }
}
impl digraph::Set for TerminalSet {
    fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }
}

/// The grammar definition used to derive the parser tables.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, Terminal>,
    pub nonterminals: Map<NonterminalID, Nonterminal>,
    pub rules: Map<RuleID, Rule>,
    pub start_symbol: NonterminalID,
    pub nullables: Set<NonterminalID>,
    pub directives: Directives,
    pub decls: Vec<CodeBlock>,
    pub impls: Vec<CodeBlock>,
    /// The file name used in `// line` annotations of the generated code.
    pub source_name: Option<String>,
    rule_map: Option<Map<NonterminalID, Vec<RuleID>>>,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            write!(f, "{}", terminal)?;
            if let Some(prec) = terminal.precedence() {
                write!(f, " (priority={}, assoc={})", prec.priority, prec.assoc)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for nonterminal in self.nonterminals.values() {
            write!(f, "{}", nonterminal)?;
            if nonterminal.id() == self.start_symbol {
                write!(f, " (start)")?;
            }
            if self.nullables.contains(&nonterminal.id()) {
                write!(f, " (nullable)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for rule in self.rules.values() {
            write!(f, "{:>3}: {}", rule.id(), rule.display(self))?;
            if let Some(prec) = &rule.precedence {
                write!(f, " (priority={}, assoc={})", prec.priority, prec.assoc)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        let mut grammar = Self::from_str(&source)?;
        grammar.source_name = Some(path.display().to_string());
        Ok(grammar)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Grammar, GrammarError> {
        let grammar = crate::syntax::parse(source)?;
        Grammar::define(|g| crate::syntax::define_grammar(g, &grammar))
    }

    /// Define a grammar using the specified function.
    ///
    /// The grammar is validated before being returned: it must have rules,
    /// a start symbol, and every nonterminal must have a rule and be
    /// reachable from the start symbol.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            rules: Map::default(),
            start: None,
            directives: Directives::default(),
            decls: vec![],
            impls: vec![],
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: NonterminalID::OFFSET,
            next_rule_id: RuleID::OFFSET,
            _marker: PhantomData,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                name: "$end".into(),
                spell: None,
                precedence: None,
            },
        );

        def.nonterminals.insert(
            NonterminalID::ACCEPT,
            Nonterminal {
                id: NonterminalID::ACCEPT,
                name: "$accept".into(),
            },
        );

        f(&mut def)?;

        def.end()
    }

    /// Insert the rule `$accept ::= Start $end` as rule 0.
    ///
    /// Returns `false` without touching the grammar if the rule is already present.
    pub fn build_extended_grammar(&mut self) -> bool {
        if self.is_extended() {
            tracing::debug!("the grammar has already been extended");
            return false;
        }

        let mut rules = Map::default();
        rules.reserve(self.rules.len() + 1);
        rules.insert(
            RuleID::ACCEPT,
            Rule {
                id: RuleID::ACCEPT,
                left: NonterminalID::ACCEPT,
                right: vec![SymbolID::N(self.start_symbol), SymbolID::T(TerminalID::EOI)],
                precedence: None,
            },
        );
        rules.extend(self.rules.drain(..));
        self.rules = rules;

        // The rule map depends on the rule table.
        self.rule_map = None;
        true
    }

    pub fn is_extended(&self) -> bool {
        self.rules.contains_key(&RuleID::ACCEPT)
    }

    /// Group the rules by their left-hand side, in rule order.
    pub fn build_rule_map(&mut self) {
        let mut rule_map: Map<NonterminalID, Vec<RuleID>> = Map::default();
        for rule in self.rules.values() {
            rule_map.entry(rule.left).or_default().push(rule.id);
        }
        self.rule_map = Some(rule_map);
    }

    pub fn has_rule_map(&self) -> bool {
        self.rule_map.is_some()
    }

    /// Return the rules whose left-hand side is `n`.
    ///
    /// # Panics
    /// Panics if [`build_rule_map`](Self::build_rule_map) has not been called.
    pub fn rules_of(&self, n: NonterminalID) -> &[RuleID] {
        let rule_map = self
            .rule_map
            .as_ref()
            .expect("build_rule_map() must be called before looking up rules");
        rule_map.get(&n).map_or(&[], |rules| &rules[..])
    }

    pub fn rule(&self, id: RuleID) -> &Rule {
        &self.rules[&id]
    }

    #[inline]
    pub fn is_terminal(&self, symbol: SymbolID) -> bool {
        matches!(symbol, SymbolID::T(..))
    }

    #[inline]
    pub fn is_nonterminal(&self, symbol: SymbolID) -> bool {
        matches!(symbol, SymbolID::N(..))
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminals[&t].name(),
            SymbolID::N(n) => self.nonterminals[&n].name(),
        }
    }

    /// The number of a symbol in the emitted tables.
    ///
    /// Terminals come first, followed by the nonterminals.
    pub fn symbol_number(&self, symbol: SymbolID) -> usize {
        match symbol {
            SymbolID::T(t) => t.index(),
            SymbolID::N(n) => self.terminals.len() + n.index(),
        }
    }

    pub fn is_nullable(&self, symbol: SymbolID) -> bool {
        match symbol {
            SymbolID::T(..) => false,
            SymbolID::N(n) => self.nullables.contains(&n),
        }
    }

    /// Return the declared terminals that never appear in a rule.
    pub fn unused_terminals(&self) -> Vec<TerminalID> {
        let mut used = Set::default();
        for rule in self.rules.values() {
            for symbol in &rule.right {
                if let SymbolID::T(t) = symbol {
                    used.insert(*t);
                }
            }
        }
        self.terminals
            .keys()
            .filter(|t| **t != TerminalID::EOI && !used.contains(*t))
            .copied()
            .collect()
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<'def> {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    rules: Map<RuleID, Rule>,
    start: Option<NonterminalID>,
    directives: Directives,
    decls: Vec<CodeBlock>,
    impls: Vec<CodeBlock>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    next_rule_id: u16,
    _marker: PhantomData<&'def mut ()>,
}

impl<'def> GrammarDef<'def> {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str, spell: Option<&str>) -> Result<TerminalID, GrammarError> {
        // The terminal is exported as a constant named `<prefix><name>`.
        let exported = format!("{}{}", self.directives.token_prefix, name);
        if !verify_ident(&exported) {
            return Err(GrammarError::InvalidName { name: name.into() });
        }
        if self.lookup(name).is_some() {
            return Err(GrammarError::DuplicateSymbol { name: name.into() });
        }

        let id = TerminalID::new(self.next_terminal_id);
        self.next_terminal_id = next_id(self.next_terminal_id)?;

        self.terminals.insert(
            id,
            Terminal {
                id,
                name: name.into(),
                spell: spell.map(Into::into),
                precedence: None,
            },
        );

        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarError> {
        if !verify_symbol_name(name) {
            return Err(GrammarError::InvalidName { name: name.into() });
        }
        if self.lookup(name).is_some() {
            return Err(GrammarError::DuplicateSymbol { name: name.into() });
        }

        let id = NonterminalID::new(self.next_nonterminal_id);
        self.next_nonterminal_id = next_id(self.next_nonterminal_id)?;

        self.nonterminals.insert(
            id,
            Nonterminal {
                id,
                name: name.into(),
            },
        );

        Ok(id)
    }

    /// Find a declared symbol by its name.
    pub fn lookup(&self, name: &str) -> Option<SymbolID> {
        if let Some(t) = self.terminals.values().find(|t| t.name == name) {
            return Some(SymbolID::T(t.id));
        }
        self.nonterminals
            .values()
            .find(|n| n.name == name)
            .map(|n| SymbolID::N(n.id))
    }

    /// Assign a precedence to a declared terminal.
    pub fn precedence(
        &mut self,
        terminal: TerminalID,
        precedence: Precedence,
    ) -> Result<(), GrammarError> {
        let t = self
            .terminals
            .get_mut(&terminal)
            .ok_or(GrammarError::UndeclaredTerminal { id: terminal })?;
        t.precedence = Some(precedence);
        Ok(())
    }

    pub fn precedence_of(&self, terminal: TerminalID) -> Option<Precedence> {
        self.terminals.get(&terminal).and_then(|t| t.precedence)
    }

    /// The number of the symbol in the emitted tables.
    ///
    /// Only meaningful once every terminal has been declared.
    pub fn symbol_number(&self, symbol: SymbolID) -> usize {
        match symbol {
            SymbolID::T(t) => t.index(),
            SymbolID::N(n) => self.terminals.len() + n.index(),
        }
    }

    /// Specify a production rule into this grammer.
    pub fn rule<I>(
        &mut self,
        left: NonterminalID,
        right: I,
        precedence: Option<Precedence>,
    ) -> Result<RuleID, GrammarError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let right: Vec<_> = right.into_iter().collect();
        if self
            .rules
            .values()
            .any(|rule| rule.left == left && rule.right == right)
        {
            return Err(GrammarError::DuplicateRule {
                rule: self.display_rule(left, &right),
            });
        }

        let id = RuleID::new(self.next_rule_id);
        self.next_rule_id = self
            .next_rule_id
            .checked_add(1)
            .ok_or(GrammarError::TooManyRules)?;
        self.rules.insert(
            id,
            Rule {
                id,
                left,
                right,
                precedence,
            },
        );

        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarError> {
        self.start.replace(symbol);
        Ok(())
    }

    pub fn directives(&mut self) -> &mut Directives {
        &mut self.directives
    }

    pub fn decl(&mut self, block: CodeBlock) {
        self.decls.push(block);
    }

    pub fn impl_(&mut self, block: CodeBlock) {
        self.impls.push(block);
    }

    fn display_rule(&self, left: NonterminalID, right: &[SymbolID]) -> String {
        let mut out = format!("{} ::=", self.nonterminals[&left].name);
        for symbol in right {
            out.push(' ');
            out.push_str(match symbol {
                SymbolID::T(t) => &self.terminals[t].name,
                SymbolID::N(n) => &self.nonterminals[n].name,
            });
        }
        out
    }

    fn end(self) -> Result<Grammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::NoRules);
        }
        let start = self.start.ok_or(GrammarError::NoStartSymbol)?;

        let mut has_rules = Set::default();
        for rule in self.rules.values() {
            has_rules.insert(rule.left);
        }
        let missing: Vec<_> = self
            .nonterminals
            .values()
            .filter(|n| n.id != NonterminalID::ACCEPT && !has_rules.contains(&n.id))
            .map(|n| n.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(GrammarError::NoProductions { names: missing });
        }

        let mut reachable = Set::default();
        reachable.insert(start);
        let mut i = 0;
        while let Some(&n) = reachable.get_index(i) {
            for rule in self.rules.values().filter(|rule| rule.left == n) {
                for symbol in &rule.right {
                    if let SymbolID::N(n) = symbol {
                        reachable.insert(*n);
                    }
                }
            }
            i += 1;
        }
        let unreachable: Vec<_> = self
            .nonterminals
            .values()
            .filter(|n| n.id != NonterminalID::ACCEPT && !reachable.contains(&n.id))
            .map(|n| n.name.clone())
            .collect();
        if !unreachable.is_empty() {
            return Err(GrammarError::Unreachable { names: unreachable });
        }

        let mut nullables = Set::default();
        loop {
            let mut changed = false;
            for rule in self.rules.values() {
                if rule
                    .right
                    .iter()
                    .all(|s| matches!(s, SymbolID::N(n) if nullables.contains(n)))
                {
                    changed |= nullables.insert(rule.left);
                }
            }
            if !changed {
                break;
            }
        }

        tracing::debug!(
            terminals = self.terminals.len(),
            nonterminals = self.nonterminals.len(),
            rules = self.rules.len(),
            "grammar loaded"
        );

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            rules: self.rules,
            start_symbol: start,
            nullables,
            directives: self.directives,
            decls: self.decls,
            impls: self.impls,
            source_name: None,
            rule_map: None,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(#[from] crate::syntax::SyntaxError),

    #[error("No rules!")]
    NoRules,

    #[error("No start symbol!")]
    NoStartSymbol,

    #[error("the nonterminal(s) {} have no rules", join(.names, ", "))]
    NoProductions { names: Vec<String> },

    #[error("the nonterminal(s) {} are unreachable from the start symbol", join(.names, ", "))]
    Unreachable { names: Vec<String> },

    #[error("duplicated rule `{}'", rule)]
    DuplicateRule { rule: String },

    #[error("the symbol `{}' has already been declared", name)]
    DuplicateSymbol { name: String },

    #[error("incorrect symbol name `{}'", name)]
    InvalidName { name: String },

    #[error("the symbol `{}' has no precedence", name)]
    UnknownPrecedence { name: String },

    #[error("the terminal {:?} is not declared in this grammar", id)]
    UndeclaredTerminal { id: TerminalID },

    #[error("too many symbols (at most {} terminals or nonterminals)", u16::MAX)]
    TooManySymbols,

    #[error("too many rules (at most {})", u16::MAX)]
    TooManyRules,

    #[error("Other error: {}", msg)]
    Other { msg: String },
}

fn next_id(raw: u16) -> Result<u16, GrammarError> {
    raw.checked_add(1).ok_or(GrammarError::TooManySymbols)
}

// Nonterminal names are never exported as Rust items, so `.` is allowed as in
// the grammar file syntax.
fn verify_symbol_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(ch) if is_ident_start(ch) => chars.all(|ch| ch == '.' || is_ident_continue(ch)),
        _ => false,
    }
}

fn verify_ident(s: &str) -> bool {
    if is_strict_keyword(s) || is_reserved(s) {
        return false;
    }

    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => chars.all(is_ident_continue),
        _ => false,
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || unicode_ident::is_xid_start(ch)
}

fn is_ident_continue(ch: char) -> bool {
    unicode_ident::is_xid_continue(ch)
}

fn is_strict_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break" | "const" | "continue" | "crate" | "else" | "enum" | "extern"
        | "false" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "match" | "mod"
        | "move" | "mut" | "pub" | "ref" | "return" | "self" | "Self" | "static" | "struct"
        | "super" | "trait" | "true" | "type" | "unsafe" | "use" | "where" | "while"
        // since Rust 2018
        | "async" | "await" | "dyn"
    )
}

fn is_reserved(s: &str) -> bool {
    matches!(
        s,
        "abstract" | "become" | "box" | "do" | "final" | "macro" | "override" | "priv"
        | "typeof" | "unsized" | "virtual" | "yield"
        // since Rust 2018
        | "try" | "_"
    )
}

/// Grammars used by the tests and benchmarks.
pub mod examples {
    use super::*;
    use SymbolID::*;

    /// `S ::= a S b | a b`
    #[allow(nonstandard_style)]
    pub fn balanced(g: &mut GrammarDef) -> Result<(), GrammarError> {
        let a = g.terminal("a", None)?;
        let b = g.terminal("b", None)?;
        let S = g.nonterminal("S")?;

        g.start_symbol(S)?;

        g.rule(S, [T(a), N(S), T(b)], None)?;
        g.rule(S, [T(a), T(b)], None)?;
        Ok(())
    }

    /// `S ::= A | B; A ::= x; B ::= x`, a reduce/reduce conflict on `$end`.
    #[allow(nonstandard_style)]
    pub fn reduce_reduce(g: &mut GrammarDef) -> Result<(), GrammarError> {
        let x = g.terminal("x", None)?;
        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;

        g.start_symbol(S)?;

        g.rule(S, [N(A)], None)?;
        g.rule(S, [N(B)], None)?;
        g.rule(A, [T(x)], None)?;
        g.rule(B, [T(x)], None)?;
        Ok(())
    }

    /// `U` has a rule but can never be derived from `S`.
    #[allow(nonstandard_style)]
    pub fn unreachable(g: &mut GrammarDef) -> Result<(), GrammarError> {
        let a = g.terminal("a", None)?;
        let b = g.terminal("b", None)?;
        let S = g.nonterminal("S")?;
        let U = g.nonterminal("U")?;

        g.start_symbol(S)?;

        g.rule(S, [T(a)], None)?;
        g.rule(U, [T(b)], None)?;
        Ok(())
    }

    pub fn arithmetic(g: &mut GrammarDef) -> Result<(), GrammarError> {
        let lparen = g.terminal("LPAREN", Some("("))?;
        let rparen = g.terminal("RPAREN", Some(")"))?;
        let plus = g.terminal("PLUS", Some("+"))?;
        let minus = g.terminal("MINUS", Some("-"))?;
        let star = g.terminal("STAR", Some("*"))?;
        let slash = g.terminal("SLASH", Some("/"))?;
        let num = g.terminal("NUM", None)?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let factor = g.nonterminal("factor")?;
        let atom = g.nonterminal("atom")?;

        g.start_symbol(expr)?;

        g.rule(expr, [N(expr), T(plus), N(term)], None)?;
        g.rule(expr, [N(expr), T(minus), N(term)], None)?;
        g.rule(expr, [N(term)], None)?;

        g.rule(term, [N(term), T(star), N(factor)], None)?;
        g.rule(term, [N(term), T(slash), N(factor)], None)?;
        g.rule(term, [N(factor)], None)?;

        g.rule(factor, [T(minus), N(factor)], None)?;
        g.rule(factor, [N(atom)], None)?;

        g.rule(atom, [T(num)], None)?;
        g.rule(atom, [T(lparen), N(expr), T(rparen)], None)?;
        Ok(())
    }

    /// An ambiguous expression grammar disambiguated by precedence.
    pub fn arithmetic_prec(g: &mut GrammarDef) -> Result<(), GrammarError> {
        let prec_add = Precedence::new(0, Assoc::Left);
        let prec_mul = Precedence::new(1, Assoc::Left);
        let prec_pow = Precedence::new(2, Assoc::Right);
        let prec_neg = Precedence::new(3, Assoc::Nonassoc);

        let lparen = g.terminal("LPAREN", Some("("))?;
        let rparen = g.terminal("RPAREN", Some(")"))?;
        let plus = g.terminal("PLUS", Some("+"))?;
        let minus = g.terminal("MINUS", Some("-"))?;
        let star = g.terminal("STAR", Some("*"))?;
        let slash = g.terminal("SLASH", Some("/"))?;
        let caret = g.terminal("CARET", Some("^"))?;
        let num = g.terminal("NUM", None)?;

        g.precedence(plus, prec_add)?;
        g.precedence(minus, prec_add)?;
        g.precedence(star, prec_mul)?;
        g.precedence(slash, prec_mul)?;
        g.precedence(caret, prec_pow)?;

        let expr = g.nonterminal("expr")?;

        g.start_symbol(expr)?;

        g.rule(expr, [N(expr), T(plus), N(expr)], None)?;
        g.rule(expr, [N(expr), T(minus), N(expr)], None)?;
        g.rule(expr, [N(expr), T(star), N(expr)], None)?;
        g.rule(expr, [N(expr), T(slash), N(expr)], None)?;
        g.rule(expr, [N(expr), T(caret), N(expr)], None)?;
        g.rule(expr, [T(minus), N(expr)], Some(prec_neg))?;
        g.rule(expr, [T(num)], None)?;
        g.rule(expr, [T(lparen), N(expr), T(rparen)], None)?;
        Ok(())
    }

    /// Nullable and mutually recursive nonterminals, producing cycles in
    /// the `includes` relation.
    ///
    /// ```text
    /// E ::= E PLUS T n | T
    /// T ::= a | LPAREN E n RPAREN | n a
    /// n ::= | NUM
    /// ```
    pub fn with_nullable(g: &mut GrammarDef) -> Result<(), GrammarError> {
        let lparen = g.terminal("LPAREN", None)?;
        let rparen = g.terminal("RPAREN", None)?;
        let plus = g.terminal("PLUS", None)?;
        let a = g.terminal("a", None)?;
        let num = g.terminal("NUM", None)?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let nullable = g.nonterminal("nullable")?;

        g.start_symbol(expr)?;

        g.rule(expr, [N(expr), T(plus), N(term), N(nullable)], None)?;
        g.rule(expr, [N(term)], None)?;

        g.rule(term, [T(a)], None)?;
        g.rule(term, [T(lparen), N(expr), N(nullable), T(rparen)], None)?;
        g.rule(term, [N(nullable), T(a)], None)?;

        g.rule(nullable, [], None)?;
        g.rule(nullable, [T(num)], None)?;
        Ok(())
    }

    /// Unit and nullable rules forming a cycle in the `includes` relation.
    ///
    /// ```text
    /// A ::= B c | a | B
    /// B ::= A |
    /// ```
    #[allow(nonstandard_style)]
    pub fn cyclic(g: &mut GrammarDef) -> Result<(), GrammarError> {
        let a = g.terminal("a", None)?;
        let c = g.terminal("c", None)?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;

        g.start_symbol(A)?;

        g.rule(A, [N(B), T(c)], None)?;
        g.rule(A, [T(a)], None)?;
        g.rule(A, [N(B)], None)?;
        g.rule(B, [N(A)], None)?;
        g.rule(B, [], None)?;
        Ok(())
    }

    /// Two reducible items with disjoint lookaheads in the state reached on `c`.
    ///
    /// ```text
    /// S ::= X a | Y b | Y d
    /// X ::= c
    /// Y ::= c
    /// ```
    #[allow(nonstandard_style)]
    pub fn disjoint_reductions(g: &mut GrammarDef) -> Result<(), GrammarError> {
        let a = g.terminal("a", None)?;
        let b = g.terminal("b", None)?;
        let c = g.terminal("c", None)?;
        let d = g.terminal("d", None)?;
        let S = g.nonterminal("S")?;
        let X = g.nonterminal("X")?;
        let Y = g.nonterminal("Y")?;

        g.start_symbol(S)?;

        g.rule(S, [N(X), T(a)], None)?;
        g.rule(S, [N(Y), T(b)], None)?;
        g.rule(S, [N(Y), T(d)], None)?;
        g.rule(X, [T(c)], None)?;
        g.rule(Y, [T(c)], None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_grammar_is_built_once() {
        let mut g = Grammar::define(examples::balanced).unwrap();
        assert!(!g.is_extended());
        assert_eq!(g.rules.len(), 2);

        assert!(g.build_extended_grammar());
        assert_eq!(g.rules.len(), 3);
        assert_eq!(g.rules.get_index(0).map(|(id, _)| *id), Some(RuleID::ACCEPT));
        let accept = g.rule(RuleID::ACCEPT);
        assert_eq!(accept.left(), NonterminalID::ACCEPT);
        assert_eq!(
            accept.right(),
            [SymbolID::N(g.start_symbol), SymbolID::T(TerminalID::EOI)]
        );

        assert!(!g.build_extended_grammar());
        assert_eq!(g.rules.len(), 3);
    }

    #[test]
    fn rule_map_keeps_rule_order() {
        let mut g = Grammar::define(examples::arithmetic).unwrap();
        g.build_extended_grammar();
        g.build_rule_map();
        let expr = g.start_symbol;
        let rules: Vec<_> = g.rules_of(expr).iter().map(|r| r.index()).collect();
        assert_eq!(rules, [1, 2, 3]);
        assert_eq!(g.rules_of(NonterminalID::ACCEPT), [RuleID::ACCEPT]);
    }

    #[test]
    fn symbol_tags_and_numbers() {
        let g = Grammar::define(examples::balanced).unwrap();
        let a = SymbolID::T(TerminalID::new(1));
        let s = SymbolID::N(g.start_symbol);
        assert!(g.is_terminal(a));
        assert!(!g.is_nonterminal(a));
        assert!(g.is_nonterminal(s));
        // $end a b | $accept S
        assert_eq!(g.symbol_number(a), 1);
        assert_eq!(g.symbol_number(s), 4);
    }

    #[test]
    fn nullables() {
        let g = Grammar::define(examples::with_nullable).unwrap();
        let names: Vec<_> = g
            .nullables
            .iter()
            .map(|n| g.nonterminals[n].name())
            .collect();
        assert_eq!(names, ["nullable"]);

        let g = Grammar::define(examples::cyclic).unwrap();
        assert_eq!(g.nullables.len(), 2);
    }

    #[test]
    fn rule_precedence_falls_back_to_rightmost_terminal() {
        let g = Grammar::define(examples::arithmetic_prec).unwrap();
        let precs: Vec<_> = g
            .rules
            .values()
            .map(|r| r.precedence(&g).map(|p| p.priority))
            .collect();
        assert_eq!(
            precs,
            [Some(0), Some(0), Some(1), Some(1), Some(2), Some(3), None, None]
        );
    }

    #[test]
    fn empty_grammar_is_rejected() {
        let err = Grammar::define(|_| Ok(())).unwrap_err();
        assert!(matches!(err, GrammarError::NoRules));
    }

    #[test]
    fn missing_start_symbol_is_rejected() {
        let err = Grammar::define(|g| {
            let a = g.terminal("a", None)?;
            let s = g.nonterminal("S")?;
            g.rule(s, [SymbolID::T(a)], None)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::NoStartSymbol));
    }

    #[test]
    fn nonterminal_without_rules_is_rejected() {
        let err = Grammar::define(|g| {
            let s = g.nonterminal("S")?;
            let x = g.nonterminal("X")?;
            g.start_symbol(s)?;
            g.rule(s, [SymbolID::N(x)], None)?;
            Ok(())
        })
        .unwrap_err();
        match err {
            GrammarError::NoProductions { names } => assert_eq!(names, ["X"]),
            err => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn unreachable_nonterminal_is_rejected() {
        let err = Grammar::define(examples::unreachable).unwrap_err();
        match err {
            GrammarError::Unreachable { names } => assert_eq!(names, ["U"]),
            err => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = Grammar::define(|g| {
            let a = g.terminal("a", None)?;
            let s = g.nonterminal("S")?;
            g.start_symbol(s)?;
            g.rule(s, [SymbolID::T(a)], None)?;
            g.rule(s, [SymbolID::T(a)], None)?;
            Ok(())
        })
        .unwrap_err();
        match err {
            GrammarError::DuplicateRule { rule } => assert_eq!(rule, "S ::= a"),
            err => panic!("unexpected error: {}", err),
        }

        let err = Grammar::define(|g| {
            g.terminal("a", None)?;
            g.nonterminal("a")?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::DuplicateSymbol { .. }));
    }

    #[test]
    fn token_names_must_be_identifiers() {
        let err = Grammar::define(|g| {
            g.terminal("fn", None)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::InvalidName { .. }));

        // a prefix turns a keyword into a valid constant name.
        let g = Grammar::define(|g| {
            g.directives().token_prefix = "T_".into();
            let t = g.terminal("fn", None)?;
            let s = g.nonterminal("Decl.list")?;
            g.start_symbol(s)?;
            g.rule(s, [SymbolID::T(t)], None)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(g.terminals.len(), 2);
    }

    #[test]
    fn unused_terminals() {
        let g = Grammar::define(|g| {
            let a = g.terminal("a", None)?;
            g.terminal("b", None)?;
            let s = g.nonterminal("S")?;
            g.start_symbol(s)?;
            g.rule(s, [SymbolID::T(a)], None)?;
            Ok(())
        })
        .unwrap();
        let unused: Vec<_> = g
            .unused_terminals()
            .into_iter()
            .map(|t| g.terminals[&t].name())
            .collect();
        assert_eq!(unused, ["b"]);
    }

    #[test]
    fn display() {
        let g = Grammar::define(examples::balanced).unwrap();
        let text = g.to_string();
        assert!(text.contains("## terminals:\n$end\na\nb\n"));
        assert!(text.contains("S (start)"));
        assert!(text.contains("  1: S ::= a S b\n"));
        assert!(text.contains("  2: S ::= a b\n"));
    }

    #[test]
    fn precedence_requires_a_declared_terminal() {
        let err = Grammar::define(|g| {
            let a = g.terminal("a", None)?;
            g.precedence(a, Precedence::new(0, Assoc::Left))?;
            g.precedence(TerminalID::new(7), Precedence::new(0, Assoc::Left))?;
            Ok(())
        })
        .unwrap_err();
        match err {
            GrammarError::UndeclaredTerminal { id } => assert_eq!(id, TerminalID::new(7)),
            err => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn id_space_is_bounded() {
        let err = Grammar::define(|g| {
            g.next_terminal_id = u16::MAX;
            g.terminal("a", None)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::TooManySymbols));

        let err = Grammar::define(|g| {
            g.next_nonterminal_id = u16::MAX;
            g.nonterminal("S")?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::TooManySymbols));

        let err = Grammar::define(|g| {
            let a = g.terminal("a", None)?;
            let s = g.nonterminal("S")?;
            g.start_symbol(s)?;
            g.next_rule_id = u16::MAX;
            g.rule(s, [SymbolID::T(a)], None)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::TooManyRules));
    }

    #[test]
    fn terminal_set() {
        let mut set: TerminalSet = [TerminalID::new(1), TerminalID::new(3)].into_iter().collect();
        assert!(set.contains(TerminalID::new(3)));
        assert!(!set.insert(TerminalID::new(1)));
        let other: TerminalSet = [TerminalID::EOI].into_iter().collect();
        assert!(set.is_disjoint(&other));
        assert!(<TerminalSet as digraph::Set>::union_with(&mut set, &other));
        assert!(!<TerminalSet as digraph::Set>::union_with(&mut set, &other));
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            [TerminalID::EOI, TerminalID::new(1), TerminalID::new(3)]
        );
    }
}
