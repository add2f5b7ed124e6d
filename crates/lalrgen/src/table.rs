//! Calculation of the LALR(1) parse table with conflict resolution.

use crate::{
    automaton::{Automaton, StateID},
    compress::{compress, Compressed},
    grammar::{Assoc, Grammar, NonterminalID, RuleID, SymbolID, TerminalID},
    util::display_fn,
};
use bit_vec::BitVec;
use std::{cmp::Ordering, fmt};

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production rule.
    Reduce(RuleID),

    /// Reject the lookahead symbol.
    Error,
}

impl Action {
    /// `s` for a shift into `s`, `-(r + 1)` for a reduction by rule `r`, `0` for an error.
    pub fn encode(self) -> i32 {
        match self {
            Self::Shift(s) => s.index() as i32,
            Self::Reduce(r) => -(r.index() as i32) - 1,
            Self::Error => 0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// The shift was kept.
    ShiftReduce { shift: StateID, rule: RuleID },
    /// The lower numbered rule was kept.
    ReduceReduce { kept: RuleID, dropped: RuleID },
}

/// A conflict found while filling the action table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub terminal: TerminalID,
    pub kind: ConflictKind,
}

impl Conflict {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| match self.kind {
            ConflictKind::ShiftReduce { rule, .. } => write!(
                f,
                "Found a shift/reduce conflict in state {} on token `{}' with rule {}",
                self.state, g.terminals[&self.terminal], rule
            ),
            ConflictKind::ReduceReduce { kept, dropped } => write!(
                f,
                "Found a reduce/reduce conflict in state {} on token `{}' between rule {} and {}, resolved using rule {}",
                self.state, g.terminals[&self.terminal], dropped, kept, kept
            ),
        })
    }
}

/// The uncompressed and compressed parse tables of an automaton.
#[derive(Debug)]
#[non_exhaustive]
pub struct ParseTable {
    pub state_count: usize,
    pub terminal_count: usize,
    pub nonterminal_count: usize,
    pub accept_state: StateID,

    /// `[state][terminal]`, without the entries covered by `action_default`.
    pub actions: Vec<Vec<i32>>,
    /// `[state][nonterminal]`, without the entries covered by `goto_default`.
    pub gotos: Vec<Vec<i32>>,
    /// The default rule of each state plus one, `0` if none.
    pub action_default: Vec<i32>,
    /// The most frequent target state of each nonterminal.
    pub goto_default: Vec<i32>,

    /// The symbol number of the left-hand side of each rule.
    pub lhs: Vec<i32>,
    /// The length of the right-hand side of each rule.
    pub rhs: Vec<i32>,

    pub conflicts: Vec<Conflict>,
    /// `[state][terminal]`, the error entries inserted by `%nonassoc`.
    pub nonassoc_errors: Vec<BitVec>,
    /// Rules never used by a reduction, except the accept rule.
    pub useless_rules: Vec<RuleID>,

    pub compressed_action: Compressed,
    pub compressed_goto: Compressed,
}

impl ParseTable {
    pub fn shift_reduce_conflicts(&self) -> usize {
        self.conflicts
            .iter()
            .filter(|c| matches!(c.kind, ConflictKind::ShiftReduce { .. }))
            .count()
    }

    pub fn reduce_reduce_conflicts(&self) -> usize {
        self.conflicts.len() - self.shift_reduce_conflicts()
    }

    /// Return whether the conflict counts differ from `%expect` and `%expect-rr`.
    pub fn has_unexpected_conflicts(&self, g: &Grammar) -> bool {
        !self.conflicts.is_empty()
            && (self.shift_reduce_conflicts() != g.directives.expected_shift_reduce
                || self.reduce_reduce_conflicts() != g.directives.expected_reduce_reduce)
    }

    /// The action on `terminal` in `state`, including the default reduction.
    pub fn action(&self, state: StateID, terminal: TerminalID) -> Action {
        decode(match self.actions[state.index()][terminal.index()] {
            0 => -self.action_default[state.index()],
            act => act,
        })
    }

    pub fn is_nonassoc_error(&self, state: StateID, terminal: TerminalID) -> bool {
        self.nonassoc_errors[state.index()]
            .get(terminal.index())
            .unwrap_or(false)
    }

    /// The successor of `state` after reducing to `symbol`.
    pub fn goto(&self, state: StateID, symbol: NonterminalID) -> Option<StateID> {
        let next = match self.gotos[state.index()][symbol.index()] {
            0 => self.goto_default[symbol.index()],
            next => next,
        };
        (next > 0).then(|| StateID::from_index(next as usize))
    }

    pub fn goto_index_offset(&self) -> usize {
        self.compressed_action.index.len()
    }

    pub fn goto_info_offset(&self) -> usize {
        self.compressed_action.info.len()
    }

    pub fn goto_check_offset(&self) -> usize {
        self.compressed_action.check.len()
    }

    /// The action section followed by the goto section.
    pub fn action_index(&self) -> Vec<i32> {
        concat(&self.compressed_action.index, &self.compressed_goto.index)
    }

    pub fn action_info(&self) -> Vec<i32> {
        concat(&self.compressed_action.info, &self.compressed_goto.info)
    }

    pub fn action_check(&self) -> Vec<i32> {
        concat(&self.compressed_action.check, &self.compressed_goto.check)
    }
}

fn concat(a: &[i32], b: &[i32]) -> Vec<i32> {
    let mut v = Vec::with_capacity(a.len() + b.len());
    v.extend_from_slice(a);
    v.extend_from_slice(b);
    v
}

fn decode(act: i32) -> Action {
    match act.cmp(&0) {
        Ordering::Greater => Action::Shift(StateID::from_index(act as usize)),
        Ordering::Less => Action::Reduce(RuleID::from_index((-act - 1) as usize)),
        Ordering::Equal => Action::Error,
    }
}

/// The owned arrays of a [`ParseTable`], borrowable as runtime tables.
#[derive(Debug, Clone)]
pub struct OwnedTables {
    terminal_count: i32,
    nonterminal_count: i32,
    state_count: i32,
    accept_state: i32,
    lhs: Vec<i32>,
    rhs: Vec<i32>,
    goto_default: Vec<i32>,
    action_default: Vec<i32>,
    action_index: Vec<i32>,
    action_info: Vec<i32>,
    action_check: Vec<i32>,
    goto_index_offset: usize,
    goto_info_offset: usize,
    goto_check_offset: usize,
}

impl OwnedTables {
    pub fn new(table: &ParseTable) -> Self {
        Self {
            terminal_count: table.terminal_count as i32,
            nonterminal_count: table.nonterminal_count as i32,
            state_count: table.state_count as i32,
            accept_state: table.accept_state.index() as i32,
            lhs: table.lhs.clone(),
            rhs: table.rhs.clone(),
            goto_default: table.goto_default.clone(),
            action_default: table.action_default.clone(),
            action_index: table.action_index(),
            action_info: table.action_info(),
            action_check: table.action_check(),
            goto_index_offset: table.goto_index_offset(),
            goto_info_offset: table.goto_info_offset(),
            goto_check_offset: table.goto_check_offset(),
        }
    }

    pub fn as_tables(&self) -> lalrgen_runtime::Tables<'_> {
        lalrgen_runtime::Tables {
            terminal_count: self.terminal_count,
            nonterminal_count: self.nonterminal_count,
            state_count: self.state_count,
            accept_state: self.accept_state,
            lhs: &self.lhs,
            rhs: &self.rhs,
            goto_default: &self.goto_default,
            action_default: &self.action_default,
            action_index: &self.action_index,
            action_info: &self.action_info,
            action_check: &self.action_check,
            goto_index_offset: self.goto_index_offset,
            goto_info_offset: self.goto_info_offset,
            goto_check_offset: self.goto_check_offset,
        }
    }
}

/// Fill and compress the parse table of the automaton.
pub fn generate(aut: &Automaton<'_>) -> ParseTable {
    let g = aut.grammar();
    let state_count = aut.states().len();
    let terminal_count = g.terminals.len();
    let nonterminal_count = g.nonterminals.len();

    let mut actions = vec![vec![0i32; terminal_count]; state_count];
    let mut gotos = vec![vec![0i32; nonterminal_count]; state_count];
    let mut conflicts = vec![];
    // explicit errors inserted by %nonassoc.
    let mut errors = vec![BitVec::from_elem(terminal_count, false); state_count];

    for state in aut.states() {
        let q = state.id().index();
        for (symbol, to) in state.bundle() {
            match symbol {
                SymbolID::T(t) => actions[q][t.index()] = Action::Shift(*to).encode(),
                SymbolID::N(n) => gotos[q][n.index()] = to.index() as i32,
            }
        }

        for (item, lookaheads) in aut.reductions(state.id()) {
            let rule = item.rule;
            for t in lookaheads.iter() {
                if errors[q].get(t.index()).unwrap_or(false) {
                    continue;
                }
                let slot = &mut actions[q][t.index()];
                match decode(*slot) {
                    Action::Error => *slot = Action::Reduce(rule).encode(),

                    Action::Reduce(other) => {
                        let (kept, dropped) = if other < rule {
                            (other, rule)
                        } else {
                            (rule, other)
                        };
                        *slot = Action::Reduce(kept).encode();
                        conflicts.push(Conflict {
                            state: state.id(),
                            terminal: t,
                            kind: ConflictKind::ReduceReduce { kept, dropped },
                        });
                    }

                    Action::Shift(shift) => {
                        let rule_prec = g.rule(rule).precedence(g);
                        let token_prec = g.terminals[&t].precedence();
                        match (rule_prec, token_prec) {
                            (Some(rule_prec), Some(token_prec)) => {
                                match rule_prec.priority.cmp(&token_prec.priority) {
                                    Ordering::Greater => *slot = Action::Reduce(rule).encode(),
                                    Ordering::Less => (),
                                    Ordering::Equal => match rule_prec.assoc {
                                        Assoc::Left => *slot = Action::Reduce(rule).encode(),
                                        Assoc::Right => (),
                                        Assoc::Nonassoc => {
                                            *slot = Action::Error.encode();
                                            errors[q].set(t.index(), true);
                                        }
                                    },
                                }
                            }
                            _ => conflicts.push(Conflict {
                                state: state.id(),
                                terminal: t,
                                kind: ConflictKind::ShiftReduce { shift, rule },
                            }),
                        }
                    }
                }
            }
        }
    }

    let mut used_rules = BitVec::from_elem(g.rules.len(), false);
    for row in &actions {
        for act in row {
            if let Action::Reduce(rule) = decode(*act) {
                used_rules.set(rule.index(), true);
            }
        }
    }
    let useless_rules: Vec<_> = g
        .rules
        .keys()
        .filter(|r| **r != RuleID::ACCEPT && !used_rules.get(r.index()).unwrap_or(false))
        .copied()
        .collect();

    // A state with explicit errors must not fall back to a default reduction.
    let mut action_default = vec![0i32; state_count];
    for state in aut.states() {
        let q = state.id().index();
        let Some(rule) = state.default_reduce() else { continue };
        if errors[q].any() {
            continue;
        }
        let encoded = Action::Reduce(rule).encode();
        for act in &mut actions[q] {
            if *act == encoded {
                *act = 0;
            }
        }
        action_default[q] = -encoded;
    }

    let mut goto_default = vec![0i32; nonterminal_count];
    let mut count = vec![0usize; state_count];
    for (j, default) in goto_default.iter_mut().enumerate() {
        count.iter_mut().for_each(|c| *c = 0);
        let mut mx = 0usize;
        for row in &gotos {
            let r = row[j] as usize;
            if r == 0 {
                continue;
            }
            count[r] += 1;
            if count[r] > count[mx] {
                mx = r;
            }
        }
        *default = mx as i32;
    }
    for row in &mut gotos {
        for (j, r) in row.iter_mut().enumerate() {
            if *r == goto_default[j] {
                *r = 0;
            }
        }
    }

    let lhs = g
        .rules
        .values()
        .map(|rule| g.symbol_number(SymbolID::N(rule.left())) as i32)
        .collect();
    let rhs = g
        .rules
        .values()
        .map(|rule| rule.right().len() as i32)
        .collect();

    let compressed_action = compress(&actions, terminal_count);
    let compressed_goto = compress(&gotos, nonterminal_count);

    tracing::debug!(
        states = state_count,
        conflicts = conflicts.len(),
        useless_rules = useless_rules.len(),
        action_len = compressed_action.info.len(),
        goto_len = compressed_goto.info.len(),
        "parse table generated"
    );

    ParseTable {
        state_count,
        terminal_count,
        nonterminal_count,
        accept_state: aut.accept_state(),
        actions,
        gotos,
        action_default,
        goto_default,
        lhs,
        rhs,
        conflicts,
        nonassoc_errors: errors,
        useless_rules,
        compressed_action,
        compressed_goto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{examples, GrammarDef, GrammarError};
    use lalrgen_runtime::{engine, ParserDef};

    fn grammar(f: fn(&mut GrammarDef) -> Result<(), GrammarError>) -> Grammar {
        let mut g = Grammar::define(f).unwrap();
        g.build_extended_grammar();
        g.build_rule_map();
        g
    }

    fn tokens(g: &Grammar, input: &str) -> Vec<i32> {
        input
            .split_whitespace()
            .map(|name| {
                g.terminals
                    .values()
                    .find(|t| t.name() == name)
                    .map(|t| t.id().index() as i32)
                    .unwrap()
            })
            .collect()
    }

    fn recognize(g: &Grammar, table: &ParseTable, input: &str) -> Option<Vec<usize>> {
        let tables = OwnedTables::new(table);
        let mut reduced = vec![];
        let accepted =
            engine::recognize(tables.as_tables(), tokens(g, input), |r| reduced.push(r)).unwrap();
        accepted.then_some(reduced)
    }

    const GRAMMARS: &[fn(&mut GrammarDef) -> Result<(), GrammarError>] = &[
        examples::balanced,
        examples::reduce_reduce,
        examples::arithmetic,
        examples::arithmetic_prec,
        examples::with_nullable,
        examples::cyclic,
        examples::disjoint_reductions,
    ];

    #[test]
    fn compressed_lookups_agree_with_dense_table() {
        for f in GRAMMARS {
            let g = grammar(*f);
            let aut = Automaton::build(&g);
            let table = generate(&aut);
            let owned = OwnedTables::new(&table);
            let tables = owned.as_tables();

            for state in aut.states() {
                let q = state.id();
                for t in g.terminals.keys() {
                    assert_eq!(
                        tables.t_action(q.index() as i32, t.index() as i32),
                        table.action(q, *t).encode(),
                        "state {} terminal {}",
                        q,
                        g.terminals[t]
                    );
                }
                for (n, to) in state.gotos() {
                    assert_eq!(table.goto(q, n), Some(to));
                    assert_eq!(
                        tables.nt_action(q.index() as i32, n.index() as i32),
                        to.index() as i32
                    );
                }
                let reads = table.actions[q.index()].iter().any(|act| *act != 0);
                assert_eq!(tables.reads_token(q.index() as i32), reads);
            }
        }
    }

    #[test]
    fn balanced_pairs() {
        let g = grammar(examples::balanced);
        let aut = Automaton::build(&g);
        let table = generate(&aut);
        assert!(table.conflicts.is_empty());
        assert!(table.useless_rules.is_empty());
        assert_eq!(table.accept_state.index(), 3);
        assert_eq!(table.lhs, [3, 4, 4]);
        assert_eq!(table.rhs, [2, 3, 2]);

        // a S b and a b are reduced without looking ahead.
        assert_eq!(table.action_default, [0, 0, 0, 1, 0, 3, 2]);
        assert!(table.actions[5].iter().all(|act| *act == 0));

        assert_eq!(recognize(&g, &table, "a b"), Some(vec![2]));
        assert_eq!(recognize(&g, &table, "a a b b"), Some(vec![2, 1]));
        assert_eq!(recognize(&g, &table, "a a b"), None);
        assert_eq!(recognize(&g, &table, "a b b"), None);
        assert_eq!(recognize(&g, &table, ""), None);
    }

    #[test]
    fn reduce_reduce_keeps_the_lower_rule() {
        let g = grammar(examples::reduce_reduce);
        let aut = Automaton::build(&g);
        let table = generate(&aut);

        let x = SymbolID::T(g.terminals.get_index(1).map(|(t, _)| *t).unwrap());
        let q = aut.state(StateID::INITIAL).bundle()[&x];
        assert_eq!(
            table.conflicts,
            [Conflict {
                state: q,
                terminal: TerminalID::EOI,
                kind: ConflictKind::ReduceReduce {
                    kept: RuleID::from_index(3),
                    dropped: RuleID::from_index(4),
                },
            }]
        );
        assert_eq!(table.reduce_reduce_conflicts(), 1);
        assert_eq!(table.shift_reduce_conflicts(), 0);
        assert!(table.has_unexpected_conflicts(&g));
        assert_eq!(table.action(q, TerminalID::EOI), Action::Reduce(RuleID::from_index(3)));

        // B ::= x lost every lookahead to A ::= x.
        let useless: Vec<_> = table.useless_rules.iter().map(|r| r.index()).collect();
        assert_eq!(useless, [4]);

        assert_eq!(recognize(&g, &table, "x"), Some(vec![3, 1]));
    }

    #[test]
    fn shift_reduce_conflicts_keep_the_shift() {
        let g = grammar(|g| {
            use SymbolID::*;
            // E ::= E PLUS E | NUM
            let plus = g.terminal("PLUS", None)?;
            let num = g.terminal("NUM", None)?;
            let e = g.nonterminal("E")?;
            g.start_symbol(e)?;
            g.rule(e, [N(e), T(plus), N(e)], None)?;
            g.rule(e, [T(num)], None)?;
            Ok(())
        });
        let aut = Automaton::build(&g);
        let table = generate(&aut);
        assert_eq!(table.shift_reduce_conflicts(), 1);
        assert_eq!(table.reduce_reduce_conflicts(), 0);

        // right associative by default.
        assert_eq!(
            recognize(&g, &table, "NUM PLUS NUM PLUS NUM"),
            Some(vec![2, 2, 2, 1, 1])
        );
    }

    #[test]
    fn precedence_resolves_shift_reduce_conflicts() {
        let g = grammar(examples::arithmetic_prec);
        let aut = Automaton::build(&g);
        let table = generate(&aut);
        assert!(table.conflicts.is_empty());
        assert!(!table.has_unexpected_conflicts(&g));

        // 1: E + E, 2: E - E, 3: E * E, 4: E / E, 5: E ^ E, 6: - E, 7: NUM, 8: ( E )
        // left associative `+`, `*` binds tighter.
        assert_eq!(
            recognize(&g, &table, "NUM PLUS NUM STAR NUM PLUS NUM"),
            Some(vec![7, 7, 7, 3, 1, 7, 1])
        );
        // right associative `^`.
        assert_eq!(
            recognize(&g, &table, "NUM CARET NUM CARET NUM"),
            Some(vec![7, 7, 7, 5, 5])
        );
        // unary minus binds tighter than `^` here.
        assert_eq!(
            recognize(&g, &table, "MINUS NUM CARET NUM"),
            Some(vec![7, 6, 7, 5])
        );
    }

    #[test]
    fn nonassoc_inserts_errors() {
        let g = grammar(|g| {
            use SymbolID::*;
            // E ::= E LT E | NUM  with %nonassoc LT
            let lt = g.terminal("LT", None)?;
            let num = g.terminal("NUM", None)?;
            g.precedence(lt, crate::grammar::Precedence::new(0, Assoc::Nonassoc))?;
            let e = g.nonterminal("E")?;
            g.start_symbol(e)?;
            g.rule(e, [N(e), T(lt), N(e)], None)?;
            g.rule(e, [T(num)], None)?;
            Ok(())
        });
        let aut = Automaton::build(&g);
        let table = generate(&aut);
        assert!(table.conflicts.is_empty());

        assert_eq!(recognize(&g, &table, "NUM LT NUM"), Some(vec![2, 2, 1]));
        assert_eq!(recognize(&g, &table, "NUM LT NUM LT NUM"), None);
    }

    #[test]
    fn default_gotos() {
        let g = grammar(examples::arithmetic);
        let aut = Automaton::build(&g);
        let table = generate(&aut);

        for (n, _) in g.nonterminals.iter().skip(1) {
            let mut targets: Vec<_> = aut
                .states()
                .iter()
                .filter_map(|s| s.bundle().get(&SymbolID::N(*n)).map(|to| to.index() as i32))
                .collect();
            targets.sort();
            let default = table.goto_default[n.index()];
            let most = targets
                .iter()
                .map(|t| targets.iter().filter(|u| *u == t).count())
                .max()
                .unwrap();
            assert_eq!(targets.iter().filter(|t| **t == default).count(), most);
        }
        assert_eq!(table.goto_default[NonterminalID::ACCEPT.index()], 0);
    }

    #[test]
    fn expected_conflicts() {
        let mut g = grammar(examples::reduce_reduce);
        g.directives.expected_reduce_reduce = 1;
        let aut = Automaton::build(&g);
        let table = generate(&aut);
        assert!(!table.has_unexpected_conflicts(&g));
    }

    #[test]
    fn default_reduce_is_stable() {
        for f in GRAMMARS {
            let g1 = grammar(*f);
            let g2 = grammar(*f);
            let t1 = generate(&Automaton::build(&g1));
            let t2 = generate(&Automaton::build(&g2));
            assert_eq!(t1.action_default, t2.action_default);
            assert_eq!(t1.action_index(), t2.action_index());
            assert_eq!(t1.action_info(), t2.action_info());
            assert_eq!(t1.action_check(), t2.action_check());
        }
    }

    #[test]
    fn default_reduction_covers_the_larger_lookahead_set() {
        let g = grammar(examples::disjoint_reductions);
        let aut = Automaton::build(&g);
        let table = generate(&aut);
        let c = g.terminals.values().find(|t| t.name() == "c").unwrap().id();
        let a = g.terminals.values().find(|t| t.name() == "a").unwrap().id();
        let q = aut.state(StateID::INITIAL).bundle()[&SymbolID::T(c)];

        // Y ::= c on {b, d} becomes the default, X ::= c on {a} stays explicit.
        assert_eq!(table.action_default[q.index()], 6);
        assert_eq!(table.action(q, a), Action::Reduce(RuleID::from_index(4)));
        assert!(table.actions[q.index()]
            .iter()
            .all(|act| *act != Action::Reduce(RuleID::from_index(5)).encode()));
    }

    #[test]
    fn parser_def_accepts_through_the_accept_state() {
        let g = grammar(examples::balanced);
        let table = generate(&Automaton::build(&g));
        let owned = OwnedTables::new(&table);
        let tables = owned.as_tables();
        // state 1 is `$accept ::= S . $end`
        assert_eq!(
            tables.action(1, 0),
            lalrgen_runtime::ParseAction::Accept
        );
    }
}
