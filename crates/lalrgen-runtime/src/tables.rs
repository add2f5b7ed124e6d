//! Compressed parse tables.

use crate::definition::{NonterminalIndex, ParseAction, ParserDef, StateIndex, TerminalIndex};

/// The compressed LALR(1) tables emitted by the generator.
///
/// Actions are plain integers: a positive value is the state to shift into,
/// `-(r + 1)` reduces by rule `r`, and `0` is an error. A terminal lookup that
/// misses the compressed row falls back to the default reduction of the state,
/// a nonterminal lookup falls back to the default goto of the symbol.
///
/// The goto rows are stored after the action rows in `action_index`,
/// `action_info` and `action_check`, starting at the `goto_*_offset`s.
#[derive(Debug, Copy, Clone)]
pub struct Tables<'t> {
    pub terminal_count: i32,
    pub nonterminal_count: i32,
    pub state_count: i32,
    pub accept_state: StateIndex,
    pub lhs: &'t [i32],
    pub rhs: &'t [i32],
    pub goto_default: &'t [i32],
    pub action_default: &'t [i32],
    pub action_index: &'t [i32],
    pub action_info: &'t [i32],
    pub action_check: &'t [i32],
    pub goto_index_offset: usize,
    pub goto_info_offset: usize,
    pub goto_check_offset: usize,
}

impl Tables<'_> {
    /// Look up the action of `state` on the terminal `token`.
    pub fn t_action(&self, state: StateIndex, token: TerminalIndex) -> i32 {
        let state = state as usize;
        let yyn = self.action_index[state] + token;
        match self.lookup(0, 0, yyn, token) {
            Some(act) => act,
            None => -self.action_default[state],
        }
    }

    /// Look up the successor of `state` after reducing to the nonterminal `nt`.
    ///
    /// `nt` is counted from the first nonterminal, not from the first symbol.
    pub fn nt_action(&self, state: StateIndex, nt: NonterminalIndex) -> i32 {
        let yyn = self.action_index[self.goto_index_offset + state as usize] + nt;
        match self.lookup(self.goto_info_offset, self.goto_check_offset, yyn, nt) {
            Some(next) => next,
            None => self.goto_default[nt as usize],
        }
    }

    /// Return whether the state has any terminal entry at all.
    ///
    /// A state without one always takes its default reduction, so the driver
    /// does not need to read a lookahead token first.
    pub fn reads_token(&self, state: StateIndex) -> bool {
        self.action_index[state as usize] != -self.terminal_count
    }

    fn lookup(&self, info_offset: usize, check_offset: usize, yyn: i32, column: i32) -> Option<i32> {
        let yyn = usize::try_from(yyn).ok()?;
        if *self.action_check.get(check_offset + yyn)? != column {
            return None;
        }
        self.action_info.get(info_offset + yyn).copied()
    }
}

impl ParserDef for Tables<'_> {
    fn initial_state(&self) -> StateIndex {
        0
    }

    fn needs_lookahead(&self, state: StateIndex) -> bool {
        self.reads_token(state)
    }

    fn action(&self, state: StateIndex, lookahead: TerminalIndex) -> ParseAction {
        let act = self.t_action(state, lookahead);
        if act == self.accept_state {
            ParseAction::Accept
        } else if act > 0 {
            ParseAction::Shift(act)
        } else if act < 0 {
            let rule = (-act - 1) as usize;
            ParseAction::Reduce {
                rule,
                lhs: self.lhs[rule] - self.terminal_count,
                len: self.rhs[rule] as usize,
            }
        } else {
            ParseAction::Fail
        }
    }

    fn goto(&self, state: StateIndex, lhs: NonterminalIndex) -> StateIndex {
        self.nt_action(state, lhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S' -> S $end ; S -> a
    //
    // state 0: S' -> . S $end, S -> . a     (a => 2, S => 1)
    // state 1: S' -> S . $end               ($end => 3)
    // state 2: S -> a .                     (default reduce rule 1)
    // state 3: S' -> S $end .
    const TABLES: Tables<'static> = Tables {
        terminal_count: 2,
        nonterminal_count: 2,
        state_count: 4,
        accept_state: 3,
        lhs: &[2, 3],
        rhs: &[2, 1],
        goto_default: &[0, 1],
        action_default: &[0, 0, 2, 1],
        action_index: &[0, 2, -2, -2, -2, -2, -2, -2],
        action_info: &[0, 2, 3, 0],
        action_check: &[-1, 1, 0, -1],
        goto_index_offset: 4,
        goto_info_offset: 4,
        goto_check_offset: 4,
    };

    #[test]
    fn terminal_lookups() {
        assert_eq!(TABLES.t_action(0, 1), 2);
        assert_eq!(TABLES.t_action(1, 0), 3);
        assert_eq!(TABLES.t_action(0, 0), 0);
        assert_eq!(TABLES.t_action(2, 0), -2);
        assert!(TABLES.reads_token(0));
        assert!(!TABLES.reads_token(2));
    }

    #[test]
    fn goto_falls_back_to_default() {
        assert_eq!(TABLES.nt_action(0, 1), 1);
    }

    #[test]
    fn decoded_actions() {
        assert!(matches!(TABLES.action(0, 1), ParseAction::Shift(2)));
        assert!(matches!(TABLES.action(1, 0), ParseAction::Accept));
        assert!(matches!(
            TABLES.action(2, 0),
            ParseAction::Reduce {
                rule: 1,
                lhs: 1,
                len: 1
            }
        ));
        assert!(matches!(TABLES.action(0, 0), ParseAction::Fail));
    }
}
