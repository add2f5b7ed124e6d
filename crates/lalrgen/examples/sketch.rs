use lalrgen::{
    automaton::Automaton,
    grammar::{Grammar, SymbolID::*},
    table::{self, OwnedTables},
};
use lalrgen_runtime::engine::{ParseEngine, ParseEvent, Token};

#[allow(nonstandard_style)]
fn main() -> anyhow::Result<()> {
    let mut grammar = Grammar::define(|g| {
        let t_ident = g.terminal("ID", None)?;
        let t_num = g.terminal("NUM", None)?;
        let t_plus = g.terminal("PLUS", Some("+"))?;
        let t_equal = g.terminal("EQUAL", Some("="))?;

        let A = g.nonterminal("A")?;
        let E = g.nonterminal("E")?;
        let T_ = g.nonterminal("T")?;

        g.start_symbol(A)?;

        g.rule(A, [N(E), T(t_equal), N(E)], None)?;
        g.rule(A, [T(t_ident)], None)?;
        g.rule(E, [N(E), T(t_plus), N(T_)], None)?;
        g.rule(E, [N(T_)], None)?;
        g.rule(T_, [T(t_num)], None)?;
        g.rule(T_, [T(t_ident)], None)?;
        Ok(())
    })?;
    grammar.build_extended_grammar();
    grammar.build_rule_map();

    let aut = Automaton::build(&grammar);
    let table = table::generate(&aut);
    for conflict in &table.conflicts {
        println!("{}", conflict.display(&grammar));
    }
    let tables = OwnedTables::new(&table);

    // $end = 0, ID = 1, NUM = 2, PLUS = 3, EQUAL = 4
    #[derive(Debug)]
    struct Tok(i32, &'static str);
    impl Token for Tok {
        fn to_index(&self) -> i32 {
            self.0
        }
    }
    let mut tokens = [Tok(2, "1"), Tok(3, "+"), Tok(2, "2"), Tok(4, "="), Tok(1, "a")].into_iter();

    let mut parser = ParseEngine::new(tables.as_tables());
    loop {
        match parser.resume()? {
            ParseEvent::InputNeeded => match tokens.next() {
                Some(tok) => parser.offer_token(tok)?,
                None => parser.offer_eoi()?,
            },
            ParseEvent::Shifting(tok) => println!("shift: {:?}", tok),
            ParseEvent::AboutToReduce { rule, args, .. } => {
                let rule = grammar.rules.get_index(rule).map(|(_, rule)| rule);
                if let Some(rule) = rule {
                    println!("reduce: {} <- {:?}", rule.display(&grammar), args);
                }
            }
            ParseEvent::Accepted => {
                println!("accepted");
                break;
            }
            ParseEvent::Rejected { state, lookahead } => {
                println!("rejected in state {} at {:?}", state, lookahead);
                break;
            }
        }
    }

    Ok(())
}
