//! Parsers generated from the grammars under `lalrgen/tests`, driven by the runtime.

#[cfg(test)]
mod g_arithmetic;
#[cfg(test)]
mod g_arithmetic_prec;
#[cfg(test)]
mod g_balanced;
#[cfg(test)]
mod g_calc;
#[cfg(test)]
mod g_call;
#[cfg(test)]
mod g_dangling_else;
#[cfg(test)]
mod g_reduce_reduce;

/// Run `tables` over `tokens`, collecting the reduced rules.
#[cfg(test)]
fn reductions(
    tables: lalrgen_runtime::Tables<'static>,
    tokens: &[i32],
) -> Option<Vec<usize>> {
    let mut rules = vec![];
    let accepted =
        lalrgen_runtime::engine::recognize(tables, tokens.iter().copied(), |rule| rules.push(rule))
            .unwrap();
    accepted.then_some(rules)
}
