//! Demo handlers shipped with the executor.
//!
//! These stand in for user code: a word counter and a sieve of Eratosthenes.
//! They are registered under the symbols `wordCount` and `sieve`.

use serde_json::{json, Value};

use crate::error::InvokeError;

pub const WORD_COUNT: &str = "wordCount";
pub const SIEVE: &str = "sieve";

const DEFAULT_SIEVE_LIMIT: i64 = 1000;
/// Largest `n` the sieve accepts; one byte of scratch per candidate
pub const MAX_SIEVE_LIMIT: i64 = 100_000_000;

/// Counts the whitespace separated words of `params.InputText`
pub fn word_count(params: Value, _context: Value) -> Result<Value, InvokeError> {
    let text = params
        .get("InputText")
        .and_then(Value::as_str)
        .ok_or_else(|| InvokeError::failed("InputText must be a string"))?;

    Ok(json!(text.split_whitespace().count()))
}

/// Lists the primes up to `params.n` (1000 when absent)
pub fn sieve(params: Value, _context: Value) -> Result<Value, InvokeError> {
    let max = match params.get("n") {
        None | Some(Value::Null) => DEFAULT_SIEVE_LIMIT,
        Some(n) => parse_limit(n)?,
    };

    Ok(json!({ "N": max, "Primes": primes_up_to(max)? }))
}

// Accepts numbers and leading-integer strings such as "10" or "10abc".
fn parse_limit(value: &Value) -> Result<i64, InvokeError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim_start();
            let end = s
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                .map(|(i, _)| i)
                .unwrap_or(s.len());
            s[..end].parse().ok()
        }
        _ => None,
    };

    parsed.ok_or_else(|| InvokeError::failed(format!("n is not an integer: {value}")))
}

fn primes_up_to(max: i64) -> Result<Vec<i64>, InvokeError> {
    if max < 2 {
        return Ok(Vec::new());
    }
    if max > MAX_SIEVE_LIMIT {
        return Err(InvokeError::failed(format!(
            "n exceeds the sieve limit of {MAX_SIEVE_LIMIT}: {max}"
        )));
    }

    let len = max as usize + 1;
    let mut composite = Vec::<bool>::new();
    composite
        .try_reserve_exact(len)
        .map_err(|e| InvokeError::failed(format!("cannot sieve up to {max}: {e}")))?;
    composite.resize(len, false);
    let mut primes = Vec::new();

    for i in 2..len {
        if composite[i] {
            continue;
        }
        primes.push(i as i64);
        for j in (i * 2..len).step_by(i) {
            composite[j] = true;
        }
    }

    Ok(primes)
}
