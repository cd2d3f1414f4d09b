use crate::runtime::{
    collation::CaseSense,
    engine::Engine,
    error::{Exception, INVALID_VALUE, RuntimeError},
    value::Value,
};

use super::helpers::{arg, arg_str, opt_int};

pub(super) fn builtin_str_len(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Integer(arg_str(args, 0).chars().count() as i64))
}

/// `SubStr(s, start, length?)`. `start` is 1-based; zero or negative counts
/// back from the end. A negative `length` leaves that many characters off
/// the end.
pub(super) fn builtin_sub_str(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = arg_str(args, 0);
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len() as i64;
    let start = opt_int(args, 1, "SubStr", "start", 1)?;
    let begin = if start > 0 {
        (start - 1).min(total)
    } else {
        (total + start).max(0)
    };
    let rest = total - begin;
    let length = opt_int(args, 2, "SubStr", "length", rest)?;
    let take = if length < 0 { (rest + length).max(0) } else { length.min(rest) };
    let begin = begin as usize;
    Ok(Value::from(
        chars[begin..begin + take as usize].iter().collect::<String>(),
    ))
}

fn case_sense_arg(args: &[Value], index: usize) -> Result<CaseSense, RuntimeError> {
    match arg(args, index) {
        None => Ok(CaseSense::Insensitive),
        Some(value) => {
            let text = value.to_str();
            CaseSense::parse(&text).ok_or_else(|| {
                Exception::new(
                    &INVALID_VALUE,
                    &[&format!("`{}` is not a CaseSense mode.", text)],
                )
                .into()
            })
        }
    }
}

/// `InStr(haystack, needle, caseSense?, start?)`: 1-based character
/// position of the match, or 0. A negative `start` searches backwards from
/// that distance to the end.
pub(super) fn builtin_in_str(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = arg_str(args, 0);
    let needle = arg_str(args, 1);
    let mode = case_sense_arg(args, 2)?;
    let start = opt_int(args, 3, "InStr", "start", 1)?;
    if start == 0 {
        return Err(Exception::new(&INVALID_VALUE, &["InStr start position must not be 0."]).into());
    }
    let offsets: Vec<usize> = haystack
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(haystack.len()))
        .collect();
    let matches_at = |pos: usize| mode.starts_with(&haystack[offsets[pos]..], &needle);
    let last = offsets.len() - 1;
    let found = if start > 0 {
        let from = (start - 1) as usize;
        (from.min(last + 1)..=last).find(|&pos| matches_at(pos))
    } else {
        let from = last as i64 + start + 1;
        if from < 0 {
            None
        } else {
            (0..=from as usize).rev().find(|&pos| matches_at(pos))
        }
    };
    Ok(Value::Integer(found.map_or(0, |pos| pos as i64 + 1)))
}

pub(super) fn builtin_str_lower(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(arg_str(args, 0).to_lowercase()))
}

pub(super) fn builtin_str_upper(_: &Engine, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(arg_str(args, 0).to_uppercase()))
}
