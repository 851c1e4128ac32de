use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::foundation::pixel::Pixel;
use crate::imaging::raster::StatKind;
use crate::symbols::table::{ConstValue, GlobalOp, SymbolTable};

/// Build a symbol table from a comma- or semicolon-separated definition list.
///
/// Each definition is one of:
///
/// - `name`: a variable initialized to zero
/// - `name=init(v)`: a variable with an initial value
/// - `name=global(+|*[,v])`: a global variable
/// - `name=v` or `name=r:g:b`: a constant
/// - `name=fn(args)`: a constant computed from an image or the environment
pub fn parse_symbols(defs: &str) -> PixelMathResult<SymbolTable> {
    let mut table = SymbolTable::new();
    let items = split_top_level(defs, &[',', ';'])?;
    let last = items.len().saturating_sub(1);
    for (i, item) in items.into_iter().enumerate() {
        let item = item.trim();
        if item.is_empty() {
            if i == last {
                continue;
            }
            return Err(PixelMathError::compile(format!(
                "missing symbol definition in '{defs}'"
            )));
        }
        parse_definition(&mut table, item)?;
    }
    Ok(table)
}

fn parse_definition(table: &mut SymbolTable, item: &str) -> PixelMathResult<()> {
    let Some((name, rhs)) = item.split_once('=') else {
        table.declare_variable(item, 0.0)?;
        return Ok(());
    };
    let name = name.trim();
    let rhs = rhs.trim();
    if rhs.is_empty() {
        return Err(PixelMathError::compile(format!(
            "missing value in symbol definition '{item}'"
        )));
    }

    if let Some((func, args)) = split_call(rhs)? {
        match func.to_ascii_lowercase().as_str() {
            "init" => {
                let [v] = fixed_args::<1>(func, &args)?;
                table.declare_variable(name, number(v)?)?;
            }
            "global" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(PixelMathError::compile(
                        "global() takes an operator and an optional initial value",
                    ));
                }
                let op = match args[0] {
                    "+" => GlobalOp::Add,
                    "*" => GlobalOp::Mul,
                    other => {
                        return Err(PixelMathError::compile(format!(
                            "invalid global variable operator '{other}'"
                        )));
                    }
                };
                let init = args.get(1).map(|v| number(v)).transpose()?;
                table.declare_global(name, op, init)?;
            }
            _ => {
                table.declare_constant(name, constant_function(func, &args)?)?;
            }
        }
        return Ok(());
    }

    let parts = rhs.split(':').map(number).collect::<PixelMathResult<Vec<_>>>()?;
    let value = match parts.as_slice() {
        [v] => Pixel::gray(*v),
        [r, g, b] => Pixel::rgb(*r, *g, *b),
        _ => {
            return Err(PixelMathError::compile(format!(
                "constant '{name}' must have one or three components"
            )));
        }
    };
    table.declare_constant(name, ConstValue::Immediate(value))?;
    Ok(())
}

fn constant_function(func: &str, args: &[&str]) -> PixelMathResult<ConstValue> {
    let lower = func.to_ascii_lowercase();
    let image_only = |args: &[&str]| -> PixelMathResult<Option<String>> {
        match args {
            [] => Ok(None),
            [id] => Ok(Some(image_id(id))),
            _ => Err(PixelMathError::compile(format!(
                "{func}() takes at most one argument"
            ))),
        }
    };
    let v = match lower.as_str() {
        "width" => ConstValue::Width(image_only(args)?),
        "height" => ConstValue::Height(image_only(args)?),
        "area" => ConstValue::Area(image_only(args)?),
        "invarea" => ConstValue::InvArea(image_only(args)?),
        "iscolor" => ConstValue::IsColor(image_only(args)?),
        "pixel" => {
            let (image, rest) = match args.len() {
                2 | 3 if args.first().is_some_and(|a| a.trim().parse::<f64>().is_ok()) => {
                    (None, args)
                }
                3 | 4 => (Some(image_id(args[0])), &args[1..]),
                _ => {
                    return Err(PixelMathError::compile(
                        "pixel() takes an optional image, two coordinates and an optional channel",
                    ));
                }
            };
            let x = integer(rest[0])?;
            let y = integer(rest[1])?;
            let channel = rest.get(2).map(|c| channel(c)).transpose()?;
            ConstValue::PixelAt {
                image,
                x,
                y,
                channel,
            }
        }
        "envvar_value" => ConstValue::EnvValue(single_name(func, args)?),
        "envvar_defined" => ConstValue::EnvDefined(single_name(func, args)?),
        other => {
            let Some(kind) = statistic_kind(other) else {
                return Err(PixelMathError::compile(format!(
                    "unknown symbol function '{func}'"
                )));
            };
            let (image, channel) = match args {
                [] => (None, None),
                [a] => match a.trim().parse::<f64>() {
                    Ok(_) => (None, Some(self::channel(a)?)),
                    Err(_) => (Some(image_id(a)), None),
                },
                [a, c] => (Some(image_id(a)), Some(self::channel(c)?)),
                _ => {
                    return Err(PixelMathError::compile(format!(
                        "{func}() takes an optional image and an optional channel"
                    )));
                }
            };
            ConstValue::Statistic {
                kind,
                image,
                channel,
            }
        }
    };
    Ok(v)
}

fn statistic_kind(name: &str) -> Option<StatKind> {
    Some(match name {
        "max" | "maximum" => StatKind::Maximum,
        "min" | "minimum" => StatKind::Minimum,
        "med" | "median" => StatKind::Median,
        "mean" => StatKind::Mean,
        "mdev" => StatKind::MedianDev,
        "adev" => StatKind::AvgDev,
        "sdev" => StatKind::StdDev,
        "var" | "variance" => StatKind::Variance,
        "mod" | "modulus" => StatKind::Modulus,
        "ssqr" => StatKind::SumSquares,
        "asqr" => StatKind::MeanSquares,
        _ => return None,
    })
}

fn fixed_args<'a, const N: usize>(func: &str, args: &[&'a str]) -> PixelMathResult<[&'a str; N]> {
    <[&str; N]>::try_from(args).map_err(|_| {
        PixelMathError::compile(format!("{func}() takes exactly {N} argument(s)"))
    })
}

fn single_name(func: &str, args: &[&str]) -> PixelMathResult<String> {
    let [n] = fixed_args::<1>(func, args)?;
    let n = unquote(n);
    if n.is_empty() {
        return Err(PixelMathError::compile(format!(
            "{func}() requires a variable name"
        )));
    }
    Ok(n.to_string())
}

fn image_id(s: &str) -> String {
    unquote(s).to_string()
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(s)
}

fn number(s: &str) -> PixelMathResult<f64> {
    let s = s.trim();
    s.parse::<f64>()
        .map_err(|_| PixelMathError::compile(format!("invalid numeric literal '{s}'")))
}

fn integer(s: &str) -> PixelMathResult<i64> {
    let v = number(s)?;
    if v.fract() != 0.0 {
        return Err(PixelMathError::compile(format!(
            "expected an integer coordinate, got '{}'",
            s.trim()
        )));
    }
    Ok(v as i64)
}

fn channel(s: &str) -> PixelMathResult<usize> {
    let v = integer(s)?;
    usize::try_from(v)
        .map_err(|_| PixelMathError::compile(format!("invalid channel index {v}")))
}

/// `fn(a, b)` into `("fn", ["a", "b"])`; `None` when `s` is not a call.
fn split_call(s: &str) -> PixelMathResult<Option<(&str, Vec<&str>)>> {
    let Some(open) = s.find('(') else {
        return Ok(None);
    };
    let Some(inner) = s[open + 1..].strip_suffix(')') else {
        return Err(PixelMathError::compile(format!(
            "unbalanced parentheses in '{s}'"
        )));
    };
    let func = s[..open].trim();
    let args = split_top_level(inner, &[','])?
        .into_iter()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();
    Ok(Some((func, args)))
}

fn split_top_level<'a>(s: &'a str, seps: &[char]) -> PixelMathResult<Vec<&'a str>> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut quoted = false;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth -= 1;
                if depth < 0 {
                    return Err(PixelMathError::compile(format!(
                        "unbalanced parentheses in '{s}'"
                    )));
                }
            }
            c if seps.contains(&c) && depth == 0 && !quoted => {
                out.push(&s[start..i]);
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 || quoted {
        return Err(PixelMathError::compile(format!(
            "unbalanced parentheses or quotes in '{s}'"
        )));
    }
    out.push(&s[start..]);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/symbols/parse.rs"]
mod tests;
