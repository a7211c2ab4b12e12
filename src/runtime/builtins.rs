//! Host built-in registry
//!
//! Built-ins are plain function pointers looked up by name. The VM routes
//! any CALL whose name is not a user function here; the returned value is
//! pushed back on the evaluation stack. Hosts add their own entries (GPIO,
//! I2C, ...) through the same registry before running.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;

use crate::runtime::value::Value;

/// A host function: output writer plus evaluated arguments in source order.
pub type BuiltinFn = fn(&mut dyn Write, &[Value]) -> Result<Value, String>;

lazy_static! {
    // millis() epoch; LAST_MILLIS clamps the counter so it never goes
    // backward even on hosts with a coarse or adjusted clock source.
    static ref EPOCH: Instant = Instant::now();
    static ref LAST_MILLIS: Mutex<i64> = Mutex::new(0);
}

/// Named registry of host functions. Populated once before execution and
/// effectively immutable while the VM runs.
pub struct Builtins {
    map: HashMap<String, BuiltinFn>,
}

impl Builtins {
    /// Registry with the default host set.
    pub fn with_defaults() -> Self {
        let mut builtins = Self {
            map: HashMap::new(),
        };
        builtins.register("print", builtin_print);
        builtins.register("sleep_ms", builtin_sleep_ms);
        builtins.register("millis", builtin_millis);
        builtins.register("count", builtin_count);
        builtins.register("strlen", builtin_strlen);
        builtins.register("array_push", builtin_array_push);
        builtins.register("rand", builtin_rand);
        builtins.register("time", builtin_time);
        builtins
    }

    pub fn register(&mut self, name: &str, func: BuiltinFn) {
        self.map.insert(name.to_string(), func);
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.map.get(name).copied()
    }
}

fn builtin_print(out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    for arg in args {
        write!(out, "{}", arg.to_display_string()).map_err(|e| format!("print: {}", e))?;
    }
    writeln!(out).map_err(|e| format!("print: {}", e))?;
    Ok(Value::Null)
}

fn builtin_sleep_ms(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match args {
        [Value::Integer(ms)] if *ms >= 0 => {
            thread::sleep(Duration::from_millis(*ms as u64));
            Ok(Value::Null)
        }
        _ => Err("sleep_ms() expects a non-negative integer".to_string()),
    }
}

/// Monotonically non-decreasing milliseconds since an arbitrary epoch.
fn builtin_millis(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    if !args.is_empty() {
        return Err("millis() takes no arguments".to_string());
    }
    let now = EPOCH.elapsed().as_millis() as i64;
    let mut last = LAST_MILLIS
        .lock()
        .map_err(|_| "millis() clock state poisoned".to_string())?;
    if now > *last {
        *last = now;
    }
    Ok(Value::Integer(*last))
}

fn builtin_count(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match args {
        [Value::Array(items)] => Ok(Value::Integer(items.len() as i64)),
        [Value::String(s)] => Ok(Value::Integer(s.len() as i64)),
        [other] => Err(format!("count() expects an array, {} given", other.type_name())),
        _ => Err("count() expects exactly one argument".to_string()),
    }
}

fn builtin_strlen(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match args {
        [Value::String(s)] => Ok(Value::Integer(s.len() as i64)),
        [other] => Err(format!(
            "strlen() expects a string, {} given",
            other.type_name()
        )),
        _ => Err("strlen() expects exactly one argument".to_string()),
    }
}

/// Values own their content, so arguments arrive as copies; the pushed-to
/// array is returned rather than mutated in place.
fn builtin_array_push(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match args.split_first() {
        Some((Value::Array(_), rest)) if !rest.is_empty() => {
            let mut array = args[0].clone();
            for value in rest {
                array.array_push(value.clone())?;
            }
            Ok(array)
        }
        Some((Value::Array(_), _)) => Err("array_push() expects at least one value".to_string()),
        Some((other, _)) => Err(format!(
            "array_push() expects an array, {} given",
            other.type_name()
        )),
        None => Err("array_push() expects an array".to_string()),
    }
}

fn builtin_rand(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match args {
        [] => Ok(Value::Integer(fastrand::i64(0..=i64::from(i32::MAX)))),
        [Value::Integer(min), Value::Integer(max)] if min <= max => {
            Ok(Value::Integer(fastrand::i64(*min..=*max)))
        }
        [Value::Integer(_), Value::Integer(_)] => {
            Err("rand() expects min <= max".to_string())
        }
        _ => Err("rand() expects no arguments or two integers".to_string()),
    }
}

/// Wall-clock Unix seconds (the RTC surface of the original hosts).
fn builtin_time(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    if !args.is_empty() {
        return Err("time() takes no arguments".to_string());
    }
    Ok(Value::Integer(chrono::Utc::now().timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_writes_display_forms_and_newline() {
        let mut out = Vec::new();
        builtin_print(
            &mut out,
            &[Value::Integer(3), Value::String(" ok".to_string())],
        )
        .expect("print");
        assert_eq!(String::from_utf8(out).expect("utf8"), "3 ok\n");
    }

    #[test]
    fn millis_is_non_decreasing() {
        let mut out = Vec::new();
        let a = builtin_millis(&mut out, &[]).expect("millis");
        let b = builtin_millis(&mut out, &[]).expect("millis");
        match (a, b) {
            (Value::Integer(x), Value::Integer(y)) => assert!(y >= x),
            other => panic!("unexpected values: {:?}", other),
        }
    }

    #[test]
    fn count_and_strlen() {
        let mut out = Vec::new();
        let array = Value::Array(vec![Value::Null, Value::Null]);
        assert_eq!(
            builtin_count(&mut out, &[array]).expect("count"),
            Value::Integer(2)
        );
        assert_eq!(
            builtin_strlen(&mut out, &[Value::String("abcd".to_string())]).expect("strlen"),
            Value::Integer(4)
        );
        assert!(builtin_count(&mut out, &[Value::Integer(1)]).is_err());
    }

    #[test]
    fn array_push_returns_extended_copy() {
        let mut out = Vec::new();
        let array = Value::Array(vec![Value::Integer(1)]);
        let pushed = builtin_array_push(&mut out, &[array.clone(), Value::Integer(2)])
            .expect("array_push");
        assert_eq!(pushed.array_size().expect("size"), 2);
        assert_eq!(array.array_size().expect("size"), 1);
    }

    #[test]
    fn rand_stays_in_range() {
        let mut out = Vec::new();
        for _ in 0..50 {
            match builtin_rand(&mut out, &[Value::Integer(3), Value::Integer(7)]).expect("rand") {
                Value::Integer(n) => assert!((3..=7).contains(&n)),
                other => panic!("unexpected value: {:?}", other),
            }
        }
        assert!(builtin_rand(&mut out, &[Value::Integer(9), Value::Integer(1)]).is_err());
    }

    #[test]
    fn sleep_ms_rejects_bad_arguments() {
        let mut out = Vec::new();
        assert!(builtin_sleep_ms(&mut out, &[Value::Integer(-1)]).is_err());
        assert!(builtin_sleep_ms(&mut out, &[Value::String("5".to_string())]).is_err());
    }
}
