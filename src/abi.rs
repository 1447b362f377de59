/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! Traits for translating between script values and Rust function arguments
//! and return values.
//!
//! Every entry point is a plain Rust function taking `&mut Environment`
//! followed by typed parameters, e.g.
//! `fn source_pitch_set(env: &mut Environment, this: Obj<Source>, pitch: f32)`.
//! The [CallFromScript] implementations here unpack a slice of [Value]s into
//! those parameters (checking count and types before anything else happens),
//! call the function, and pack its result back into a [Value].

use crate::objects::{HostObject, Obj};
use crate::value::Value;
use crate::{Environment, Error};

/// This trait represents a Rust function that can be called from a script.
///
/// This module provides generic implementations of this trait for Rust
/// [function pointers][fn] with compatible argument and return types, so
/// entry points never need to implement it themselves.
pub trait CallFromScript {
    fn call_from_script(&self, env: &mut Environment, args: &[Value]) -> Result<Value, Error>;
}

macro_rules! impl_CallFromScript {
    ( $($p:tt => $P:ident),* ) => {
        impl<R, $($P),*> CallFromScript for fn(&mut Environment, $($P),*) -> Result<R, Error>
            where R: ScriptRet, $($P: ScriptArg,)* {
            // ignore warnings for the zero-argument case
            #[allow(unused_variables, unused_mut, clippy::unused_unit)]
            fn call_from_script(&self, env: &mut Environment, args: &[Value]) -> Result<Value, Error> {
                let params: &[&str] = &[$(stringify!($P)),*];
                if args.len() > params.len() {
                    return Err(Error::arity(args.len(), &params.len().to_string()));
                }
                let args: ($($P,)*) = ($(<$P as ScriptArg>::from_arg(args.get($p), env)?,)*);
                log_dbg!("CallFromScript {:?}", args);
                let retval = self(env, $(args.$p),*)?;
                log_dbg!("CallFromScript => {:?}", retval);
                Ok(retval.into_value())
            }
        }
    }
}

impl_CallFromScript!();
impl_CallFromScript!(0 => P0);
impl_CallFromScript!(0 => P0, 1 => P1);
impl_CallFromScript!(0 => P0, 1 => P1, 2 => P2);
impl_CallFromScript!(0 => P0, 1 => P1, 2 => P2, 3 => P3);
impl_CallFromScript!(0 => P0, 1 => P1, 2 => P2, 3 => P3, 4 => P4);
impl_CallFromScript!(0 => P0, 1 => P1, 2 => P2, 3 => P3, 4 => P4, 5 => P5);

/// Type for lists of functions exported by a bindings module.
pub type FunctionExports = &'static [(&'static str, &'static dyn CallFromScript)];

/// Type for lists of integer constants exported by a bindings module.
pub type ConstantExports = &'static [(&'static str, i64)];

/// Macro for exporting a function with a script-visible name. The number of
/// arguments must be written out, though their types can be inferred:
///
/// ```ignore
/// pub const FUNCTIONS: FunctionExports = &[
///     export_fn!("AL::Source#pitch=", source_pitch_set(_, _)),
/// ];
/// ```
macro_rules! export_fn {
    ($script_name:literal, $name:ident ($($_:ty),*)) => {
        (
            $script_name,
            &($name as fn(&mut $crate::Environment, $($_),*) -> _)
                as &'static dyn $crate::abi::CallFromScript,
        )
    };
}

/// Conversion from a script argument to a Rust parameter type.
pub trait ScriptArg: std::fmt::Debug + Sized {
    /// `arg` is [None] if the script passed fewer arguments than the function
    /// has parameters.
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error>;
}

fn required(arg: Option<&Value>) -> Result<&Value, Error> {
    arg.ok_or_else(|| Error::Argument("wrong number of arguments (too few)".to_string()))
}

fn type_error(value: &Value, expected: &str) -> Error {
    Error::Type(format!(
        "wrong argument type {} (expected {})",
        value.type_name(),
        expected
    ))
}

impl ScriptArg for Value {
    fn from_arg(arg: Option<&Value>, _env: &Environment) -> Result<Self, Error> {
        required(arg).cloned()
    }
}

impl ScriptArg for i64 {
    fn from_arg(arg: Option<&Value>, _env: &Environment) -> Result<Self, Error> {
        let value = required(arg)?;
        value.as_int().ok_or_else(|| type_error(value, "Integer"))
    }
}

impl ScriptArg for i32 {
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error> {
        let value = i64::from_arg(arg, env)?;
        i32::try_from(value)
            .map_err(|_| Error::Range(format!("integer {} too big to convert to int", value)))
    }
}

/// Counts, sizes and indices. Negative values are an ArgumentError.
impl ScriptArg for usize {
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error> {
        let value = i64::from_arg(arg, env)?;
        usize::try_from(value).map_err(|_| Error::Argument(format!("negative size ({})", value)))
    }
}

impl ScriptArg for f64 {
    fn from_arg(arg: Option<&Value>, _env: &Environment) -> Result<Self, Error> {
        let value = required(arg)?;
        value.as_float().ok_or_else(|| type_error(value, "Float"))
    }
}

impl ScriptArg for f32 {
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error> {
        f64::from_arg(arg, env).map(|value| value as f32)
    }
}

impl ScriptArg for bool {
    fn from_arg(arg: Option<&Value>, _env: &Environment) -> Result<Self, Error> {
        required(arg).map(Value::is_truthy)
    }
}

impl ScriptArg for String {
    fn from_arg(arg: Option<&Value>, _env: &Environment) -> Result<Self, Error> {
        let value = required(arg)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_error(value, "String"))
    }
}

impl<T: ScriptArg> ScriptArg for Vec<T> {
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error> {
        let value = required(arg)?;
        let list = value.as_list().ok_or_else(|| type_error(value, "Array"))?;
        list.iter().map(|item| T::from_arg(Some(item), env)).collect()
    }
}

/// Trailing optional parameter: [None] only if the argument was left out.
/// An explicit `nil` is passed on to `T`.
impl<T: ScriptArg> ScriptArg for Option<T> {
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error> {
        match arg {
            None => Ok(None),
            Some(_) => T::from_arg(arg, env).map(Some),
        }
    }
}

/// Required parameter that may be `nil`.
#[derive(Debug)]
pub struct Nullable<T>(pub Option<T>);

impl<T: ScriptArg> ScriptArg for Nullable<T> {
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error> {
        match required(arg)? {
            Value::Nil => Ok(Nullable(None)),
            _ => T::from_arg(arg, env).map(|value| Nullable(Some(value))),
        }
    }
}

impl<T: HostObject> ScriptArg for Obj<T> {
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error> {
        let value = required(arg)?;
        match *value {
            Value::Object(id) => env.objects.downcast_id(id),
            _ => Err(type_error(value, T::CLASS_NAME)),
        }
    }
}

/// Conversion from a Rust return type to a script value.
pub trait ScriptRet: std::fmt::Debug {
    fn into_value(self) -> Value;
}

impl ScriptRet for () {
    fn into_value(self) -> Value {
        Value::Nil
    }
}
impl ScriptRet for Value {
    fn into_value(self) -> Value {
        self
    }
}
impl ScriptRet for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}
impl ScriptRet for i32 {
    fn into_value(self) -> Value {
        Value::Int(self.into())
    }
}
impl ScriptRet for u32 {
    fn into_value(self) -> Value {
        Value::Int(self.into())
    }
}
impl ScriptRet for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}
impl ScriptRet for usize {
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}
impl ScriptRet for f32 {
    fn into_value(self) -> Value {
        Value::Float(self.into())
    }
}
impl ScriptRet for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}
impl ScriptRet for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}
impl ScriptRet for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Bytes(self)
    }
}
impl<T: ScriptRet> ScriptRet for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Nil, ScriptRet::into_value)
    }
}
impl<T: HostObject> ScriptRet for Obj<T> {
    fn into_value(self) -> Value {
        Value::Object(self.id())
    }
}
impl<T: ScriptRet, const N: usize> ScriptRet for [T; N] {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(ScriptRet::into_value).collect())
    }
}

/// A list of script values, e.g. specifier lists or `to_a` results.
#[derive(Debug)]
pub struct List<T>(pub Vec<T>);

impl<T: ScriptRet> ScriptRet for List<T> {
    fn into_value(self) -> Value {
        Value::List(self.0.into_iter().map(ScriptRet::into_value).collect())
    }
}

/// A fixed-size float vector argument, such as a position or orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Floats<const N: usize>(pub [f32; N]);

impl<const N: usize> ScriptArg for Floats<N> {
    fn from_arg(arg: Option<&Value>, env: &Environment) -> Result<Self, Error> {
        let value = required(arg)?;
        let list = value.as_list().ok_or_else(|| type_error(value, "Array"))?;
        if list.len() != N {
            return Err(Error::Argument(format!(
                "expected {} elements, got {}",
                N,
                list.len()
            )));
        }
        let mut floats = [0.0; N];
        for (float, item) in floats.iter_mut().zip(list) {
            *float = f32::from_arg(Some(item), env)?;
        }
        Ok(Floats(floats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn env() -> Environment {
        let mut options = Options::new();
        options.headless = true;
        Environment::new(options).unwrap()
    }

    #[test]
    fn numbers() {
        let env = env();
        assert_eq!(f32::from_arg(Some(&Value::Int(3)), &env), Ok(3.0));
        assert_eq!(i32::from_arg(Some(&Value::Int(-7)), &env), Ok(-7));
        assert_eq!(
            i32::from_arg(Some(&Value::Float(1.5)), &env).unwrap_err().class_name(),
            "TypeError"
        );
        assert_eq!(
            usize::from_arg(Some(&Value::Int(-1)), &env).unwrap_err().class_name(),
            "ArgumentError"
        );
        assert_eq!(
            i32::from_arg(Some(&Value::Int(1 << 40)), &env).unwrap_err(),
            Error::Range("integer 1099511627776 too big to convert to int".to_string())
        );
    }

    #[test]
    fn optional_and_nullable() {
        let env = env();
        assert_eq!(Option::<i64>::from_arg(None, &env), Ok(None));
        assert_eq!(Option::<i64>::from_arg(Some(&Value::Int(2)), &env), Ok(Some(2)));
        assert!(Option::<i64>::from_arg(Some(&Value::Nil), &env).is_err());
        assert!(Nullable::<i64>::from_arg(Some(&Value::Nil), &env)
            .unwrap()
            .0
            .is_none());
        assert!(Nullable::<i64>::from_arg(None, &env).is_err());
    }

    #[test]
    fn truthiness() {
        let env = env();
        assert_eq!(bool::from_arg(Some(&Value::Nil), &env), Ok(false));
        assert_eq!(bool::from_arg(Some(&Value::Int(0)), &env), Ok(true));
    }

    #[test]
    fn float_vectors() {
        let env = env();
        let list = Value::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(Floats::<3>::from_arg(Some(&list), &env), Ok(Floats([1.0, 2.0, 3.0])));
        assert!(Floats::<6>::from_arg(Some(&list), &env).is_err());
    }

    #[test]
    fn arity() {
        fn two(_env: &mut Environment, a: i64, b: Option<i64>) -> Result<i64, Error> {
            Ok(a + b.unwrap_or(10))
        }
        let f = &(two as fn(&mut Environment, _, _) -> _) as &dyn CallFromScript;
        let mut env = env();
        assert_eq!(f.call_from_script(&mut env, &[Value::Int(1)]), Ok(Value::Int(11)));
        assert_eq!(
            f.call_from_script(&mut env, &[Value::Int(1), Value::Int(2)]),
            Ok(Value::Int(3))
        );
        assert_eq!(
            f.call_from_script(&mut env, &[]).unwrap_err().class_name(),
            "ArgumentError"
        );
        assert_eq!(
            f.call_from_script(&mut env, &[Value::Int(1), Value::Int(2), Value::Int(3)])
                .unwrap_err()
                .class_name(),
            "ArgumentError"
        );
    }
}
