//! Encoding calls against ABIs that are only known at runtime (user-supplied ABI files and rule
//! ABIs stored in `TokenRules`).

use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
pub use alloy_json_abi::JsonAbi;
use alloy_json_abi::Param;
use alloy_primitives::{hex, Bytes};
use alloy_sol_types::SolConstructor;
use serde_json::Value;
use tracing::warn;

use crate::{ContractError, ContractResult};

/// Parse an ABI. Accepts both a bare ABI array and a compiler artifact with an `abi` field.
pub fn parse_abi(content: &str) -> ContractResult<JsonAbi> {
    let value: Value = serde_json::from_str(content)?;
    let abi = match value {
        Value::Object(mut artifact) => artifact
            .remove("abi")
            .unwrap_or(Value::Object(artifact)),
        other => other,
    };
    Ok(serde_json::from_value(abi)?)
}

/// Parse contract bytecode as found in `.bin` files: whitespace around it is ignored and the
/// `0x` prefix is optional.
pub fn parse_bytecode(content: &str) -> ContractResult<Bytes> {
    let trimmed = content.trim();
    let hex_code = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(hex_code)
        .map(Bytes::from)
        .map_err(|e| ContractError::Other(format!("Invalid bytecode: {e}")))
}

/// Encode a call to `function_name` (selector included). Among overloads, the one taking
/// `args.len()` arguments is used.
pub fn encode_function_call(
    abi: &JsonAbi,
    function_name: &str,
    args: &[Value],
) -> ContractResult<Bytes> {
    let function = abi
        .function(function_name)
        .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
        .ok_or_else(|| ContractError::FunctionNotFound {
            name: function_name.to_string(),
            arity: args.len(),
        })?;

    let values = coerce_args(&function.inputs, args)?;
    Ok(function.abi_encode_input(&values)?.into())
}

/// Encode constructor arguments (no selector), ready to be appended to the creation bytecode.
/// An ABI without a constructor accepts only an empty argument list.
pub fn encode_constructor_args(abi: &JsonAbi, args: &[Value]) -> ContractResult<Bytes> {
    match &abi.constructor {
        Some(constructor) => {
            let values = coerce_args(&constructor.inputs, args)?;
            Ok(constructor.abi_encode_input(&values)?.into())
        }
        None if args.is_empty() => Ok(Bytes::new()),
        None => Err(ContractError::ArityMismatch {
            expected: 0,
            actual: args.len(),
        }),
    }
}

/// Creation bytecode followed by the encoded constructor arguments.
pub fn creation_code(bytecode: &Bytes, constructor_args: &[u8]) -> Bytes {
    [bytecode.as_ref(), constructor_args].concat().into()
}

/// Same as [`creation_code`], with arguments of a contract known at compile time.
pub fn typed_creation_code<C: SolConstructor>(bytecode: &Bytes, constructor: &C) -> Bytes {
    creation_code(bytecode, &constructor.abi_encode())
}

/// Turn positional command-line arguments into JSON values. Arguments that look like a JSON
/// object or array are parsed as such; everything else stays a string.
pub fn parse_cli_args(args: &[String]) -> Vec<Value> {
    args.iter()
        .map(|arg| {
            let looks_like_json = (arg.starts_with('{') && arg.ends_with('}'))
                || (arg.starts_with('[') && arg.ends_with(']'));
            if looks_like_json {
                match serde_json::from_str(arg) {
                    Ok(value) => return value,
                    Err(e) => warn!(%arg, "Argument looks like JSON but does not parse: {e}"),
                }
            }
            Value::String(arg.clone())
        })
        .collect()
}

fn coerce_args(params: &[Param], args: &[Value]) -> ContractResult<Vec<DynSolValue>> {
    if params.len() != args.len() {
        return Err(ContractError::ArityMismatch {
            expected: params.len(),
            actual: args.len(),
        });
    }
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| coerce_value(&param.resolve()?, arg))
        .collect()
}

/// Convert a JSON value into a Solidity value of type `ty`. Scalars go through the string
/// coercion of `DynSolType`, arrays and tuples are converted element by element.
pub fn coerce_value(ty: &DynSolType, value: &Value) -> ContractResult<DynSolValue> {
    let mismatch = || ContractError::ArgumentMismatch {
        expected: ty.sol_type_name().into_owned(),
        value: value.to_string(),
    };

    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<ContractResult<_>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) if items.len() == *len => items
            .iter()
            .map(|item| coerce_value(inner, item))
            .collect::<ContractResult<_>>()
            .map(DynSolValue::FixedArray),
        (DynSolType::Tuple(types), Value::Array(items)) if items.len() == types.len() => types
            .iter()
            .zip(items)
            .map(|(ty, item)| coerce_value(ty, item))
            .collect::<ContractResult<_>>()
            .map(DynSolValue::Tuple),
        (
            DynSolType::Array(_) | DynSolType::FixedArray(..) | DynSolType::Tuple(_),
            _,
        ) => Err(mismatch()),
        (_, Value::String(s)) => ty.coerce_str(s).map_err(|_| mismatch()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|_| mismatch()),
        (_, Value::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}
