use std::str::FromStr;

use alloy_signer_local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use openst_contract::{
    abi::{encode_function_call, parse_abi},
    alloy_primitives::{keccak256, Address, U256},
    eip1077::Eip1077Transaction,
    Connection, ReceiptSummary,
    TokenHolder::{self, RuleExecuted},
    TokenRules::{self, RuleRegistered},
};
use serde_json::Value;
use tracing::debug;

use crate::{
    config::{ExecuteRuleCmd, RegisterRuleCmd},
    ops::read_abi_file,
    performer::{Performer, Success},
};

pub async fn register_rule(performer: &mut Performer, cmd: RegisterRuleCmd) -> Result<Success> {
    let config = performer.setup_config()?;
    let organization = config.organization()?;

    let rule_abi = minified_rule_abi(&read_abi_file(&cmd.abi)?)?;

    performer.log(format!(
        "Registering rule `{}` at {} in TokenRules {}",
        cmd.rule, cmd.address, cmd.token_rules
    ));
    let receipt = config
        .connection()
        .send(
            organization,
            cmd.token_rules,
            TokenRules::registerRuleCall {
                _ruleName: cmd.rule,
                _ruleAddress: cmd.address,
                _ruleAbi: rule_abi,
            },
        )
        .await
        .context("Failed to register rule. See error for details.")?;
    performer.log_receipt(&receipt);

    match receipt.find_event::<RuleRegistered>() {
        Some(event) if receipt.status => {
            performer.log_event("RuleRegistered", &event);
            Ok(Success::subject("Rule Registered Successfully."))
        }
        _ => bail!("Failed to register rule. See receipt for details."),
    }
}

/// A rule as stored in `TokenRules`.
struct Rule {
    address: Address,
    abi: String,
}

pub async fn execute_rule(performer: &mut Performer, cmd: ExecuteRuleCmd) -> Result<Success> {
    let ephemeral_key = PrivateKeySigner::from_str(cmd.ephemeral_private_key.trim())
        .context(
            "Invalid Ephemeral Private Key.\n\
             Please provide Ephemeral Private Key using --ephemeral-private-key flag",
        )?;
    let method_args = parse_method_args(&cmd.method_args)?;

    let config = performer.setup_config()?;
    let facilitator = config.facilitator()?;
    let connection = config.connection();

    let token_rules = connection
        .read(cmd.token_holder, TokenHolder::tokenRulesCall {})
        .await
        .context("Failed to get TokenRules Contract Address. See error for more details.")?
        ._0;
    performer.log(format!("TokenRules Contract Address: {token_rules}"));

    let rule = find_rule(&connection, token_rules, &cmd.rule)
        .await
        .context("Failed to get Custom Rule. See error for details.")?;
    performer.log(format!("Rule `{}` Contract Address: {}", cmd.rule, rule.address));

    let rule_abi = parse_abi(&rule.abi).context("Invalid ABI stored for the rule.")?;
    let data = encode_function_call(&rule_abi, &cmd.method, &method_args)
        .context("Failed to generate encodedABI. See error for details.")?;

    let key_nonce = connection
        .read(
            cmd.token_holder,
            TokenHolder::ephemeralKeysCall {
                _0: ephemeral_key.address(),
            },
        )
        .await
        .context("Failed to get Ephemeral Key Nonce. See error for details.")?
        .nonce;
    let nonce = key_nonce + U256::from(1);

    let call_prefix = connection
        .read(cmd.token_holder, TokenHolder::EXECUTE_RULE_CALLPREFIXCall {})
        .await
        .context("Failed to get EXECUTE_RULE_CALLPREFIX. See error for details.")?
        ._0;

    let transaction =
        Eip1077Transaction::rule_call(cmd.token_holder, rule.address, data, nonce, call_prefix);
    let signature = transaction
        .sign(&ephemeral_key)
        .context("Failed to sign the rule call with the ephemeral key.")?;
    debug!(message_hash = %transaction.message_hash(), %nonce, "Rule call signed");

    performer.log(format!(
        "Executing rule `{}` method `{}` with ephemeral key {} (nonce {nonce}) from {facilitator}",
        cmd.rule,
        cmd.method,
        ephemeral_key.address()
    ));
    let receipt = connection
        .send(
            facilitator,
            cmd.token_holder,
            TokenHolder::executeRuleCall {
                _to: rule.address,
                _data: transaction.data,
                _nonce: nonce,
                _v: signature.v,
                _r: signature.r,
                _s: signature.s,
            },
        )
        .await
        .context("Failed to execute rule. See error for details.")?;
    performer.log_receipt(&receipt);

    rule_outcome(performer, &receipt)
}

/// The rule ABI as registered on chain: whitespace stripped, key order kept.
fn minified_rule_abi(content: &str) -> Result<String> {
    parse_abi(content).context("Invalid rule ABI. Please provide the rule Abi using --abi flag")?;
    let rule_abi: Value = serde_json::from_str(content)?;
    Ok(rule_abi.to_string())
}

fn parse_method_args(method_args: &str) -> Result<Vec<Value>> {
    serde_json::from_str(method_args)
        .context("Failed to parse method-args. Please provide a JSON array using --method-args flag")
}

async fn find_rule(connection: &Connection, token_rules: Address, name: &str) -> Result<Rule> {
    let lookup = connection
        .read(
            token_rules,
            TokenRules::rulesByNameHashCall {
                _0: keccak256(name),
            },
        )
        .await?;
    if !lookup.exists {
        bail!("Rule `{name}` is not registered in TokenRules {token_rules}.");
    }

    let rule = connection
        .read(token_rules, TokenRules::rulesCall { _0: lookup.index })
        .await?;
    Ok(Rule {
        address: rule.ruleAddress,
        abi: rule.ruleAbi,
    })
}

fn rule_outcome(performer: &mut Performer, receipt: &ReceiptSummary) -> Result<Success> {
    if !receipt.status {
        bail!("Rule Execution Failed. Receipt status is false.");
    }
    let Some(event) = receipt.find_event::<RuleExecuted>() else {
        bail!("Rule Execution Failed. RuleExecuted event was not found. See receipt for details.");
    };
    performer.log_event("RuleExecuted", &event);

    match event._status {
        true => Ok(Success::subject("Rule Execution Success.")),
        false => {
            bail!("Rule Execution Failed. Receipt status is true. But execution status is false.")
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_sol_types::SolEvent;
    use assert2::{assert, let_assert};
    use openst_contract::alloy_primitives::{address, fixed_bytes, Log, B256};
    use serde_json::json;

    use super::*;

    fn rule_executed(status: bool) -> Log {
        let event = RuleExecuted {
            _to: address!("7F8d92283Fa96f9F2FE1596e718584F8aCA70264"),
            _functionSelector: fixed_bytes!("a9059cbb"),
            _ephemeralKey: address!("e7817ce78558ca0e43f11a975acc6027eb845a5a"),
            _nonce: U256::from(1),
            _messageHash: B256::repeat_byte(0x11),
            _status: status,
        };
        Log {
            address: address!("3D7bb53A5d731B157554E32a6499162070365C06"),
            data: event.encode_log_data(),
        }
    }

    fn receipt(status: bool, logs: Vec<Log>) -> ReceiptSummary {
        ReceiptSummary {
            status,
            logs,
            ..Default::default()
        }
    }

    #[test]
    fn method_args_must_be_a_json_array() {
        assert!(parse_method_args("[]").unwrap().is_empty());
        assert!(
            parse_method_args(r#"["0x7F8d92283Fa96f9F2FE1596e718584F8aCA70264", 10]"#).unwrap()
                == vec![json!("0x7F8d92283Fa96f9F2FE1596e718584F8aCA70264"), json!(10)]
        );
        assert!(parse_method_args(r#"{"to": "0x01"}"#).is_err());
        assert!(parse_method_args("[1,").is_err());
    }

    #[test]
    fn rule_abi_is_minified_in_file_order() {
        let content = r#"[
            {
                "type": "function",
                "name": "transferFrom",
                "inputs": [
                    { "name": "_from", "type": "address" },
                    { "name": "_to", "type": "address" },
                    { "name": "_amount", "type": "uint256" }
                ],
                "outputs": [{ "name": "", "type": "bool" }],
                "stateMutability": "nonpayable"
            }
        ]"#;

        let_assert!(Ok(minified) = minified_rule_abi(content));
        assert!(
            minified
                == r#"[{"type":"function","name":"transferFrom","inputs":[{"name":"_from","type":"address"},{"name":"_to","type":"address"},{"name":"_amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"}]"#
        );
    }

    #[test]
    fn invalid_rule_abi_is_rejected() {
        let_assert!(Err(err) = minified_rule_abi("[1,"));
        assert!(err.to_string().contains("--abi flag"));
    }

    #[test]
    fn rule_outcome_follows_the_event_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut performer = Performer::in_dir(dir.path());

        let succeeded = receipt(true, vec![rule_executed(true)]);
        let_assert!(Ok(success) = rule_outcome(&mut performer, &succeeded));
        assert!(success.subject == "Rule Execution Success.");

        let failed = receipt(true, vec![rule_executed(false)]);
        let_assert!(Err(err) = rule_outcome(&mut performer, &failed));
        assert!(err.to_string().ends_with("But execution status is false."));

        let_assert!(Err(err) = rule_outcome(&mut performer, &receipt(false, vec![])));
        assert!(err.to_string() == "Rule Execution Failed. Receipt status is false.");

        let_assert!(Err(err) = rule_outcome(&mut performer, &receipt(true, vec![])));
        assert!(err.to_string().contains("RuleExecuted event was not found"));
    }
}
