use std::{fs, path::Path};

use anyhow::{Context, Result};
use openst_contract::{
    abi::{parse_abi, parse_bytecode, JsonAbi},
    alloy_primitives::Bytes,
};

use crate::{
    config::{Command, DeployCommand, KeyCommand, MultisigCommand, RuleCommand, TokenCommand},
    performer::{Performer, Success},
};

mod deploy;
mod keys;
mod multisig;
mod rules;
mod token;

pub async fn perform(performer: &mut Performer, command: Command) -> Result<Success> {
    match command {
        Command::Deploy(command) => match command {
            DeployCommand::DeployContract(cmd) => deploy::deploy_contract(performer, cmd).await,
            DeployCommand::DeployMockToken(cmd) => deploy::deploy_mock_token(performer, cmd).await,
            DeployCommand::DeployTokenRules(cmd) => {
                deploy::deploy_token_rules(performer, cmd).await
            }
            DeployCommand::DeployTokenHolder(cmd) => {
                deploy::deploy_token_holder(performer, cmd).await
            }
        },
        Command::Token(command) => match command {
            TokenCommand::BalanceOf(cmd) => token::balance_of(performer, cmd).await,
            TokenCommand::FundMockToken(cmd) => token::fund_mock_token(performer, cmd).await,
        },
        Command::Key(command) => match command {
            KeyCommand::CreateAndFundKey(cmd) => keys::create_and_fund_key(performer, cmd).await,
            KeyCommand::CreateEphemeralKey => keys::create_ephemeral_key(performer),
        },
        Command::Multisig(command) => match command {
            MultisigCommand::ProposeWallet(cmd) => multisig::propose_wallet(performer, cmd).await,
            MultisigCommand::ProposeRevokeWallet(cmd) => {
                multisig::propose_revoke_wallet(performer, cmd).await
            }
            MultisigCommand::ConfirmTransaction(cmd) => {
                multisig::confirm_transaction(performer, cmd).await
            }
            MultisigCommand::ProposeEphemeralKey(cmd) => {
                multisig::propose_ephemeral_key(performer, cmd).await
            }
            MultisigCommand::RevokeEphemeralKey(cmd) => {
                multisig::revoke_ephemeral_key(performer, cmd).await
            }
        },
        Command::Rule(command) => match command {
            RuleCommand::RegisterRule(cmd) => rules::register_rule(performer, cmd).await,
            RuleCommand::ExecuteRule(cmd) => rules::execute_rule(performer, cmd).await,
        },
    }
}

fn read_abi_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| {
        format!(
            "Invalid ABI Path: {}\nPlease provide contract Abi using -a or --abi flag",
            path.display()
        )
    })
}

fn read_bin(path: &Path) -> Result<Bytes> {
    let content = fs::read_to_string(path).with_context(|| {
        format!(
            "Invalid BIN Path: {}\nPlease provide contract bin using -b or --bin flag",
            path.display()
        )
    })?;
    parse_bytecode(&content).with_context(|| format!("Invalid bytecode in {}", path.display()))
}

fn read_abi(path: &Path) -> Result<JsonAbi> {
    let content = read_abi_file(path)?;
    parse_abi(&content).with_context(|| format!("Invalid ABI in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use assert2::{assert, let_assert};

    use super::*;

    #[test]
    fn missing_abi_tells_how_to_provide_it() {
        let dir = tempfile::tempdir().unwrap();
        let_assert!(Err(err) = read_abi(&dir.path().join("Missing.abi")));
        assert!(err.to_string().contains("Invalid ABI Path:"));
        assert!(err.to_string().contains("-a or --abi"));
    }

    #[test]
    fn bin_files_are_read_as_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Token.bin");
        fs::write(&path, "0x6080604052\n").unwrap();
        assert!(read_bin(&path).unwrap().to_vec() == vec![0x60, 0x80, 0x60, 0x40, 0x52]);

        fs::write(&path, "not hex").unwrap();
        let_assert!(Err(err) = read_bin(&path));
        assert!(err.to_string().starts_with("Invalid bytecode"));
    }
}
