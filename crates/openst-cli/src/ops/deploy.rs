use anyhow::{bail, Context, Result};
use openst_contract::{
    abi::{creation_code, encode_constructor_args, parse_cli_args, typed_creation_code},
    alloy_primitives::{Address, Bytes, U256},
    ReceiptSummary, TokenHolder, TokenRules,
};

use crate::{
    config::{DeployContractCmd, DeployMockTokenCmd, DeployTokenHolderCmd, DeployTokenRulesCmd},
    ops::{read_abi, read_bin},
    performer::{Performer, Success},
};

pub async fn deploy_contract(performer: &mut Performer, cmd: DeployContractCmd) -> Result<Success> {
    let config = performer.setup_config()?;
    let deployer = config.deployer()?;

    let abi = read_abi(&cmd.abi)?;
    let bytecode = read_bin(&cmd.bin)?;
    let args = parse_cli_args(&cmd.args);
    let constructor_args = encode_constructor_args(&abi, &args)
        .context("Failed to encode constructor arguments. See error for details.")?;

    performer.log(format!(
        "Deploying contract from {deployer} with {} constructor argument(s)",
        args.len()
    ));
    let code = creation_code(&bytecode, &constructor_args);
    deploy(performer, deployer, code, "Deployed Contract Address:").await
}

pub async fn deploy_mock_token(
    performer: &mut Performer,
    cmd: DeployMockTokenCmd,
) -> Result<Success> {
    let config = performer.setup_config()?;
    let deployer = config.deployer()?;
    let code = read_bin(&cmd.bin.unwrap_or_else(|| config.contract_bin("MockToken")))?;

    performer.log(format!("Deploying MockToken from {deployer}"));
    deploy(performer, deployer, code, "MockToken Contract Address:").await
}

pub async fn deploy_token_rules(
    performer: &mut Performer,
    cmd: DeployTokenRulesCmd,
) -> Result<Success> {
    let config = performer.setup_config()?;
    let deployer = config.deployer()?;
    let organization = match cmd.org_address {
        Some(organization) => organization,
        None => config.organization()?,
    };
    let bytecode = read_bin(&cmd.bin.unwrap_or_else(|| config.contract_bin("TokenRules")))?;

    performer.log(format!(
        "Deploying TokenRules for EIP20 {} and organization {organization}",
        cmd.eip20_address
    ));
    let code = typed_creation_code(
        &bytecode,
        &TokenRules::constructorCall {
            _organization: organization,
            _token: cmd.eip20_address,
        },
    );
    deploy(performer, deployer, code, "TokenRules Contract Address:").await
}

pub async fn deploy_token_holder(
    performer: &mut Performer,
    cmd: DeployTokenHolderCmd,
) -> Result<Success> {
    check_requirement(cmd.requirement, &cmd.wallets)?;

    let config = performer.setup_config()?;
    let deployer = config.deployer()?;
    let bytecode = read_bin(&cmd.bin.unwrap_or_else(|| config.contract_bin("TokenHolder")))?;

    performer.log(format!(
        "Deploying TokenHolder for EIP20 {} with TokenRules {}, {} wallet(s) and requirement {}",
        cmd.erc20_address,
        cmd.token_rules_address,
        cmd.wallets.len(),
        cmd.requirement
    ));
    let code = typed_creation_code(
        &bytecode,
        &TokenHolder::constructorCall {
            _token: cmd.erc20_address,
            _tokenRules: cmd.token_rules_address,
            _wallets: cmd.wallets,
            _required: cmd.requirement,
        },
    );
    deploy(performer, deployer, code, "TokenHolder Contract Address:").await
}

async fn deploy(
    performer: &mut Performer,
    deployer: Address,
    code: Bytes,
    subject: &str,
) -> Result<Success> {
    let receipt = performer
        .connection()?
        .deploy(deployer, code)
        .await
        .context("Failed to deploy contract. See error for details.")?;
    performer.log_receipt(&receipt);
    deployed(&receipt, subject)
}

fn deployed(receipt: &ReceiptSummary, subject: &str) -> Result<Success> {
    match receipt.deployed_address() {
        Some(address) => Ok(Success::new(subject, address.to_string())),
        None => bail!("Failed to deploy contract. See receipt for details."),
    }
}

fn check_requirement(requirement: U256, wallets: &[Address]) -> Result<()> {
    if requirement.is_zero() {
        bail!("Requirement must be at least 1.");
    }
    if requirement > U256::from(wallets.len()) {
        bail!(
            "Requirement {requirement} exceeds the number of wallets ({}).",
            wallets.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert2::{assert, let_assert};
    use openst_contract::alloy_primitives::address;

    use super::*;

    const WALLETS: [Address; 2] = [
        address!("e7817ce78558ca0e43f11a975acc6027eb845a5a"),
        address!("3D7bb53A5d731B157554E32a6499162070365C06"),
    ];

    #[test]
    fn requirement_must_fit_the_wallets() {
        assert!(check_requirement(U256::from(1), &WALLETS).is_ok());
        assert!(check_requirement(U256::from(2), &WALLETS).is_ok());
        assert!(check_requirement(U256::ZERO, &WALLETS).is_err());

        let_assert!(Err(err) = check_requirement(U256::from(3), &WALLETS));
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn deployed_address_requires_successful_receipt() {
        let contract = address!("84b0a610C11A9F8DB974CDBe39b855915b42CfD7");
        let mut receipt = ReceiptSummary {
            status: true,
            contract_address: Some(contract),
            ..Default::default()
        };

        let_assert!(Ok(success) = deployed(&receipt, "MockToken Contract Address:"));
        assert!(success.subject == "MockToken Contract Address:");
        assert!(success.message == contract.to_string());

        receipt.status = false;
        assert!(deployed(&receipt, "MockToken Contract Address:").is_err());
    }
}
