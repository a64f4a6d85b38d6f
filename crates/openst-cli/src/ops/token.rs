use anyhow::{bail, Context, Result};
use openst_contract::MockToken;

use crate::{
    config::{BalanceOfCmd, FundMockTokenCmd},
    performer::{Performer, Success},
};

pub async fn balance_of(performer: &mut Performer, cmd: BalanceOfCmd) -> Result<Success> {
    let connection = performer.connection()?;
    let balance = connection
        .read(
            cmd.eip20_address,
            MockToken::balanceOfCall {
                _owner: cmd.address,
            },
        )
        .await
        .context("Balance check failed.")?
        .balance;

    Ok(Success::new(
        format!("Balance of address:{}", cmd.address),
        balance.to_string(),
    ))
}

pub async fn fund_mock_token(performer: &mut Performer, cmd: FundMockTokenCmd) -> Result<Success> {
    let config = performer.setup_config()?;
    let deployer = config.deployer()?;

    performer.log(format!(
        "Transferring {} of {} from {deployer} to {}",
        cmd.amount, cmd.eip20_address, cmd.to_address
    ));
    let receipt = config
        .connection()
        .send(
            deployer,
            cmd.eip20_address,
            MockToken::transferCall {
                _to: cmd.to_address,
                _value: cmd.amount,
            },
        )
        .await
        .context("Fund EIP20 failed. See error for details.")?;
    performer.log_receipt(&receipt);

    if !receipt.status {
        bail!("Fund EIP20 failed. See receipt for details.");
    }
    if let Some(transfer) = receipt.find_event::<MockToken::Transfer>() {
        performer.log_event("Transfer", &transfer);
    }
    Ok(Success::subject("Fund EIP20 Done."))
}
