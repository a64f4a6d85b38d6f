use alloy_signer_local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use openst_contract::{
    alloy_primitives::Address,
    signing::{create_keystore, hex_address},
};
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};

use crate::{
    config::CreateAndFundKeyCmd,
    performer::{Performer, Success},
};

const KEYSTORE_SUBDIR: &str = "keystore";
const KEYSTORE_TIMESTAMP: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]-[minute]-[second].[subsecond digits:9]Z"
);

pub fn create_ephemeral_key(performer: &mut Performer) -> Result<Success> {
    performer.log("Generating a new ephemeral key");
    let signer = PrivateKeySigner::random();
    Ok(Success::new(
        "New Ephemeral Key Details",
        format!(
            "\naddress: {}\nprivateKey: {}",
            signer.address(),
            signer.to_bytes()
        ),
    ))
}

pub async fn create_and_fund_key(
    performer: &mut Performer,
    cmd: CreateAndFundKeyCmd,
) -> Result<Success> {
    let config = performer.setup_config()?;
    let chain_owner = config.chain_owner()?;
    let keystore_dir = cmd.data_dir.join(KEYSTORE_SUBDIR);

    let timestamp = OffsetDateTime::now_utc().format(KEYSTORE_TIMESTAMP)?;
    let (signer, keystore_file) = create_keystore(&keystore_dir, &config.passphrase, |address| {
        keystore_file_name(&timestamp, address)
    })
    .context("Failed to create account. See error for details.")?;
    let address = signer.address();
    performer.log(format!(
        "Created account {address}, keystore file {}",
        keystore_file.display()
    ));

    performer.log(format!(
        "Funding {address} with {} wei from {chain_owner}",
        cmd.amount
    ));
    let receipt = config
        .connection()
        .transfer_value(chain_owner, address, cmd.amount)
        .await
        .context("Failed to fund account. See error for details.")?;
    performer.log_receipt(&receipt);

    if !receipt.status {
        bail!("Failed to fund account {address}. See receipt for details.");
    }
    Ok(Success::new("Account created and funded.", address.to_string()))
}

/// Geth names keystore files `UTC--<timestamp>--<address>`.
fn keystore_file_name(timestamp: &str, address: Address) -> String {
    format!("UTC--{timestamp}--{}", hex_address(address))
}
