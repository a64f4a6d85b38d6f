use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_signer_local::PrivateKeySigner;
use tracing::debug;

use crate::{ContractError, ContractResult};

/// How transactions sent through a `Connection` get signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigningPolicy {
    /// The sender is an account managed by the node. It is unlocked with `passphrase`
    /// (`personal_unlockAccount`) right before sending, and the node signs.
    NodeUnlock { passphrase: String },
    /// The sender's key is read from a geth-style keystore directory, decrypted with
    /// `passphrase` and used to sign locally.
    Keystore { dir: PathBuf, passphrase: String },
}

/// Ask the node to unlock `account` with `passphrase` until the node decides otherwise.
pub async fn unlock_account(
    provider: &impl Provider,
    account: Address,
    passphrase: &str,
) -> ContractResult<()> {
    debug!(%account, "Unlocking account on the node");
    let unlocked: bool = provider
        .raw_request(
            "personal_unlockAccount".into(),
            (account, passphrase.to_string(), Option::<u64>::None),
        )
        .await?;

    match unlocked {
        true => Ok(()),
        false => Err(ContractError::UnlockRejected(account)),
    }
}

/// Find the keystore file of `address` in `dir`. Geth names these files
/// `UTC--<timestamp>--<lowercase hex address>`.
pub fn find_keystore_file(dir: &Path, address: Address) -> ContractResult<PathBuf> {
    let suffix = hex_address(address);
    let not_found = || ContractError::KeystoreNotFound {
        address,
        dir: dir.to_path_buf(),
    };

    fs::read_dir(dir)
        .map_err(|_| not_found())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.to_lowercase().ends_with(&suffix))
        })
        .ok_or_else(not_found)
}

/// Decrypt the keystore of `address` stored in `dir`.
pub fn load_keystore_signer(
    dir: &Path,
    address: Address,
    passphrase: &str,
) -> ContractResult<PrivateKeySigner> {
    let path = find_keystore_file(dir, address)?;
    debug!(?path, "Decrypting keystore");
    let signer = PrivateKeySigner::decrypt_keystore(&path, passphrase)?;
    if signer.address() != address {
        return Err(ContractError::Other(format!(
            "Keystore {path:?} holds the key of {}, not {address}",
            signer.address()
        )));
    }
    Ok(signer)
}

/// Generate a fresh key and store it in `dir`, encrypted with `passphrase`. The file is named
/// by `file_name`, which gets the address of the new key.
pub fn create_keystore(
    dir: &Path,
    passphrase: &str,
    file_name: impl FnOnce(Address) -> String,
) -> ContractResult<(PrivateKeySigner, PathBuf)> {
    fs::create_dir_all(dir)
        .map_err(|e| ContractError::Other(format!("Failed to create {dir:?}: {e}")))?;

    let signer = PrivateKeySigner::random();
    let name = file_name(signer.address());
    PrivateKeySigner::encrypt_keystore(
        dir,
        &mut rand::thread_rng(),
        signer.to_bytes(),
        passphrase,
        Some(&name),
    )?;
    Ok((signer, dir.join(name)))
}

/// Lowercase hex representation of `address`, without the `0x` prefix.
pub fn hex_address(address: Address) -> String {
    format!("{address:x}")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use alloy_primitives::address;

    use super::*;

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[test]
    fn hex_address_is_lowercase_without_prefix() {
        assert_eq!(
            hex_address(ANVIL_ADDRESS),
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn finds_keystore_by_address_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir
            .path()
            .join("UTC--2018-06-12T10-20-30.0Z--0000000000000000000000000000000000000001");
        let wanted = dir
            .path()
            .join("UTC--2018-06-12T10-20-31.0Z--f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        fs::write(&other, "{}").unwrap();
        fs::write(&wanted, "{}").unwrap();

        assert_eq!(find_keystore_file(dir.path(), ANVIL_ADDRESS).unwrap(), wanted);
    }

    #[test]
    fn missing_keystore_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = find_keystore_file(dir.path(), ANVIL_ADDRESS);
        assert!(matches!(
            result,
            Err(ContractError::KeystoreNotFound { address, .. }) if address == ANVIL_ADDRESS
        ));
    }

    #[test]
    fn created_keystore_can_be_decrypted() {
        let dir = tempfile::tempdir().unwrap();
        let keystore_dir = dir.path().join("keystore");
        let (signer, path) = create_keystore(&keystore_dir, "testtest", |address| {
            format!("UTC--test--{}", hex_address(address))
        })
        .unwrap();

        assert!(path.is_file());
        assert_eq!(find_keystore_file(&keystore_dir, signer.address()).unwrap(), path);
        let loaded = load_keystore_signer(&keystore_dir, signer.address(), "testtest").unwrap();
        assert_eq!(loaded.address(), signer.address());
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let signer = PrivateKeySigner::from_str(ANVIL_KEY).unwrap();
        let name = format!("UTC--test--{}", hex_address(signer.address()));
        PrivateKeySigner::encrypt_keystore(
            dir.path(),
            &mut rand::thread_rng(),
            signer.to_bytes(),
            "testtest",
            Some(&name),
        )
        .unwrap();

        assert!(load_keystore_signer(dir.path(), ANVIL_ADDRESS, "wrong").is_err());
        assert!(load_keystore_signer(dir.path(), ANVIL_ADDRESS, "testtest").is_ok());
    }
}
