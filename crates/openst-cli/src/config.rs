use std::path::PathBuf;

use alloy_primitives::{Address, U256};
use clap::{Args, Parser, Subcommand, ValueEnum};

pub const DEFAULT_CONFIG_PATH: &str = "./openst-setup/config.json";
pub const DEFAULT_HISTORY_PATH: &str = "./openst-setup/history.log";
pub const DEFAULT_DATA_DIR: &str = "./openst-setup/origin-geth";
/// 1000 ether.
pub const DEFAULT_FUNDING_AMOUNT: &str = "1000000000000000000000";

#[derive(Clone, Eq, PartialEq, Debug, Parser)]
#[clap(name = "openst", version, about = "Deploy and operate OpenST TokenHolder contracts")]
pub struct CliConfig {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct CommonArgs {
    /// Path to the openst-setup `config.json` file.
    #[clap(
        short = 'c',
        long,
        global = true,
        default_value = DEFAULT_CONFIG_PATH,
        value_parser = parsing::parse_path
    )]
    pub config: PathBuf,

    /// Path to the history file. Every run appends its logs and outcome there.
    #[clap(
        short = 'H',
        long,
        global = true,
        default_value = DEFAULT_HISTORY_PATH,
        value_parser = parsing::parse_path
    )]
    pub history: PathBuf,

    /// Logging configuration.
    #[clap(short = 'l', long, global = true, value_enum, default_value = "text")]
    pub logging_format: LoggingFormat,
}

#[derive(Clone, Eq, PartialEq, Debug, Subcommand)]
pub enum Command {
    #[clap(flatten)]
    Deploy(DeployCommand),
    #[clap(flatten)]
    Token(TokenCommand),
    #[clap(flatten)]
    Key(KeyCommand),
    #[clap(flatten)]
    Multisig(MultisigCommand),
    #[clap(flatten)]
    Rule(RuleCommand),
}

#[derive(Clone, Eq, PartialEq, Debug, Subcommand)]
pub enum DeployCommand {
    /// Deploy any contract from its ABI and bytecode files.
    DeployContract(DeployContractCmd),
    /// Deploy the MockToken EIP20 contract.
    DeployMockToken(DeployMockTokenCmd),
    /// Deploy a TokenRules contract for an EIP20 token.
    DeployTokenRules(DeployTokenRulesCmd),
    /// Deploy a TokenHolder contract.
    DeployTokenHolder(DeployTokenHolderCmd),
}

#[derive(Clone, Eq, PartialEq, Debug, Subcommand)]
pub enum TokenCommand {
    /// Print the EIP20 balance of an address.
    BalanceOf(BalanceOfCmd),
    /// Transfer MockToken from the deployer to an address.
    FundMockToken(FundMockTokenCmd),
}

#[derive(Clone, Eq, PartialEq, Debug, Subcommand)]
pub enum KeyCommand {
    /// Create a new account in a geth keystore and fund it from the chain owner.
    CreateAndFundKey(CreateAndFundKeyCmd),
    /// Generate a new ephemeral key. Nothing is sent to the chain.
    CreateEphemeralKey,
}

#[derive(Clone, Eq, PartialEq, Debug, Subcommand)]
pub enum MultisigCommand {
    /// Propose adding a wallet to a TokenHolder.
    ProposeWallet(ProposeWalletCmd),
    /// Propose removing a wallet from a TokenHolder.
    ProposeRevokeWallet(ProposeRevokeWalletCmd),
    /// Confirm a pending TokenHolder multisig transaction.
    #[clap(visible_aliases = ["confirm-wallet", "confirm-revoke-wallet", "confirm-ephemeral-key"])]
    ConfirmTransaction(ConfirmTransactionCmd),
    /// Propose authorizing an ephemeral key.
    ProposeEphemeralKey(ProposeEphemeralKeyCmd),
    /// Revoke an ephemeral key.
    RevokeEphemeralKey(RevokeEphemeralKeyCmd),
}

#[derive(Clone, Eq, PartialEq, Debug, Subcommand)]
pub enum RuleCommand {
    /// Register a rule contract in TokenRules.
    RegisterRule(RegisterRuleCmd),
    /// Execute a registered rule through a TokenHolder, signed by an ephemeral key.
    ExecuteRule(ExecuteRuleCmd),
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct DeployContractCmd {
    /// Path to the contract ABI (a bare ABI array or a compiler artifact).
    #[clap(short, long, value_parser = parsing::parse_path)]
    pub abi: PathBuf,
    /// Path to the contract bytecode.
    #[clap(short, long, value_parser = parsing::parse_path)]
    pub bin: PathBuf,
    /// Constructor arguments. Arguments looking like JSON arrays or objects are parsed as JSON.
    #[clap(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct DeployMockTokenCmd {
    /// Path to the bytecode. Defaults to `MockToken.bin` in the contracts directory.
    #[clap(long, value_parser = parsing::parse_path)]
    pub bin: Option<PathBuf>,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct DeployTokenRulesCmd {
    /// Address of the EIP20 token.
    #[clap(long)]
    pub eip20_address: Address,
    /// Organization address. Defaults to `organizationAddress` from the config.
    #[clap(long)]
    pub org_address: Option<Address>,
    /// Path to the bytecode. Defaults to `TokenRules.bin` in the contracts directory.
    #[clap(long, value_parser = parsing::parse_path)]
    pub bin: Option<PathBuf>,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct DeployTokenHolderCmd {
    /// Address of the EIP20 token.
    #[clap(short, long)]
    pub erc20_address: Address,
    /// Address of the TokenRules contract.
    #[clap(short, long)]
    pub token_rules_address: Address,
    /// Number of confirmations required for multisig operations.
    #[clap(short, long)]
    pub requirement: U256,
    /// Comma separated wallet addresses.
    #[clap(
        short,
        long,
        required = true,
        value_delimiter = ',',
        value_parser = parsing::parse_address
    )]
    pub wallets: Vec<Address>,
    /// Path to the bytecode. Defaults to `TokenHolder.bin` in the contracts directory.
    #[clap(long, value_parser = parsing::parse_path)]
    pub bin: Option<PathBuf>,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct BalanceOfCmd {
    /// Address of the EIP20 token.
    #[clap(long)]
    pub eip20_address: Address,
    /// Address whose balance is read.
    #[clap(long)]
    pub address: Address,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct FundMockTokenCmd {
    /// Address of the MockToken contract.
    #[clap(long)]
    pub eip20_address: Address,
    /// Beneficiary.
    #[clap(long)]
    pub to_address: Address,
    /// Amount in the token's smallest unit.
    #[clap(long)]
    pub amount: U256,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct CreateAndFundKeyCmd {
    /// Geth data directory. The key is stored in its `keystore` subdirectory.
    #[clap(long, default_value = DEFAULT_DATA_DIR, value_parser = parsing::parse_path)]
    pub data_dir: PathBuf,
    /// Amount of wei to send to the new account.
    #[clap(long, default_value = DEFAULT_FUNDING_AMOUNT)]
    pub amount: U256,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct ProposeWalletCmd {
    /// Address of the TokenHolder contract.
    #[clap(short, long, alias = "token-holder-address")]
    pub token_holder: Address,
    /// Wallet to add.
    #[clap(short = 'p', long)]
    pub wallet_to_propose: Address,
    /// Existing wallet submitting the proposal.
    #[clap(short, long)]
    pub wallet: Address,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct ProposeRevokeWalletCmd {
    /// Address of the TokenHolder contract.
    #[clap(short, long, alias = "token-holder-address")]
    pub token_holder: Address,
    /// Wallet to remove.
    #[clap(short = 'r', long)]
    pub wallet_to_revoke: Address,
    /// Existing wallet submitting the proposal.
    #[clap(short, long)]
    pub wallet: Address,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct ConfirmTransactionCmd {
    /// Address of the TokenHolder contract.
    #[clap(short, long, alias = "token-holder-address")]
    pub token_holder: Address,
    /// Wallet confirming the transaction.
    #[clap(short, long)]
    pub wallet: Address,
    /// Id of the multisig transaction.
    #[clap(short = 'i', long)]
    pub transaction_id: U256,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct ProposeEphemeralKeyCmd {
    /// Address of the TokenHolder contract.
    #[clap(long, alias = "token-holder-address")]
    pub token_holder: Address,
    /// Wallet submitting the proposal.
    #[clap(long)]
    pub wallet: Address,
    /// Ephemeral key to authorize.
    #[clap(long)]
    pub ephemeral_key: Address,
    /// Amount of tokens the key may spend.
    #[clap(long)]
    pub spending_limit: U256,
    /// Block height after which the key expires.
    #[clap(long)]
    pub expiration_height: U256,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct RevokeEphemeralKeyCmd {
    /// Address of the TokenHolder contract.
    #[clap(long, alias = "token-holder-address")]
    pub token_holder: Address,
    /// Wallet revoking the key.
    #[clap(long)]
    pub wallet: Address,
    /// Ephemeral key to revoke.
    #[clap(long)]
    pub ephemeral_key: Address,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct RegisterRuleCmd {
    /// Address of the TokenRules contract.
    #[clap(long)]
    pub token_rules: Address,
    /// Name of the rule.
    #[clap(long)]
    pub rule: String,
    /// Address of the rule contract.
    #[clap(long)]
    pub address: Address,
    /// Path to the rule ABI.
    #[clap(long, value_parser = parsing::parse_path)]
    pub abi: PathBuf,
}

#[derive(Clone, Eq, PartialEq, Debug, Args)]
pub struct ExecuteRuleCmd {
    /// Address of the TokenHolder contract.
    #[clap(long, alias = "token-holder-address")]
    pub token_holder: Address,
    /// Private key of an authorized ephemeral key.
    #[clap(long)]
    pub ephemeral_private_key: String,
    /// Name of the registered rule.
    #[clap(long)]
    pub rule: String,
    /// Rule method to call.
    #[clap(long)]
    pub method: String,
    /// Method arguments as a JSON array.
    #[clap(long, default_value = "[]")]
    pub method_args: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, ValueEnum)]
pub enum LoggingFormat {
    #[default]
    Text,
    Json,
}

mod parsing {
    use std::{path::PathBuf, str::FromStr};

    use alloy_primitives::Address;
    use anyhow::{anyhow, Result};

    pub fn parse_path(path: &str) -> Result<PathBuf> {
        let expanded_path =
            shellexpand::full(path).map_err(|e| anyhow!("Failed to expand path: {e:?}"))?;
        PathBuf::from_str(expanded_path.as_ref())
            .map_err(|e| anyhow!("Failed to interpret path: {e:?}"))
    }

    /// Addresses in comma separated lists may be surrounded by spaces.
    pub fn parse_address(address: &str) -> Result<Address> {
        Address::from_str(address.trim()).map_err(|e| anyhow!("Invalid address `{address}`: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use assert2::{assert, let_assert};
    use clap::Parser;

    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        crate::config::CliConfig::command().debug_assert()
    }

    #[test]
    fn wallets_are_comma_separated() {
        let config = CliConfig::parse_from([
            "openst",
            "deploy-token-holder",
            "-e",
            "0x84b0a610C11A9F8DB974CDBe39b855915b42CfD7",
            "-t",
            "0x7F8d92283Fa96f9F2FE1596e718584F8aCA70264",
            "-r",
            "2",
            "-w",
            "0xe7817ce78558ca0e43f11a975acc6027eb845a5a, 0x3D7bb53A5d731B157554E32a6499162070365C06",
        ]);
        let_assert!(Command::Deploy(DeployCommand::DeployTokenHolder(cmd)) = config.command);
        assert!(cmd.requirement == U256::from(2));
        assert!(
            cmd.wallets
                == vec![
                    address!("e7817ce78558ca0e43f11a975acc6027eb845a5a"),
                    address!("3D7bb53A5d731B157554E32a6499162070365C06"),
                ]
        );
    }

    #[test]
    fn confirm_aliases_resolve_to_the_same_command() {
        for alias in [
            "confirm-transaction",
            "confirm-wallet",
            "confirm-revoke-wallet",
            "confirm-ephemeral-key",
        ] {
            let config = CliConfig::parse_from([
                "openst",
                alias,
                "-t",
                "0x84b0a610C11A9F8DB974CDBe39b855915b42CfD7",
                "-w",
                "0xe7817ce78558ca0e43f11a975acc6027eb845a5a",
                "-i",
                "7",
            ]);
            let_assert!(Command::Multisig(MultisigCommand::ConfirmTransaction(cmd)) = config.command);
            assert!(cmd.transaction_id == U256::from(7));
        }
    }

    #[test]
    fn invalid_address_is_a_usage_error() {
        let result = CliConfig::try_parse_from([
            "openst",
            "balance-of",
            "--eip20-address",
            "not-an-address",
            "--address",
            "0xe7817ce78558ca0e43f11a975acc6027eb845a5a",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let config = CliConfig::parse_from([
            "openst",
            "create-ephemeral-key",
            "-c",
            "/tmp/config.json",
            "-l",
            "json",
        ]);
        assert!(config.common.config == PathBuf::from("/tmp/config.json"));
        assert!(config.common.history == PathBuf::from(DEFAULT_HISTORY_PATH));
        assert!(config.common.logging_format == LoggingFormat::Json);
        assert!(config.command == Command::Key(KeyCommand::CreateEphemeralKey));
    }

    #[test]
    fn execute_rule_requires_rule_and_method() {
        let result = CliConfig::try_parse_from([
            "openst",
            "execute-rule",
            "--token-holder",
            "0x84b0a610C11A9F8DB974CDBe39b855915b42CfD7",
            "--ephemeral-private-key",
            "0x01",
            "--rule",
            "transferRule",
        ]);
        assert!(result.is_err());
    }
}
