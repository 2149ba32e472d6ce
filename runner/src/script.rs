//! # Script Replay
//!
//! A script deploys one token and then lists the calls to make against it:
//!
//! ```json
//! {
//!   "token": { "name": "MyToken", "symbol": "MTK", "decimals": 18, "initial_supply": "1000" },
//!   "deployer": "owner",
//!   "amounts": "tokens",
//!   "steps": [
//!     { "caller": "owner", "call": { "method": "transfer", "to": "addr1", "amount": "100" } },
//!     { "caller": "addr1", "call": { "method": "transfer", "to": "owner", "amount": "500" },
//!       "expect": { "revert": "不十分なバランス" } }
//!   ]
//! }
//! ```
//!
//! Accounts may be written as `0x` hex or as labels; labels resolve through
//! [`Address::from_label`]. With `"amounts": "tokens"` every amount, the
//! initial supply included, is in whole tokens and scaled by `decimals`;
//! with the default `"raw"` amounts are smallest units.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use bep20_contracts::units::parse_raw;
use bep20_contracts::{parse_units, Address, Bep20Token, Call, Outcome, TokenConfig};

/// Call argument names that carry accounts.
const ACCOUNT_FIELDS: &[&str] = &["to", "from", "spender", "owner", "account", "new_owner"];

/// Call argument names that carry amounts.
const AMOUNT_FIELDS: &[&str] = &["amount"];

/// How amounts in a script are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountMode {
    /// Smallest units.
    #[default]
    Raw,
    /// Whole tokens, scaled by the token's decimals.
    Tokens,
}

/// Token deployment section of a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSection {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_supply: String,
}

/// What a step is expected to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    #[default]
    Success,
    /// The call must revert with exactly this reason.
    Revert(String),
}

/// One scripted call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub caller: String,
    pub call: Value,
    #[serde(default)]
    pub expect: Expectation,
}

/// A parsed script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub token: TokenSection,
    pub deployer: String,
    #[serde(default)]
    pub amounts: AmountMode,
    pub steps: Vec<Step>,
}

/// Per-step line written to the report.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub caller: Address,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub expectation_met: bool,
}

/// Result of replaying a whole script.
#[derive(Debug)]
pub struct RunSummary {
    pub token: Bep20Token,
    pub reports: Vec<StepReport>,
}

impl RunSummary {
    /// Number of steps whose expectation failed.
    pub fn failures(&self) -> usize {
        self.reports.iter().filter(|r| !r.expectation_met).count()
    }
}

/// Reads and parses a script file.
pub fn load(path: &Path) -> Result<Script> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse script {}", path.display()))
}

/// Resolves an account written as hex or as a label.
pub fn resolve_account(text: &str) -> Result<Address> {
    if text.starts_with("0x") || text.starts_with("0X") {
        text.parse()
            .with_context(|| format!("invalid account address '{text}'"))
    } else {
        Ok(Address::from_label(text))
    }
}

impl Script {
    fn parse_amount(&self, text: &str) -> Result<bep20_contracts::Amount> {
        let parsed = match self.amounts {
            AmountMode::Raw => parse_raw(text),
            AmountMode::Tokens => parse_units(text, self.token.decimals),
        };
        parsed.with_context(|| format!("invalid amount '{text}'"))
    }

    /// The deployment config described by the `token` section.
    pub fn token_config(&self) -> Result<TokenConfig> {
        let supply = self.parse_amount(&self.token.initial_supply)?;
        Ok(TokenConfig::new(
            self.token.name.clone(),
            self.token.symbol.clone(),
            self.token.decimals,
            supply,
        ))
    }

    /// Turns a step's loosely-written call into a typed [`Call`]: labels
    /// become hex addresses and amounts become smallest-unit decimals.
    pub fn resolve_call(&self, raw: &Value) -> Result<Call> {
        let mut value = raw.clone();
        let Some(fields) = value.as_object_mut() else {
            bail!("call must be a JSON object, got {raw}");
        };

        for (key, field) in fields.iter_mut() {
            let key = key.as_str();
            if ACCOUNT_FIELDS.contains(&key) {
                if let Value::String(text) = field {
                    *field = Value::String(resolve_account(text)?.to_hex());
                }
            } else if AMOUNT_FIELDS.contains(&key) {
                // Numbers go through the same scaling as strings.
                let text = match field {
                    Value::String(text) => text.clone(),
                    Value::Number(n) => n.to_string(),
                    other => bail!("amount must be a string or number, got {other}"),
                };
                *field = Value::String(self.parse_amount(&text)?.to_string());
            }
        }

        serde_json::from_value(value).with_context(|| format!("invalid call {raw}"))
    }

    /// Deploys the token and replays every step, writing one JSON report
    /// line per step to `out`.
    ///
    /// A step that does not parse aborts the run. A step whose outcome
    /// differs from its expectation is reported and, unless `fail_fast` is
    /// set, the run continues.
    pub fn run(&self, out: &mut impl Write, fail_fast: bool) -> Result<RunSummary> {
        let deployer = resolve_account(&self.deployer)?;
        let mut token = Bep20Token::deploy(deployer, self.token_config()?);
        let mut reports = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let caller = resolve_account(&step.caller)
                .with_context(|| format!("step {index}: bad caller"))?;
            let call = self
                .resolve_call(&step.call)
                .with_context(|| format!("step {index}: bad call"))?;

            let report = match (token.execute(caller, &call), &step.expect) {
                (Ok(outcome), expect) => StepReport {
                    step: index,
                    caller,
                    method: call.method(),
                    outcome: Some(outcome),
                    reason: None,
                    error: None,
                    expectation_met: *expect == Expectation::Success,
                },
                (Err(err), expect) => StepReport {
                    step: index,
                    caller,
                    method: call.method(),
                    outcome: None,
                    reason: Some(err.reason().to_string()),
                    error: Some(err.to_string()),
                    expectation_met: matches!(expect, Expectation::Revert(r) if r == err.reason()),
                },
            };

            if !report.expectation_met {
                tracing::warn!(
                    step = index,
                    method = report.method,
                    expected = ?step.expect,
                    reason = ?report.reason,
                    "expectation failed"
                );
            }

            serde_json::to_writer(&mut *out, &report).context("failed to write report")?;
            writeln!(out).context("failed to write report")?;

            let stop = fail_fast && !report.expectation_met;
            reports.push(report);
            if stop {
                break;
            }
        }

        Ok(RunSummary { token, reports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bep20_contracts::Amount;

    const SCRIPT: &str = r#"{
        "token": { "name": "MyToken", "symbol": "MTK", "decimals": 18, "initial_supply": "1000" },
        "deployer": "owner",
        "amounts": "tokens",
        "steps": [
            { "caller": "owner", "call": { "method": "transfer", "to": "addr1", "amount": "100" } },
            { "caller": "addr1", "call": { "method": "transfer", "to": "addr2", "amount": "50" } },
            { "caller": "addr1", "call": { "method": "transfer", "to": "owner", "amount": "51" },
              "expect": { "revert": "不十分なバランス" } },
            { "caller": "owner", "call": { "method": "transfer_ownership", "new_owner": "addr1" } },
            { "caller": "addr1", "call": { "method": "mint", "to": "addr1", "amount": "1000" } },
            { "caller": "owner", "call": { "method": "balance_of", "account": "addr1" } }
        ]
    }"#;

    fn ether(n: u64) -> Amount {
        Amount::from(n) * Amount::exp10(18)
    }

    #[test]
    fn replays_script_and_meets_expectations() {
        let script: Script = serde_json::from_str(SCRIPT).unwrap();
        let mut out = Vec::new();
        let summary = script.run(&mut out, false).unwrap();

        assert_eq!(summary.failures(), 0);
        assert_eq!(summary.reports.len(), 6);
        let addr1 = Address::from_label("addr1");
        assert_eq!(summary.token.balance_of(&addr1), ether(1050));
        assert_eq!(summary.token.total_supply(), ether(2000));

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[2]["reason"], "不十分なバランス");
        assert_eq!(lines[5]["outcome"]["value"]["value"], ether(1050).to_string());
    }

    #[test]
    fn unmet_expectation_is_counted() {
        let script: Script = serde_json::from_str(
            r#"{
                "token": { "name": "T", "symbol": "T", "decimals": 0, "initial_supply": "10" },
                "deployer": "owner",
                "steps": [
                    { "caller": "nobody", "call": { "method": "burn", "amount": "1" } },
                    { "caller": "owner", "call": { "method": "burn", "amount": "1" },
                      "expect": { "revert": "不十分なバランス" } }
                ]
            }"#,
        )
        .unwrap();
        let summary = script.run(&mut Vec::new(), false).unwrap();
        assert_eq!(summary.failures(), 2);

        let summary = script.run(&mut Vec::new(), true).unwrap();
        assert_eq!(summary.reports.len(), 1);
    }

    #[test]
    fn hex_accounts_and_raw_amounts() {
        let addr1 = Address::from_label("addr1");
        let script: Script = serde_json::from_str(&format!(
            r#"{{
                "token": {{ "name": "T", "symbol": "T", "decimals": 18, "initial_supply": "0xff" }},
                "deployer": "owner",
                "steps": [
                    {{ "caller": "owner", "call": {{ "method": "approve", "spender": "{addr1}", "amount": "5" }} }}
                ]
            }}"#
        ))
        .unwrap();
        let summary = script.run(&mut Vec::new(), false).unwrap();
        let owner = Address::from_label("owner");
        assert_eq!(summary.token.total_supply(), Amount::from(255u64));
        assert_eq!(summary.token.allowance(&owner, &addr1), Amount::from(5u64));
    }

    #[test]
    fn numeric_amounts_scale_like_strings() {
        let script: Script = serde_json::from_str(
            r#"{
                "token": { "name": "MyToken", "symbol": "MTK", "decimals": 18, "initial_supply": "1000" },
                "deployer": "owner",
                "amounts": "tokens",
                "steps": [
                    { "caller": "owner", "call": { "method": "transfer", "to": "addr1", "amount": "100" } },
                    { "caller": "owner", "call": { "method": "transfer", "to": "addr2", "amount": 100 } },
                    { "caller": "owner", "call": { "method": "approve", "spender": "addr3", "amount": 2.5 } }
                ]
            }"#,
        )
        .unwrap();
        let summary = script.run(&mut Vec::new(), false).unwrap();
        assert_eq!(summary.failures(), 0);

        let token = &summary.token;
        let owner = Address::from_label("owner");
        assert_eq!(token.balance_of(&Address::from_label("addr1")), ether(100));
        assert_eq!(token.balance_of(&Address::from_label("addr2")), ether(100));
        assert_eq!(
            token.allowance(&owner, &Address::from_label("addr3")),
            Amount::from(25u64) * Amount::exp10(17)
        );
    }

    #[test]
    fn non_scalar_amount_rejected() {
        let script: Script = serde_json::from_str(
            r#"{
                "token": { "name": "T", "symbol": "T", "decimals": 0, "initial_supply": "1" },
                "deployer": "owner",
                "steps": []
            }"#,
        )
        .unwrap();
        let raw: Value =
            serde_json::from_str(r#"{ "method": "burn", "amount": [1] }"#).unwrap();
        assert!(script.resolve_call(&raw).is_err());

        let raw: Value = serde_json::from_str(r#"{ "method": "burn", "amount": 1 }"#).unwrap();
        assert_eq!(
            script.resolve_call(&raw).unwrap(),
            Call::Burn { amount: Amount::one() }
        );
    }

    #[test]
    fn malformed_call_aborts() {
        let script: Script = serde_json::from_str(
            r#"{
                "token": { "name": "T", "symbol": "T", "decimals": 0, "initial_supply": "1" },
                "deployer": "owner",
                "steps": [ { "caller": "owner", "call": { "method": "teleport" } } ]
            }"#,
        )
        .unwrap();
        let err = script.run(&mut Vec::new(), false).unwrap_err();
        assert!(format!("{err:#}").contains("step 0"));
    }

    #[test]
    fn bundled_script_passes() {
        let script: Script =
            serde_json::from_str(include_str!("../scripts/mytoken.json")).unwrap();
        let summary = script.run(&mut Vec::new(), false).unwrap();
        assert_eq!(summary.failures(), 0);
        // 1000 - 100 burned + 1000 minted
        assert_eq!(summary.token.total_supply(), ether(1900));
        assert_eq!(summary.token.owner(), Address::from_label("addr1"));
        summary.token.check_supply_invariant().unwrap();
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCRIPT.as_bytes()).unwrap();
        let script = load(file.path()).unwrap();
        assert_eq!(script.amounts, AmountMode::Tokens);
        assert_eq!(script.steps.len(), 6);

        assert!(load(Path::new("/nonexistent/script.json")).is_err());
    }
}
