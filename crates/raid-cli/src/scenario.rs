//! # Run Subcommand
//!
//! Replays a YAML scenario against a fresh [`RaidNode`]. A scenario is a
//! list of steps, each tagged with `op`:
//!
//! ```yaml
//! steps:
//!   - op: deposit
//!     identity: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
//!     amount: 1000000
//!   - op: publish
//!     caller: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
//!     slot: 1
//!     replace: true
//!   - op: commit_root
//!     slot: 1000
//!     proposers: ["0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1", "0x0101010101010101010101010101010101010101"]
//!   - op: publish
//!     caller: "0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0"
//!     slot: 2
//!     replace: false
//!     proof:
//!       slot: 1000
//!       proposer_index: 42
//!       proposer: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
//! ```
//!
//! `commit_root` takes either an explicit `root` or a `proposers` set from
//! which the root is built. A `proof` block without `siblings` takes its
//! branch from the `proposers` set committed for the same slot.
//!
//! Step failures are part of the output, not errors of the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use raid_core::{hex, Address, Bytes32, Slot};
use raid_crypto::{Proof, SortedPairTree};
use raid_state::{
    AdminCapability, ErrorKind, HeadPhase, HeadState, PublishReceipt, PublishRequest, RaidConfig,
    RaidEvent, RaidNode,
};

/// Arguments for the `raid run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario file (YAML).
    #[arg(long, value_name = "SCENARIO_YAML")]
    pub scenario: PathBuf,
}

/// A parsed scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Steps, executed in order.
    pub steps: Vec<Step>,
}

/// Explicit proof fields, encoded by the runner.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProofFields {
    /// Beacon slot whose root the proof folds to.
    pub slot: Slot,
    /// Claimed validator index of the proposer.
    pub proposer_index: u64,
    /// Attested proposer.
    pub proposer: Address,
    /// Explicit branch. When absent, built from the `proposers` committed
    /// for `slot`.
    #[serde(default)]
    pub siblings: Option<Vec<Bytes32>>,
}

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Bond collateral for a participant.
    Deposit {
        /// Depositing participant.
        identity: Address,
        /// Amount added to the bond.
        amount: u128,
    },
    /// Release bonded collateral.
    Withdraw {
        /// Withdrawing participant.
        identity: Address,
        /// Amount taken from the bond.
        amount: u128,
    },
    /// Record a trusted beacon root.
    CommitRoot {
        /// Slot the root belongs to.
        slot: Slot,
        /// Explicit root.
        #[serde(default)]
        root: Option<Bytes32>,
        /// Proposer set the root is built from.
        #[serde(default)]
        proposers: Option<Vec<Address>>,
    },
    /// Submit a publication.
    Publish {
        /// Submitting participant.
        caller: Address,
        /// Slot claimed for the publication.
        slot: Slot,
        /// Replace the candidate rather than advance it.
        replace: bool,
        /// Blob payload, taken as UTF-8 bytes.
        #[serde(default)]
        blob: String,
        /// Fee attached to the call.
        #[serde(default)]
        fee: u128,
        /// Pre-encoded proof bytes.
        #[serde(default)]
        proof_hex: Option<String>,
        /// Proof fields for the runner to encode.
        #[serde(default)]
        proof: Option<ProofFields>,
    },
    /// Close the publish gate.
    Pause,
    /// Reopen the publish gate.
    Unpause,
    /// Change the default threshold.
    SetThreshold {
        /// New threshold.
        value: u64,
    },
    /// Change the per-default slash amount.
    SetSlashAmount {
        /// New slash amount.
        value: u128,
    },
    /// Sweep collected publication fees.
    WithdrawFees,
}

impl Step {
    fn op(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::CommitRoot { .. } => "commit_root",
            Self::Publish { .. } => "publish",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::SetThreshold { .. } => "set_threshold",
            Self::SetSlashAmount { .. } => "set_slash_amount",
            Self::WithdrawFees => "withdraw_fees",
        }
    }
}

/// Why a step was rejected by the node.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepFailure {
    /// Stable error name.
    pub code: String,
    /// Failure class, for publish errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// Human-readable message.
    pub message: String,
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// Zero-based step index.
    pub step: usize,
    /// Step tag.
    pub op: &'static str,
    /// Whether the node accepted the step.
    pub ok: bool,
    /// Receipt of an accepted publish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<PublishReceipt>,
    /// Amount returned by balance-moving steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u128>,
    /// Rejection details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
}

/// Full output of `raid run`.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Per-step outcomes, in order.
    pub steps: Vec<StepOutcome>,
    /// Final heads.
    pub heads: HeadState,
    /// Final phase.
    pub phase: HeadPhase,
    /// Default counts of every address the scenario touched.
    pub defaults: BTreeMap<Address, u64>,
    /// Bonded collateral of every address the scenario touched.
    pub collateral: BTreeMap<Address, u128>,
    /// Seized collateral credited to the treasury.
    pub treasury_balance: u128,
    /// Every event the node emitted.
    pub events: Vec<RaidEvent>,
}

/// Parse a scenario from YAML.
pub fn parse(yaml: &str) -> Result<Scenario> {
    serde_yaml::from_str(yaml).context("failed to parse scenario YAML")
}

/// Proposer sets committed per slot, for deriving proof branches.
#[derive(Default)]
struct Trees {
    by_slot: BTreeMap<Slot, Vec<Address>>,
}

impl Trees {
    fn branch_for(&self, slot: Slot, proposer: Address) -> Result<Vec<Bytes32>> {
        let Some(members) = self.by_slot.get(&slot) else {
            return Ok(Vec::new());
        };
        let Some(index) = members.iter().position(|a| *a == proposer) else {
            return Ok(Vec::new());
        };
        let tree = SortedPairTree::from_addresses(members)?;
        Ok(tree.branch(index)?)
    }
}

struct Runner {
    node: RaidNode,
    admin: AdminCapability,
    trees: Trees,
    touched: Vec<Address>,
}

impl Runner {
    fn touch(&mut self, identity: Address) {
        if !self.touched.contains(&identity) {
            self.touched.push(identity);
        }
    }

    fn step(&mut self, index: usize, step: &Step) -> Result<StepOutcome> {
        let mut outcome = StepOutcome {
            step: index,
            op: step.op(),
            ok: true,
            receipt: None,
            amount: None,
            error: None,
        };
        let failure = match step {
            Step::Deposit { identity, amount } => {
                self.touch(*identity);
                match self.node.deposit(*identity, *amount) {
                    Ok(balance) => {
                        outcome.amount = Some(balance);
                        None
                    }
                    Err(e) => Some(failure_of(&e, "BondError")),
                }
            }
            Step::Withdraw { identity, amount } => {
                self.touch(*identity);
                match self.node.withdraw(*identity, *amount) {
                    Ok(balance) => {
                        outcome.amount = Some(balance);
                        None
                    }
                    Err(e) => Some(failure_of(&e, "BondError")),
                }
            }
            Step::CommitRoot {
                slot,
                root,
                proposers,
            } => {
                let root = match (root, proposers) {
                    (Some(root), None) => *root,
                    (None, Some(members)) => {
                        let tree = SortedPairTree::from_addresses(members)
                            .with_context(|| format!("step {index}: empty proposer set"))?;
                        self.trees.by_slot.insert(*slot, members.clone());
                        tree.root()
                    }
                    _ => bail!("step {index}: commit_root needs exactly one of root, proposers"),
                };
                self.node
                    .commit_beacon_root(*slot, root)
                    .err()
                    .map(|e| failure_of(&e, "BeaconError"))
            }
            Step::Publish {
                caller,
                slot,
                replace,
                blob,
                fee,
                proof_hex,
                proof,
            } => {
                self.touch(*caller);
                let proof = self.proof_bytes(index, proof_hex.as_deref(), proof.as_ref())?;
                let request = PublishRequest {
                    caller: *caller,
                    blob: blob.as_bytes().to_vec(),
                    slot: *slot,
                    replace: *replace,
                    proof,
                    fee_paid: *fee,
                };
                match self.node.publish(request) {
                    Ok(receipt) => {
                        outcome.receipt = Some(receipt);
                        None
                    }
                    Err(e) => Some(StepFailure {
                        code: e.code().to_string(),
                        kind: Some(e.kind()),
                        message: e.to_string(),
                    }),
                }
            }
            Step::Pause => self
                .node
                .set_paused(&self.admin, true)
                .err()
                .map(|e| failure_of(&e, "NotAdmin")),
            Step::Unpause => self
                .node
                .set_paused(&self.admin, false)
                .err()
                .map(|e| failure_of(&e, "NotAdmin")),
            Step::SetThreshold { value } => self
                .node
                .set_default_threshold(&self.admin, *value)
                .err()
                .map(|e| failure_of(&e, "NotAdmin")),
            Step::SetSlashAmount { value } => self
                .node
                .set_default_slash_amount(&self.admin, *value)
                .err()
                .map(|e| failure_of(&e, "NotAdmin")),
            Step::WithdrawFees => match self.node.withdraw_fees(&self.admin) {
                Ok(amount) => {
                    outcome.amount = Some(amount);
                    None
                }
                Err(e) => Some(failure_of(&e, "NotAdmin")),
            },
        };
        if let Some(failure) = failure {
            tracing::info!(step = index, op = outcome.op, code = %failure.code, "step rejected");
            outcome.ok = false;
            outcome.error = Some(failure);
        }
        Ok(outcome)
    }

    fn proof_bytes(
        &self,
        index: usize,
        proof_hex: Option<&str>,
        fields: Option<&ProofFields>,
    ) -> Result<Vec<u8>> {
        match (proof_hex, fields) {
            (Some(_), Some(_)) => bail!("step {index}: give proof_hex or proof, not both"),
            (Some(raw), None) => {
                hex::decode(raw).with_context(|| format!("step {index}: invalid proof_hex"))
            }
            (None, Some(fields)) => {
                let branch = match &fields.siblings {
                    Some(siblings) => siblings.clone(),
                    None => self.trees.branch_for(fields.slot, fields.proposer)?,
                };
                Ok(Proof {
                    slot: fields.slot,
                    proposer_index: fields.proposer_index,
                    proposer: fields.proposer,
                    branch,
                }
                .encode())
            }
            (None, None) => Ok(Vec::new()),
        }
    }
}

fn failure_of(err: &dyn std::error::Error, code: &str) -> StepFailure {
    StepFailure {
        code: code.to_string(),
        kind: None,
        message: err.to_string(),
    }
}

/// Replay `scenario` against a fresh node built from `config`.
pub fn run_scenario(scenario: &Scenario, config: &RaidConfig) -> Result<ScenarioReport> {
    let (node, admin) = RaidNode::new(config).context("failed to start node")?;
    let mut runner = Runner {
        node,
        admin,
        trees: Trees::default(),
        touched: Vec::new(),
    };

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        steps.push(runner.step(index, step)?);
    }

    let node = &runner.node;
    let defaults = runner
        .touched
        .iter()
        .map(|a| (*a, node.defaults_of(*a)))
        .filter(|(_, count)| *count > 0)
        .collect();
    let collateral = runner
        .touched
        .iter()
        .map(|a| (*a, node.collateral_of(*a)))
        .collect();

    Ok(ScenarioReport {
        steps,
        heads: node.heads(),
        phase: node.phase(),
        defaults,
        collateral,
        treasury_balance: node.treasury_balance(),
        events: node.events(),
    })
}

/// Execute the run subcommand.
///
/// Returns exit code 0 if every step was accepted, 1 otherwise.
pub fn run_run(args: &RunArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = crate::load_config(config_path)?;
    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read scenario: {}", args.scenario.display()))?;
    let scenario = parse(&raw)?;
    tracing::debug!(steps = scenario.steps.len(), "scenario loaded");

    let report = run_scenario(&scenario, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.steps.iter().all(|s| s.ok) { 0 } else { 1 })
}
