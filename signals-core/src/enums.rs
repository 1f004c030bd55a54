//! Enum types for signal and activation entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATALOG ENUMS
// ============================================================================

/// Kind of audience/content signal carried in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Private,
    Marketplace,
    Audience,
    Bidding,
    Contextual,
    Geographical,
    Temporal,
    Environmental,
}

/// Catalog access level for signals and principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogAccess {
    Public,
    Personalized,
    Private,
}

/// Scope of a platform deployment row.
/// A signal may carry both a platform-wide and account-specific row
/// for the same platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentScope {
    PlatformWide,
    AccountSpecific,
}

// ============================================================================
// PROPOSAL ENUMS
// ============================================================================

/// Logic combining the signals of a proposal.
/// Only `Or` is ever valid; `And` exists so the validator can reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombinationLogic {
    Or,
    And,
}

/// How the ranked signal list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMethod {
    AiRanking,
    Fallback,
}

/// How the proposal list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    AiGeneration,
    Fallback,
}

// ============================================================================
// ACTIVATION ENUMS
// ============================================================================

/// Status of an activation context.
/// Pending -> InProgress -> Completed is the only automatic path;
/// Completed, Failed and Expired are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Expired,
}

impl ActivationStatus {
    /// Next status on the automatic path. Terminal states map to themselves.
    pub fn next(self) -> ActivationStatus {
        match self {
            ActivationStatus::Pending => ActivationStatus::InProgress,
            ActivationStatus::InProgress => ActivationStatus::Completed,
            terminal => terminal,
        }
    }

    /// Whether this status ends the lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActivationStatus::Completed | ActivationStatus::Failed | ActivationStatus::Expired
        )
    }

    /// Whether entering this status records a completion timestamp.
    pub fn records_completion(self) -> bool {
        matches!(self, ActivationStatus::Completed | ActivationStatus::Failed)
    }
}

/// Kind of activation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Segment,
    Proposal,
}

// ============================================================================
// STRING CONVERSIONS
// ============================================================================

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SignalType::Private => "private",
            SignalType::Marketplace => "marketplace",
            SignalType::Audience => "audience",
            SignalType::Bidding => "bidding",
            SignalType::Contextual => "contextual",
            SignalType::Geographical => "geographical",
            SignalType::Temporal => "temporal",
            SignalType::Environmental => "environmental",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "private" => Ok(SignalType::Private),
            "marketplace" => Ok(SignalType::Marketplace),
            "audience" => Ok(SignalType::Audience),
            "bidding" => Ok(SignalType::Bidding),
            "contextual" => Ok(SignalType::Contextual),
            "geographical" | "geo" => Ok(SignalType::Geographical),
            "temporal" => Ok(SignalType::Temporal),
            "environmental" => Ok(SignalType::Environmental),
            _ => Err(format!("Invalid SignalType: {}", s)),
        }
    }
}

impl fmt::Display for CatalogAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            CatalogAccess::Public => "public",
            CatalogAccess::Personalized => "personalized",
            CatalogAccess::Private => "private",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for CatalogAccess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "public" => Ok(CatalogAccess::Public),
            "personalized" => Ok(CatalogAccess::Personalized),
            "private" => Ok(CatalogAccess::Private),
            _ => Err(format!("Invalid CatalogAccess: {}", s)),
        }
    }
}

impl fmt::Display for DeploymentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            DeploymentScope::PlatformWide => "platform-wide",
            DeploymentScope::AccountSpecific => "account-specific",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for DeploymentScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "platformwide" => Ok(DeploymentScope::PlatformWide),
            "accountspecific" => Ok(DeploymentScope::AccountSpecific),
            _ => Err(format!("Invalid DeploymentScope: {}", s)),
        }
    }
}

impl fmt::Display for CombinationLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            CombinationLogic::Or => "OR",
            CombinationLogic::And => "AND",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for CombinationLogic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "or" => Ok(CombinationLogic::Or),
            "and" => Ok(CombinationLogic::And),
            _ => Err(format!("Invalid CombinationLogic: {}", s)),
        }
    }
}

impl fmt::Display for RankingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RankingMethod::AiRanking => "ai_ranking",
            RankingMethod::Fallback => "fallback",
        };
        write!(f, "{}", value)
    }
}

impl fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            GenerationMethod::AiGeneration => "ai_generation",
            GenerationMethod::Fallback => "fallback",
        };
        write!(f, "{}", value)
    }
}

impl fmt::Display for ActivationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ActivationStatus::Pending => "pending",
            ActivationStatus::InProgress => "in_progress",
            ActivationStatus::Completed => "completed",
            ActivationStatus::Failed => "failed",
            ActivationStatus::Expired => "expired",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for ActivationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "pending" => Ok(ActivationStatus::Pending),
            "inprogress" => Ok(ActivationStatus::InProgress),
            "completed" | "complete" => Ok(ActivationStatus::Completed),
            "failed" | "failure" => Ok(ActivationStatus::Failed),
            "expired" => Ok(ActivationStatus::Expired),
            _ => Err(format!("Invalid ActivationStatus: {}", s)),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TargetType::Segment => "segment",
            TargetType::Proposal => "proposal",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "segment" => Ok(TargetType::Segment),
            "proposal" => Ok(TargetType::Proposal),
            _ => Err(format!("Invalid TargetType: {}", s)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
