//! Signals Engine - Discovery, Validation and Activation Pipeline
//!
//! The discovery path runs CandidateRetriever -> RankingEngine ->
//! ProposalGenerator -> ProposalValidator; the activation path runs
//! ActivationOrchestrator -> ActivationLifecycleManager. `SignalsAgent`
//! wires both over a shared store, provider registry and configuration.

pub mod activation;
pub mod agent;
pub mod generator;
pub mod lifecycle;
pub mod ranking;
pub mod retriever;
pub mod validator;

pub use activation::{ActivationOrchestrator, ActivationReceipt, ActivationRequest};
pub use agent::{build_registry, DiscoveryResponse, SignalsAgent, StatusResponse};
pub use generator::ProposalGenerator;
pub use lifecycle::ActivationLifecycleManager;
pub use ranking::RankingEngine;
pub use retriever::CandidateRetriever;
pub use validator::{ProposalValidator, ValidationReport, ValidationSummary};
