use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered stage of a transaction's lifecycle.
///
/// A node may only be evaluated once the transaction has reached the node's
/// bound phase; the ordering gates when each rule root becomes eligible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    RequestHeader,
    RequestBody,
    ResponseHeader,
    ResponseBody,
    Logging,
}

impl Phase {
    /// All phases in transaction order.
    pub const ALL: [Phase; 5] = [
        Phase::RequestHeader,
        Phase::RequestBody,
        Phase::ResponseHeader,
        Phase::ResponseBody,
        Phase::Logging,
    ];

    /// The earliest phase. Literals and other context-free nodes bind here.
    pub const EARLIEST: Phase = Phase::RequestHeader;
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::RequestHeader => "request-header",
            Phase::RequestBody => "request-body",
            Phase::ResponseHeader => "response-header",
            Phase::ResponseBody => "response-body",
            Phase::Logging => "logging",
        };
        write!(f, "{name}")
    }
}

/// Maps transaction field names to the earliest phase at which the
/// surrounding pipeline populates them.
///
/// The catalog is consulted when a `Var` node is interned: the field's
/// intrinsic phase becomes a lower bound on every node depending on it.
/// Fields not listed fall back to the configured default phase.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    phases: HashMap<String, Phase>,
    default_phase: Phase,
}

impl FieldCatalog {
    /// An empty catalog where every field is assumed available at `default`.
    #[must_use]
    pub fn new(default: Phase) -> Self {
        Self {
            phases: HashMap::new(),
            default_phase: default,
        }
    }

    /// A catalog pre-populated with the common traffic-inspection fields.
    #[must_use]
    pub fn standard() -> Self {
        let mut catalog = Self::new(Phase::RequestHeader);
        for name in [
            "REQUEST_METHOD",
            "REQUEST_URI",
            "REQUEST_URI_PATH",
            "REQUEST_PROTOCOL",
            "REQUEST_HEADERS",
            "REQUEST_COOKIES",
            "ARGS_GET",
        ] {
            catalog.insert(name, Phase::RequestHeader);
        }
        for name in ["REQUEST_BODY", "ARGS_POST", "ARGS"] {
            catalog.insert(name, Phase::RequestBody);
        }
        for name in ["RESPONSE_STATUS", "RESPONSE_PROTOCOL", "RESPONSE_HEADERS"] {
            catalog.insert(name, Phase::ResponseHeader);
        }
        catalog.insert("RESPONSE_BODY", Phase::ResponseBody);
        catalog
    }

    /// Register a field's intrinsic phase. Replaces any previous entry.
    pub fn insert(&mut self, name: &str, phase: Phase) {
        self.phases.insert(name.to_owned(), phase);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: &str, phase: Phase) -> Self {
        self.insert(name, phase);
        self
    }

    /// The earliest phase at which `name` is populated.
    #[must_use]
    pub fn phase_of(&self, name: &str) -> Phase {
        self.phases.get(name).copied().unwrap_or(self.default_phase)
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
