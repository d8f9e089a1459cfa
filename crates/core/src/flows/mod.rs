pub mod engine;
pub mod states;

pub use engine::{
    initial_demand_status, DemandEngine, DemandFlow, QuoteEngine, QuoteFlow, WorkflowDefinition,
    WorkflowEngine, WorkflowError, WorkflowErrorKind, DEFAULT_DEMAND_APPROVAL_NOTE,
    DEFAULT_QUOTE_APPROVAL_NOTE,
};
pub use states::{
    DemandAction, DemandCommand, EntityKind, QuoteAction, QuoteCommand, TransitionOutcome,
    WorkflowEffect,
};
