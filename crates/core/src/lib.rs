pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod inbox;
pub mod statistics;
pub mod visibility;

pub use domain::{
    Article, ArticleDraft, AttachedFile, Comment, CommentDraft, CommentType, Demand, DemandDraft,
    DemandId, DemandStatus, Quote, QuoteId, QuoteStatus, Role, User, UserId, UserRef,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{
    initial_demand_status, DemandAction, DemandCommand, DemandEngine, EntityKind, QuoteAction,
    QuoteCommand, QuoteEngine, TransitionOutcome, WorkflowEffect, WorkflowError, WorkflowErrorKind,
};
pub use inbox::{inbox, InboxItem, INBOX_LIMIT};
pub use statistics::{DemandStatistics, ProviderStatistics, TechnicianStatistics};
pub use visibility::{visible_demands, visible_quotes, Viewer};
