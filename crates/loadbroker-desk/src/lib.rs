//! Dispatcher desk collaborators for loadbroker
//!
//! The pieces a carrier call touches around the negotiation itself: the load
//! board (search and board rate lookup), the carrier registry (MC number
//! eligibility) and the post-call analytics relay.

mod analytics;
mod carrier;
mod load_board;

pub use analytics::{AnalyticsRelay, CallAnalytics, EVENT_RETENTION, parse_currency};
pub use carrier::{CarrierRegistry, CarrierVerification, VerificationStatus, validate_mc_number};
pub use load_board::{DEFAULT_SEARCH_LIMIT, Load, LoadBoard, LoadQuery, MAX_SEARCH_LIMIT};
pub use loadbroker_utils::error::DeskError;
