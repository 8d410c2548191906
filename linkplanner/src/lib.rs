//! LinkPlanner - point-to-point radio link planning core
//!
//! This library provides the computational and coordination core of a
//! wireless link planning tool:
//!
//! - [`geometry`]: Earth-curvature adjusted line of sight and Fresnel zone
//! - [`obstruction`]: where a LiDAR surface intrudes into the Fresnel zone
//! - [`coverage`]: tri-state building coverage merged across transmitters
//! - [`channel`]: one reconnecting backend connection with stale-response
//!   rejection
//! - [`session`]: the orchestrator tying the above to caller actions
//!
//! # Example
//!
//! ```ignore
//! use linkplanner::config::PlannerConfig;
//! use linkplanner::protocol::LinkQuery;
//! use linkplanner::session::{LinkPlanningSession, SessionEvent};
//!
//! let config = PlannerConfig::load("linkplanner.ini")?;
//! let (mut session, mut events) = LinkPlanningSession::connect(&config);
//! session.update_request(LinkQuery::new(tx, rx, "link-1", 5.0))?;
//!
//! while session.process_next().await {
//!     while let Ok(SessionEvent::LinkAnalysis(analysis)) = events.try_recv() {
//!         println!("{:?}", analysis.obstructions);
//!     }
//! }
//! ```

pub mod channel;
pub mod config;
pub mod coord;
pub mod coverage;
pub mod geometry;
pub mod logging;
pub mod obstruction;
pub mod protocol;
pub mod session;
pub mod units;
