//! Multicast routing table minimisation.
//!
//! `rtmin` compresses the routing tables of a many-core neuromorphic
//! machine so they fit the router's fixed-size ternary CAM. A table is an
//! ordered list of `(key, mask) -> route` entries; a packet takes the
//! route of the *first* entry matching its key. Compression merges
//! same-route entries into wider wildcarded entries without changing
//! which route any previously-matched packet takes:
//!
//! - Default-route elision drops entries the hardware reproduces for free
//! - Ordered covering exploits first-match order for aggressive merging
//! - Route grouping gives a simpler alternative for non-overlapping tables
//!
//! # Compression Methods
//!
//! - **Ordered covering**: greedy best-merge search with up/down covering
//!   checks, near the best known ratios for order-exploiting tables
//! - **Route grouping**: pairwise merging within same-route buckets,
//!   for tables whose entries of distinct routes do not overlap
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//! use rtmin::{OrderedCovering, RoutingEntry, RoutingTable, TableMinimiser};
//!
//! // Two entries with the same route, differing in one key bit.
//! let mut table = RoutingTable::from_entries(vec![
//!     RoutingEntry::new(0b0000, 0b1111, 0b1000, 0b0001),
//!     RoutingEntry::new(0b0100, 0b1111, 0b1000, 0b0001),
//! ]);
//!
//! let stop = AtomicBool::new(false);
//! OrderedCovering::new().minimise(&mut table, 0, &stop).unwrap();
//!
//! // They merge into one entry with an X in the differing bit.
//! assert_eq!(table.len(), 1);
//! ```
//!
//! # References
//!
//! - Mundy, Heathcote & Garside (2016). "On-chip order-exploiting routing
//!   table minimization for a multicast supercomputer network"
//! - Liu (2002). "Routing table compaction in ternary CAM"
//! - Furber et al. (2014). "The SpiNNaker Project"

#![warn(missing_docs)]
#![warn(clippy::all)]

mod alias;
mod bitset;
mod default_routes;
mod error;
mod keymask;
mod merge;
mod orchestrator;
mod ordered_covering;
mod route_grouping;
mod table;
mod traits;

pub use alias::{AliasEntry, AliasTable};
pub use default_routes::{elide_default_routes, is_default_routable};
pub use error::CompressionError;
pub use keymask::KeyMask;
pub use orchestrator::{CompressorConfig, Orchestrator, Outcome, RouterAccess};
pub use ordered_covering::OrderedCovering;
pub use route_grouping::RouteGrouping;
pub use table::{RoutingEntry, RoutingTable};
pub use traits::{MinimiseStatus, TableMinimiser};

/// Minimisation strategy selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MinimisationMethod {
    /// Ordered covering (order-exploiting, best compression).
    #[default]
    OrderedCovering,
    /// Route grouping (faster, weaker compression; requires entries of
    /// distinct routes not to overlap and leaves other tables unchanged).
    RouteGrouping,
}

impl MinimisationMethod {
    /// The strategy implementation behind this selection.
    pub fn minimiser(self) -> Box<dyn TableMinimiser> {
        match self {
            MinimisationMethod::OrderedCovering => Box::new(OrderedCovering::new()),
            MinimisationMethod::RouteGrouping => Box::new(RouteGrouping::new()),
        }
    }
}
