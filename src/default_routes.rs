//! Default-route elision: delete entries the hardware reproduces for free.
//!
//! The router's default forwarding sends an unmatched packet straight out
//! of the link opposite the one it arrived on. An entry whose route and
//! source each name exactly one link, with the two links geometrically
//! opposite, adds nothing over that behaviour, unless deleting it would
//! expose its packets to a different entry later in the table. Each
//! deletion is therefore guarded by an intersection scan over the
//! surviving later entries.

use tracing::info;

use crate::bitset::BitSet;
use crate::error::CompressionError;
use crate::table::{RoutingEntry, RoutingTable};

/// The six low bits of a direction word select physical links; higher
/// bits select local cores and can never default-route.
const LINK_MASK: u32 = 0x3f;

/// Whether a direction bitmask names exactly one physical link.
fn just_a_link(direction: u32) -> bool {
    direction.count_ones() == 1 && direction & LINK_MASK != 0
}

/// Whether the entry's single input link is geometrically opposite its
/// single output link (a rotation of the 6-bit link field by 3 places).
fn opposite_links(entry: &RoutingEntry) -> bool {
    let src = entry.source & LINK_MASK;
    let dst = entry.route & LINK_MASK;
    (dst >> 3) == (src & 0x7) && (src >> 3) == (dst & 0x7)
}

/// Whether hardware default forwarding already reproduces this entry.
pub fn is_default_routable(entry: &RoutingEntry) -> bool {
    just_a_link(entry.route) && just_a_link(entry.source) && opposite_links(entry)
}

/// Remove default-routable entries from the table where doing so cannot
/// change behaviour.
///
/// Works bottom-up so that an entry is only compared against later
/// entries that will actually survive. An eligible entry is kept whenever
/// any surviving later entry's keymask intersects its own: deleting it
/// would let packets currently stopped here fall through to that later
/// entry instead of to default routing.
///
/// Returns the number of entries removed.
pub fn elide_default_routes(table: &mut RoutingTable) -> Result<usize, CompressionError> {
    let mut remove = BitSet::new(table.len())?;

    for i in (0..table.len()).rev() {
        let entry = table.entry(i);
        if !is_default_routable(entry) {
            continue;
        }
        let exposed = ((i + 1)..table.len()).any(|j| {
            !remove.contains(j) && entry.keymask.intersects(table.entry(j).keymask)
        });
        if !exposed {
            remove.add(i);
        }
    }

    let removed = remove.count();
    if removed > 0 {
        table.retain_indices(|i| !remove.contains(i));
        info!(removed, remaining = table.len(), "elided default routes");
    }
    Ok(removed)
}
