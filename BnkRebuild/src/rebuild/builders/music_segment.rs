//! Music segments

use super::{BuildCtx, tids};
use crate::error::Result;
use crate::output::PlaylistWriter;
use crate::rebuild::config::NodeConfig;
use crate::rebuild::node::{FieldRef, RebuiltNode};
use crate::rebuild::session::Rebuilder;
use crate::rebuild::source::Sound;
use crate::tree::NodeRef;

/// Fixed id of the entry cue.
pub const ENTRY_MARKER_ID: u32 = 43573010;
/// Fixed id of the exit cue.
pub const EXIT_MARKER_ID: u32 = 1539036744;

// v62 and older use 0/1 for entry/exit (other cues do use ids)
const LEGACY_ENTRY_MARKER_ID: u32 = 0;
const LEGACY_EXIT_MARKER_ID: u32 = 1;

/// Segment: tracks layered over a fixed duration.
#[derive(Debug, Clone)]
pub struct MusicSegmentBody {
    pub children: Vec<u32>,
    /// Played instead of the tracks when there are none.
    pub silence: Sound,
}

fn find_marker<'a>(nmarkers: NodeRef<'a>, id: u32) -> Option<NodeRef<'a>> {
    nmarkers
        .finds_name("id")
        .into_iter()
        .find(|n| n.value_u32() == Some(id))
        .and_then(NodeRef::parent)
}

pub(super) fn build_segment(ctx: &mut BuildCtx<'_, '_>) -> Result<MusicSegmentBody> {
    ctx.build_audio_config()?;
    ctx.forbid_loop()?;

    let nduration = ctx.require("fDuration")?;
    ctx.config.duration = nduration.value_f64();
    ctx.field(nduration);

    // markers are ordered by time, entry/exit may be anywhere
    let nmarkers = ctx.require("pArrayMarkers")?;
    let markers = match (
        find_marker(nmarkers, ENTRY_MARKER_ID),
        find_marker(nmarkers, EXIT_MARKER_ID),
    ) {
        (Some(entry), Some(exit)) => Some((entry, exit)),
        _ => find_marker(nmarkers, LEGACY_ENTRY_MARKER_ID)
            .zip(find_marker(nmarkers, LEGACY_EXIT_MARKER_ID)),
    };
    let Some((nentry, nexit)) = markers else {
        return Err(ctx.structural("entry/exit markers not found"));
    };

    let nentry_pos = ctx.require_in(nentry, "fPosition")?;
    let nexit_pos = ctx.require_in(nexit, "fPosition")?;
    ctx.config.entry = nentry_pos.value_f64();
    ctx.config.exit = nexit_pos.value_f64();
    ctx.fields.push(FieldRef::Keyed {
        key: nentry.id(),
        value: nentry_pos.id(),
    });
    ctx.fields.push(FieldRef::Keyed {
        key: nexit.id(),
        value: nexit_pos.id(),
    });

    Ok(MusicSegmentBody {
        children: tids(ctx.node.find_name("Children")),
        silence: Sound::silence(ctx.node.id(), true),
    })
}

impl MusicSegmentBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        // empty segments are allowed as silence
        if self.children.is_empty() {
            writer.group_layer(1, &bnode.config);
            writer.source_sound(&self.silence, &NodeConfig::default());
            writer.group_done();
            return Ok(());
        }

        writer.group_layer(self.children.len(), &bnode.config);
        for &tid in &self.children {
            session.process_next(tid, writer)?;
        }
        writer.group_done();
        Ok(())
    }
}
