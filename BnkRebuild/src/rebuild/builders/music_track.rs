//! Music tracks
//!
//! Each track holds subtracks ("lanes") of clips:
//! - 0: silent track
//! - 1: normal
//! - N: layered, with pre-defined fades if overlapped
//!
//! Final length depends on the segment.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use super::BuildCtx;
use crate::error::Result;
use crate::output::{GameSync, GameSyncType, PlaylistWriter};
use crate::rebuild::config::NodeConfig;
use crate::rebuild::node::{FieldRef, RebuiltNode};
use crate::rebuild::session::Rebuilder;
use crate::rebuild::source::{ClipTiming, MediaSource, Sound};
use crate::tree::{NodeId, NodeRef};

/// Track sub-type (`eTrackType`, `eRSType` in older banks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackType {
    /// Plays its only subtrack.
    Normal,
    /// Plays one random subtrack.
    Random,
    /// Plays one subtrack, the next one on the following play.
    Sequence,
    /// Plays the subtrack selected by a game sync.
    Switch,
}

impl TrackType {
    fn from_raw(value: i64) -> Option<Self> {
        match value {
            0 => Some(TrackType::Normal),
            1 => Some(TrackType::Random),
            2 => Some(TrackType::Sequence),
            3 => Some(TrackType::Switch),
            _ => None,
        }
    }
}

/// One clip of a subtrack.
#[derive(Debug, Clone)]
pub struct Clip {
    /// `AkTrackSrcInfo` node.
    pub node: NodeId,
    pub fields: Vec<FieldRef>,
    /// Media and timing of the clip.
    pub sound: Sound,
    /// Event played instead of media (later versions), 0 if unset.
    pub event: u32,
}

/// Switch track selection: value → subtrack index.
#[derive(Debug, Clone)]
pub struct TrackSwitch {
    pub gtype: GameSyncType,
    pub group: u32,
    pub lanes: IndexMap<u32, usize>,
}

#[derive(Debug, Clone)]
pub struct MusicTrackBody {
    pub track_type: TrackType,
    /// Clips per subtrack (empty subtracks play silence).
    pub subtracks: Vec<Vec<Clip>>,
    pub switch: Option<TrackSwitch>,
}

pub(super) fn build_track(ctx: &mut BuildCtx<'_, '_>) -> Result<MusicTrackBody> {
    ctx.build_audio_config()?;
    ctx.read_loop();
    // loops in tracks are meaningless
    ctx.config.loop_count = None;

    let ntype = ctx
        .node
        .find_name("eTrackType")
        .or_else(|| ctx.node.find_name("eRSType"))
        .ok_or_else(|| ctx.structural("missing track type"))?;
    let track_type = ntype
        .value_i64()
        .and_then(TrackType::from_raw)
        .ok_or_else(|| ctx.structural("unknown track type"))?;
    ctx.field(ntype);

    // sources are referenced by clips
    let mut sources: HashMap<u32, MediaSource> = HashMap::new();
    if let Some(nsources) = ctx.node.find_name("pSource") {
        for nitem in nsources.finds_name("AkBankSourceData") {
            let source = ctx.parse_source(nitem)?;
            sources.insert(source.source_id, source);
        }
    }

    let Some(ncount) = ctx.node.find_name("numSubTrack") else {
        // empty / no clips
        return Ok(MusicTrackBody {
            track_type,
            subtracks: Vec::new(),
            switch: None,
        });
    };
    let count = ncount.value_u32().unwrap_or_default() as usize;
    ctx.field(ncount);

    // normal tracks play one subtrack, N aren't allowed
    if track_type == TrackType::Normal && count > 1 {
        return Err(ctx.structural("more than 1 subtrack"));
    }

    // every lane is backed by a clip or a switch value
    let nclips = ctx.node.finds_name("AkTrackSrcInfo");
    let backed = nclips.len() + ctx.node.finds_name("ulSwitchAssoc").len();
    if count > backed.max(1) {
        return Err(ctx.structural(format!(
            "{count} subtracks for {backed} clips and switch values"
        )));
    }

    let mut subtracks: Vec<Vec<Clip>> = vec![Vec::new(); count];
    for nsrc in nclips {
        let index = ctx
            .require_in(nsrc, "trackID")?
            .value_u32()
            .unwrap_or_default() as usize;
        let clip = build_clip(ctx, &sources, nsrc)?;
        let Some(lane) = subtracks.get_mut(index) else {
            return Err(ctx.structural(format!("clip in subtrack {index} of {count}")));
        };
        lane.push(clip);
    }

    let switch = if track_type == TrackType::Switch {
        Some(build_track_switch(ctx, subtracks.len())?)
    } else {
        None
    };

    Ok(MusicTrackBody {
        track_type,
        subtracks,
        switch,
    })
}

fn build_track_switch(ctx: &BuildCtx<'_, '_>, lanes_count: usize) -> Result<TrackSwitch> {
    let nswitch = ctx.require("SwitchParams")?;
    let gtype = ctx
        .require_in(nswitch, "eGroupType")?
        .value_i64()
        .and_then(GameSyncType::from_raw)
        .ok_or_else(|| ctx.structural("unknown game sync type"))?;
    let group = ctx
        .require_in(nswitch, "uGroupID")?
        .value_u32()
        .ok_or_else(|| ctx.structural("invalid group id"))?;

    // switch N = subtrack N
    let mut lanes = IndexMap::new();
    for nvalue in nswitch.finds_name("ulSwitchAssoc") {
        let Some(value) = nvalue.value_u32() else {
            continue;
        };
        let index = nvalue.parent().map_or(0, NodeRef::index);
        if index >= lanes_count {
            return Err(ctx.structural(format!(
                "switch value {value} selects subtrack {index} of {lanes_count}"
            )));
        }
        lanes.insert(value, index);
    }

    Ok(TrackSwitch {
        gtype,
        group,
        lanes,
    })
}

fn build_clip<'a>(
    ctx: &BuildCtx<'_, 'a>,
    sources: &HashMap<u32, MediaSource>,
    nsrc: NodeRef<'a>,
) -> Result<Clip> {
    let nplay_at = ctx.require_in(nsrc, "fPlayAt")?;
    let nbegin = ctx.require_in(nsrc, "fBeginTrimOffset")?;
    let nend = ctx.require_in(nsrc, "fEndTrimOffset")?;
    let nduration = ctx.require_in(nsrc, "fSrcDuration")?;
    let nsource = ctx.require_in(nsrc, "sourceID")?;
    let nevent = nsrc.find_name("eventID");

    let timing = ClipTiming {
        play_at: nplay_at.value_f64().unwrap_or_default(),
        begin_trim: nbegin.value_f64().unwrap_or_default(),
        end_trim: nend.value_f64().unwrap_or_default(),
        source_duration: nduration.value_f64().unwrap_or_default(),
    };

    let mut fields: Vec<FieldRef> = [
        Some(nsource),
        nevent,
        Some(nplay_at),
        Some(nbegin),
        Some(nend),
        Some(nduration),
    ]
    .into_iter()
    .flatten()
    .map(|n| FieldRef::Single(n.id()))
    .collect();

    // otherwise has an event id
    let source_id = nsource.value_u32().unwrap_or_default();
    let source = if source_id == 0 {
        None
    } else {
        let source = sources
            .get(&source_id)
            .cloned()
            .ok_or_else(|| ctx.structural(format!("unknown clip source {source_id}")))?;
        fields.push(FieldRef::Single(source.node));
        Some(source)
    };

    Ok(Clip {
        node: nsrc.id(),
        fields,
        sound: Sound {
            node: nsrc.id(),
            source,
            silent: false,
            clip: Some(timing),
        },
        event: nevent.and_then(NodeRef::value_u32).unwrap_or_default(),
    })
}

impl MusicTrackBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        if self.subtracks.is_empty() {
            return Ok(());
        }

        match self.track_type {
            TrackType::Normal => {
                writer.group_single(&bnode.config);
                for subtrack in &self.subtracks {
                    render_clips(bnode, subtrack, session, writer)?;
                }
                writer.group_done();
            }
            // sequence is approximated as random
            TrackType::Random | TrackType::Sequence => {
                writer.group_random(self.subtracks.len(), &bnode.config);
                for subtrack in &self.subtracks {
                    render_clips(bnode, subtrack, session, writer)?;
                }
                writer.group_done();
            }
            TrackType::Switch => {
                let Some(switch) = &self.switch else {
                    return Ok(());
                };
                self.render_switch(bnode, switch, session, writer)?;
            }
        }
        Ok(())
    }

    fn render_switch(
        &self,
        bnode: &RebuiltNode,
        switch: &TrackSwitch,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        if writer.params().is_empty() {
            // no subnodes, just announce every value
            for &value in switch.lanes.keys() {
                writer
                    .paths()
                    .add(GameSync::new(switch.gtype, switch.group, value));
                writer.paths().done();
            }
            return Ok(());
        }

        let Some(value) = writer.params().value(switch.gtype, switch.group) else {
            return Ok(());
        };
        let Some(&index) = switch.lanes.get(&value) else {
            return Ok(());
        };
        let Some(subtrack) = self.subtracks.get(index) else {
            return Ok(());
        };

        writer.info_gamesync(GameSync::new(switch.gtype, switch.group, value));
        writer.group_single(&bnode.config);
        render_clips(bnode, subtrack, session, writer)?;
        writer.group_done();
        Ok(())
    }
}

fn render_clips(
    bnode: &RebuiltNode,
    subtrack: &[Clip],
    session: &mut Rebuilder<'_>,
    writer: &mut dyn PlaylistWriter,
) -> Result<()> {
    let default = NodeConfig::default();

    if subtrack.is_empty() {
        let silence = Sound::silence(bnode.node, true);
        writer.group_layer(1, &default);
        writer.source_sound(&silence, &default);
        writer.group_done();
        return Ok(());
    }

    let tree = session.tree();
    writer.group_layer(subtrack.len(), &default);
    for clip in subtrack {
        if clip.event != 0 {
            // play-at offsets the event like a clip
            let play_at = clip.sound.clip.map_or(0.0, |t| t.play_at);
            writer.group_single(&NodeConfig::with_initial_delay(play_at));
            session.process_next(clip.event, writer)?;
            writer.group_done();
        } else {
            writer.info_next(tree.node(clip.node)?, &clip.fields);
            writer.info_source(&clip.sound);
            writer.info_done();
            writer.source_sound(&clip.sound, &default);
        }
    }
    writer.group_done();
    Ok(())
}
