//! Node configuration and property extraction
//!
//! Three property-bundle bindings are known across bank versions, tried in
//! order. Older banks have no bundle and use fixed named fields instead.

use serde::Serialize;

use super::builders::BuildCtx;
use super::node::FieldRef;
use crate::error::Result;
use crate::tree::NodeRef;

/// Property bundle bindings, newest first.
const PROPERTY_BUNDLES: [&str; 3] = [
    "AkPropBundle<AkPropValue,unsigned char>",
    "AkPropBundle<float,unsigned short>",
    "AkPropBundle<float>",
];

const RANGED_BUNDLE: &str = "AkPropBundle<RANGED_MODIFIERS<AkPropValue>>";

/// Properties that change playback but aren't applied.
const WATCHED_PROPS: [&str; 7] = [
    "LoopStart",
    "LoopEnd",
    "FadeInTime",
    "FadeOutTime",
    "LoopCrossfadeDuration",
    "CrossfadeUpCurve",
    "CrossfadeDownCurve",
];

/// Fixed audio fields of older banks (min/max are randomizer ranges).
const LEGACY_AUDIO_PROPS: [&str; 12] = [
    "Volume",
    "Volume.min",
    "Volume.max",
    "LFE",
    "LFE.min",
    "LFE.max",
    "Pitch",
    "Pitch.min",
    "Pitch.max",
    "LPF",
    "LPF.min",
    "LPF.max",
];

/// Fixed action fields of older banks.
const LEGACY_ACTION_PROPS: [&str; 6] = [
    "tDelay",
    "tDelayMin",
    "tDelayMax",
    "TTime",
    "TTimeMin",
    "TTimeMax",
];

/// Volume at or below this is inaudible.
pub const SILENCE_VOLUME: f64 = -96.0;

/// Playback settings of a rebuilt node. Unset fields keep engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeConfig {
    /// Volume in decibels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Loop count (0 = infinite).
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<i64>,
    /// Delay in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    /// Initial delay in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_delay: Option<f64>,
    /// Duration in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Entry marker position in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<f64>,
    /// Exit marker position in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<f64>,
}

impl NodeConfig {
    /// Whether nothing was set.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Config with only an initial delay, used to offset clips and events.
    #[must_use]
    pub fn with_initial_delay(initial_delay: f64) -> Self {
        Self {
            initial_delay: Some(initial_delay),
            ..Self::default()
        }
    }
}

/// Name between brackets in a property label, e.g. `"0x06 [Volume]"` → `Volume`.
pub(crate) fn property_name(label: &str) -> Option<&str> {
    let start = label.find('[')? + 1;
    let end = start + label[start..].find(']')?;
    Some(&label[start..end])
}

/// Label of a property key: its formatted value, else the raw id.
fn property_label(nkey: NodeRef<'_>) -> String {
    nkey.attr("valuefmt").map_or_else(
        || nkey.value().map(ToString::to_string).unwrap_or_default(),
        str::to_string,
    )
}

impl<'a> BuildCtx<'_, 'a> {
    /// Parse property bundles under `ninit`. Returns `true` if any bundle exists.
    pub(crate) fn parse_props(&mut self, ninit: NodeRef<'a>) -> bool {
        let nvalues = PROPERTY_BUNDLES.iter().find_map(|name| ninit.find_name(name));
        if let Some(nvalues) = nvalues {
            for nprop in nvalues.finds_name("AkPropBundle") {
                let (Some(nkey), Some(nval)) = (nprop.find_name("pID"), nprop.find_name("pValue"))
                else {
                    continue;
                };
                self.apply_prop(nkey, nval);
            }
        }

        // ranged values are informational only
        let nranges = ninit.find_name(RANGED_BUNDLE);
        if let Some(nranges) = nranges {
            for nprop in nranges.finds_name("AkPropBundle") {
                let Some(nkey) = nprop.find_name("pID") else {
                    continue;
                };
                self.fields.push(FieldRef::Ranged {
                    key: nkey.id(),
                    min: nprop.find_name("min").map(NodeRef::id),
                    max: nprop.find_name("max").map(NodeRef::id),
                });
            }
        }

        nvalues.is_some() || nranges.is_some()
    }

    fn apply_prop(&mut self, nkey: NodeRef<'a>, nval: NodeRef<'a>) {
        let label = property_label(nkey);
        let value = nval.value_f64();

        match property_name(&label) {
            Some("Loop") => self.config.loop_count = nval.value_i64(),
            Some("Volume") => self.config.volume = value,
            Some("DelayTime") => self.config.delay = value,
            // seconds to ms
            Some("InitialDelay") => self.config.initial_delay = value.map(|v| v * 1000.0),
            Some(name) if WATCHED_PROPS.contains(&name) => {
                tracing::debug!("Unhandled property {label} in {} {}", self.kind, self.sid);
                self.session.diagnostics_mut().record_unknown_prop(&label);
            }
            _ => {}
        }

        self.fields.push(FieldRef::Keyed {
            key: nkey.id(),
            value: nval.id(),
        });
    }

    /// Delay settings of actions.
    pub(crate) fn build_action_config(&mut self) {
        let Some(ninit) = self.node.find_name("ActionInitialValues") else {
            return;
        };
        if self.parse_props(ninit) {
            return;
        }

        for prop in LEGACY_ACTION_PROPS {
            let Some(nprop) = ninit.find_name(prop) else {
                continue;
            };
            let value = nprop.value_f64().unwrap_or_default();
            if value == 0.0 {
                continue;
            }
            if matches!(prop, "tDelay" | "tDelayMin") {
                self.config.initial_delay = Some(value);
            }
            self.fields.push(FieldRef::Single(nprop.id()));
        }
    }

    /// Volume/loop settings of audio objects, plus silence detection.
    ///
    /// # Errors
    /// Propagates failures building a referenced state.
    pub(crate) fn build_audio_config(&mut self) -> Result<()> {
        if self.kind.checks_silence() {
            self.check_silences()?;
        }

        let ninit = self
            .node
            .find_name("NodeInitialParams")
            .or_else(|| self.node.find_name("StateInitialValues"));
        let Some(ninit) = ninit else {
            return Ok(());
        };
        if self.parse_props(ninit) {
            return Ok(());
        }

        for prop in LEGACY_AUDIO_PROPS {
            let Some(nprop) = ninit.find_name(prop) else {
                continue;
            };
            let value = nprop.value_f64().unwrap_or_default();
            if value == 0.0 {
                continue;
            }
            if prop == "Volume" {
                self.config.volume = Some(value);
            }
            self.fields.push(FieldRef::Single(nprop.id()));
        }
        Ok(())
    }

    /// States and RTPCs that mute this node (used to crossfade layered music).
    fn check_silences(&mut self) -> Result<()> {
        let Some(nbase) = self.node.find_name("NodeBaseParams") else {
            return Ok(());
        };

        if let Some(nchunk) = nbase.find_name("StateChunk") {
            for nstateid in nchunk.finds_name("ulStateInstanceID") {
                let Some(tid) = nstateid.value_u32() else {
                    continue;
                };
                let Some(state) = self.session.get_by_sid(tid)? else {
                    continue;
                };
                if state.config.volume.is_some_and(|v| v <= SILENCE_VOLUME) {
                    tracing::debug!("State {tid} silences {} {}", self.kind, self.sid);
                    self.silenced = true;
                    if let Some(ngroup) = nchunk.find_name("ulStateGroupID") {
                        self.fields.push(FieldRef::Single(ngroup.id()));
                    }
                }
            }
        }

        if let Some(nrtpc) = nbase.find_name("RTPC") {
            for nparam in nrtpc.finds_name("ParamID") {
                // param 0 is volume
                if nparam.value_i64() != Some(0) {
                    continue;
                }
                tracing::debug!("RTPC silences {} {}", self.kind, self.sid);
                self.silenced = true;
                let nid = nparam.parent().and_then(|p| p.find_name("RTPCID"));
                if let Some(nid) = nid {
                    self.fields.push(FieldRef::Single(nid.id()));
                }
            }
        }
        Ok(())
    }
}
