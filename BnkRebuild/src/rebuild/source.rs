//! Playable sources: media descriptors, clips and silence

use serde::Serialize;

use super::builders::BuildCtx;
use crate::error::Result;
use crate::index::MediaLocation;
use crate::tree::{NodeId, NodeRef};

/// `StreamType` of media that lives only in external stream files.
const STREAM_TYPE_STREAMED: u32 = 2;

/// Media descriptor parsed from `AkBankSourceData`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSource {
    /// Descriptor node.
    pub node: NodeId,
    /// Media id.
    pub source_id: u32,
    /// File id (older banks may differ from the media id).
    pub file_id: u32,
    /// Codec plugin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<u32>,
    /// 0 = in bank, 1 = prefetched, 2 = streamed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<u32>,
    /// Size of the in-bank data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u32>,
    /// Where the in-bank data was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaLocation>,
}

impl MediaSource {
    /// Whether data should be found in a loaded bank.
    pub fn is_in_bank(&self) -> bool {
        self.stream_type != Some(STREAM_TYPE_STREAMED)
    }
}

/// Clip placement inside a music track, all in ms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClipTiming {
    pub play_at: f64,
    pub begin_trim: f64,
    pub end_trim: f64,
    pub source_duration: f64,
}

/// A leaf emitted to the writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sound {
    /// Node the sound comes from.
    pub node: NodeId,
    /// Media to play; `None` for silence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<MediaSource>,
    /// Placeholder silence.
    pub silent: bool,
    /// Music clip timing, for track clips and clip silences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipTiming>,
}

impl Sound {
    /// Silence placeholder for empty segments and subtracks.
    #[must_use]
    pub fn silence(node: NodeId, clip: bool) -> Self {
        Self {
            node,
            source: None,
            silent: true,
            clip: clip.then(ClipTiming::default),
        }
    }

    /// Id of the media played, if any.
    pub fn source_id(&self) -> Option<u32> {
        self.source.as_ref().map(|s| s.source_id)
    }
}

impl<'a> BuildCtx<'_, 'a> {
    /// Parse an `AkBankSourceData` and locate its in-bank media.
    ///
    /// # Errors
    /// Fails if the descriptor has no media id.
    pub(crate) fn parse_source(&mut self, nitem: NodeRef<'a>) -> Result<MediaSource> {
        let source_id = nitem
            .find_name("sourceID")
            .and_then(NodeRef::value_u32)
            .ok_or_else(|| self.structural("source without sourceID"))?;
        let file_id = nitem
            .find_name("uFileID")
            .or_else(|| nitem.find_name("fileID"))
            .and_then(NodeRef::value_u32)
            .unwrap_or(source_id);
        let stream_type = nitem
            .find_name("StreamType")
            .or_else(|| nitem.find_name("uStreamType"))
            .and_then(NodeRef::value_u32);

        let mut source = MediaSource {
            node: nitem.id(),
            source_id,
            file_id,
            plugin_id: nitem.find_name("ulPluginID").and_then(NodeRef::value_u32),
            stream_type,
            memory_size: nitem
                .find_name("uInMemoryMediaSize")
                .and_then(NodeRef::value_u32),
            media: None,
        };

        if source.is_in_bank() {
            source.media = self.session.get_media_index(nitem.bank_name(), source_id);
        }
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_placeholder() {
        let node = crate::tree::NodeTree::new().add_bank("a.bnk", crate::tree::RawNode::object("x"));
        let sound = Sound::silence(node, true);
        assert!(sound.silent);
        assert_eq!(sound.clip, Some(ClipTiming::default()));
        assert_eq!(sound.source_id(), None);
        assert!(Sound::silence(node, false).clip.is_none());
    }
}
