//! Sound leaves

use super::BuildCtx;
use crate::error::Result;
use crate::output::PlaylistWriter;
use crate::rebuild::node::RebuiltNode;
use crate::rebuild::source::Sound;

#[derive(Debug, Clone)]
pub struct SoundBody {
    pub sound: Sound,
}

pub(super) fn build_sound(ctx: &mut BuildCtx<'_, '_>) -> Result<SoundBody> {
    ctx.build_audio_config()?;
    ctx.read_loop();

    let nitem = ctx.require("AkBankSourceData")?;
    let source = ctx.parse_source(nitem)?;

    if let Some(nstream) = nitem
        .find_name("StreamType")
        .or_else(|| nitem.find_name("uStreamType"))
    {
        ctx.field(nstream);
    }
    if source.file_id != source.source_id {
        let nfile = nitem
            .find_name("uFileID")
            .or_else(|| nitem.find_name("fileID"));
        if let Some(nfile) = nfile {
            ctx.field(nfile);
        }
    }

    Ok(SoundBody {
        sound: Sound {
            node: ctx.node.id(),
            source: Some(source),
            silent: false,
            clip: None,
        },
    })
}

impl SoundBody {
    pub(crate) fn render(&self, bnode: &RebuiltNode, writer: &mut dyn PlaylistWriter) {
        writer.info_source(&self.sound);
        writer.source_sound(&self.sound, &bnode.config);
    }
}
