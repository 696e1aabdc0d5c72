use std::rc::Rc;

use bnkrebuild::prelude::*;
use pretty_assertions::assert_eq;

// ==================== Fixtures ====================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn bank(objects: Vec<RawNode>, media: &[u32]) -> NodeTree {
    let headers = media.iter().map(|&id| {
        RawNode::object("MediaHeader")
            .with_child(RawNode::tid("id", id))
            .with_child(RawNode::field("uSize", "u32", 1024))
    });
    let mut tree = NodeTree::new();
    tree.add_bank(
        "Test.bnk",
        RawNode::object("root")
            .with_child(RawNode::object("DataIndex").with_children(headers))
            .with_child(RawNode::object("HircChunk").with_children(objects)),
    );
    tree
}

fn sound(sid: u32, source: u32) -> RawNode {
    RawNode::object("CAkSound")
        .with_child(RawNode::sid(sid))
        .with_child(
            RawNode::object("AkBankSourceData")
                .with_child(RawNode::field("ulPluginID", "u32", 262145))
                .with_child(RawNode::field("StreamType", "u8", 0))
                .with_child(
                    RawNode::object("AkMediaInformation")
                        .with_child(RawNode::tid("sourceID", source))
                        .with_child(RawNode::field("uInMemoryMediaSize", "u32", 1024)),
                ),
        )
}

fn event(sid: u32, actions: &[u32]) -> RawNode {
    RawNode::object("CAkEvent")
        .with_child(RawNode::sid(sid))
        .with_child(
            RawNode::object("actions")
                .with_children(actions.iter().map(|&tid| RawNode::tid("ulActionID", tid))),
        )
}

fn action(name: &str, sid: u32, target: u32) -> RawNode {
    RawNode::object(name)
        .with_child(RawNode::sid(sid))
        .with_child(RawNode::tid("idExt", target))
}

fn children(tids: &[u32]) -> RawNode {
    RawNode::object("Children")
        .with_children(tids.iter().map(|&tid| RawNode::tid("ulChildID", tid)))
}

fn layer(sid: u32, tids: &[u32]) -> RawNode {
    RawNode::object("CAkLayerCntr")
        .with_child(RawNode::sid(sid))
        .with_child(children(tids))
}

fn switch(sid: u32, group: u32, values: &[(u32, &[u32])]) -> RawNode {
    let packages = values.iter().map(|&(value, targets)| {
        RawNode::object("CAkSwitchPackage")
            .with_child(RawNode::tid("ulSwitchID", value))
            .with_child(
                RawNode::object("NodeList")
                    .with_children(targets.iter().map(|&tid| RawNode::tid("NodeID", tid))),
            )
    });
    RawNode::object("CAkSwitchCntr")
        .with_child(RawNode::sid(sid))
        .with_child(RawNode::field("eGroupType", "u8", 0))
        .with_child(RawNode::tid("ulGroupID", group))
        .with_child(RawNode::object("SwitchList").with_children(packages))
}

fn tree_node(key: u32, inner: RawNode) -> RawNode {
    RawNode::object("Node")
        .with_child(RawNode::field("key", "u32", key))
        .with_child(inner)
}

fn leaf(key: u32, target: u32) -> RawNode {
    tree_node(key, RawNode::tid("audioNodeId", target))
}

fn branch(key: u32, nodes: Vec<RawNode>) -> RawNode {
    tree_node(key, RawNode::object("pNodes").with_children(nodes))
}

fn dialogue(sid: u32, depth: u32, groups: &[u32], nodes: Vec<RawNode>) -> RawNode {
    let args = groups.iter().map(|&group| {
        RawNode::object("AkGameSync")
            .with_child(RawNode::tid("ulGroup", group))
            .with_child(RawNode::field("eGroupType", "u8", 1))
    });
    RawNode::object("CAkDialogueEvent")
        .with_child(RawNode::sid(sid))
        .with_child(RawNode::field("uTreeDepth", "u32", depth))
        .with_child(RawNode::object("Arguments").with_children(args))
        .with_child(
            RawNode::object("AkDecisionTree")
                .with_child(RawNode::object("pNodes").with_child(branch(0, nodes))),
        )
}

fn state(sid: u32, volume: f64) -> RawNode {
    RawNode::object("CAkState").with_child(RawNode::sid(sid)).with_child(
        RawNode::object("StateInitialValues").with_child(
            RawNode::object("AkPropBundle<float,unsigned short>").with_child(
                RawNode::object("AkPropBundle")
                    .with_child(RawNode::field("pID", "u16", 6).with_attr("valuefmt", "0x0006 [Volume]"))
                    .with_child(RawNode::field("pValue", "f32", volume)),
            ),
        ),
    )
}

fn marker(id: u32, position: f64) -> RawNode {
    RawNode::object("AkMusicMarkerWwise")
        .with_child(RawNode::field("id", "u32", id))
        .with_child(RawNode::field("fPosition", "f64", position))
}

fn segment(sid: u32, tracks: &[u32], state_id: Option<u32>) -> RawNode {
    let mut node = RawNode::object("CAkMusicSegment").with_child(RawNode::sid(sid));
    if let Some(state_id) = state_id {
        node = node.with_child(
            RawNode::object("NodeBaseParams").with_child(
                RawNode::object("StateChunk")
                    .with_child(RawNode::tid("ulStateGroupID", 500))
                    .with_child(RawNode::tid("ulStateInstanceID", state_id)),
            ),
        );
    }
    node.with_child(children(tracks))
        .with_child(RawNode::field("fDuration", "f64", 2000.0))
        .with_child(
            RawNode::object("pArrayMarkers")
                .with_child(marker(43573010, 0.0))
                .with_child(marker(1539036744, 2000.0)),
        )
}

fn track(sid: u32, source: u32) -> RawNode {
    track_lanes(sid, source, 0, 1)
}

fn track_lanes(sid: u32, source: u32, track_type: i64, lanes: u32) -> RawNode {
    RawNode::object("CAkMusicTrack")
        .with_child(RawNode::sid(sid))
        .with_child(
            RawNode::object("pSource").with_child(
                RawNode::object("AkBankSourceData")
                    .with_child(RawNode::field("ulPluginID", "u32", 262145))
                    .with_child(RawNode::field("StreamType", "u8", 2))
                    .with_child(RawNode::tid("sourceID", source)),
            ),
        )
        .with_child(
            RawNode::object("pPlaylist").with_child(
                RawNode::object("AkTrackSrcInfo")
                    .with_child(RawNode::field("trackID", "u32", 0))
                    .with_child(RawNode::tid("sourceID", source))
                    .with_child(RawNode::tid("eventID", 0))
                    .with_child(RawNode::field("fPlayAt", "f64", 0.0))
                    .with_child(RawNode::field("fBeginTrimOffset", "f64", 0.0))
                    .with_child(RawNode::field("fEndTrimOffset", "f64", 0.0))
                    .with_child(RawNode::field("fSrcDuration", "f64", 2000.0)),
            ),
        )
        .with_child(RawNode::field("numSubTrack", "u32", lanes))
        .with_child(RawNode::field("eTrackType", "u8", track_type))
}

fn music_switch(sid: u32, group: u32, assocs: &[(u32, u32)], transition: u32, stinger: (u32, u32)) -> RawNode {
    let items = assocs.iter().map(|&(value, target)| {
        RawNode::object("AkMusicSwitchAssoc")
            .with_child(RawNode::tid("switchID", value))
            .with_child(RawNode::tid("nodeID", target))
    });
    RawNode::object("CAkMusicSwitchCntr")
        .with_child(RawNode::sid(sid))
        .with_child(
            RawNode::object("pStingers").with_child(
                RawNode::object("CAkStinger")
                    .with_child(RawNode::tid("TriggerID", stinger.0))
                    .with_child(RawNode::tid("SegmentID", stinger.1)),
            ),
        )
        .with_child(
            RawNode::object("pRules").with_child(
                RawNode::object("AkMusicTransitionRule").with_child(
                    RawNode::object("AkMusicTransitionObject")
                        .with_child(RawNode::tid("segmentID", transition)),
                ),
            ),
        )
        .with_child(RawNode::field("eGroupType", "u8", 0))
        .with_child(RawNode::tid("ulGroupID", group))
        .with_child(RawNode::object("pAssocs").with_children(items))
}

fn playlist_item(segment: u32, rs_type: i64, items: Vec<RawNode>) -> RawNode {
    RawNode::object("AkMusicRanSeqPlaylistItem")
        .with_child(RawNode::tid("SegmentID", segment))
        .with_child(RawNode::field("NumChildren", "u32", items.len() as u32))
        .with_child(RawNode::field("eRSType", "u32", rs_type))
        .with_child(RawNode::field("Loop", "u16", 1))
        .with_child(RawNode::object("pPlayList").with_children(items))
}

fn render(session: &mut Rebuilder<'_>, sid: u32, params: GameSyncParams) -> (Recording, PathCollector) {
    let node = session.get_node_ref(sid).unwrap().id();
    let mut recorder = PlaylistRecorder::new(params);
    session.begin_render(&mut recorder, node).unwrap();
    recorder.finish()
}

fn render_err(session: &mut Rebuilder<'_>, sid: u32) -> Error {
    let node = session.get_node_ref(sid).unwrap().id();
    let mut recorder = PlaylistRecorder::new(GameSyncParams::new());
    session.begin_render(&mut recorder, node).unwrap_err()
}

fn source_ids(recording: &Recording) -> Vec<u32> {
    recording.sounds().iter().filter_map(|s| s.source_id()).collect()
}

// ==================== Scenarios ====================

#[test]
fn test_event_layers_play_actions() {
    let tree = bank(
        vec![
            event(1, &[2, 3]),
            action("CAkActionPlay", 2, 4),
            action("CAkActionPlay", 3, 5),
            sound(4, 1004),
            sound(5, 1005),
        ],
        &[1004, 1005],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();
    let (recording, paths) = render(&mut session, 1, GameSyncParams::new());

    assert!(paths.is_empty());
    assert_eq!(recording.items.len(), 1);
    let layer = &recording.items[0];
    assert_eq!(layer.kind(), Some(GroupKind::Layer));
    assert_eq!(layer.children().len(), 2);
    for single in layer.children() {
        assert_eq!(single.kind(), Some(GroupKind::Single));
        assert_eq!(single.children().len(), 1);
        assert_eq!(single.children()[0].kind(), None);
    }
    assert_eq!(source_ids(&recording), vec![1004, 1005]);

    let media = recording.sounds()[1].source.as_ref().and_then(|s| s.media.clone()).unwrap();
    assert_eq!(media.bank, "Test.bnk");
    assert_eq!(media.index, 1);

    assert_eq!(session.diagnostics().summary(), Default::default());
}

#[test]
fn test_dialogue_event_paths() {
    let tree = bank(
        vec![
            dialogue(
                1,
                2,
                &[100, 200],
                vec![
                    branch(1, vec![leaf(10, 11), leaf(20, 12)]),
                    branch(2, vec![leaf(10, 13)]),
                ],
            ),
            sound(11, 1011),
            sound(12, 1012),
            sound(13, 1013),
        ],
        &[],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    // no context: one alternative per leaf
    let (_, paths) = render(&mut session, 1, GameSyncParams::new());
    assert_eq!(paths.len(), 3);
    let second = paths.combinations().nth(1).unwrap().to_vec();
    assert_eq!(
        second,
        vec![
            GameSync::new(GameSyncType::State, 100, 1),
            GameSync::new(GameSyncType::State, 200, 20),
        ]
    );

    // the second path only
    let (recording, paths) = render(&mut session, 1, GameSyncParams::from_combo(&second));
    assert!(paths.is_empty());
    assert_eq!(source_ids(&recording), vec![1012]);
    assert_eq!(recording.gamesyncs, second);

    // partial context never matches
    let partial = GameSyncParams::from_combo(&second[..1]);
    let (recording, _) = render(&mut session, 1, partial);
    assert!(recording.sounds().is_empty());
}

#[test]
fn test_switch_resolves_value_to_layer() {
    let tree = bank(
        vec![
            switch(1, 300, &[(10, &[21, 22]), (20, &[23])]),
            sound(21, 1021),
            sound(22, 1022),
            sound(23, 1023),
        ],
        &[],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let params = GameSyncParams::from_combo(&[GameSync::new(GameSyncType::Switch, 300, 10)]);
    let (recording, _) = render(&mut session, 1, params);

    assert_eq!(recording.items.len(), 1);
    assert_eq!(recording.items[0].kind(), Some(GroupKind::Layer));
    assert_eq!(source_ids(&recording), vec![1021, 1022]);

    let (_, paths) = render(&mut session, 1, GameSyncParams::new());
    assert_eq!(paths.len(), 2);
}

#[test]
fn test_trigger_action_renders_nothing() {
    let tree = bank(vec![action("CAkActionTrigger", 1, 77)], &[]);
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let (recording, paths) = render(&mut session, 1, GameSyncParams::new());
    assert!(recording.is_empty());
    assert!(paths.is_empty());
    assert_eq!(session.diagnostics().summary(), Default::default());
}

// ==================== Session ====================

#[test]
fn test_same_sid_returns_cached_node() {
    let tree = bank(vec![sound(4, 1004)], &[1004]);
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let first = session.get_by_sid(4).unwrap().unwrap();
    let second = session.get_by_sid(4).unwrap().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(session.builds(), 1);
    assert_eq!(session.cached(), 1);
}

#[test]
fn test_missing_reference_is_recovered() {
    init_tracing();
    let tree = bank(vec![event(1, &[2]), action("CAkActionPlay", 2, 999)], &[]);
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let (recording, _) = render(&mut session, 1, GameSyncParams::new());
    assert!(recording.sounds().is_empty());
    assert_eq!(session.diagnostics().summary().missing_nodes, 1);
}

#[test]
fn test_missing_media_is_recorded() {
    let tree = bank(vec![sound(4, 1004)], &[]);
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let (recording, _) = render(&mut session, 4, GameSyncParams::new());
    assert_eq!(source_ids(&recording), vec![1004]);
    assert_eq!(session.diagnostics().summary().missing_media, 1);
    assert!(recording.info.iter().any(|line| line.contains("not found")));
}

#[test]
fn test_cycle_fails_with_cyclic_reference() {
    let tree = bank(vec![layer(1, &[2]), layer(2, &[1])], &[]);
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let err = render_err(&mut session, 1);
    assert_eq!(err.failing_sid(), Some(1));
    assert!(err.to_string().contains("cyclic"));
}

#[test]
fn test_depth_mismatch_is_structural() {
    let tree = bank(
        vec![dialogue(1, 2, &[100], vec![leaf(1, 11)]), sound(11, 1011)],
        &[],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let err = render_err(&mut session, 1);
    assert!(matches!(err, Error::StructuralMismatch { sid: 1, .. }));
}

#[test]
fn test_play_and_continue_is_unimplemented() {
    let tree = bank(vec![action("CAkActionPlayAndContinue", 1, 2)], &[]);
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let err = render_err(&mut session, 1);
    assert!(matches!(err, Error::UnimplementedFeature { .. }));
}

#[test]
fn test_silence_threshold() {
    let tree = bank(
        vec![
            state(90, -96.0),
            state(91, -95.0),
            segment(1, &[], Some(90)),
            segment(2, &[], Some(91)),
        ],
        &[],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let (silenced, _) = render(&mut session, 1, GameSyncParams::new());
    assert!(silenced.items[0].is_silenced());

    let (audible, _) = render(&mut session, 2, GameSyncParams::new());
    assert!(!audible.items[0].is_silenced());
}

#[test]
fn test_empty_segment_plays_silence() {
    let tree = bank(vec![segment(1, &[], None)], &[]);
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let (recording, _) = render(&mut session, 1, GameSyncParams::new());
    let sounds = recording.sounds();
    assert_eq!(sounds.len(), 1);
    assert!(sounds[0].silent);
    assert_eq!(recording.items[0].config().duration, Some(2000.0));
    assert_eq!(recording.items[0].config().exit, Some(2000.0));
}

#[test]
fn test_segment_without_markers_is_structural() {
    let tree = bank(
        vec![
            RawNode::object("CAkMusicSegment")
                .with_child(RawNode::sid(1))
                .with_child(RawNode::field("fDuration", "f64", 1.0))
                .with_child(RawNode::object("pArrayMarkers").with_child(marker(7, 0.0))),
        ],
        &[],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let err = render_err(&mut session, 1);
    assert!(matches!(err, Error::StructuralMismatch { sid: 1, .. }));
}

// ==================== Music ====================

fn music_bank() -> NodeTree {
    bank(
        vec![
            event(50, &[51]),
            action("CAkActionPlay", 51, 40),
            music_switch(40, 400, &[(1, 41)], 42, (77, 43)),
            segment(41, &[44], None),
            segment(42, &[45], None),
            segment(43, &[46], None),
            track(44, 2044),
            track(45, 2045),
            track(46, 2046),
        ],
        &[],
    )
}

#[test]
fn test_transition_segment_is_not_marked_used() {
    let tree = music_bank();
    let mut session = Rebuilder::with_banks(&tree).unwrap();
    render(&mut session, 50, GameSyncParams::new());

    let transition = session.get_node_ref(42).unwrap().id();
    assert_eq!(session.transition_segments(), vec![transition]);
    assert!(!session.references().is_used(transition));

    let unused = session.unused_nodes(NodeKind::MusicSegment);
    assert!(unused.contains(&transition));
    assert!(!unused.contains(&session.get_node_ref(41).unwrap().id()));
}

#[test]
fn test_music_switch_announces_stingers() {
    let tree = music_bank();
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let (_, paths) = render(&mut session, 50, GameSyncParams::new());
    assert_eq!(paths.len(), 1);
    assert_eq!(paths.stingers().len(), 1);
    assert_eq!(paths.stingers()[0].trigger_id, 77);
    assert_eq!(paths.stingers()[0].segment_id, 43);
    assert_eq!(session.stingers_for(77).len(), 1);
}

#[test]
fn test_music_track_clip_timing() {
    let tree = music_bank();
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let params = GameSyncParams::from_combo(&[GameSync::new(GameSyncType::Switch, 400, 1)]);
    let (recording, _) = render(&mut session, 50, params);

    let sounds = recording.sounds();
    assert_eq!(sounds.len(), 1);
    assert_eq!(sounds[0].source_id(), Some(2044));
    assert_eq!(sounds[0].clip.map(|c| c.source_duration), Some(2000.0));
    // streamed, so not looked up
    assert_eq!(session.diagnostics().summary().missing_media, 0);
}

#[test]
fn test_subtrack_count_needs_clips() {
    init_tracing();
    let tree = bank(
        vec![track_lanes(1, 1001, 1, 50_000_000), track_lanes(2, 1002, 0, 2)],
        &[],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let err = render_err(&mut session, 1);
    assert!(matches!(err, Error::StructuralMismatch { sid: 1, .. }));
    let err = render_err(&mut session, 2);
    assert!(matches!(err, Error::StructuralMismatch { sid: 2, .. }));
}

#[test]
fn test_playlist_approximation_is_counted() {
    let tree = bank(
        vec![
            RawNode::object("CAkMusicRanSeqCntr")
                .with_child(RawNode::sid(60))
                .with_child(
                    RawNode::object("pPlayList").with_child(playlist_item(
                        0,
                        1,
                        vec![playlist_item(41, -1, vec![]), playlist_item(42, -1, vec![])],
                    )),
                ),
            segment(41, &[], None),
            segment(42, &[], None),
        ],
        &[],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let (recording, _) = render(&mut session, 60, GameSyncParams::new());
    render(&mut session, 60, GameSyncParams::new());

    let root = &recording.items[0];
    assert_eq!(root.kind(), Some(GroupKind::Single));
    let steps = &root.children()[0];
    assert_eq!(steps.kind(), Some(GroupKind::Random));
    assert_eq!(steps.children().len(), 2);
    assert_eq!(steps.config().loop_count, Some(1));

    // counted once per build, not per render
    assert_eq!(session.diagnostics().summary().approximations, 1);
}

#[test]
fn test_empty_playlist_group_keeps_its_mode() {
    let empty_group = RawNode::object("AkMusicRanSeqPlaylistItem")
        .with_child(RawNode::field("NumChildren", "u32", 0))
        .with_child(RawNode::field("eRSType", "u32", 3))
        .with_child(RawNode::field("Loop", "u16", 1))
        .with_child(RawNode::object("pPlayList"));
    let tree = bank(
        vec![
            RawNode::object("CAkMusicRanSeqCntr")
                .with_child(RawNode::sid(60))
                .with_child(
                    RawNode::object("pPlayList")
                        .with_child(empty_group)
                        .with_child(playlist_item(41, 0, vec![])),
                ),
            segment(41, &[], None),
        ],
        &[],
    );
    let mut session = Rebuilder::with_banks(&tree).unwrap();

    let (recording, _) = render(&mut session, 60, GameSyncParams::new());
    let items = recording.items[0].children();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].kind(), Some(GroupKind::Random));
    assert!(items[0].children().is_empty());
    // an item with a segment id and no sub-items plays the segment
    assert_eq!(items[1].kind(), Some(GroupKind::Single));
    assert_eq!(items[1].sounds().len(), 1);
}

// ==================== Generator ====================

#[test]
fn test_generator_renders_out_of_band_targets() {
    let tree = music_bank();
    let report = Generator::new(&tree, GeneratorOptions::default()).run().unwrap();

    assert!(!report.has_failures());
    assert_eq!(report.playlists_for(50).count(), 1);
    // transition segment rendered on its own
    assert_eq!(report.playlists_for(42).count(), 1);

    let stingers: Vec<&Recording> = report
        .playlists
        .iter()
        .filter(|r| r.stinger.is_some())
        .collect();
    assert_eq!(stingers.len(), 1);
    assert_eq!(stingers[0].sid, Some(77));
    assert_eq!(source_ids(stingers[0]), vec![2046]);

    // everything got reached by some pass
    assert!(!report.unused.contains_key(&NodeKind::MusicSegment));
}

#[test]
fn test_generator_isolates_failing_roots() {
    init_tracing();
    let tree = bank(
        vec![
            dialogue(70, 2, &[100], vec![leaf(1, 11)]),
            event(1, &[2]),
            action("CAkActionPlay", 2, 11),
            sound(11, 1011),
        ],
        &[1011],
    );
    let report = Generator::new(&tree, GeneratorOptions::default()).run().unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].sid, Some(70));
    assert_eq!(report.failures[0].failing_sid, Some(70));
    assert_eq!(report.playlists_for(1).count(), 1);
}

#[test]
fn test_generator_report_serializes() {
    let tree = music_bank();
    let report = Generator::new(&tree, GeneratorOptions::default()).run().unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["playlists"].as_array().is_some_and(|p| !p.is_empty()));
    assert_eq!(json["diagnostics"]["missing_nodes"], 0);
}
