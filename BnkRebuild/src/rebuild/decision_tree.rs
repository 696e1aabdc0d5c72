//! Multi game-sync decision trees
//!
//! A tree starts at `AkDecisionTree` with a base `pNodes` list holding one
//! `Node`, then per game sync level:
//!
//! - `pNodes` + `Node` xN (`key` + `audioNodeId`) at the last level
//! - `pNodes` + `Node` xN (`key` + nested `pNodes`) at upper levels
//!
//! The `key` is the game sync value (0 = any), the argument list gives each
//! level's type and group.

use serde::Serialize;

use super::kind::NodeKind;
use crate::error::{Error, Result};
use crate::output::{GameSync, GameSyncParams, GameSyncType};
use crate::tree::NodeRef;

/// One leaf of a decision tree: a value per level plus the target object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionPath {
    pub gamesyncs: Vec<GameSync>,
    pub target: u32,
}

/// Flattened decision tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionTree {
    /// (type, group) per level.
    pub args: Vec<(GameSyncType, u32)>,
    /// Leaves in depth-first order.
    pub paths: Vec<DecisionPath>,
}

impl DecisionTree {
    /// Flatten the tree under `ntree`; `node` is the owner holding the arguments.
    ///
    /// # Errors
    /// Fails if the declared depth doesn't match the argument count, or if a
    /// level is missing its key, target or children.
    pub fn build(kind: NodeKind, sid: u32, node: NodeRef<'_>, ntree: NodeRef<'_>) -> Result<Self> {
        let fail = |msg: &str| Error::structural(kind, sid, msg);

        let depth = node
            .find_name("uTreeDepth")
            .and_then(NodeRef::value_i64)
            .ok_or_else(|| fail("missing tree depth"))?;
        let nargs = node.finds_name("AkGameSync");
        if usize::try_from(depth).ok() != Some(nargs.len()) {
            return Err(fail("tree depth and args don't match"));
        }

        let mut args = Vec::with_capacity(nargs.len());
        for narg in nargs {
            // states are implicit in older versions
            let gtype = match narg.find_name("eGroupType").and_then(NodeRef::value_i64) {
                Some(raw) => GameSyncType::from_raw(raw)
                    .ok_or_else(|| fail(&format!("unknown game sync type {raw}")))?,
                None => GameSyncType::State,
            };
            let group = narg
                .find_name("ulGroup")
                .and_then(NodeRef::value_u32)
                .ok_or_else(|| fail("missing game sync group"))?;
            args.push((gtype, group));
        }

        let mut tree = DecisionTree {
            args,
            paths: Vec::new(),
        };

        let nbase = ntree
            .child("pNodes")
            .and_then(|n| n.child("Node"))
            .ok_or_else(|| fail("missing tree root"))?;
        if let Some(nchildren) = nbase.child("pNodes") {
            let mut path = Vec::with_capacity(tree.args.len());
            tree.walk(kind, sid, nchildren, &mut path)?;
        }
        Ok(tree)
    }

    fn walk(
        &mut self,
        kind: NodeKind,
        sid: u32,
        nlist: NodeRef<'_>,
        path: &mut Vec<GameSync>,
    ) -> Result<()> {
        let level = path.len();
        let Some(&(gtype, group)) = self.args.get(level) else {
            return Err(Error::structural(kind, sid, "tree deeper than args"));
        };
        let last = level + 1 == self.args.len();

        for nnode in nlist.children() {
            let key = nnode
                .child("key")
                .and_then(NodeRef::value_u32)
                .ok_or_else(|| Error::structural(kind, sid, "missing tree key"))?;
            path.push(GameSync::new(gtype, group, key));

            if last {
                let target = nnode
                    .child("audioNodeId")
                    .and_then(NodeRef::value_u32)
                    .ok_or_else(|| Error::structural(kind, sid, "missing tree target"))?;
                self.paths.push(DecisionPath {
                    gamesyncs: path.clone(),
                    target,
                });
            } else {
                let nchildren = nnode
                    .child("pNodes")
                    .ok_or_else(|| Error::structural(kind, sid, "missing tree children"))?;
                self.walk(kind, sid, nchildren, path)?;
            }

            path.pop();
        }
        Ok(())
    }

    /// Number of game sync levels.
    pub fn depth(&self) -> usize {
        self.args.len()
    }

    /// First path (in build order) whose every value matches `params` exactly.
    ///
    /// Groups without an assigned value never match. The engine's "best match"
    /// mode (key 0 acting as a fallback) isn't emulated.
    pub fn resolve(&self, params: &GameSyncParams) -> Option<&DecisionPath> {
        self.paths.iter().find(|path| {
            path.gamesyncs
                .iter()
                .all(|gs| params.value(gs.gtype, gs.group) == Some(gs.value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeTree, RawNode};
    use pretty_assertions::assert_eq;

    fn gs_arg(gtype: Option<i64>, group: u32) -> RawNode {
        let mut arg = RawNode::object("AkGameSync");
        if let Some(gtype) = gtype {
            arg = arg.with_child(RawNode::field("eGroupType", "u8", gtype));
        }
        arg.with_child(RawNode::tid("ulGroup", group))
    }

    fn leaf(key: u32, target: u32) -> RawNode {
        RawNode::object("Node")
            .with_child(RawNode::field("key", "u32", key))
            .with_child(RawNode::tid("audioNodeId", target))
    }

    fn branch(key: u32, children: Vec<RawNode>) -> RawNode {
        RawNode::object("Node")
            .with_child(RawNode::field("key", "u32", key))
            .with_child(RawNode::object("pNodes").with_children(children))
    }

    fn dialogue(depth: i64, args: Vec<RawNode>, levels: Vec<RawNode>) -> RawNode {
        RawNode::object("CAkDialogueEvent")
            .with_child(RawNode::sid(1))
            .with_child(RawNode::field("uTreeDepth", "u32", depth))
            .with_child(RawNode::object("Arguments").with_children(args))
            .with_child(
                RawNode::object("AkDecisionTree").with_child(
                    RawNode::object("pNodes")
                        .with_child(branch(0, levels)),
                ),
            )
    }

    fn build(raw: RawNode) -> Result<DecisionTree> {
        let mut tree = NodeTree::new();
        let root = tree.add_bank("test.bnk", raw);
        let node = tree.node(root).unwrap();
        let ntree = node.child("AkDecisionTree").unwrap();
        DecisionTree::build(NodeKind::DialogueEvent, 1, node, ntree)
    }

    fn two_level_tree() -> DecisionTree {
        build(dialogue(
            2,
            vec![gs_arg(Some(0), 100), gs_arg(None, 200)],
            vec![
                branch(1, vec![leaf(10, 501), leaf(20, 502)]),
                branch(2, vec![leaf(10, 503)]),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_paths_in_depth_first_order() {
        let tree = two_level_tree();
        assert_eq!(
            tree.args,
            vec![(GameSyncType::Switch, 100), (GameSyncType::State, 200)]
        );
        let targets: Vec<u32> = tree.paths.iter().map(|p| p.target).collect();
        assert_eq!(targets, vec![501, 502, 503]);
        assert!(tree.paths.iter().all(|p| p.gamesyncs.len() == tree.depth()));
        assert_eq!(
            tree.paths[1].gamesyncs,
            vec![
                GameSync::new(GameSyncType::Switch, 100, 1),
                GameSync::new(GameSyncType::State, 200, 20),
            ]
        );
    }

    #[test]
    fn test_depth_mismatch_fails_before_paths() {
        let err = build(dialogue(
            3,
            vec![gs_arg(Some(0), 100), gs_arg(Some(1), 200)],
            vec![branch(1, vec![leaf(10, 501)])],
        ))
        .unwrap_err();
        assert!(matches!(err, Error::StructuralMismatch { sid: 1, .. }));
        assert!(err.to_string().contains("tree depth"));
    }

    #[test]
    fn test_resolve_exact_match() {
        let tree = two_level_tree();
        let params = GameSyncParams::from_combo(&[
            GameSync::new(GameSyncType::Switch, 100, 1),
            GameSync::new(GameSyncType::State, 200, 20),
        ]);
        assert_eq!(tree.resolve(&params).map(|p| p.target), Some(502));
    }

    #[test]
    fn test_resolve_missing_assignment_never_matches() {
        let tree = two_level_tree();
        let params =
            GameSyncParams::from_combo(&[GameSync::new(GameSyncType::Switch, 100, 1)]);
        assert!(tree.resolve(&params).is_none());

        // same group, wrong type
        let params = GameSyncParams::from_combo(&[
            GameSync::new(GameSyncType::Switch, 100, 2),
            GameSync::new(GameSyncType::Switch, 200, 10),
        ]);
        assert!(tree.resolve(&params).is_none());
    }

    #[test]
    fn test_key_zero_is_not_a_wildcard() {
        let tree = build(dialogue(
            1,
            vec![gs_arg(Some(0), 100)],
            vec![leaf(0, 600), leaf(5, 601)],
        ))
        .unwrap();
        let params = GameSyncParams::from_combo(&[GameSync::new(GameSyncType::Switch, 100, 7)]);
        assert!(tree.resolve(&params).is_none());
        let params = GameSyncParams::from_combo(&[GameSync::new(GameSyncType::Switch, 100, 0)]);
        assert_eq!(tree.resolve(&params).map(|p| p.target), Some(600));
    }

    #[test]
    fn test_missing_target_is_structural() {
        let bad_leaf = RawNode::object("Node").with_child(RawNode::field("key", "u32", 1));
        let err = build(dialogue(1, vec![gs_arg(Some(0), 100)], vec![bad_leaf])).unwrap_err();
        assert!(err.to_string().contains("missing tree target"));
    }
}
