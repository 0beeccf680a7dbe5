//! Reusable depth-first walkers over the nonterminal-reachability graph,
//! where grammar `A` has an arc to `B` iff `B` is in `A`'s nonterminal set.
//!
//! Implemented with an explicit work stack rather than native recursion:
//! the original C++ implementation these are grounded on
//! (`original_source/include/cfg-parser/grammar.hpp`'s `traverser` class)
//! recurses, but an explicit stack is the corpus's own idiom for worklist
//! graph algorithms (see `cfg-grammar::rhs_closure`) and avoids bounding
//! grammar depth by the call stack.

use std::collections::HashSet;

use crate::grammar::GrammarArena;
use crate::symbol::GrammarId;

/// Visits every nonterminal reachable from `root` (root included) exactly
/// once, visiting a node before any of its not-yet-visited successors.
pub fn dfs_preorder(arena: &GrammarArena, root: GrammarId, mut visit: impl FnMut(GrammarId)) {
    let mut visited = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        visit(id);
        let mut successors: Vec<GrammarId> = arena.nonterminals(id).iter().copied().collect();
        successors.reverse();
        stack.extend(successors);
    }
}

/// Like [`dfs_preorder`], but also returns the nodes in visitation order.
/// Used internally by [`crate::grammar::GrammarArena::deep_copy`] to
/// discover the whole reachable subgraph.
pub(crate) fn dfs_preorder_collect(arena: &GrammarArena, root: GrammarId) -> Vec<GrammarId> {
    let mut order = Vec::new();
    dfs_preorder(arena, root, |id| order.push(id));
    order
}

enum Frame {
    Enter(GrammarId),
    Exit(GrammarId),
}

/// Visits every nonterminal reachable from `root` (root included) exactly
/// once, visiting a node only after all of its successors have been
/// visited.
pub fn dfs_postorder(arena: &GrammarArena, root: GrammarId, mut visit: impl FnMut(GrammarId)) {
    let mut visited = HashSet::new();
    let mut stack = vec![Frame::Enter(root)];
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(id) => {
                if visited.contains(&id) {
                    continue;
                }
                visited.insert(id);
                stack.push(Frame::Exit(id));
                let mut successors: Vec<GrammarId> =
                    arena.nonterminals(id).iter().copied().collect();
                successors.reverse();
                for succ in successors {
                    if !visited.contains(&succ) {
                        stack.push(Frame::Enter(succ));
                    }
                }
            }
            Frame::Exit(id) => visit(id),
        }
    }
}

/// `true` iff `to` is reachable from `from` by a directed path of
/// nonterminal arcs (a node is always reachable from itself).
pub fn is_reachable(arena: &GrammarArena, from: GrammarId, to: GrammarId) -> bool {
    let mut found = false;
    let mut visited = HashSet::new();
    let mut stack = vec![from];
    while let Some(id) = stack.pop() {
        if id == to {
            found = true;
            break;
        }
        if !visited.insert(id) {
            continue;
        }
        stack.extend(arena.nonterminals(id).iter().copied());
    }
    found
}
