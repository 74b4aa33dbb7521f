//! Structure forest: parent/child trees linked by `parent_id` codes.
//!
//! `parent_id` is a non-owning lookup-by-code reference. Cycle prevention
//! happens at the mutation boundary (`set_parent`); every traversal here still
//! carries a visited set, so corrupted input (e.g. a bulk import that closed a
//! loop) terminates instead of spinning.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::types::{normalize_code, Structure};
use crate::error::StructureError;

/// One node of the forest. `depth` is 0 for roots.
#[derive(Clone, Debug)]
pub struct TreeNode<'a> {
    pub structure: &'a Structure,
    pub children: Vec<TreeNode<'a>>,
    pub depth: usize,
}

impl TreeNode<'_> {
    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Everything related to one structure.
#[derive(Clone, Debug, Default)]
pub struct Relationships<'a> {
    pub parent: Option<&'a Structure>,
    pub children: Vec<&'a Structure>,
    /// Other structures with the same `parent_id` (other roots for a root).
    pub siblings: Vec<&'a Structure>,
    /// Nearest first.
    pub ancestors: Vec<&'a Structure>,
    /// Depth-first pre-order.
    pub descendants: Vec<&'a Structure>,
}

fn position(structures: &[Structure], code: &str) -> Option<usize> {
    structures.iter().position(|s| s.code == code)
}

/// Child indices per parent code, in input order.
fn children_index(structures: &[Structure]) -> HashMap<&str, Vec<usize>> {
    let mut map: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, s) in structures.iter().enumerate() {
        if let Some(p) = s.parent_id.as_deref() {
            map.entry(p).or_default().push(i);
        }
    }
    map
}

/// Group structures into trees. Roots are structures without a parent or
/// whose parent code is unknown. Sibling order follows input order.
///
/// Structures caught in a parent cycle are unreachable from any root and
/// therefore absent from the result.
pub fn build_forest(structures: &[Structure]) -> Vec<TreeNode<'_>> {
    let codes: HashSet<&str> = structures.iter().map(|s| s.code.as_str()).collect();
    let children = children_index(structures);
    let mut visited = HashSet::new();
    let mut roots = Vec::new();
    for (i, s) in structures.iter().enumerate() {
        let is_root = match s.parent_id.as_deref() {
            None => true,
            Some(p) => !codes.contains(p),
        };
        if is_root {
            if let Some(node) = build_node(structures, &children, i, 0, &mut visited) {
                roots.push(node);
            }
        }
    }
    roots
}

fn build_node<'a>(
    structures: &'a [Structure],
    children: &HashMap<&str, Vec<usize>>,
    idx: usize,
    depth: usize,
    visited: &mut HashSet<usize>,
) -> Option<TreeNode<'a>> {
    if !visited.insert(idx) {
        return None;
    }
    let s = &structures[idx];
    let kids = children
        .get(s.code.as_str())
        .map(|v| {
            v.iter()
                .filter_map(|&k| build_node(structures, children, k, depth + 1, visited))
                .collect()
        })
        .unwrap_or_default();
    Some(TreeNode {
        structure: s,
        children: kids,
        depth,
    })
}

/// Parent chain of `code`, nearest first. Stops at a missing parent or on a
/// revisit.
pub fn ancestors<'a>(code: &str, structures: &'a [Structure]) -> Vec<&'a Structure> {
    let code = normalize_code(code);
    let mut out = Vec::new();
    let Some(start) = position(structures, &code) else {
        return out;
    };
    let mut visited = HashSet::from([start]);
    let mut cur = structures[start].parent_id.as_deref();
    while let Some(p) = cur {
        let Some(i) = position(structures, p) else {
            break;
        };
        if !visited.insert(i) {
            break;
        }
        out.push(&structures[i]);
        cur = structures[i].parent_id.as_deref();
    }
    out
}

/// All structures below `code`, depth-first pre-order.
pub fn descendants<'a>(code: &str, structures: &'a [Structure]) -> Vec<&'a Structure> {
    let code = normalize_code(code);
    let mut out = Vec::new();
    let Some(start) = position(structures, &code) else {
        return out;
    };
    let children = children_index(structures);
    let mut visited = HashSet::from([start]);
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if i != start {
            out.push(&structures[i]);
        }
        if let Some(kids) = children.get(structures[i].code.as_str()) {
            // reversed so the first child is popped first
            for &k in kids.iter().rev() {
                if visited.insert(k) {
                    stack.push(k);
                }
            }
        }
    }
    out
}

/// Parent, children, siblings, ancestors and descendants of `code`.
/// `None` if the code is unknown.
pub fn relationships<'a>(code: &str, structures: &'a [Structure]) -> Option<Relationships<'a>> {
    let code = normalize_code(code);
    let s = &structures[position(structures, &code)?];
    let parent = s
        .parent_id
        .as_deref()
        .and_then(|p| structures.iter().find(|x| x.code == p));
    let children = structures
        .iter()
        .filter(|x| x.parent_id.as_deref() == Some(code.as_str()) && x.code != code)
        .collect();
    let siblings = structures
        .iter()
        .filter(|x| x.code != code && x.parent_id == s.parent_id)
        .collect();
    Some(Relationships {
        parent,
        children,
        siblings,
        ancestors: ancestors(&code, structures),
        descendants: descendants(&code, structures),
    })
}

/// Whether `child` may take `proposed_parent` (or no parent) without closing
/// a cycle.
///
/// False when either code is unknown, when the two are the same, or when
/// `child` already sits in the proposed parent's ancestor chain (i.e. the
/// proposed parent is one of `child`'s descendants). Only that chain is
/// checked: moving a structure under one of its own ancestors, such as its
/// grandparent, is allowed.
pub fn can_reparent(child: &str, proposed_parent: Option<&str>, structures: &[Structure]) -> bool {
    let child = normalize_code(child);
    if position(structures, &child).is_none() {
        return false;
    }
    let Some(parent) = proposed_parent.map(normalize_code) else {
        return true;
    };
    if parent == child || position(structures, &parent).is_none() {
        return false;
    }
    !ancestors(&parent, structures).iter().any(|a| a.code == child)
}

/// Re-parent `child`. On rejection nothing changes.
pub fn set_parent(
    structures: &mut [Structure],
    child: &str,
    new_parent: Option<&str>,
) -> Result<(), StructureError> {
    let child = normalize_code(child);
    let new_parent = new_parent.map(normalize_code);
    let idx = position(structures, &child).ok_or_else(|| StructureError::NotFound(child.clone()))?;
    if let Some(p) = new_parent.as_deref() {
        if position(structures, p).is_none() {
            return Err(StructureError::UnknownParent(p.to_string()));
        }
    }
    if !can_reparent(&child, new_parent.as_deref(), structures) {
        debug!(child = %child, parent = ?new_parent, "reparent rejected");
        return Err(StructureError::WouldCycle {
            child,
            parent: new_parent.unwrap_or_default(),
        });
    }
    let s = &mut structures[idx];
    s.parent_id = new_parent;
    s.touch();
    Ok(())
}
