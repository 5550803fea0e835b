//! Path-expression evaluation.
//!
//! No AST is built: the evaluator scans the expression once, picking an
//! axis and a name test per step and handing the current working set to
//! the axis handler. Predicate brackets are balanced-skipped, never
//! evaluated.

use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::document::{Document, ElementId, NodeId};
use crate::macros::strcspn;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    SelfNode,
}

/// Sorted for binary search; an `axis::` prefix that is not one of these
/// is silently ignored and the step keeps its prefix-chosen axis.
const AXIS_NAMES: [(&str, Axis); 13] = [
    ("ancestor", Axis::Ancestor),
    ("ancestor-or-self", Axis::AncestorOrSelf),
    ("attribute", Axis::Attribute),
    ("child", Axis::Child),
    ("descendant", Axis::Descendant),
    ("descendant-or-self", Axis::DescendantOrSelf),
    ("following", Axis::Following),
    ("following-sibling", Axis::FollowingSibling),
    ("namespace", Axis::Namespace),
    ("parent", Axis::Parent),
    ("preceding", Axis::Preceding),
    ("preceding-sibling", Axis::PrecedingSibling),
    ("self", Axis::SelfNode),
];

#[derive(Clone, Copy)]
enum NameTest<'q> {
    Wildcard,
    Exact(&'q str),
}

impl<'q> NameTest<'q> {
    /// The empty token (as after `.` and `..`) matches like `*`.
    fn from_token(token: &'q str) -> Self {
        if token.is_empty() || token == "*" {
            NameTest::Wildcard
        } else {
            NameTest::Exact(token)
        }
    }
}

/// A node passes a name test only if it has a name at all, so the
/// meta-root never matches, the wildcard included.
fn check(doc: &Document, id: NodeId, test: NameTest) -> bool {
    match (doc.node_name(id), test) {
        (None, _) => false,
        (Some(_), NameTest::Wildcard) => true,
        (Some(name), NameTest::Exact(want)) => name == want,
    }
}

pub(crate) fn evaluate(doc: &Document, origin: ElementId, path: &str) -> Vec<NodeId> {
    let q = path.as_bytes();
    let mut pos = 0usize;

    let mut set: Vec<NodeId> = if q.first() != Some(&b'/') {
        // Relative expressions start from every strict descendant of the
        // origin.
        let mut out = Vec::new();
        descendant(doc, &[NodeId::Element(origin)], NameTest::Wildcard, &mut out);
        out
    } else if q.get(1) != Some(&b'/') {
        pos = 1;
        vec![NodeId::Element(origin)]
    } else {
        // `//`: start from the origin's first child and let the second
        // slash become a descendant-or-self step.
        pos = 1;
        doc.element(origin)
            .children
            .first()
            .map(|&c| NodeId::Element(c))
            .into_iter()
            .collect()
    };

    while pos < q.len() {
        let mut axis = Axis::Child;
        match q[pos] {
            b'/' => {
                axis = Axis::DescendantOrSelf;
                pos += 1;
            }
            b'@' => {
                axis = Axis::Attribute;
                pos += 1;
            }
            b'.' => {
                if q.get(pos + 1) == Some(&b'.') {
                    axis = Axis::Parent;
                    pos += 2;
                } else {
                    axis = Axis::SelfNode;
                    pos += 1;
                }
            }
            _ => {}
        }

        // Scan the name token. `axis::` overrides the prefix choice; a
        // single `:` is an ordinary name byte.
        let mut start = pos;
        let mut scan = pos;
        let token: &str;
        loop {
            scan += strcspn!(q, b'/' | b'[' | b':', scan);
            match q.get(scan) {
                Some(b':') if q.get(scan + 1) == Some(&b':') => {
                    if let Ok(found) =
                        AXIS_NAMES.binary_search_by_key(&&path[start..scan], |&(name, _)| name)
                    {
                        axis = AXIS_NAMES[found].1;
                    }
                    start = scan + 2;
                    scan = start;
                }
                Some(b':') => {
                    scan += 1;
                }
                Some(b'/') => {
                    token = &path[start..scan];
                    pos = scan + 1;
                    break;
                }
                Some(_) => {
                    // `[`: the step applies first, then its predicates
                    // are discarded.
                    token = &path[start..scan];
                    pos = skip_predicates(q, scan);
                    if q.get(pos) == Some(&b'/') {
                        pos += 1;
                    }
                    break;
                }
                None => {
                    token = &path[start..];
                    pos = q.len();
                    break;
                }
            }
        }

        let test = NameTest::from_token(token);
        trace!("step {axis:?} {token:?} over {} nodes", set.len());
        let mut next = Vec::new();
        apply_axis(doc, axis, &set, test, &mut next);
        set = next;
    }

    debug!("{path:?}: {} matches", set.len());
    set
}

/// Advances past one or more `[...]` groups, tracking nesting. An
/// expression that ends inside a predicate just stops here.
fn skip_predicates(q: &[u8], mut pos: usize) -> usize {
    while q.get(pos) == Some(&b'[') {
        let mut depth = 1usize;
        pos += 1;
        while depth > 0 {
            match q.get(pos) {
                Some(b'[') => depth += 1,
                Some(b']') => depth -= 1,
                Some(_) => {}
                None => return pos,
            }
            pos += 1;
        }
    }
    pos
}

fn apply_axis(doc: &Document, axis: Axis, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    match axis {
        Axis::Ancestor => ancestor(doc, input, test, false, out),
        Axis::AncestorOrSelf => ancestor(doc, input, test, true, out),
        Axis::Attribute => attribute(doc, input, test, out),
        Axis::Child => child(doc, input, test, out),
        Axis::Descendant => descendant(doc, input, test, out),
        Axis::DescendantOrSelf => descendant_or_self(doc, input, test, out),
        Axis::Following => surrounding(doc, input, test, Side::Following, out),
        Axis::FollowingSibling => following_sibling(doc, input, test, out),
        Axis::Namespace => {}
        Axis::Parent => parent(doc, input, test, out),
        Axis::Preceding => surrounding(doc, input, test, Side::Preceding, out),
        Axis::PrecedingSibling => preceding_sibling(doc, input, test, out),
        Axis::SelfNode => self_node(doc, input, test, out),
    }
}

fn self_node(doc: &Document, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    for &id in input {
        if check(doc, id, test) {
            out.push(id);
        }
    }
}

fn parent(doc: &Document, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    let mut visited = FxHashSet::default();
    for &id in input {
        let Some(up) = doc.node_parent(id) else {
            continue;
        };
        let up = NodeId::Element(up);
        if visited.insert(up) && check(doc, up, test) {
            out.push(up);
        }
    }
}

fn child(doc: &Document, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    for &id in input {
        let NodeId::Element(el) = id else { continue };
        let data = doc.element(el);
        match test {
            NameTest::Wildcard => out.extend(data.children.iter().map(|&c| NodeId::Element(c))),
            NameTest::Exact(name) => {
                if let Some(found) = data.child_index.as_ref().and_then(|ix| ix.lookup(name)) {
                    out.extend(found.iter().map(|&c| NodeId::Element(c)));
                }
            }
        }
    }
}

fn attribute(doc: &Document, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    for &id in input {
        let NodeId::Element(el) = id else { continue };
        let data = doc.element(el);
        match test {
            NameTest::Wildcard => out.extend(data.attributes.iter().map(|&a| NodeId::Attribute(a))),
            NameTest::Exact(name) => {
                if let Some(found) = data.attr_index.as_ref().and_then(|ix| ix.lookup(name)) {
                    out.extend(found.iter().map(|&a| NodeId::Attribute(a)));
                }
            }
        }
    }
}

/// Pre-order walk below `el`, marking on visit so overlapping inputs do
/// not duplicate work; an already-visited subtree is skipped whole.
fn descend(
    doc: &Document,
    el: ElementId,
    test: NameTest,
    visited: &mut FxHashSet<NodeId>,
    out: &mut Vec<NodeId>,
) {
    let id = NodeId::Element(el);
    if !visited.insert(id) {
        return;
    }
    if check(doc, id, test) {
        out.push(id);
    }
    for &below in &doc.element(el).children {
        descend(doc, below, test, visited, out);
    }
}

fn descendant(doc: &Document, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    let mut visited = FxHashSet::default();
    for &id in input {
        let NodeId::Element(el) = id else { continue };
        if visited.contains(&id) {
            continue;
        }
        for &below in &doc.element(el).children {
            descend(doc, below, test, &mut visited, out);
        }
    }
}

fn descendant_or_self(doc: &Document, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    let mut visited = FxHashSet::default();
    for &id in input {
        match id {
            NodeId::Element(el) => descend(doc, el, test, &mut visited, out),
            // An attribute is its own whole subtree.
            NodeId::Attribute(_) => {
                if visited.insert(id) && check(doc, id, test) {
                    out.push(id);
                }
            }
        }
    }
}

/// Shared by `ancestor` and `ancestor-or-self`. Each walk climbs until
/// the meta-root or a node some earlier walk already claimed, then emits
/// its matches root-first on the way back down.
fn ancestor(
    doc: &Document,
    input: &[NodeId],
    test: NameTest,
    include_self: bool,
    out: &mut Vec<NodeId>,
) {
    let mut visited = FxHashSet::default();
    let mut chain = Vec::new();
    for &id in input {
        let mut cur = if include_self {
            Some(id)
        } else {
            doc.node_parent(id).map(NodeId::Element)
        };
        chain.clear();
        while let Some(id) = cur {
            if doc.is_meta_root(id) || !visited.insert(id) {
                break;
            }
            chain.push(id);
            cur = doc.node_parent(id).map(NodeId::Element);
        }
        for &id in chain.iter().rev() {
            if check(doc, id, test) {
                out.push(id);
            }
        }
    }
}

fn following_sibling(doc: &Document, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    let mut visited = FxHashSet::default();
    for &id in input {
        let NodeId::Element(el) = id else { continue };
        let Some(parent) = doc.element(el).parent else {
            continue;
        };
        let siblings = &doc.element(parent).children;
        let at = doc.element(el).pos as usize;
        for &sib in &siblings[at + 1..] {
            let sib = NodeId::Element(sib);
            // A claimed node means an earlier input already walked the
            // rest of this range.
            if visited.contains(&sib) {
                break;
            }
            if check(doc, sib, test) {
                visited.insert(sib);
                out.push(sib);
            }
        }
    }
}

fn preceding_sibling(doc: &Document, input: &[NodeId], test: NameTest, out: &mut Vec<NodeId>) {
    let mut visited = FxHashSet::default();
    for &id in input {
        let NodeId::Element(el) = id else { continue };
        let Some(parent) = doc.element(el).parent else {
            continue;
        };
        let siblings = &doc.element(parent).children;
        let at = doc.element(el).pos as usize;
        let mut from = at;
        while from > 0 && !visited.contains(&NodeId::Element(siblings[from - 1])) {
            from -= 1;
        }
        for &sib in &siblings[from..at] {
            let sib = NodeId::Element(sib);
            if check(doc, sib, test) {
                visited.insert(sib);
                out.push(sib);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Following,
    Preceding,
}

/// `following` / `preceding`: gather each input's later (or earlier)
/// siblings, then take descendant-or-self of the lot.
fn surrounding(doc: &Document, input: &[NodeId], test: NameTest, side: Side, out: &mut Vec<NodeId>) {
    let mut scratch = Vec::new();
    for &id in input {
        let NodeId::Element(el) = id else { continue };
        let Some(parent) = doc.element(el).parent else {
            continue;
        };
        let siblings = &doc.element(parent).children;
        let at = doc.element(el).pos as usize;
        let range = match side {
            Side::Following => &siblings[at + 1..],
            Side::Preceding => &siblings[..at],
        };
        scratch.extend(range.iter().map(|&s| NodeId::Element(s)));
    }
    descendant_or_self(doc, &scratch, test, out);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn axis_name_table_is_sorted() {
        assert!(AXIS_NAMES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn predicates_skip_with_nesting() {
        let q = b"[a[b]c]/rest";
        assert_eq!(skip_predicates(q, 0), 7);
        assert_eq!(&q[skip_predicates(q, 0)..], b"/rest");
    }

    #[test]
    fn consecutive_predicates_all_skip() {
        let q = b"[1][2]tail";
        assert_eq!(&q[skip_predicates(q, 0)..], b"tail");
    }

    #[test]
    fn unbalanced_predicate_stops_at_the_end() {
        assert_eq!(skip_predicates(b"[never closed", 0), 13);
    }
}
