use xml_path_api::{Document, Node};

const DOC: &str = r#"<a><b id="1"><c/></b><b id="2"><c/><c/></b></a>"#;

fn names<'a>(matches: &'a [Node<'a>]) -> Vec<&'a str> {
    matches.iter().map(|n| n.name().unwrap_or("(root)")).collect()
}

fn ids<'a>(matches: &'a [Node<'a>]) -> Vec<&'a str> {
    matches
        .iter()
        .map(|n| n.as_element().and_then(|el| el.attribute("id")).unwrap_or("-"))
        .collect()
}

#[test]
fn child_steps_follow_document_order() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("/a/b");
    assert_eq!(names(&matches), ["b", "b"]);
    assert_eq!(ids(&matches), ["1", "2"]);
}

#[test]
fn predicates_are_skipped_not_evaluated() {
    let doc = Document::parse(DOC).unwrap();
    assert_eq!(names(&doc.select("/a/b[1]/c")), ["c", "c", "c"]);
    assert_eq!(names(&doc.select("/a/b[position() = 1][2]/c")), ["c", "c", "c"]);
}

#[test]
fn double_slash_selects_descendants() {
    let doc = Document::parse(DOC).unwrap();
    assert_eq!(names(&doc.select("//c")), ["c", "c", "c"]);
    assert_eq!(names(&doc.select("//b")), ["b", "b"]);
}

#[test]
fn attribute_axis_yields_attribute_nodes() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("/a/b/@id");
    let values: Vec<&str> = matches
        .iter()
        .filter_map(Node::as_attribute)
        .map(|attr| attr.value())
        .collect();
    assert_eq!(values, ["1", "2"]);

    let all = doc.select("/a/b/@*");
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|n| n.as_attribute().is_some()));
}

#[test]
fn parent_step_collapses_duplicates() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("/a/b/c/..");
    assert_eq!(names(&matches), ["b", "b"]);
    assert_eq!(ids(&matches), ["1", "2"]);
}

#[test]
fn descendant_or_self_walks_preorder() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("/a/descendant-or-self::*");
    assert_eq!(names(&matches), ["a", "b", "c", "b", "c", "c"]);
}

#[test]
fn following_sibling_excludes_self_and_stops_at_claimed_nodes() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("/a/b/following-sibling::b");
    assert_eq!(ids(&matches), ["2"]);
}

#[test]
fn namespace_axis_is_always_empty() {
    let doc = Document::parse(DOC).unwrap();
    assert!(doc.select("/a/b/namespace::*").is_empty());
    assert!(doc.select("/a/namespace::b").is_empty());
}

#[test]
fn lone_slash_selects_the_meta_root() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("/");
    assert_eq!(matches.len(), 1);
    let root = matches[0].as_element().expect("an element");
    assert_eq!(root.name(), None);
    assert_eq!(root, doc.root());
}

#[test]
fn empty_expression_selects_every_descendant() {
    let doc = Document::parse(DOC).unwrap();
    assert_eq!(names(&doc.select("")), ["a", "b", "c", "b", "c", "c"]);
}

#[test]
fn relative_expressions_start_below_the_origin() {
    let doc = Document::parse(DOC).unwrap();
    let a = doc.document_element().unwrap();
    assert_eq!(names(&a.select("c")), ["c", "c", "c"]);
    assert!(a.select("a").is_empty());
}

#[test]
fn ancestors_emit_root_first_per_walk() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("//c/ancestor::*");
    assert_eq!(names(&matches), ["a", "b", "b"]);
    assert_eq!(ids(&matches), ["-", "1", "2"]);

    let or_self = doc.select("//c/ancestor-or-self::c");
    assert_eq!(names(&or_self), ["c", "c", "c"]);
}

#[test]
fn following_takes_descendants_of_later_siblings() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("/a/b/following::*");
    assert_eq!(names(&matches), ["b", "c", "c"]);
    assert_eq!(ids(&matches), ["2", "-", "-"]);
}

#[test]
fn preceding_takes_descendants_of_earlier_siblings() {
    let doc = Document::parse(DOC).unwrap();
    let matches = doc.select("/a/b/preceding::*");
    assert_eq!(names(&matches), ["b", "c"]);
    assert_eq!(ids(&matches), ["1", "-"]);
}

#[test]
fn sibling_axes_are_dual() {
    let doc = Document::parse("<r><x/><y/><z/></r>").unwrap();
    let after = doc.select("/r/y/following-sibling::*");
    let before = doc.select("/r/y/preceding-sibling::*");
    assert_eq!(names(&before), ["x"]);
    assert_eq!(names(&after), ["z"]);

    let siblings: Vec<Node> = before.iter().chain(after.iter()).copied().collect();
    let y = doc.select("/r/y");
    assert!(siblings.iter().all(|s| !y.contains(s)));
    assert_eq!(siblings.len() + 1, doc.select("/r/*").len());
}

#[test]
fn descendant_or_self_is_idempotent() {
    let doc = Document::parse(DOC).unwrap();
    let once = doc.select("/a/descendant-or-self::*");
    let twice = doc.select("/a/descendant-or-self::*/descendant-or-self::*");
    assert_eq!(once, twice);
}

#[test]
fn queries_never_disturb_each_other() {
    let doc = Document::parse(DOC).unwrap();
    let first = doc.select("//c/ancestor::*");
    let second = doc.select("//c/ancestor::*");
    assert_eq!(first, second);

    // Interleave other axes and re-check.
    doc.select("/a/descendant-or-self::*");
    doc.select("/a/b/following-sibling::*");
    assert_eq!(doc.select("//c/ancestor::*"), first);
}

#[test]
fn unknown_axis_names_fall_back_to_the_prefix_choice() {
    let doc = Document::parse(DOC).unwrap();
    assert_eq!(names(&doc.select("/a/bogus::b")), ["b", "b"]);
    assert_eq!(doc.select("/a/b/@attribute-ish::id").len(), 2);
}

#[test]
fn a_single_colon_is_part_of_the_name() {
    let doc = Document::parse("<a><x:y/><x/></a>").unwrap();
    assert_eq!(names(&doc.select("/a/x:y")), ["x:y"]);
    assert_eq!(names(&doc.select("/a/x")), ["x"]);
}

#[test]
fn steps_apply_to_attribute_nodes() {
    let doc = Document::parse(DOC).unwrap();
    // `.` keeps the attributes, `..` climbs to their owners.
    assert_eq!(doc.select("/a/b/@id/.").len(), 2);
    assert_eq!(ids(&doc.select("/a/b/@id/..")), ["1", "2"]);
    // Attributes have no children or sibling order.
    assert!(doc.select("/a/b/@id/c").is_empty());
    assert!(doc.select("/a/b/@id/following-sibling::*").is_empty());
}

#[test]
fn explicit_axis_names_override_the_prefix() {
    let doc = Document::parse(DOC).unwrap();
    assert_eq!(names(&doc.select("/a/child::b")), ["b", "b"]);
    assert_eq!(doc.select("/a/b/attribute::id").len(), 2);
    assert_eq!(names(&doc.select("/a/b/self::b")), ["b", "b"]);
    assert!(doc.select("/a/b/self::c").is_empty());
}
