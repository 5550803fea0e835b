use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::XmlError;
use crate::trie::NameTrie;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct ElementId(pub(crate) u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct AttributeId(pub(crate) u32);

/// Internal node identity: what a query's working set holds. The public
/// counterpart is [`Node`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum NodeId {
    Element(ElementId),
    Attribute(AttributeId),
}

pub(crate) struct ElementData {
    /// `None` only for the meta-root.
    pub name: Option<Box<str>>,
    /// Concatenated text runs captured between child tags.
    pub value: String,
    pub parent: Option<ElementId>,
    /// Index of this element in its parent's child vector.
    pub pos: u32,
    pub children: Vec<ElementId>,
    pub attributes: Vec<AttributeId>,
    pub child_index: Option<NameTrie<ElementId>>,
    pub attr_index: Option<NameTrie<AttributeId>>,
}

pub(crate) struct AttributeData {
    pub name: Box<str>,
    pub value: Box<str>,
    pub owner: ElementId,
}

/// A loaded XML document.
///
/// All nodes live in id-indexed arenas owned by the document; navigation
/// hands out cheap [`Element`] / [`Attribute`] borrows. The tree is
/// immutable once loaded and queries never mutate it, so a document may
/// be shared freely across threads.
pub struct Document {
    pub(crate) elements: Vec<ElementData>,
    pub(crate) attributes: Vec<AttributeData>,
}

impl Document {
    pub(crate) const META_ROOT: ElementId = ElementId(0);

    /// Opens and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, XmlError> {
        Self::from_reader(File::open(path)?)
    }

    /// Parses a document from any byte source.
    pub fn from_reader(source: impl Read) -> Result<Self, XmlError> {
        crate::parser::parse(source)
    }

    /// Parses a document held in memory.
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        Self::from_reader(text.as_bytes())
    }

    /// The synthetic meta-root wrapping the document's outermost
    /// elements. It has no name and never matches a name test.
    pub fn root(&self) -> Element<'_> {
        Element {
            doc: self,
            id: Self::META_ROOT,
        }
    }

    /// The first outermost element, if the document has one.
    pub fn document_element(&self) -> Option<Element<'_>> {
        self.root().first_child()
    }

    /// Evaluates a path expression from the meta-root. See the crate
    /// docs for the accepted grammar.
    pub fn select(&self, path: &str) -> Vec<Node<'_>> {
        self.root().select(path)
    }

    pub(crate) fn element(&self, id: ElementId) -> &ElementData {
        &self.elements[id.0 as usize]
    }

    pub(crate) fn attribute(&self, id: AttributeId) -> &AttributeData {
        &self.attributes[id.0 as usize]
    }

    pub(crate) fn is_meta_root(&self, id: NodeId) -> bool {
        id == NodeId::Element(Self::META_ROOT)
    }

    pub(crate) fn node_name(&self, id: NodeId) -> Option<&str> {
        match id {
            NodeId::Element(el) => self.element(el).name.as_deref(),
            NodeId::Attribute(attr) => Some(&self.attribute(attr).name),
        }
    }

    /// The owning parent: an element's parent element, an attribute's
    /// owner. `None` only for the meta-root.
    pub(crate) fn node_parent(&self, id: NodeId) -> Option<ElementId> {
        match id {
            NodeId::Element(el) => self.element(el).parent,
            NodeId::Attribute(attr) => Some(self.attribute(attr).owner),
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("elements", &(self.elements.len() - 1))
            .field("attributes", &self.attributes.len())
            .finish()
    }
}

/// Borrowed handle to an element node.
#[derive(Clone, Copy)]
pub struct Element<'d> {
    doc: &'d Document,
    id: ElementId,
}

impl<'d> Element<'d> {
    fn data(&self) -> &'d ElementData {
        self.doc.element(self.id)
    }

    /// Tag name; `None` for the meta-root.
    pub fn name(&self) -> Option<&'d str> {
        self.data().name.as_deref()
    }

    /// Concatenated text content captured between this element's child
    /// tags, trailing whitespace trimmed per run.
    pub fn text(&self) -> &'d str {
        &self.data().value
    }

    pub fn parent(&self) -> Option<Element<'d>> {
        let doc = self.doc;
        self.data().parent.map(|id| Element { doc, id })
    }

    pub fn children(&self) -> impl Iterator<Item = Element<'d>> + 'd {
        let doc = self.doc;
        self.data().children.iter().map(move |&id| Element { doc, id })
    }

    pub fn first_child(&self) -> Option<Element<'d>> {
        let doc = self.doc;
        self.data().children.first().map(|&id| Element { doc, id })
    }

    pub fn next_sibling(&self) -> Option<Element<'d>> {
        self.sibling_at(self.data().pos as usize + 1)
    }

    pub fn prev_sibling(&self) -> Option<Element<'d>> {
        let pos = self.data().pos.checked_sub(1)?;
        self.sibling_at(pos as usize)
    }

    fn sibling_at(&self, pos: usize) -> Option<Element<'d>> {
        let doc = self.doc;
        let parent = self.data().parent?;
        doc.element(parent)
            .children
            .get(pos)
            .map(|&id| Element { doc, id })
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute<'d>> + 'd {
        let doc = self.doc;
        self.data()
            .attributes
            .iter()
            .map(move |&id| Attribute { doc, id })
    }

    /// Value of the named attribute, resolved through the attribute
    /// index.
    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        let ids = self.data().attr_index.as_ref()?.lookup(name)?;
        ids.first().map(|&id| self.doc.attribute(id).value.as_ref())
    }

    /// Evaluates a path expression with this element as the origin.
    pub fn select(&self, path: &str) -> Vec<Node<'d>> {
        let doc = self.doc;
        crate::query::evaluate(doc, self.id, path)
            .into_iter()
            .map(|id| Node::from_id(doc, id))
            .collect()
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}
impl Eq for Element<'_> {}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name().unwrap_or("(root)"))
    }
}

/// Borrowed handle to an attribute node.
#[derive(Clone, Copy)]
pub struct Attribute<'d> {
    doc: &'d Document,
    id: AttributeId,
}

impl<'d> Attribute<'d> {
    fn data(&self) -> &'d AttributeData {
        self.doc.attribute(self.id)
    }

    pub fn name(&self) -> &'d str {
        &self.data().name
    }

    pub fn value(&self) -> &'d str {
        &self.data().value
    }

    /// The element this attribute is declared on.
    pub fn element(&self) -> Element<'d> {
        Element {
            doc: self.doc,
            id: self.data().owner,
        }
    }
}

impl PartialEq for Attribute<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}
impl Eq for Attribute<'_> {}

impl fmt::Debug for Attribute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.name(), self.value())
    }
}

/// A query result: either an element or an attribute. Callers match to
/// tell them apart.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Node<'d> {
    Element(Element<'d>),
    Attribute(Attribute<'d>),
}

impl<'d> Node<'d> {
    pub(crate) fn from_id(doc: &'d Document, id: NodeId) -> Self {
        match id {
            NodeId::Element(id) => Node::Element(Element { doc, id }),
            NodeId::Attribute(id) => Node::Attribute(Attribute { doc, id }),
        }
    }

    /// Element tag name or attribute name; `None` for the meta-root.
    pub fn name(&self) -> Option<&'d str> {
        match self {
            Node::Element(el) => el.name(),
            Node::Attribute(attr) => Some(attr.name()),
        }
    }

    pub fn as_element(&self) -> Option<Element<'d>> {
        match self {
            Node::Element(el) => Some(*el),
            Node::Attribute(_) => None,
        }
    }

    pub fn as_attribute(&self) -> Option<Attribute<'d>> {
        match self {
            Node::Attribute(attr) => Some(*attr),
            Node::Element(_) => None,
        }
    }
}
