use std::io::Read;

use log::debug;

use crate::byte_reader::{is_space, ByteReader};
use crate::document::{AttributeData, AttributeId, Document, ElementData, ElementId};
use crate::errors::XmlError;
use crate::trie::NameTrie;

/// Outcome of reading one `<...>` header.
enum TagHeader {
    /// `<name a="v">` — the element stays open and a body follows.
    Open {
        name: Box<str>,
        attributes: Vec<(Box<str>, Box<str>)>,
    },
    /// `<name a="v"/>`.
    SelfClosing {
        name: Box<str>,
        attributes: Vec<(Box<str>, Box<str>)>,
    },
    /// `</name>`.
    Close { name: Box<str> },
    /// `<?...?>` or `<!...>`, skipped without preserving content.
    Skipped,
}

pub(crate) fn parse<R: Read>(source: R) -> Result<Document, XmlError> {
    let meta_root = ElementData {
        name: None,
        value: String::new(),
        parent: None,
        pos: 0,
        children: Vec::new(),
        attributes: Vec::new(),
        child_index: None,
        attr_index: None,
    };
    let mut parser = Parser {
        reader: ByteReader::new(source),
        doc: Document {
            elements: vec![meta_root],
            attributes: Vec::new(),
        },
    };
    parser.read_element_body(Document::META_ROOT, true)?;

    let mut doc = parser.doc;
    build_indices(&mut doc);
    debug!(
        "loaded document: {} elements, {} attributes",
        doc.elements.len() - 1,
        doc.attributes.len()
    );
    Ok(doc)
}

struct Parser<R> {
    reader: ByteReader<R>,
    doc: Document,
}

impl<R: Read> Parser<R> {
    /// Element body: text runs and child tags until the matching close
    /// tag. End of stream is fine at the meta-root and an error anywhere
    /// below it.
    fn read_element_body(&mut self, elem: ElementId, is_root: bool) -> Result<(), XmlError> {
        loop {
            self.reader.skip_whitespace()?;
            let Some(c) = self.reader.peek()? else {
                return if is_root {
                    Ok(())
                } else {
                    Err(XmlError::UnexpectedEof)
                };
            };
            if c != b'<' {
                self.read_text(elem)?;
                continue;
            }
            match self.read_tag_header()? {
                TagHeader::Open { name, attributes } => {
                    let child = self.link_child(elem, name, attributes);
                    self.read_element_body(child, false)?;
                }
                TagHeader::SelfClosing { name, attributes } => {
                    self.link_child(elem, name, attributes);
                }
                TagHeader::Close { name } => {
                    let open = self.doc.element(elem).name.as_deref();
                    if open != Some(name.as_ref()) {
                        return Err(XmlError::MismatchedCloseTag {
                            expected: open.map(Into::into),
                            found: name,
                        });
                    }
                    return Ok(());
                }
                TagHeader::Skipped => {}
            }
        }
    }

    /// Appends a parsed element under `parent`, in document order.
    fn link_child(
        &mut self,
        parent: ElementId,
        name: Box<str>,
        attributes: Vec<(Box<str>, Box<str>)>,
    ) -> ElementId {
        let id = ElementId(self.doc.elements.len() as u32);
        let pos = self.doc.element(parent).children.len() as u32;
        let mut attribute_ids = Vec::with_capacity(attributes.len());
        for (name, value) in attributes {
            let attr_id = AttributeId(self.doc.attributes.len() as u32);
            self.doc.attributes.push(AttributeData {
                name,
                value,
                owner: id,
            });
            attribute_ids.push(attr_id);
        }
        self.doc.elements.push(ElementData {
            name: Some(name),
            value: String::new(),
            parent: Some(parent),
            pos,
            children: Vec::new(),
            attributes: attribute_ids,
            child_index: None,
            attr_index: None,
        });
        self.doc.elements[parent.0 as usize].children.push(id);
        id
    }

    /// A `<`-terminated text run, appended to the element's value with
    /// trailing whitespace trimmed. Text that runs to end of stream has
    /// no enclosing element left to close and is an error.
    fn read_text(&mut self, elem: ElementId) -> Result<(), XmlError> {
        let mut run = Vec::new();
        if !self.reader.read_until(b'<', &mut run)? {
            return Err(XmlError::UnexpectedEof);
        }
        trim_trailing_space(&mut run);
        let run = String::from_utf8(run)?;
        self.doc.elements[elem.0 as usize].value.push_str(&run);
        Ok(())
    }

    /// Everything between `<` and the byte that ends the header.
    fn read_tag_header(&mut self) -> Result<TagHeader, XmlError> {
        let opener = self.reader.next()?;
        debug_assert_eq!(opener, Some(b'<'));

        let Some(c) = self.reader.next()? else {
            return Err(XmlError::UnexpectedEof);
        };
        if c == b'?' || c == b'!' {
            return self.skip_special_tag();
        }

        let close_tag = c == b'/';
        if !close_tag {
            self.reader.push_back(c);
        }
        self.reader.skip_whitespace()?;

        let mut name = Vec::new();
        let Some(mut c) = self.reader.next()? else {
            return Err(XmlError::UnexpectedEof);
        };
        if c == b'>' {
            return Err(XmlError::InvalidTag);
        }
        while c != b'>' && c != b'/' && !is_space(c) {
            name.push(c);
            match self.reader.next()? {
                Some(b) => c = b,
                None => return Err(XmlError::UnexpectedEof),
            }
        }
        let name = into_name(name)?;

        if close_tag {
            // `</name/>` is never valid; whitespace before `>` is.
            if c == b'/' {
                return Err(XmlError::InvalidTag);
            }
            if c != b'>' {
                self.reader.skip_whitespace()?;
                if self.reader.next()? != Some(b'>') {
                    return Err(XmlError::InvalidTag);
                }
            }
            return Ok(TagHeader::Close { name });
        }

        self.reader.push_back(c);
        self.read_attributes(name)
    }

    /// `<?` / `<!` tags are skipped opaquely, counting `<` and `>` so a
    /// nested DOCTYPE subset does not end the tag early.
    fn skip_special_tag(&mut self) -> Result<TagHeader, XmlError> {
        let mut depth = 1u32;
        while depth > 0 {
            match self.reader.next()? {
                Some(b'<') => depth += 1,
                Some(b'>') => depth -= 1,
                Some(_) => {}
                None => return Err(XmlError::UnexpectedEof),
            }
        }
        Ok(TagHeader::Skipped)
    }

    /// The attribute list of an open tag, up to `>` or `/>`.
    fn read_attributes(&mut self, name: Box<str>) -> Result<TagHeader, XmlError> {
        let mut attributes = Vec::new();
        loop {
            self.reader.skip_whitespace()?;
            let Some(c) = self.reader.next()? else {
                return Err(XmlError::UnexpectedEof);
            };
            match c {
                b'>' => return Ok(TagHeader::Open { name, attributes }),
                b'/' => {
                    self.reader.skip_whitespace()?;
                    return if self.reader.next()? == Some(b'>') {
                        Ok(TagHeader::SelfClosing { name, attributes })
                    } else {
                        Err(XmlError::InvalidTag)
                    };
                }
                b'=' => return Err(XmlError::InvalidTag),
                _ => {
                    self.reader.push_back(c);
                    let attr_name = self.read_attr_name()?;
                    if self.reader.next()? != Some(b'=') {
                        return Err(XmlError::ExpectedAttributeValue { name: attr_name });
                    }
                    self.reader.skip_whitespace()?;
                    let value = self.read_attr_value()?;
                    attributes.push((attr_name, value));
                }
            }
        }
    }

    /// Attribute name: bytes up to `=` or whitespace; any whitespace
    /// before the `=` is consumed so the caller sees the `=` next.
    fn read_attr_name(&mut self) -> Result<Box<str>, XmlError> {
        let mut name = Vec::new();
        loop {
            let Some(c) = self.reader.next()? else {
                return Err(XmlError::UnexpectedEof);
            };
            if c == b'=' || is_space(c) {
                self.reader.push_back(c);
                break;
            }
            name.push(c);
        }
        self.reader.skip_whitespace()?;
        into_name(name)
    }

    /// Quoted attribute value: delimited by `'` or `"`, terminated by
    /// the same quote that opened it, no escape processing inside.
    fn read_attr_value(&mut self) -> Result<Box<str>, XmlError> {
        let quote = match self.reader.next()? {
            Some(q @ (b'\'' | b'"')) => q,
            Some(_) | None => return Err(XmlError::ExpectedQuote),
        };
        let mut value = Vec::new();
        if !self.reader.read_until(quote, &mut value)? {
            return Err(XmlError::UnexpectedEof);
        }
        self.reader.next()?; // the closing quote
        trim_trailing_space(&mut value);
        into_name(value)
    }
}

/// Post-processing: attach the two name tries to every element that has
/// children or attributes. Child vectors are appended in document order
/// during the parse, so there is no sibling list to repair first.
fn build_indices(doc: &mut Document) {
    for at in 0..doc.elements.len() {
        let child_index = {
            let entries: Vec<(&str, ElementId)> = doc.elements[at]
                .children
                .iter()
                .filter_map(|&c| {
                    doc.elements[c.0 as usize]
                        .name
                        .as_deref()
                        .map(|name| (name, c))
                })
                .collect();
            NameTrie::build(entries)
        };
        doc.elements[at].child_index = child_index;

        let attr_index = {
            let entries: Vec<(&str, AttributeId)> = doc.elements[at]
                .attributes
                .iter()
                .map(|&a| (doc.attributes[a.0 as usize].name.as_ref(), a))
                .collect();
            NameTrie::build(entries)
        };
        doc.elements[at].attr_index = attr_index;
    }
}

fn trim_trailing_space(bytes: &mut Vec<u8>) {
    while bytes.last().is_some_and(|&b| is_space(b)) {
        bytes.pop();
    }
}

fn into_name(bytes: Vec<u8>) -> Result<Box<str>, XmlError> {
    Ok(String::from_utf8(bytes)?.into_boxed_str())
}
