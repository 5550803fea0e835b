//! In-memory XML document model with an XPath-subset query engine.
//!
//! A document is parsed from a byte stream into an arena-backed tree
//! under a synthetic meta-root. Every element carries two compressed
//! tries, one over its child-element names and one over its attribute
//! names, which back the non-wildcard name steps of path queries.
//!
//! The accepted path syntax covers the thirteen named axes, unqualified
//! name steps, the `*` wildcard, the abbreviations `/`, `//`, `@`, `.`
//! and `..`, and predicate brackets — which are balanced-skipped, never
//! evaluated. Entity references, namespaces and processing-instruction
//! content are out of scope: `&lt;` passes through verbatim, a `:` in a
//! name is an ordinary byte, and `<?...?>` / `<!...>` tags are dropped.
//!
//! ```
//! use xml_path_api::{Document, Node};
//!
//! let doc = Document::parse(r#"<a><b id="1"/><b id="2"/></a>"#).unwrap();
//! let matches = doc.select("/a/b/@id");
//! let values: Vec<&str> = matches
//!     .iter()
//!     .filter_map(Node::as_attribute)
//!     .map(|attr| attr.value())
//!     .collect();
//! assert_eq!(values, ["1", "2"]);
//! ```

mod byte_reader;
mod document;
mod errors;
mod macros;
mod parser;
mod query;
mod trie;

pub use document::{Attribute, Document, Element, Node};
pub use errors::XmlError;
