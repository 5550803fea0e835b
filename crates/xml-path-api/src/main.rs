use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use xml_path_api::{Document, Element, Node};

/// Load an XML document and evaluate path expressions against it.
#[derive(Parser)]
#[command(name = "xml-query", version, about)]
struct Args {
    /// XML file to load.
    file: PathBuf,

    /// Path expressions to evaluate, e.g. `/a/b/@id` or `//item`.
    #[arg(required = true)]
    paths: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let doc = Document::load(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    for path in &args.paths {
        let matches = doc.select(path);
        println!("{path}  ({} matches)", matches.len());
        for node in matches {
            match node {
                Node::Element(el) => print_element(el, 1),
                Node::Attribute(attr) => {
                    println!("   ({}, {})", attr.name(), attr.value());
                }
            }
        }
        println!();
    }

    Ok(())
}

fn print_element(el: Element, level: usize) {
    let indent = "   ".repeat(level);
    println!("{indent}{}: {}", el.name().unwrap_or("(root)"), el.text());
    for attr in el.attributes() {
        println!("{indent}   ({}, {})", attr.name(), attr.value());
    }
    for child in el.children() {
        print_element(child, level + 1);
    }
}
