//! Structured-data loader for XML documents.
//!
//! Flattens an XML tree into a [`DataMapping`] keyed by the local name of
//! every leaf element (an element with no child elements). Branch elements
//! contribute nothing themselves. When the same leaf name appears more than
//! once, the last occurrence wins.
//!
//! ```text
//! <offer>
//!   <candidate><Name>Ann</Name></candidate>
//!   <Salary>5000</Salary>
//! </offer>
//! ```
//!
//! yields `{"Name": "Ann", "Salary": "5000"}`.

use super::DataMapping;
use crate::error::{DocfillError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::Path;

struct Frame {
    name: String,
    text: String,
    has_children: bool,
}

/// Load and flatten an XML file.
pub fn load_xml_file<P: AsRef<Path>>(path: P) -> Result<DataMapping> {
    let path = path.as_ref();
    let content = std::fs::read(path).map_err(|e| {
        DocfillError::Storage(format!("failed to read '{}': {}", path.display(), e))
    })?;
    let text = std::str::from_utf8(&content).map_err(|e| {
        DocfillError::Parse(format!("'{}' is not valid UTF-8: {}", path.display(), e))
    })?;
    parse_xml(text)
}

/// Flatten an XML document held in memory.
pub fn parse_xml(xml: &str) -> Result<DataMapping> {
    let mut reader = Reader::from_str(xml);
    let mut mapping = DataMapping::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut root_closed = false;

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| DocfillError::Parse(format!("at byte {}: {}", position, e)))?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root_closed {
                    return Err(DocfillError::Parse(
                        "document has more than one root element".to_string(),
                    ));
                }
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(Frame {
                    name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                    text: String::new(),
                    has_children: false,
                });
            }
            Event::Empty(empty) => {
                if stack.is_empty() && root_closed {
                    return Err(DocfillError::Parse(
                        "document has more than one root element".to_string(),
                    ));
                }
                match stack.last_mut() {
                    Some(parent) => parent.has_children = true,
                    None => root_closed = true,
                }
                let name = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                mapping.insert(name, "");
            }
            Event::End(_) => {
                // quick-xml has already checked that the end name matches.
                let frame = stack.pop().ok_or_else(|| {
                    DocfillError::Parse(format!("unexpected closing tag at byte {}", position))
                })?;
                if !frame.has_children {
                    mapping.insert(frame.name, frame.text.trim());
                }
                if stack.is_empty() {
                    root_closed = true;
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| DocfillError::Parse(format!("at byte {}: {}", position, e)))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(DocfillError::Parse(format!(
                            "text outside of the root element at byte {}",
                            position
                        )));
                    }
                }
            }
            Event::CData(cdata) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DocfillError::Parse(format!(
            "unexpected end of document: element <{}> is not closed",
            open.name
        )));
    }
    if !root_closed {
        return Err(DocfillError::Parse("document has no root element".to_string()));
    }

    Ok(mapping)
}
