//! Structured data: the flat tag → value mapping and its XML loader.

mod mapping;
mod xml;

pub use mapping::DataMapping;
pub use xml::{load_xml_file, parse_xml};
