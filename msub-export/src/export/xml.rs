//! Small quick-xml writing helpers shared by the XML artifact generators

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::ExportError;

pub(crate) type XmlWriter = Writer<Vec<u8>>;

/// Writer with the standard declaration already emitted
pub(crate) fn document_writer() -> Result<XmlWriter, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    Ok(writer)
}

pub(crate) fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<(), ExportError> {
    writer.write_event(Event::Start(element)).map_err(xml_err)
}

pub(crate) fn end(writer: &mut XmlWriter, name: &str) -> Result<(), ExportError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)
}

pub(crate) fn empty(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<(), ExportError> {
    writer.write_event(Event::Empty(element)).map_err(xml_err)
}

/// Escaped character data
pub(crate) fn text(writer: &mut XmlWriter, content: &str) -> Result<(), ExportError> {
    writer
        .write_event(Event::Text(BytesText::new(content)))
        .map_err(xml_err)
}

/// `<name>text</name>`; text is escaped by quick-xml
pub(crate) fn leaf(writer: &mut XmlWriter, name: &str, content: &str) -> Result<(), ExportError> {
    start(writer, BytesStart::new(name))?;
    text(writer, content)?;
    end(writer, name)
}

pub(crate) fn xml_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Xml(e.to_string())
}
