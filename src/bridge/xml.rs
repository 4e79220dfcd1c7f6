//! XML plumbing shared by the document bridges

use std::collections::HashMap;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::{Error, ErrorContext, Result};

pub(crate) type Attributes = HashMap<String, String>;

/// Fail on DTD declarations, which can pull in external entities
pub(crate) fn reject_doctype(xml: &str) -> Result<()> {
    let check_len = xml.len().min(2000);
    let head = xml.get(..check_len).unwrap_or(xml);
    if head.to_lowercase().contains("<!doctype") {
        return Err(Error::InvalidXml(
            "DTD declarations are not allowed for security reasons".to_string(),
        ));
    }
    Ok(())
}

/// Element name without its namespace prefix
pub(crate) fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Qualified name of an element as a string
pub(crate) fn element_name(e: &BytesStart) -> Result<String> {
    let name = e.name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_string)
        .map_err(|e| Error::InvalidXml(e.to_string()))
}

/// Context naming `file` and the element being read
pub(crate) fn element_context(file: &str, e: &BytesStart) -> ErrorContext {
    ErrorContext::new()
        .file(file)
        .element(String::from_utf8_lossy(e.name().as_ref()).into_owned())
}

/// Collect the unescaped attributes of an element
pub(crate) fn parse_attributes(e: &BytesStart) -> Result<Attributes> {
    let mut attrs = HashMap::with_capacity(8);
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let raw = std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value = quick_xml::escape::unescape(raw).map_err(|e| Error::InvalidXml(e.to_string()))?;
        attrs.insert(key.to_string(), value.into_owned());
    }
    Ok(attrs)
}

/// A required attribute
pub(crate) fn required<'a>(attrs: &'a Attributes, element: &str, key: &str) -> Result<&'a str> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::missing_attribute(element, key))
}

/// Parse a finite number
pub(crate) fn parse_number(field: &str, value: &str) -> Result<f64> {
    let number: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::parse_error_with_context(field, value, "number"))?;
    if !number.is_finite() {
        return Err(Error::parse_error_with_context(field, value, "finite number"));
    }
    Ok(number)
}

/// A required numeric attribute
pub(crate) fn required_number(attrs: &Attributes, element: &str, key: &str) -> Result<f64> {
    parse_number(key, required(attrs, element, key)?)
}

/// An optional numeric attribute with a default
pub(crate) fn number_or(attrs: &Attributes, key: &str, default: f64) -> Result<f64> {
    attrs.get(key).map_or(Ok(default), |v| parse_number(key, v))
}

/// A required integer attribute
pub(crate) fn required_int(attrs: &Attributes, element: &str, key: &str) -> Result<i64> {
    let value = required(attrs, element, key)?;
    value
        .trim()
        .parse()
        .map_err(|_| Error::parse_error_with_context(key, value, "integer"))
}

/// Parse a boolean written as `true`/`false` or `1`/`0`
pub(crate) fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::parse_error_with_context(field, other, "boolean")),
    }
}

pub(crate) fn write_start<W: Write>(writer: &mut Writer<W>, elem: BytesStart) -> Result<()> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    writer
        .write_event(Event::Start(elem))
        .map_err(|e| Error::xml_write(format!("Failed to write {} element: {}", name, e)))?;
    Ok(())
}

pub(crate) fn write_empty<W: Write>(writer: &mut Writer<W>, elem: BytesStart) -> Result<()> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    writer
        .write_event(Event::Empty(elem))
        .map_err(|e| Error::xml_write(format!("Failed to write {} element: {}", name, e)))?;
    Ok(())
}

pub(crate) fn write_end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| Error::xml_write(format!("Failed to close {} element: {}", name, e)))?;
    Ok(())
}

/// Turn the bytes of a finished writer into a string
pub(crate) fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::xml_write(format!("Generated XML is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctype_rejected() {
        assert!(reject_doctype("<?xml version=\"1.0\"?><!DOCTYPE svg><svg/>").is_err());
        assert!(reject_doctype("<svg/>").is_ok());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_number("x", " 1.5 ").unwrap(), 1.5);
        assert!(parse_number("x", "inf").is_err());
        assert!(parse_number("x", "abc").is_err());
        assert!(parse_bool("b", "1").unwrap());
        assert!(parse_bool("b", "yes").is_err());
        assert_eq!(local_name("cad:sketch"), "sketch");
        assert_eq!(local_name("svg"), "svg");
    }
}
