//! XML decoding helpers.
//!
//! UPnP metadata mixes several namespace prefixes (`dc:`, `upnp:`, `r:`) that
//! differ between firmware versions. Prefixes are stripped before handing the
//! document to serde so struct fields can use plain local names.

use crate::error::{ParseError, ParseResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;

/// Deserialize `xml` into `T` after stripping namespace prefixes.
pub fn parse<T: DeserializeOwned>(xml: &str) -> ParseResult<T> {
    quick_xml::de::from_str(&strip_namespaces(xml)).map_err(|e| ParseError::Xml(e.to_string()))
}

/// Local name of the document's root element.
pub fn root_element_name(xml: &str) -> ParseResult<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
            }
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure("document has no root element".into()))
            }
            Ok(_) => continue,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
        }
    }
}

/// Remove namespace prefixes from element and attribute names and drop
/// `xmlns` declarations.
///
/// `<dc:title id="1">Song</dc:title>` becomes `<title id="1">Song</title>`.
/// Text content, comments and processing instructions pass through unchanged.
pub fn strip_namespaces(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find('>') else {
            out.push_str(tail);
            return out;
        };
        strip_tag(&tail[..=end], &mut out);
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}

fn strip_tag(tag: &str, out: &mut String) {
    if tag.starts_with("<?") || tag.starts_with("<!") {
        out.push_str(tag);
        return;
    }

    let inner = &tag[1..tag.len() - 1];
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(inner) => (true, inner),
        None => (false, inner),
    };
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(inner) => (inner, true),
        None => (inner, false),
    };

    let name_end = inner.find(char::is_whitespace).unwrap_or(inner.len());
    out.push('<');
    if closing {
        out.push('/');
    }
    out.push_str(local_name(&inner[..name_end]));

    let mut attributes = &inner[name_end..];
    loop {
        attributes = attributes.trim_start();
        let Some(eq) = attributes.find('=') else {
            break;
        };
        let name = attributes[..eq].trim();
        let value = attributes[eq + 1..].trim_start();
        let Some(quote) = value.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            break;
        };
        let Some(close) = value[1..].find(quote) else {
            break;
        };

        if name != "xmlns" && !name.starts_with("xmlns:") {
            out.push(' ');
            out.push_str(local_name(name));
            out.push('=');
            out.push_str(&value[..close + 2]);
        }
        attributes = &value[close + 2..];
    }

    if self_closing {
        out.push('/');
    }
    out.push('>');
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;

    #[rstest]
    #[case::elements(
        "<e:propertyset><e:property>test</e:property></e:propertyset>",
        "<propertyset><property>test</property></propertyset>"
    )]
    #[case::attributes(r#"<dc:title r:id="1">Song</dc:title>"#, r#"<title id="1">Song</title>"#)]
    #[case::declarations_dropped(
        r#"<DIDL-Lite xmlns="urn:x" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>A</dc:title></DIDL-Lite>"#,
        "<DIDL-Lite><title>A</title></DIDL-Lite>"
    )]
    #[case::self_closing(r#"<upnp:albumArtURI a="b"/>"#, r#"<albumArtURI a="b"/>"#)]
    #[case::prolog_kept(r#"<?xml version="1.0"?><a:b/>"#, r#"<?xml version="1.0"?><b/>"#)]
    #[case::text_untouched("<a>x:y &amp; z</a>", "<a>x:y &amp; z</a>")]
    #[case::single_quotes("<item id='3' xmlns:r='urn:r'/>", "<item id='3'/>")]
    fn test_strip_namespaces(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_namespaces(input), expected);
    }

    #[test]
    fn test_parse_uses_local_names() {
        #[derive(Debug, Deserialize)]
        struct PropertySet {
            property: Property,
        }

        #[derive(Debug, Deserialize)]
        struct Property {
            #[serde(rename = "@val")]
            val: String,
        }

        let xml = r#"<e:propertyset xmlns:e="urn:test"><e:property e:val="test"/></e:propertyset>"#;
        let parsed: PropertySet = parse(xml).unwrap();
        assert_eq!(parsed.property.val, "test");
    }

    #[rstest]
    #[case(r#"<?xml version="1.0"?><DIDL-Lite xmlns="urn:x"/>"#, "DIDL-Lite")]
    #[case("<dc:title>x</dc:title>", "title")]
    fn test_root_element_name(#[case] xml: &str, #[case] expected: &str) {
        assert_eq!(root_element_name(xml).unwrap(), expected);
    }

    #[test]
    fn test_root_element_name_of_empty_document() {
        assert!(matches!(
            root_element_name("   "),
            Err(ParseError::InvalidStructure(_))
        ));
    }
}
