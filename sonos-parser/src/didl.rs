//! DIDL-Lite structures for track metadata

use crate::error::{ParseError, ParseResult};
use crate::xml_decode;
use serde::Deserialize;

/// DIDL-Lite document.
///
/// ```xml
/// <DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" ...>
///   <item id="-1" parentID="-1">
///     <dc:title>Song Title</dc:title>
///     <dc:creator>Artist Name</dc:creator>
///     <upnp:album>Album Name</upnp:album>
///     <res duration="0:03:58">uri</res>
///   </item>
/// </DIDL-Lite>
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DidlLite {
    #[serde(rename = "item", default)]
    pub items: Vec<DidlItem>,
}

impl DidlLite {
    /// Parse a DIDL-Lite document. Fails when the root element is not
    /// `DIDL-Lite` or the document is not well-formed.
    pub fn from_xml(xml: &str) -> ParseResult<Self> {
        let root = xml_decode::root_element_name(xml)?;
        if root != "DIDL-Lite" {
            return Err(ParseError::InvalidStructure(format!(
                "expected DIDL-Lite root, found {root}"
            )));
        }
        xml_decode::parse(xml)
    }

    /// The item describing the current track
    pub fn first_item(&self) -> Option<&DidlItem> {
        self.items.first()
    }
}

/// One `<item>` in a DIDL-Lite document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DidlItem {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,

    #[serde(rename = "@parentID", default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub res: Option<DidlResource>,

    #[serde(rename = "albumArtURI", default)]
    pub album_art_uri: Option<String>,

    /// Item class, e.g. `object.item.audioItem.musicTrack`
    #[serde(default)]
    pub class: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Lead artist
    #[serde(default)]
    pub creator: Option<String>,

    #[serde(default)]
    pub album: Option<String>,
}

/// `<res>` element: the playable resource URI and its attributes
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DidlResource {
    /// Duration in H:MM:SS form
    #[serde(rename = "@duration", default)]
    pub duration: Option<String>,

    #[serde(rename = "@protocolInfo", default)]
    pub protocol_info: Option<String>,

    #[serde(rename = "$text", default)]
    pub uri: Option<String>,
}
