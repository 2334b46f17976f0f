//! # sonos-parser
//!
//! Decoding of the DIDL-Lite documents zone players attach to track
//! metadata (`TrackMetaData` in `GetPositionInfo`, `CurrentTrackMetaData` in
//! events). Every descriptive field is optional: devices routinely omit
//! titles for radio streams, line-in sources and TV audio.
//!
//! ```
//! use sonos_parser::DidlLite;
//!
//! let didl = DidlLite::from_xml(
//!     r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/"><item id="-1" parentID="-1"><dc:title>Song</dc:title></item></DIDL-Lite>"#,
//! )?;
//! assert_eq!(didl.first_item().and_then(|item| item.title.as_deref()), Some("Song"));
//! # Ok::<(), sonos_parser::ParseError>(())
//! ```

pub mod didl;
pub mod error;
pub mod xml_decode;

pub use didl::{DidlItem, DidlLite, DidlResource};
pub use error::{ParseError, ParseResult};
