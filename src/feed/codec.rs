use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

use super::model::{Channel, Feed, Item};

const ROOT_TAG: &str = "rss";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Errors raised while decoding feed bytes.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document contains no element at all (empty body, plain text).
    #[error("Parse error: document has no root element")]
    MissingRoot,

    /// The document's root element is something other than `<rss>`,
    /// e.g. an HTML error page.
    #[error("Parse error: expected <rss> root element, found <{0}>")]
    UnexpectedRoot(String),

    /// The `<rss>` root has no `<channel>` child.
    #[error("Parse error: <rss> has no <channel> element")]
    MissingChannel,

    /// Input ended before the root element was closed.
    #[error("Parse error: document ended before </rss>")]
    Truncated,

    /// Malformed XML (mismatched tags, bad entities, invalid UTF-8).
    #[error("Parse error: {0}")]
    Xml(String),
}

/// Errors raised while encoding a [`Feed`] back to XML.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Serialize error: {0}")]
    Xml(String),
}

/// Decodes raw RSS bytes into a [`Feed`].
///
/// The root element must be `<rss>` and must contain a `<channel>`.
/// Schema elements are matched by their full qualified name, so prefixed
/// extensions such as `<atom:link>` or `<media:title>` never fill a
/// `link`/`title` field. Those and any other unknown elements are skipped.
/// Field text is kept exactly as written, whitespace included. Missing
/// fields decode as empty strings; a repeated field keeps its last value.
///
/// # Errors
///
/// - [`ParseError::MissingRoot`] if the input has no element
/// - [`ParseError::UnexpectedRoot`] if the root is not `<rss>`
/// - [`ParseError::MissingChannel`] if `<rss>` has no `<channel>`
/// - [`ParseError::Truncated`] if the input stops inside the document
/// - [`ParseError::Xml`] for malformed XML
///
/// # Security
///
/// Entity handling follows the pinned `quick-xml` version: only the five
/// predefined XML entities are resolved, `<!ENTITY>` declarations are never
/// expanded.
pub fn decode(bytes: &[u8]) -> Result<Feed, ParseError> {
    // No trim_text: whitespace inside fields is part of the value
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut state = FeedDecoder::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => state.open(&e, reader.decoder())?,
            Ok(Event::Empty(e)) => {
                state.open(&e, reader.decoder())?;
                if state.close() {
                    break;
                }
            }
            Ok(Event::End(_)) => {
                if state.close() {
                    break;
                }
            }
            Ok(Event::Text(e)) => {
                if state.in_field() {
                    let text = e.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                    state.push_text(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if state.in_field() {
                    let text = std::str::from_utf8(&e).map_err(|e| ParseError::Xml(e.to_string()))?;
                    state.push_text(text);
                }
            }
            Ok(Event::Eof) => {
                if !state.stack.is_empty() {
                    return Err(ParseError::Truncated);
                }
                break;
            }
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    state.finish()
}

/// Encodes a [`Feed`] as an XML document indented two spaces per level.
///
/// # Errors
///
/// Returns [`SerializeError::Xml`] if the serializer rejects the structure.
/// With the fixed schema in [`model`](super::model) this does not happen
/// for any value a caller can construct.
pub fn encode(feed: &Feed) -> Result<String, SerializeError> {
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some(ROOT_TAG))
        .map_err(|e| SerializeError::Xml(e.to_string()))?;
    serializer.indent(' ', 2);
    feed.serialize(serializer)
        .map_err(|e| SerializeError::Xml(e.to_string()))?;

    let mut document = String::with_capacity(XML_DECLARATION.len() + 1 + body.len());
    document.push_str(XML_DECLARATION);
    document.push('\n');
    document.push_str(&body);
    Ok(document)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelField {
    Title,
    Link,
    Description,
}

impl ChannelField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"description" => Some(Self::Description),
            _ => None,
        }
    }

    fn assign(self, channel: &mut Channel, text: String) {
        match self {
            Self::Title => channel.title = text,
            Self::Link => channel.link = text,
            Self::Description => channel.description = text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    Description,
    PubDate,
    Guid,
}

impl ItemField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"description" => Some(Self::Description),
            b"pubDate" => Some(Self::PubDate),
            b"guid" => Some(Self::Guid),
            _ => None,
        }
    }

    fn assign(self, item: &mut Item, text: String) {
        match self {
            Self::Title => item.title = text,
            Self::Link => item.link = text,
            Self::Description => item.description = text,
            Self::PubDate => item.pub_date = text,
            Self::Guid => item.guid = text,
        }
    }
}

/// Where an open element sits in the `rss > channel > item` schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Root,
    Channel,
    Item,
    ChannelField(ChannelField),
    ItemField(ItemField),
    Ignored,
}

/// Event-driven builder for [`Feed`], one stack entry per open element.
#[derive(Debug, Default)]
struct FeedDecoder {
    stack: Vec<Node>,
    version: Option<String>,
    channel: Option<Channel>,
    item: Option<Item>,
    text: String,
}

impl FeedDecoder {
    fn open(&mut self, e: &BytesStart<'_>, decoder: Decoder) -> Result<(), ParseError> {
        let name = e.name();
        let name = name.as_ref();

        let node = match self.stack.last().copied() {
            None => {
                if name != ROOT_TAG.as_bytes() {
                    return Err(ParseError::UnexpectedRoot(
                        String::from_utf8_lossy(name).into_owned(),
                    ));
                }
                self.version = Some(root_version(e, decoder)?);
                Node::Root
            }
            // Only the first <channel> is relayed
            Some(Node::Root) if name == b"channel" && self.channel.is_none() => {
                self.channel = Some(Channel::default());
                Node::Channel
            }
            Some(Node::Channel) if name == b"item" => {
                self.item = Some(Item::default());
                Node::Item
            }
            Some(Node::Channel) => ChannelField::from_name(name).map_or(Node::Ignored, Node::ChannelField),
            Some(Node::Item) => ItemField::from_name(name).map_or(Node::Ignored, Node::ItemField),
            Some(_) => Node::Ignored,
        };

        if matches!(node, Node::ChannelField(_) | Node::ItemField(_)) {
            self.text.clear();
        }
        self.stack.push(node);
        Ok(())
    }

    /// Closes the innermost element. Returns `true` once `</rss>` is reached.
    fn close(&mut self) -> bool {
        match self.stack.pop() {
            Some(Node::Root) => return true,
            Some(Node::ChannelField(field)) => {
                if let Some(channel) = self.channel.as_mut() {
                    field.assign(channel, std::mem::take(&mut self.text));
                }
            }
            Some(Node::ItemField(field)) => {
                if let Some(item) = self.item.as_mut() {
                    field.assign(item, std::mem::take(&mut self.text));
                }
            }
            Some(Node::Item) => {
                if let (Some(item), Some(channel)) = (self.item.take(), self.channel.as_mut()) {
                    channel.items.push(item);
                }
            }
            _ => {}
        }
        false
    }

    fn in_field(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Node::ChannelField(_)) | Some(Node::ItemField(_))
        )
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn finish(self) -> Result<Feed, ParseError> {
        let version = self.version.ok_or(ParseError::MissingRoot)?;
        let channel = self.channel.ok_or(ParseError::MissingChannel)?;
        Ok(Feed { version, channel })
    }
}

fn root_version(e: &BytesStart<'_>, decoder: Decoder) -> Result<String, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
        if attr.key.as_ref() == b"version" {
            return attr
                .decode_and_unescape_value(decoder)
                .map(|v| v.into_owned())
                .map_err(|e| ParseError::Xml(e.to_string()));
        }
    }
    Ok(String::new())
}
