//! Parser for the AIDA64 sensor dump.
//!
//! The dump is a sequence of sibling elements without an enclosing root:
//!
//! ```text
//! <sys><id>SCPUCK</id><label>CPU Clock</label><value>3593</value></sys>
//! <temp><id>TCPUDIO</id><label>CPU Diode</label><value>48</value></temp>
//! ```
//!
//! Every element must carry an `id` and a `value` child. Values are returned
//! as text; deciding whether they are numeric is left to the classifier.

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

const ROOT: &str = "aida64";

/// One sensor entry of a dump, as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub identifier: String,
    pub raw_value: String,
}

impl RawRecord {
    pub fn new(identifier: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_value: raw_value.into(),
        }
    }
}

/// The dump does not have the expected element structure.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Element #{index} <{element}> has no <{missing}> child")]
    MissingChild {
        index: usize,
        element: String,
        missing: &'static str,
    },

    #[error("Malformed sensor markup at byte {position}: {message}")]
    Markup { position: u64, message: String },

    #[error("Sensor markup ended inside an open element")]
    Unterminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Value,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"id" => Some(Field::Id),
            b"value" => Some(Field::Value),
            _ => None,
        }
    }
}

/// Children collected for the element currently being read.
struct Element {
    index: usize,
    name: String,
    id: Option<String>,
    value: Option<String>,
}

impl Element {
    fn new(index: usize, name: &[u8]) -> Self {
        Self {
            index,
            name: String::from_utf8_lossy(name).into_owned(),
            id: None,
            value: None,
        }
    }

    fn has(&self, field: Field) -> bool {
        match field {
            Field::Id => self.id.is_some(),
            Field::Value => self.value.is_some(),
        }
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Id => &mut self.id,
            Field::Value => &mut self.value,
        }
    }

    fn finish(self) -> Result<RawRecord, ParseError> {
        let missing = |missing| ParseError::MissingChild {
            index: self.index,
            element: self.name.clone(),
            missing,
        };

        let identifier = self.id.clone().ok_or_else(|| missing("id"))?;
        let raw_value = self.value.clone().ok_or_else(|| missing("value"))?;

        Ok(RawRecord {
            identifier,
            raw_value,
        })
    }
}

/// Parse a dump into records, in document order.
pub fn parse(raw: &str) -> Result<Vec<RawRecord>, ParseError> {
    let wrapped = format!("<{ROOT}>{raw}</{ROOT}>");
    let offset = ROOT.len() as u64 + 2;

    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);

    let markup_error = |reader: &Reader<&[u8]>, message: String| ParseError::Markup {
        position: (reader.buffer_position() as u64).saturating_sub(offset),
        message,
    };

    let mut records = Vec::new();
    let mut depth = 0usize;
    let mut element: Option<Element> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                depth += 1;
                match depth {
                    2 => element = Some(Element::new(records.len(), start.name().as_ref())),
                    3 => {
                        // A repeated child is ignored, the first one wins
                        field = Field::from_name(start.name().as_ref())
                            .filter(|f| element.as_ref().is_some_and(|el| !el.has(*f)));
                        if let (Some(el), Some(f)) = (element.as_mut(), field) {
                            *el.slot(f) = Some(String::new());
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(empty)) => match depth {
                1 => {
                    records.push(Element::new(records.len(), empty.name().as_ref()).finish()?);
                }
                2 => {
                    if let (Some(el), Some(f)) =
                        (element.as_mut(), Field::from_name(empty.name().as_ref()))
                    {
                        el.slot(f).get_or_insert_with(String::new);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(text)) if depth == 3 => {
                if let (Some(el), Some(f)) = (element.as_mut(), field) {
                    let text = text
                        .unescape()
                        .map_err(|e| markup_error(&reader, e.to_string()))?;
                    el.slot(f).get_or_insert_with(String::new).push_str(&text);
                }
            }
            Ok(Event::Text(text)) if depth == 1 && !text.iter().all(u8::is_ascii_whitespace) => {
                return Err(markup_error(&reader, "text outside of a sensor element".to_string()));
            }
            Ok(Event::CData(_)) if depth == 1 => {
                return Err(markup_error(&reader, "CDATA outside of a sensor element".to_string()));
            }
            Ok(Event::CData(cdata)) if depth == 3 => {
                if let (Some(el), Some(f)) = (element.as_mut(), field) {
                    el.slot(f)
                        .get_or_insert_with(String::new)
                        .push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Ok(Event::End(_)) => {
                match depth {
                    3 => field = None,
                    2 => {
                        if let Some(el) = element.take() {
                            records.push(el.finish()?);
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(markup_error(&reader, e.to_string())),
        }
    }

    if depth != 0 {
        return Err(ParseError::Unterminated);
    }

    Ok(records)
}
