//! XML property list decoding into `serde_json::Value`
//!
//! Only the XML flavour is supported. `data` payloads stay base64 text and
//! `date` values stay ISO 8601 strings.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlistError {
    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("Invalid property list: {0}")]
    Structure(String),
}

enum Frame {
    Dict {
        map: Map<String, Value>,
        key: Option<String>,
    },
    Array(Vec<Value>),
}

/// Scalar element currently being read
struct Scalar {
    tag: Vec<u8>,
    text: String,
}

/// Decodes an XML property list.
pub fn from_str(xml: &str) -> Result<Value, PlistError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut scalar: Option<Scalar> = None;
    let mut root: Option<Value> = None;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| PlistError::Xml(e.to_string()))?
        {
            Event::Start(element) => match element.name().as_ref() {
                b"plist" => {}
                b"dict" => stack.push(Frame::Dict {
                    map: Map::new(),
                    key: None,
                }),
                b"array" => stack.push(Frame::Array(Vec::new())),
                tag => {
                    scalar = Some(Scalar {
                        tag: tag.to_vec(),
                        text: String::new(),
                    })
                }
            },
            Event::Empty(element) => {
                let value = match element.name().as_ref() {
                    b"dict" => Some(Value::Object(Map::new())),
                    b"array" => Some(Value::Array(Vec::new())),
                    b"true" => Some(Value::Bool(true)),
                    b"false" => Some(Value::Bool(false)),
                    b"key" => {
                        set_key(&mut stack, String::new())?;
                        None
                    }
                    _ => Some(Value::String(String::new())),
                };
                if let Some(value) = value {
                    insert(&mut stack, &mut root, value)?;
                }
            }
            Event::Text(text) => {
                if let Some(current) = scalar.as_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| PlistError::Xml(e.to_string()))?;
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(current) = scalar.as_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(element) => match element.name().as_ref() {
                b"plist" => {}
                b"dict" => match stack.pop() {
                    Some(Frame::Dict { map, .. }) => {
                        insert(&mut stack, &mut root, Value::Object(map))?
                    }
                    _ => return Err(structure("unbalanced </dict>")),
                },
                b"array" => match stack.pop() {
                    Some(Frame::Array(items)) => {
                        insert(&mut stack, &mut root, Value::Array(items))?
                    }
                    _ => return Err(structure("unbalanced </array>")),
                },
                _ => {
                    let Some(finished) = scalar.take() else {
                        return Err(structure("unexpected closing tag"));
                    };
                    if finished.tag == b"key" {
                        set_key(&mut stack, finished.text)?;
                    } else {
                        insert(&mut stack, &mut root, scalar_value(finished)?)?;
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(structure("unterminated container"));
    }
    root.ok_or_else(|| structure("empty document"))
}

fn scalar_value(scalar: Scalar) -> Result<Value, PlistError> {
    let text = scalar.text;
    match scalar.tag.as_slice() {
        b"integer" => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| structure(&format!("invalid integer {text:?}"))),
        b"real" => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| structure(&format!("invalid real {text:?}"))),
        b"true" => Ok(Value::Bool(true)),
        b"false" => Ok(Value::Bool(false)),
        b"data" => Ok(Value::String(
            text.chars().filter(|c| !c.is_whitespace()).collect(),
        )),
        b"string" | b"date" => Ok(Value::String(text)),
        other => Err(structure(&format!(
            "unsupported element <{}>",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn set_key(stack: &mut [Frame], name: String) -> Result<(), PlistError> {
    match stack.last_mut() {
        Some(Frame::Dict { key, .. }) => {
            *key = Some(name);
            Ok(())
        }
        _ => Err(structure("<key> outside of <dict>")),
    }
}

fn insert(stack: &mut [Frame], root: &mut Option<Value>, value: Value) -> Result<(), PlistError> {
    match stack.last_mut() {
        Some(Frame::Dict { map, key }) => {
            let name = key
                .take()
                .ok_or_else(|| structure("dictionary value without <key>"))?;
            map.insert(name, value);
        }
        Some(Frame::Array(items)) => items.push(value),
        None => {
            if root.is_some() {
                return Err(structure("multiple root objects"));
            }
            *root = Some(value);
        }
    }
    Ok(())
}

fn structure(message: &str) -> PlistError {
    PlistError::Structure(message.to_string())
}
