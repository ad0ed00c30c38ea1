// src/file/xml.rs
use super::Codec;
use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Number, Value};

const TYPE_ATTR: &str = "type";
const NAME_ATTR: &str = "name";
/// Element used for array entries.
const ITEM_TAG: &str = "item";
/// Element used for object keys that are not valid XML names; the key goes
/// in the `name` attribute.
const FIELD_TAG: &str = "field";
/// Root element when the type name is not a valid XML name (tuples, slices).
const FALLBACK_ROOT: &str = "value";

/// XML codec.
///
/// Data goes through the serde data model as a tree of elements, one per
/// field. Strings are plain text content, copied verbatim with whitespace
/// kept. Every other value carries a `type` attribute (`number`, `bool`,
/// `null`, `array`, `object`), so `None`, empty strings and empty
/// sequences come back as they went in. The root element is named after
/// the saved type.
///
/// ```xml
/// <?xml version="1.0" encoding="utf-8"?>
/// <LevelRecord type="object">
///   <index type="number">0</index>
///   <name>  padded  </name>
///   <tags type="array"/>
///   <count type="null"/>
/// </LevelRecord>
/// ```
///
/// Anything `serde_json` can represent round-trips. Non-finite floats are
/// saved as `null`, the same as with the JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl<T: Serialize + DeserializeOwned> Codec<T> for XmlCodec {
    fn encode(&self, data: &T) -> Result<Vec<u8>> {
        let value = serde_json::to_value(data).context("Failed to serialize XML")?;

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        write_value(&mut writer, &root_name::<T>(), None, &value)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        let content = std::str::from_utf8(bytes).context("XML content is not valid UTF-8")?;
        let value = read_document(content).context("Failed to parse XML")?;
        serde_json::from_value(value).context("Failed to parse XML")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    Number,
    Bool,
    Null,
    Array,
    Object,
}

impl Kind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Strings are the untyped default.
    fn attr(&self) -> Option<&'static str> {
        match self {
            Kind::String => None,
            Kind::Number => Some("number"),
            Kind::Bool => Some("bool"),
            Kind::Null => Some("null"),
            Kind::Array => Some("array"),
            Kind::Object => Some("object"),
        }
    }

    fn from_attr(attr: &str) -> Option<Self> {
        match attr {
            "string" => Some(Kind::String),
            "number" => Some(Kind::Number),
            "bool" => Some(Kind::Bool),
            "null" => Some(Kind::Null),
            "array" => Some(Kind::Array),
            "object" => Some(Kind::Object),
            _ => None,
        }
    }
}

fn root_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let name = base.rsplit("::").next().unwrap_or(base);
    if is_xml_name(name) {
        name.to_string()
    } else {
        FALLBACK_ROOT.to_string()
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_');
    first_ok
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.to_ascii_lowercase().starts_with("xml")
}

fn write_value(
    writer: &mut Writer<Vec<u8>>,
    tag: &str,
    key: Option<&str>,
    value: &Value,
) -> Result<()> {
    let mut start = BytesStart::new(tag);
    if let Some(key) = key {
        start.push_attribute((NAME_ATTR, key));
    }
    if let Some(kind) = Kind::of(value).attr() {
        start.push_attribute((TYPE_ATTR, kind));
    }

    // Empty content is always a self-closing element: the indenting writer
    // would otherwise put whitespace between the start and end tags.
    let text = match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if !items.is_empty() => {
            writer.write_event(Event::Start(start))?;
            for item in items {
                write_value(writer, ITEM_TAG, None, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
            return Ok(());
        }
        Value::Object(fields) if !fields.is_empty() => {
            writer.write_event(Event::Start(start))?;
            for (name, field) in fields {
                if is_xml_name(name) {
                    write_value(writer, name, None, field)?;
                } else {
                    write_value(writer, FIELD_TAG, Some(name), field)?;
                }
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
            return Ok(());
        }
        Value::Array(_) | Value::Object(_) => None,
    };

    match text {
        Some(text) => {
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        None => writer.write_event(Event::Empty(start))?,
    }
    Ok(())
}

/// Name attribute (if any) and kind of an element.
fn element_header(start: &BytesStart) -> Result<(Option<String>, Kind)> {
    let key = match start.try_get_attribute(NAME_ATTR)? {
        Some(attr) => Some(attr.unescape_value()?.into_owned()),
        None => None,
    };
    let kind = match start.try_get_attribute(TYPE_ATTR)? {
        Some(attr) => {
            let value = attr.unescape_value()?;
            Kind::from_attr(&value).ok_or_else(|| anyhow!("Unknown value type '{}'", value))?
        }
        None => Kind::String,
    };
    Ok((key, kind))
}

fn element_key(start: &BytesStart, key: Option<String>) -> Result<String> {
    match key {
        Some(key) => Ok(key),
        None => Ok(std::str::from_utf8(start.name().as_ref())
            .context("Element name is not valid UTF-8")?
            .to_string()),
    }
}

fn read_document(content: &str) -> Result<Value> {
    let mut reader = Reader::from_str(content);
    // Text is data; leading and trailing whitespace must survive
    reader.config_mut().trim_text(false);

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let (_, kind) = element_header(&start)?;
                return read_content(&mut reader, kind);
            }
            Event::Empty(start) => {
                let (_, kind) = element_header(&start)?;
                return empty_value(kind);
            }
            Event::Text(text) if text.unescape()?.trim().is_empty() => continue,
            Event::Text(_) | Event::CData(_) => bail!("Text outside of the root element"),
            Event::Eof => bail!("Document has no root element"),
            _ => continue,
        }
    }
}

fn empty_value(kind: Kind) -> Result<Value> {
    match kind {
        Kind::String => Ok(Value::String(String::new())),
        Kind::Null => Ok(Value::Null),
        Kind::Array => Ok(Value::Array(Vec::new())),
        Kind::Object => Ok(Value::Object(Map::new())),
        Kind::Number | Kind::Bool => bail!("Empty element for a {:?} value", kind),
    }
}

/// Read the content of an element whose start tag was just consumed, up to
/// and including its end tag.
fn read_content(reader: &mut Reader<&[u8]>, kind: Kind) -> Result<Value> {
    match kind {
        Kind::Array => {
            let mut items = Vec::new();
            while let Some((_, item)) = read_child(reader)? {
                items.push(item);
            }
            Ok(Value::Array(items))
        }
        Kind::Object => {
            let mut fields = Map::new();
            while let Some((key, field)) = read_child(reader)? {
                fields.insert(key, field);
            }
            Ok(Value::Object(fields))
        }
        Kind::String => Ok(Value::String(read_text(reader)?)),
        Kind::Null => {
            read_text(reader)?;
            Ok(Value::Null)
        }
        Kind::Bool => match read_text(reader)?.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => bail!("Invalid bool '{}'", other),
        },
        Kind::Number => parse_number(read_text(reader)?.trim()).map(Value::Number),
    }
}

/// Next child element of a container as `(key, value)`, or `None` at the
/// container's end tag. Whitespace between children is layout.
fn read_child(reader: &mut Reader<&[u8]>) -> Result<Option<(String, Value)>> {
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let (key, kind) = element_header(&start)?;
                let key = element_key(&start, key)?;
                return Ok(Some((key, read_content(reader, kind)?)));
            }
            Event::Empty(start) => {
                let (key, kind) = element_header(&start)?;
                let key = element_key(&start, key)?;
                return Ok(Some((key, empty_value(kind)?)));
            }
            Event::End(_) => return Ok(None),
            Event::Text(text) => {
                if !text.unescape()?.trim().is_empty() {
                    bail!("Unexpected text between elements");
                }
            }
            Event::CData(_) => bail!("Unexpected CDATA between elements"),
            Event::Eof => bail!("Unexpected end of document"),
            _ => {}
        }
    }
}

/// Text content up to the element's end tag, verbatim.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(part) => text.push_str(&part.unescape()?),
            Event::CData(part) => {
                text.push_str(std::str::from_utf8(&part).context("CDATA is not valid UTF-8")?)
            }
            Event::End(_) => return Ok(text),
            Event::Start(_) | Event::Empty(_) => bail!("Unexpected element inside a text value"),
            Event::Eof => bail!("Unexpected end of document"),
            _ => {}
        }
    }
}

fn parse_number(text: &str) -> Result<Number> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Number::from(n));
    }
    if let Ok(n) = text.parse::<u64>() {
        return Ok(Number::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| anyhow!("Invalid number '{}'", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Slot {
        name: String,
        index: i32,
        value: f32,
        state: bool,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inventory {
        label: Option<String>,
        count: Option<u32>,
        tags: Vec<String>,
        nested: Vec<Vec<u8>>,
    }

    fn round_trip<T>(value: &T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let bytes = XmlCodec.encode(value).unwrap();
        XmlCodec.decode(&bytes).unwrap()
    }

    #[test]
    fn test_encode_writes_declaration_and_type_root() {
        let slot = Slot { name: "Test".into(), index: 0, value: 0.5, state: true };
        let bytes = Codec::<Slot>::encode(&XmlCodec, &slot).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<Slot type=\"object\">"));
        assert!(text.contains("<name>Test</name>"));
        assert!(text.contains("<index type=\"number\">0</index>"));
        assert_eq!(round_trip(&slot), slot);
    }

    #[test]
    fn test_surrounding_whitespace_is_kept() {
        let slot = Slot { name: "  padded  ".into(), index: 1, value: 1.5, state: false };
        assert_eq!(round_trip(&slot), slot);

        let blank = Slot { name: " \n\t ".into(), ..slot.clone() };
        assert_eq!(round_trip(&blank), blank);
    }

    #[test]
    fn test_empty_string_is_not_none() {
        let some_empty = Inventory {
            label: Some(String::new()),
            count: Some(0),
            tags: vec![String::new()],
            nested: vec![],
        };
        assert_eq!(round_trip(&some_empty), some_empty);
    }

    #[test]
    fn test_none_and_empty_vec_round_trip() {
        let empty = Inventory {
            label: None,
            count: None,
            tags: Vec::new(),
            nested: vec![Vec::new()],
        };
        let text = String::from_utf8(XmlCodec.encode(&empty).unwrap()).unwrap();

        assert!(text.contains("<label type=\"null\"/>"));
        assert!(text.contains("<tags type=\"array\"/>"));
        assert_eq!(round_trip(&empty), empty);
    }

    #[test]
    fn test_markup_characters_are_escaped() {
        let name = "<a href=\"x\">&amp;</a> ]]>".to_string();
        let slot = Slot { name, index: -3, value: -0.25, state: true };
        assert_eq!(round_trip(&slot), slot);
    }

    #[test]
    fn test_map_keys_that_are_not_xml_names() {
        let mut map = BTreeMap::new();
        map.insert("two words".to_string(), 2);
        map.insert("1st".to_string(), 1);
        map.insert("plain".to_string(), 3);

        let text = String::from_utf8(XmlCodec.encode(&map).unwrap()).unwrap();
        assert!(text.contains("<field name=\"two words\" type=\"number\">2</field>"));
        assert!(text.contains("<plain type=\"number\">3</plain>"));
        assert_eq!(round_trip(&map), map);
    }

    #[test]
    fn test_primitives_and_tuples_as_root() {
        assert_eq!(round_trip(&"  text  ".to_string()), "  text  ");
        assert_eq!(round_trip(&(1u8, -2i64, 3.5f64)), (1u8, -2i64, 3.5f64));
        assert_eq!(round_trip(&u64::MAX), u64::MAX);
    }

    #[test]
    fn test_decode_accepts_cdata_and_comments() {
        let xml = "<?xml version=\"1.0\"?>\n<!-- hand written -->\n<Slot type=\"object\">\n  \
                   <name><![CDATA[ <raw> ]]></name>\n  <index type=\"number\">4</index>\n  \
                   <value type=\"number\">2</value>\n  <state type=\"bool\">true</state>\n</Slot>\n";
        let slot: Slot = XmlCodec.decode(xml.as_bytes()).unwrap();
        assert_eq!(slot, Slot { name: " <raw> ".into(), index: 4, value: 2.0, state: true });
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result: Result<Slot> = XmlCodec.decode(b"<Slot type=\"object\"><name>unterminated");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_bad_typed_values() {
        let bad_number: Result<Slot> = XmlCodec.decode(
            b"<Slot type=\"object\"><name>a</name><index type=\"number\">many</index>\
              <value type=\"number\">1</value><state type=\"bool\">true</state></Slot>",
        );
        assert!(bad_number.is_err());

        let unknown_type: Result<Slot> = XmlCodec.decode(b"<Slot type=\"blob\"/>");
        assert!(unknown_type.is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let result: Result<Slot> = XmlCodec.decode(&[0xff, 0xfe, 0x00]);
        assert!(result.is_err());
    }

    #[test]
    fn test_root_name() {
        assert_eq!(root_name::<Slot>(), "Slot");
        assert_eq!(root_name::<BTreeMap<String, i32>>(), "BTreeMap");
        assert_eq!(root_name::<(u8, u8)>(), FALLBACK_ROOT);
    }
}
