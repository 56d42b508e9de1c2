//! Minimal XML reader and escaping helpers
//!
//! Enough XML for vector markup and the round-trip format: elements,
//! attributes, text, character references, comments, processing instructions,
//! DOCTYPE and CDATA. Namespaces are kept as part of the element name; use
//! [`XmlElement::local_name`] to ignore prefixes.

use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use std::borrow::Cow;

use crate::error::{PlanError, Result};

/// A parsed element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<XmlNode>,
}

/// Child of an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name without a namespace prefix
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute parsed as a number; unit suffixes such as `px` are ignored
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(parse_number)
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Child elements with the given local name
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.local_name() == name)
    }

    /// Concatenated text of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Leading numeric part of an attribute value (`"12.5px"` → 12.5)
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit()
                || c == '.'
                || ((c == '-' || c == '+') && (i == 0 || value[..i].ends_with(['e', 'E'])))
                || ((c == 'e' || c == 'E') && i > 0))
        })
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char)(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
    ))(input)
}

fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, (key, _, _, _, value)) =
        preceded(multispace0, tuple((name, multispace0, char('='), multispace0, quoted)))(input)?;
    Ok((input, (key, value)))
}

/// `<name attr="v" ...` up to, but not including, the closing bracket
fn tag_head(input: &str) -> IResult<&str, (&str, Vec<(&str, &str)>)> {
    preceded(char('<'), pair(name, many0(attribute)))(input)
}

/// `<name ... >` or `<name ... />`; the flag is true when self-closing
fn start_tag(input: &str) -> IResult<&str, (&str, Vec<(&str, &str)>, bool)> {
    let (input, (tag, attrs)) = tag_head(input)?;
    let (input, _) = multispace0(input)?;
    let (input, close) = alt((
        nom::combinator::value(true, nom::bytes::complete::tag("/>")),
        nom::combinator::value(false, char('>')),
    ))(input)?;
    Ok((input, (tag, attrs, close)))
}

fn end_tag(input: &str) -> IResult<&str, &str> {
    delimited(
        nom::bytes::complete::tag("</"),
        name,
        preceded(multispace0, char('>')),
    )(input)
}

/// Value of one attribute in a raw opening tag such as `<svg version="1.1"`
pub fn attribute_value(tag: &str, attr_name: &str) -> Option<String> {
    let (_, (_, attrs)) = tag_head(tag.trim_start()).ok()?;
    attrs
        .into_iter()
        .find(|(k, _)| *k == attr_name)
        .map(|(_, v)| decode_entities(v).into_owned())
}

/// Replace the predefined entities and numeric character references
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let Some(semi) = after.find(';').filter(|&s| s <= 12) else {
            out.push('&');
            rest = &after[1..];
            continue;
        };
        let entity = &after[1..semi];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Escape text for use inside a double-quoted attribute
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape character data
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn skip_past<'a>(input: &'a str, terminator: &str, what: &str) -> Result<&'a str> {
    input
        .find(terminator)
        .map(|pos| &input[pos + terminator.len()..])
        .ok_or_else(|| PlanError::Parse(format!("unterminated {}", what)))
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn element_from(tag: &str, attrs: Vec<(&str, &str)>) -> XmlElement {
    XmlElement {
        name: tag.to_string(),
        attributes: attrs
            .into_iter()
            .map(|(k, v)| (k.to_string(), decode_entities(v).into_owned()))
            .collect(),
        children: Vec::new(),
    }
}

/// Parse a document and return its root element
pub fn parse_document(input: &str) -> Result<XmlElement> {
    let mut rest = input.trim_start_matches('\u{feff}');
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    while !rest.is_empty() {
        if rest.starts_with("<?") {
            rest = skip_past(rest, "?>", "processing instruction")?;
        } else if rest.starts_with("<!--") {
            rest = skip_past(rest, "-->", "comment")?;
        } else if let Some(body) = rest.strip_prefix("<![CDATA[") {
            let end = body
                .find("]]>")
                .ok_or_else(|| PlanError::Parse("unterminated CDATA section".into()))?;
            if let Some(parent) = stack.last_mut() {
                parent.children.push(XmlNode::Text(body[..end].to_string()));
            }
            rest = &body[end + 3..];
        } else if rest.starts_with("<!") {
            let bracket = rest.find('[');
            let close = rest.find('>');
            rest = match (bracket, close) {
                (Some(b), Some(c)) if b < c => skip_past(rest, "]>", "DOCTYPE")?,
                _ => skip_past(rest, ">", "declaration")?,
            };
        } else if rest.starts_with("</") {
            let (after, closing) = end_tag(rest)
                .map_err(|_| PlanError::Parse("malformed end tag".into()))?;
            let open = stack
                .pop()
                .ok_or_else(|| PlanError::Parse(format!("unexpected </{}>", closing)))?;
            if open.name != closing {
                return Err(PlanError::Parse(format!(
                    "mismatched end tag: expected </{}>, found </{}>",
                    open.name, closing
                )));
            }
            attach(&mut stack, &mut root, open);
            rest = after;
        } else if rest.starts_with('<') {
            let (after, (tag, attrs, self_closing)) = start_tag(rest).map_err(|_| {
                let snippet: String = rest.chars().take(40).collect();
                PlanError::Parse(format!("malformed tag near '{}'", snippet))
            })?;
            let element = element_from(tag, attrs);
            if self_closing {
                attach(&mut stack, &mut root, element);
            } else {
                stack.push(element);
            }
            rest = after;
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            if let Some(parent) = stack.last_mut() {
                let raw = &rest[..end];
                if !raw.trim().is_empty() {
                    parent
                        .children
                        .push(XmlNode::Text(decode_entities(raw).into_owned()));
                }
            }
            rest = &rest[end..];
        }
    }

    if let Some(open) = stack.last() {
        return Err(PlanError::Parse(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| PlanError::Parse("no root element".into()))
}
