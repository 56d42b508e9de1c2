//! ISO 10303-21 (STEP physical file) tokenizer
//!
//! Splits the file into statements, then parses each `#id=TYPE(args)`
//! instance into a [`StepEntity`] with structured argument values.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, value},
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

/// One argument of an entity instance
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// `#12`
    Ref(u64),
    Str(String),
    Int(i64),
    Real(f64),
    /// `.ELEMENT.`
    Enum(String),
    List(Vec<StepValue>),
    /// `IFCLENGTHMEASURE(25.4)`
    Typed(String, Vec<StepValue>),
    /// `$`
    Null,
    /// `*`
    Derived,
}

impl StepValue {
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value; typed measures yield their wrapped number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            Self::Typed(_, args) if args.len() == 1 => args[0].as_f64(),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// An entity instance
#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    pub id: u64,
    /// Upper-case type name, e.g. `IFCWALL`
    pub type_name: String,
    pub args: Vec<StepValue>,
}

impl StepEntity {
    pub fn arg(&self, index: usize) -> Option<&StepValue> {
        self.args.get(index)
    }

    pub fn ref_arg(&self, index: usize) -> Option<u64> {
        self.arg(index)?.as_id()
    }

    /// Non-empty string argument
    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.arg(index)?.as_str().filter(|s| !s.is_empty())
    }

    pub fn f64_arg(&self, index: usize) -> Option<f64> {
        self.arg(index)?.as_f64()
    }

    pub fn enum_arg(&self, index: usize) -> Option<&str> {
        self.arg(index)?.as_enum()
    }

    /// References held in a list argument
    pub fn ref_list(&self, index: usize) -> Vec<u64> {
        self.arg(index)
            .and_then(StepValue::as_list)
            .map(|items| items.iter().filter_map(StepValue::as_id).collect())
            .unwrap_or_default()
    }
}

/// Result of tokenizing a whole file
#[derive(Debug, Clone, Default)]
pub struct StepFile {
    /// First schema named by `FILE_SCHEMA`
    pub schema: Option<String>,
    pub entities: Vec<StepEntity>,
    /// Instance statements that could not be parsed
    pub malformed: usize,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('\'')(input)?;
    let mut raw = String::new();
    loop {
        let Some(quote) = rest.find('\'') else {
            return Err(nom::Err::Error(nom::error::Error::new(
                rest,
                nom::error::ErrorKind::Char,
            )));
        };
        raw.push_str(&rest[..quote]);
        let after = &rest[quote + 1..];
        match after.strip_prefix('\'') {
            Some(more) => {
                raw.push('\'');
                rest = more;
            }
            None => return Ok((after, decode_string(&raw))),
        }
    }
}

fn number(input: &str) -> IResult<&str, StepValue> {
    map_res(recognize_float, |text: &str| {
        if text.contains(['.', 'e', 'E']) {
            text.parse::<f64>().map(StepValue::Real).map_err(|_| ())
        } else {
            text.parse::<i64>().map(StepValue::Int).map_err(|_| ())
        }
    })(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<StepValue>> {
    delimited(
        char('('),
        separated_list0(preceded(multispace0, char(',')), step_value),
        preceded(multispace0, char(')')),
    )(input)
}

fn step_value(input: &str) -> IResult<&str, StepValue> {
    preceded(
        multispace0,
        alt((
            value(StepValue::Null, char('$')),
            value(StepValue::Derived, char('*')),
            map(preceded(char('#'), digit1), |d: &str| {
                StepValue::Ref(d.parse().unwrap_or(0))
            }),
            map(string_literal, StepValue::Str),
            map(delimited(char('.'), identifier, char('.')), |e: &str| {
                StepValue::Enum(e.to_string())
            }),
            map(arguments, StepValue::List),
            map(pair(identifier, preceded(multispace0, arguments)), |(name, args)| {
                StepValue::Typed(name.to_ascii_uppercase(), args)
            }),
            number,
        )),
    )(input)
}

fn entity_instance(input: &str) -> IResult<&str, StepEntity> {
    map(
        tuple((
            preceded(char('#'), map_res(digit1, |d: &str| d.parse::<u64>())),
            delimited(multispace0, char('='), multispace0),
            identifier,
            terminated(preceded(multispace0, arguments), multispace0),
        )),
        |(id, _, name, args)| StepEntity {
            id,
            type_name: name.to_ascii_uppercase(),
            args,
        },
    )(input)
}

/// Statements separated by `;` outside string literals, comments removed
fn statements(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_string = !in_string;
                current.push(c);
            }
            '/' if !in_string && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' if !in_string => {
                let statement = current.trim();
                if !statement.is_empty() {
                    out.push(statement.to_string());
                }
                current.clear();
            }
            c => current.push(c),
        }
    }
    out
}

/// Tokenize a STEP file
pub fn parse_step(content: &str) -> StepFile {
    let mut file = StepFile::default();
    for statement in statements(content) {
        if statement.starts_with('#') {
            match entity_instance(&statement) {
                Ok((rest, entity)) if rest.is_empty() => file.entities.push(entity),
                _ => file.malformed += 1,
            }
        } else if let Some(args) = statement.strip_prefix("FILE_SCHEMA") {
            if file.schema.is_none() {
                file.schema = match arguments(args.trim_start()) {
                    Ok((_, values)) => values
                        .first()
                        .and_then(StepValue::as_list)
                        .and_then(|l| l.first())
                        .and_then(StepValue::as_str)
                        .map(str::to_string),
                    Err(_) => None,
                };
            }
        }
    }
    file
}

/// Expand `\X2\…\X0\`, `\X\hh`, `\S\c` and `\\` in a string literal body
pub fn decode_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(body) = tail.strip_prefix("\\X2\\") {
            let end = body.find("\\X0\\").unwrap_or(body.len());
            let units: Vec<u16> = body[..end]
                .as_bytes()
                .chunks(4)
                .filter_map(|c| std::str::from_utf8(c).ok())
                .filter_map(|h| u16::from_str_radix(h, 16).ok())
                .collect();
            out.extend(char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)));
            rest = body.get(end + 4..).unwrap_or("");
        } else if let Some(body) = tail.strip_prefix("\\X\\") {
            match body.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(byte as char);
                    rest = &body[2..];
                }
                None => {
                    out.push('\\');
                    rest = &tail[1..];
                }
            }
        } else if let Some(body) = tail.strip_prefix("\\S\\") {
            match body.chars().next() {
                Some(c) if c.is_ascii() => {
                    out.push(char::from(c as u8 + 128));
                    rest = &body[1..];
                }
                _ => {
                    out.push('\\');
                    rest = &tail[1..];
                }
            }
        } else if let Some(body) = tail.strip_prefix("\\\\") {
            out.push('\\');
            rest = body;
        } else {
            out.push('\\');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Quote a string for a STEP file
pub fn encode_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(c),
            c => {
                let mut units = [0u16; 2];
                out.push_str("\\X2\\");
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("{:04X}", unit));
                }
                out.push_str("\\X0\\");
            }
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_arguments() {
        let file = parse_step(
            "DATA;\n#12= IFCWALLSTANDARDCASE('2O2Fr$t4X7Zf8NOew3FLOH',#5,'North, outer',$,$,#20,#30,$);\nENDSEC;",
        );
        let wall = &file.entities[0];
        assert_eq!(wall.id, 12);
        assert_eq!(wall.type_name, "IFCWALLSTANDARDCASE");
        assert_eq!(wall.args.len(), 8);
        assert_eq!(wall.str_arg(2), Some("North, outer"));
        assert_eq!(wall.ref_arg(5), Some(20));
        assert_eq!(wall.arg(3), Some(&StepValue::Null));
    }

    #[test]
    fn test_nested_lists_and_measures() {
        let file = parse_step(
            "#1=IFCCARTESIANPOINT((0.,12.5,-3.E2));\n#2=IFCMEASUREWITHUNIT(IFCLENGTHMEASURE(25.4),#3);\n#4=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);",
        );
        let coords = file.entities[0].arg(0).and_then(StepValue::as_list).unwrap();
        let values: Vec<f64> = coords.iter().filter_map(StepValue::as_f64).collect();
        assert_eq!(values, vec![0.0, 12.5, -300.0]);
        assert_eq!(file.entities[1].f64_arg(0), Some(25.4));
        assert_eq!(file.entities[2].arg(0), Some(&StepValue::Derived));
        assert_eq!(file.entities[2].enum_arg(2), Some("MILLI"));
    }

    #[test]
    fn test_semicolons_in_strings_and_comments() {
        let file = parse_step("/* header; note */ #1=IFCLABEL('a;b''c');\nFILE_SCHEMA(('IFC4'));");
        assert_eq!(file.entities.len(), 1);
        assert_eq!(file.entities[0].str_arg(0), Some("a;b'c"));
        assert_eq!(file.schema.as_deref(), Some("IFC4"));
    }

    #[test]
    fn test_malformed_statements_are_counted() {
        let file = parse_step("#1=IFCWALL('x',;\n#2=IFCDOOR($);");
        assert_eq!(file.entities.len(), 1);
        assert_eq!(file.malformed, 1);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(decode_string("K\\X2\\00FC\\X0\\che"), "Küche");
        assert_eq!(decode_string("\\X\\E9t\\S\\e"), "\u{e9}t\u{e5}");
        assert_eq!(decode_string("a\\\\b"), "a\\b");
        assert_eq!(encode_string("Küche's"), "'K\\X2\\00FC\\X0\\che''s'");
        assert_eq!(decode_string(&encode_string("a\\b")[1..5]), "a\\b");
    }
}
