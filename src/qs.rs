use std::borrow::Cow;

use serde_json::{Map, Value};

/// Ordered mapping of query parameter names to values
pub type QueryParams = Map<String, Value>;

/// Pieces beyond this count are ignored by `parse`
const PARAMETER_LIMIT: usize = 1000;

/// Bracket indices above this are treated as object keys
const ARRAY_LIMIT: usize = 20;

/// Bracket groups beyond this depth are kept as one literal key
const MAX_DEPTH: usize = 5;

/// Serializes `params` into a query string without the leading `?`.
///
/// Nested maps and arrays flatten into bracketed keys (`user[name]=Ann`,
/// `tags[0]=a`). Everything outside the RFC 3986 unreserved set is
/// percent-encoded, so a space becomes `%20` rather than `+`.
///
/// # Arguments
/// * `params` - The parameters to serialize, in insertion order.
///
/// # Returns
/// * `String` - The encoded query string, empty when nothing serializes.
#[must_use]
pub fn stringify(params: &QueryParams) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pairs(&mut pairs, key, value);
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, prefix: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(pairs, &format!("{prefix}[{index}]"), item);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                push_pairs(pairs, &format!("{prefix}[{key}]"), item);
            }
        }
        scalar => pairs.push(format!(
            "{}={}",
            urlencoding::encode(prefix),
            urlencoding::encode(&scalar_text(scalar))
        )),
    }
}

fn scalar_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(text) => Cow::Borrowed(text),
        Value::Number(number) => match number.as_f64() {
            Some(float) if !(number.is_i64() || number.is_u64()) => Cow::Owned(float_text(float)),
            _ => Cow::Owned(number.to_string()),
        },
        other => Cow::Owned(other.to_string()),
    }
}

/// Formats a float the way `Number.prototype.toString` does: `1.0` is `1`,
/// and magnitudes outside `[1e-6, 1e21)` use `1e+21`/`1e-7` notation.
fn float_text(float: f64) -> String {
    let magnitude = float.abs();
    if magnitude == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return float.to_string();
    }

    let exponential = format!("{float:e}");
    match exponential.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exponential,
    }
}

/// Parses a raw query string (without the leading `?`) into parameters.
///
/// Never fails: undecodable input is kept verbatim and pieces without a key
/// are skipped. Empty pieces still count toward the parameter limit.
///
/// Repeated keys collect into an array, bracketed keys nest, and keys made
/// only of small indices (`list[0]`, `list[1]`) become arrays.
///
/// # Arguments
/// * `query` - The raw query string.
///
/// # Returns
/// * `QueryParams` - The decoded parameters, empty for an empty input.
#[must_use]
pub fn parse(query: &str) -> QueryParams {
    let mut root = Branch::new();

    for piece in query
        .split('&')
        .take(PARAMETER_LIMIT)
        .filter(|piece| !piece.is_empty())
    {
        let (raw_key, raw_value) = split_pair(piece);
        let key = decode(raw_key);
        let value = raw_value.map(decode).unwrap_or_default();

        match split_key(&key) {
            Some((name, segments)) => root.insert(&Field::Key(name), &segments, value),
            None => log::trace!("Skipping query piece without a key: {piece}"),
        }
    }

    root.into_object()
}

fn split_pair(piece: &str) -> (&str, Option<&str>) {
    let position = match piece.find("]=") {
        Some(bracket) => Some(bracket + 1),
        None => piece.find('='),
    };

    match position {
        Some(at) => (&piece[..at], Some(&piece[at + 1..])),
        None => (piece, None),
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(Cow::into_owned);
    decoded.unwrap_or(spaced)
}

/// One bracket group of a parameter key
#[derive(Debug, PartialEq)]
enum Segment {
    /// `[]`
    Append,
    Field(Field),
}

#[derive(Debug, PartialEq)]
enum Field {
    Index(usize),
    Key(String),
}

impl Segment {
    fn classify(inner: &str) -> Self {
        if inner.is_empty() {
            return Segment::Append;
        }

        match inner.parse::<usize>() {
            Ok(index) if index <= ARRAY_LIMIT && index.to_string() == inner => {
                Segment::Field(Field::Index(index))
            }
            _ => Segment::Field(Field::Key(inner.to_string())),
        }
    }
}

/// Finds the next `[...]` group at or after `from` that contains no brackets.
fn next_bracket(key: &str, from: usize) -> Option<(usize, usize)> {
    let mut open = None;
    for (offset, c) in key[from..].char_indices() {
        match c {
            '[' => open = Some(from + offset),
            ']' => {
                if let Some(start) = open {
                    return Some((start, from + offset + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `user[tags][]` into the root name `user` and its child segments.
fn split_key(key: &str) -> Option<(String, Vec<Segment>)> {
    let first = next_bracket(key, 0);
    let parent = first.map_or(key, |(start, _)| &key[..start]);

    let mut name = (!parent.is_empty()).then(|| parent.to_string());
    let mut segments = Vec::new();
    let mut cursor = first;
    let mut depth = 0;

    while let Some((start, end)) = cursor {
        if depth == MAX_DEPTH {
            segments.push(Segment::Field(Field::Key(key[start..].to_string())));
            break;
        }

        let inner = &key[start + 1..end - 1];
        if name.is_none() {
            name = Some(inner.to_string());
        } else {
            segments.push(Segment::classify(inner));
        }

        depth += 1;
        cursor = next_bracket(key, end);
    }

    name.filter(|name| !name.is_empty())
        .map(|name| (name, segments))
}

/// Intermediate tree built while parsing, before indices are resolved
#[derive(Debug)]
enum Node {
    Leaf(String),
    List(Vec<Node>),
    Map(Branch),
}

#[derive(Debug)]
struct Branch {
    entries: Vec<(String, Node)>,
    /// Every key so far came from a `[n]` index
    indexed: bool,
}

impl Node {
    fn grow(rest: &[Segment], leaf: String) -> Node {
        match rest.split_first() {
            None => Node::Leaf(leaf),
            Some((Segment::Append, tail)) => Node::List(vec![Node::grow(tail, leaf)]),
            Some((Segment::Field(field), tail)) => {
                let mut branch = Branch::new();
                branch.insert(field, tail, leaf);
                Node::Map(branch)
            }
        }
    }

    fn absorb(&mut self, rest: &[Segment], leaf: String) {
        match rest.split_first() {
            Some((Segment::Append, tail)) => {
                if let Node::List(items) = self {
                    items.push(Node::grow(tail, leaf));
                    return;
                }
            }
            Some((Segment::Field(field), tail)) => {
                if let Node::Map(branch) = self {
                    branch.insert(field, tail, leaf);
                    return;
                }
            }
            None => {}
        }

        let incoming = Node::grow(rest, leaf);
        self.combine(incoming);
    }

    /// Merges two shapes that cannot nest into one list, flattening one level.
    fn combine(&mut self, incoming: Node) {
        let previous = std::mem::replace(self, Node::List(Vec::new()));
        let mut items = match previous {
            Node::List(items) => items,
            other => vec![other],
        };
        match incoming {
            Node::List(more) => items.extend(more),
            other => items.push(other),
        }
        *self = Node::List(items);
    }

    fn into_value(self) -> Value {
        match self {
            Node::Leaf(text) => Value::String(text),
            Node::List(items) => Value::Array(items.into_iter().map(Node::into_value).collect()),
            Node::Map(branch) => branch.into_value(),
        }
    }
}

impl Branch {
    fn new() -> Self {
        Branch {
            entries: Vec::new(),
            indexed: true,
        }
    }

    fn insert(&mut self, field: &Field, rest: &[Segment], leaf: String) {
        let key = match field {
            Field::Index(index) => index.to_string(),
            Field::Key(key) => {
                self.indexed = false;
                key.clone()
            }
        };

        match self.entries.iter_mut().find(|entry| entry.0 == key) {
            Some((_, node)) => node.absorb(rest, leaf),
            None => self.entries.push((key, Node::grow(rest, leaf))),
        }
    }

    fn into_value(self) -> Value {
        if !self.indexed || self.entries.is_empty() {
            return Value::Object(self.into_object());
        }

        let mut entries = self.entries;
        entries.sort_by_key(|(key, _)| key.parse::<usize>().unwrap_or(usize::MAX));
        Value::Array(entries.into_iter().map(|(_, node)| node.into_value()).collect())
    }

    fn into_object(self) -> QueryParams {
        self.entries
            .into_iter()
            .map(|(key, node)| (key, node.into_value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> QueryParams {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_stringify_encodes_reserved_characters() {
        let query = stringify(&params(json!({ "foo": "bar with spaces", "q": "a&b=c" })));

        assert_eq!(query, "foo=bar%20with%20spaces&q=a%26b%3Dc");
    }

    #[test]
    fn test_stringify_scalars() {
        let query = stringify(&params(json!({ "n": 1, "t": true, "z": null })));

        assert_eq!(query, "n=1&t=true&z=");
    }

    #[test]
    fn test_stringify_floats_like_javascript() {
        let query = stringify(&params(json!({
            "whole": 1.0,
            "half": 1.5,
            "negative": -2.0,
            "big": 1e21,
            "tiny": 1e-7,
        })));

        assert_eq!(query, "whole=1&half=1.5&negative=-2&big=1e%2B21&tiny=1e-7");
    }

    #[test]
    fn test_stringify_nested_structures() {
        let query = stringify(&params(json!({
            "user": { "name": "Ann" },
            "tags": ["x", "y"],
            "empty": [],
        })));

        assert_eq!(query, "user%5Bname%5D=Ann&tags%5B0%5D=x&tags%5B1%5D=y");
    }

    #[test]
    fn test_stringify_empty() {
        assert_eq!(stringify(&QueryParams::new()), "");
    }

    #[test]
    fn test_parse_flat_pairs() {
        assert_eq!(
            parse("foo=bar&foo2=bar2"),
            params(json!({ "foo": "bar", "foo2": "bar2" }))
        );
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("&&").is_empty());
    }

    #[test]
    fn test_parse_decodes_values() {
        assert_eq!(
            parse("q=bar%20with%20spaces&r=a+b&flag"),
            params(json!({ "q": "bar with spaces", "r": "a b", "flag": "" }))
        );
    }

    #[test]
    fn test_parse_keeps_undecodable_input() {
        assert_eq!(parse("x=%FF"), params(json!({ "x": "%FF" })));
    }

    #[test]
    fn test_parse_repeated_keys_collect() {
        assert_eq!(parse("a=1&a=2&a[]=3"), params(json!({ "a": ["1", "2", "3"] })));
    }

    #[test]
    fn test_parse_nested_keys() {
        assert_eq!(
            parse("user[name]=Ann&user[tags][]=x&user[tags][]=y"),
            params(json!({ "user": { "name": "Ann", "tags": ["x", "y"] } }))
        );
    }

    #[test]
    fn test_parse_indices_sort_into_arrays() {
        assert_eq!(
            parse("list[1]=b&list[0]=a"),
            params(json!({ "list": ["a", "b"] }))
        );
        assert_eq!(
            parse("list[21]=x"),
            params(json!({ "list": { "21": "x" } }))
        );
        assert_eq!(
            parse("mixed[0]=a&mixed[k]=b"),
            params(json!({ "mixed": { "0": "a", "k": "b" } }))
        );
    }

    #[test]
    fn test_parse_depth_limit() {
        assert_eq!(
            parse("a[b][c][d][e][f][g][h]=i"),
            params(json!({ "a": { "b": { "c": { "d": { "e": { "f": { "[g][h]": "i" } } } } } } }))
        );
    }

    #[test]
    fn test_parse_bracket_equals() {
        assert_eq!(parse("a[b=c]=d"), params(json!({ "a": { "b=c": "d" } })));
        assert_eq!(parse("a[b]=c=d"), params(json!({ "a": { "b": "c=d" } })));
    }

    #[test]
    fn test_parse_empty_pieces_count_toward_limit() {
        let query = format!("{}a=1", "&".repeat(PARAMETER_LIMIT));
        assert!(parse(&query).is_empty());

        let query = format!("{}a=1", "&".repeat(PARAMETER_LIMIT - 1));
        assert_eq!(parse(&query), params(json!({ "a": "1" })));
    }

    #[test]
    fn test_parse_skips_empty_keys() {
        assert_eq!(parse("=x&a=1"), params(json!({ "a": "1" })));
    }

    #[test]
    fn test_round_trip() {
        let original = params(json!({
            "query": "How to make URLs easier",
            "apiKey": "1234567890",
            "user": { "name": "Ann", "tags": ["x", "y"] },
        }));

        assert_eq!(parse(&stringify(&original)), original);
    }
}
