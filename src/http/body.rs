//! Request body parsing stages.
//!
//! Two middleware stages run after cookie parsing: one for JSON bodies and
//! one for URL-encoded forms. Each buffers a body of its content type up to
//! the configured ceiling, parses it, stores the result as a [`ParsedBody`]
//! request extension and hands the buffered bytes on, so extractors such as
//! `Json<T>` keep working in route handlers. Other content types pass
//! through unread.

use std::collections::{BTreeMap, HashMap};

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::security::limits::{buffer_limited, BodyLimit};

/// A body decoded by one of the parsing stages.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// `application/json` (or `+json`) body; always an object or array.
    Json(Value),
    /// `application/x-www-form-urlencoded` body, decoded in extended mode.
    Form(Value),
}

impl ParsedBody {
    pub fn value(&self) -> &Value {
        match self {
            ParsedBody::Json(v) | ParsedBody::Form(v) => v,
        }
    }
}

fn media_type(request: &Request) -> Option<String> {
    let raw = request.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next()?.trim().to_ascii_lowercase();
    Some(essence)
}

fn is_json(media_type: &str) -> bool {
    media_type == "application/json"
        || (media_type.starts_with("application/") && media_type.ends_with("+json"))
}

fn declares_body(request: &Request) -> bool {
    match request.headers().get(CONTENT_LENGTH) {
        Some(len) => len.to_str().ok().and_then(|v| v.parse::<u64>().ok()) != Some(0),
        None => true,
    }
}

async fn take_body(request: Request, limit: BodyLimit) -> Result<(Request, Bytes), AppError> {
    let (parts, body) = request.into_parts();
    let bytes = buffer_limited(&parts.headers, body, limit).await?;
    let request = Request::from_parts(parts, Body::from(bytes.clone()));
    Ok((request, bytes))
}

/// Stage 4: parse JSON bodies.
///
/// Only objects and arrays are accepted at the top level; an empty body
/// parses as an empty object.
pub async fn parse_json(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let wants_parse = media_type(&request).is_some_and(|m| is_json(&m)) && declares_body(&request);
    if !wants_parse {
        return Ok(next.run(request).await);
    }

    let (mut request, bytes) = take_body(request, limit).await?;
    let value = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::MalformedBody(format!("Invalid JSON body: {}", e)))?;
        if !(value.is_object() || value.is_array()) {
            return Err(AppError::MalformedBody(
                "JSON body must be an object or an array".to_string(),
            ));
        }
        value
    };

    request.extensions_mut().insert(ParsedBody::Json(value));
    Ok(next.run(request).await)
}

/// Stage 5: parse URL-encoded form bodies in extended mode.
pub async fn parse_urlencoded(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let wants_parse = media_type(&request).as_deref() == Some("application/x-www-form-urlencoded")
        && declares_body(&request);
    if !wants_parse {
        return Ok(next.run(request).await);
    }

    let (mut request, bytes) = take_body(request, limit).await?;
    request
        .extensions_mut()
        .insert(ParsedBody::Form(parse_extended(&bytes)));
    Ok(next.run(request).await)
}

/// Nested brackets beyond this depth stay in one literal key.
const MAX_DEPTH: usize = 5;

/// Highest numeric index that still builds an array; larger ones become object keys.
const ARRAY_LIMIT: usize = 20;

/// Decode a form body, expanding bracketed keys.
///
/// `a[b]=1` nests into `{"a": {"b": "1"}}`, `a[]=1&a[]=2` and repeated plain
/// keys collect into arrays, and `a[0]=x&a[1]=y` builds `["x", "y"]`. A key
/// that meets an existing value of another shape keeps both.
pub fn parse_extended(input: &[u8]) -> Value {
    let mut order: Vec<(String, Vec<String>)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        match seen.get(&*key) {
            Some(&at) => order[at].1.push(value.into_owned()),
            None => {
                seen.insert(key.to_string(), order.len());
                order.push((key.into_owned(), vec![value.into_owned()]));
            }
        }
    }

    let mut root = Node::Map(BTreeMap::new());
    for (key, mut values) in order {
        let leaf = if values.len() == 1 {
            Node::Scalar(values.remove(0))
        } else {
            Node::List(values.into_iter().map(Node::Scalar).enumerate().collect())
        };
        let (parent, chain) = split_key(&key);
        let mut node = leaf;
        for segment in chain.into_iter().rev() {
            node = segment.wrap(node);
        }
        root = merge(root, Node::Map(BTreeMap::from([(parent, node)])));
    }
    root.into_value()
}

/// One bracketed part of a form key.
#[derive(Debug, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
    Push,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Segment::Push;
        }
        match raw.parse::<usize>() {
            Ok(index) if index <= ARRAY_LIMIT && index.to_string() == raw => Segment::Index(index),
            _ => Segment::Key(raw.to_string()),
        }
    }

    fn wrap(self, node: Node) -> Node {
        match self {
            Segment::Key(key) => Node::Map(BTreeMap::from([(key, node)])),
            Segment::Index(index) => Node::List(BTreeMap::from([(index, node)])),
            Segment::Push => match node {
                list @ Node::List(_) => list,
                other => Node::List(BTreeMap::from([(0, other)])),
            },
        }
    }
}

/// Split `a[b][c]` into `a` and its segments.
///
/// Keys that are not well formed stay whole. Anything past [`MAX_DEPTH`]
/// segments is kept as a single literal key.
fn split_key(key: &str) -> (String, Vec<Segment>) {
    let literal = || (key.to_string(), Vec::new());
    let Some(open) = key.find('[') else {
        return literal();
    };
    if open == 0 || !key.ends_with(']') {
        return literal();
    }

    let mut chain = Vec::new();
    let mut rest = &key[open..];
    while chain.len() < MAX_DEPTH {
        let Some(inner) = rest.strip_prefix('[') else {
            break;
        };
        let Some(close) = inner.find(']') else {
            return literal();
        };
        chain.push(Segment::parse(&inner[..close]));
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        if !rest.starts_with('[') {
            return literal();
        }
        chain.push(Segment::Key(rest.to_string()));
    }
    (key[..open].to_string(), chain)
}

/// Decoded form value before sparse arrays are compacted.
#[derive(Debug)]
enum Node {
    Scalar(String),
    List(BTreeMap<usize, Node>),
    Map(BTreeMap<String, Node>),
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Scalar(s) => Value::String(s),
            Node::List(items) => Value::Array(items.into_values().map(Node::into_value).collect()),
            Node::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

fn next_index(items: &BTreeMap<usize, Node>) -> usize {
    items.keys().next_back().map_or(0, |last| last + 1)
}

fn index_keys(items: BTreeMap<usize, Node>) -> BTreeMap<String, Node> {
    items.into_iter().map(|(i, node)| (i.to_string(), node)).collect()
}

/// Fold `source` into `target`. Recursion is bounded by [`MAX_DEPTH`].
fn merge(target: Node, source: Node) -> Node {
    match (target, source) {
        (Node::Map(mut map), Node::Map(incoming)) => {
            for (key, node) in incoming {
                let merged = match map.remove(&key) {
                    Some(existing) => merge(existing, node),
                    None => node,
                };
                map.insert(key, merged);
            }
            Node::Map(map)
        }
        (Node::List(mut items), Node::List(incoming)) => {
            for (index, node) in incoming {
                let merged = match items.remove(&index) {
                    Some(existing) => merge(existing, node),
                    None => node,
                };
                items.insert(index, merged);
            }
            Node::List(items)
        }
        (Node::List(items), map @ Node::Map(_)) => merge(Node::Map(index_keys(items)), map),
        (map @ Node::Map(_), Node::List(items)) => merge(map, Node::Map(index_keys(items))),
        (Node::List(mut items), scalar @ Node::Scalar(_)) => {
            let at = next_index(&items);
            items.insert(at, scalar);
            Node::List(items)
        }
        (scalar @ Node::Scalar(_), Node::List(items)) => Node::List(
            std::iter::once(scalar)
                .chain(items.into_values())
                .enumerate()
                .collect(),
        ),
        (existing, incoming) => Node::List(BTreeMap::from([(0, existing), (1, incoming)])),
    }
}
