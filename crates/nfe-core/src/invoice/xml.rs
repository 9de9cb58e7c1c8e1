//! Minimal namespace-aware element tree built with quick-xml.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::XmlError;

/// Deepest element nesting accepted by [`parse_tree`].
///
/// Lookups recurse per level, so the tree depth must stay bounded.
pub const MAX_DEPTH: usize = 256;

/// How an element's namespace must match during lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsMatch<'a> {
    /// Element must be bound to exactly this namespace URI.
    Exact(&'a str),
    /// Namespace is ignored, only the local name counts.
    Any,
}

/// An XML element with its resolved namespace, attributes, text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Namespace URI, `None` when unqualified.
    pub namespace: Option<String>,
    /// Local name without prefix.
    pub name: String,
    /// Attributes by local name, namespace declarations excluded.
    pub attributes: Vec<(String, String)>,
    /// Concatenated character data directly inside this element.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn matches(&self, name: &str, ns: NsMatch<'_>) -> bool {
        if self.name != name {
            return false;
        }
        match ns {
            NsMatch::Exact(uri) => self.namespace.as_deref() == Some(uri),
            NsMatch::Any => true,
        }
    }

    /// Direct children with the given local name.
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
        ns: NsMatch<'a>,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.matches(name, ns))
    }

    /// First descendant (depth-first, document order) with the given local name.
    pub fn find_descendant(&self, name: &str, ns: NsMatch<'_>) -> Option<&Element> {
        for child in &self.children {
            if child.matches(name, ns) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name, ns) {
                return Some(found);
            }
        }
        None
    }

    /// This element if it matches, otherwise its first matching descendant.
    pub fn find_self_or_descendant(&self, name: &str, ns: NsMatch<'_>) -> Option<&Element> {
        if self.matches(name, ns) {
            Some(self)
        } else {
            self.find_descendant(name, ns)
        }
    }

    /// Follow `path`, each segment searched among descendants of the previous match.
    pub fn find_path(&self, path: &[&str], ns: NsMatch<'_>) -> Option<&Element> {
        path.iter()
            .try_fold(self, |current, segment| current.find_descendant(segment, ns))
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text, `None` when blank.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        if text.is_empty() { None } else { Some(text) }
    }
}

fn utf8<'a>(bytes: &'a [u8], what: &str) -> Result<&'a str, XmlError> {
    std::str::from_utf8(bytes).map_err(|_| XmlError::Encoding(what.to_string()))
}

fn syntax(position: u64, message: impl ToString) -> XmlError {
    XmlError::Syntax {
        position,
        message: message.to_string(),
    }
}

fn open_element(
    ns: ResolveResult<'_>,
    start: &BytesStart<'_>,
    position: u64,
) -> Result<Element, XmlError> {
    let name = utf8(start.local_name().as_ref(), "element name")?.to_string();

    // Undeclared prefixes are tolerated and treated as unqualified
    let namespace = match ns {
        ResolveResult::Bound(uri) => Some(utf8(uri.as_ref(), "namespace URI")?.to_string()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| syntax(position, e))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = utf8(attr.key.local_name().as_ref(), "attribute name")?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| syntax(position, e))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        namespace,
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn close_element(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlError::TrailingContent),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: Cow<'_, str>) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(current) => current.text.push_str(&text),
        None if text.trim().is_empty() => {}
        None => return Err(XmlError::TrailingContent),
    }
    Ok(())
}

/// Read raw bytes into an element tree.
///
/// Fails on anything that is not a single well-formed root element.
pub fn parse_tree(content: &[u8]) -> Result<Element, XmlError> {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    let mut reader = NsReader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, Event::Start(start))) => {
                if root.is_some() && stack.is_empty() {
                    return Err(XmlError::TrailingContent);
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::TooDeep(MAX_DEPTH));
                }
                stack.push(open_element(ns, &start, position)?);
            }
            Ok((ns, Event::Empty(start))) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::TooDeep(MAX_DEPTH));
                }
                let element = open_element(ns, &start, position)?;
                close_element(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::End(_))) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| syntax(position, "closing tag without an open element"))?;
                close_element(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::Text(text))) => {
                let text = text.unescape().map_err(|e| syntax(position, e))?;
                push_text(&mut stack, text)?;
            }
            Ok((_, Event::CData(data))) => {
                let text = utf8(&data, "CDATA section")?.to_string();
                push_text(&mut stack, Cow::Owned(text))?;
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(e) => return Err(syntax(position, e)),
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }

    root.ok_or(XmlError::Empty)
}
